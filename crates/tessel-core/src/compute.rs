use core::fmt::Display;

use rayon::prelude::*;
use tessel_ir::{Elem, KernelDefinition, LaunchConfig};

use crate::{
    KernelNamer, Lowerer, LoweringError, OperationDescriptor, config::CompilationLogger,
};

/// Compiles kernel definitions into the source representation of one target language.
pub trait Compiler: Sync + Send + 'static + Clone + core::fmt::Debug {
    /// The representation for the compiled code.
    type Representation: Display;

    /// Compiles the [kernel definition](KernelDefinition) into the compiler's representation.
    fn compile(&mut self, kernel: KernelDefinition) -> Self::Representation;

    /// The size of the given element in bytes.
    fn elem_size(&self, elem: Elem) -> usize;

    /// The default extension for the compiled source files.
    fn extension(&self) -> &'static str;

    /// Language tag of the source, used when logging.
    fn lang_tag(&self) -> &'static str;
}

/// Kernel source ready to be handed to a device runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledKernel {
    /// Entry point name.
    pub name: String,
    /// Source code of the kernel.
    pub source: String,
    /// Grid and block shape the kernel must be launched with.
    pub launch: LaunchConfig,
    /// The language tag of the source.
    pub lang_tag: &'static str,
}

impl CompiledKernel {
    /// Key identifying the source text; identical sources share a key.
    pub fn cache_key(&self) -> String {
        format!("{:x}", md5::compute(self.source.as_bytes()))
    }
}

impl Display for CompiledKernel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("\n[START_KERNEL_COMPILATION]")?;
        f.write_fmt(format_args!("\nname: {}", self.name))?;

        let grid = self.launch.grid;
        let block = self.launch.block;
        f.write_fmt(format_args!(
            "
grid: ({}, {}, {})
block: ({}, {}, {})
cache_key: {}",
            grid.x,
            grid.y,
            grid.z,
            block.x,
            block.y,
            block.z,
            self.cache_key(),
        ))?;

        f.write_fmt(format_args!(
            "
source:
```{}
{}
```
[END_KERNEL_COMPILATION]
",
            self.lang_tag, self.source
        ))
    }
}

/// A compilation session: lowers descriptors, keeps kernel names unique and compiles them
/// with `C`, logging every compiled kernel.
#[derive(Debug)]
pub struct KernelCompiler<C: Compiler> {
    compiler: C,
    lowerer: Lowerer,
    namer: KernelNamer,
    logger: CompilationLogger,
}

impl<C: Compiler> KernelCompiler<C> {
    /// A session using the global configuration.
    pub fn new(compiler: C) -> Self {
        Self::with_lowerer(compiler, Lowerer::from_config())
    }

    pub fn with_lowerer(compiler: C, lowerer: Lowerer) -> Self {
        Self {
            compiler,
            lowerer,
            namer: KernelNamer::new(),
            logger: CompilationLogger::new(),
        }
    }

    pub fn compile(
        &mut self,
        descriptor: &OperationDescriptor,
    ) -> Result<CompiledKernel, LoweringError> {
        let kernel = self.lowerer.lower(descriptor)?;
        Ok(self.emit(kernel))
    }

    /// Lower every descriptor in parallel, then name and compile them in order.
    ///
    /// Names depend only on the order of `descriptors`, never on scheduling.
    pub fn compile_batch(
        &mut self,
        descriptors: &[OperationDescriptor],
    ) -> Vec<Result<CompiledKernel, LoweringError>> {
        lower_batch(&self.lowerer, descriptors)
            .into_iter()
            .map(|kernel| kernel.map(|kernel| self.emit(kernel)))
            .collect()
    }

    fn emit(&mut self, kernel: KernelDefinition) -> CompiledKernel {
        let kernel = self.namer.assign(kernel);
        let name = kernel.name.clone();
        let launch = kernel.launch;

        let compiled = CompiledKernel {
            name,
            source: self.compiler.compile(kernel).to_string(),
            launch,
            lang_tag: self.compiler.lang_tag(),
        };

        if self.logger.is_enabled() {
            self.logger.log_compilation(&compiled);
        }

        compiled
    }
}

/// Lower independent descriptors in parallel, results in input order.
pub fn lower_batch(
    lowerer: &Lowerer,
    descriptors: &[OperationDescriptor],
) -> Vec<Result<KernelDefinition, LoweringError>> {
    descriptors
        .par_iter()
        .map(|descriptor| lowerer.lower(descriptor))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ElementwiseOp, OperandDescriptor, Source};
    use pretty_assertions::assert_eq;
    use tessel_ir::{BlockDim, GridSize};

    /// Renders the IR statements one per line.
    #[derive(Debug, Clone, Default)]
    struct DebugCompiler;

    impl Compiler for DebugCompiler {
        type Representation = String;

        fn compile(&mut self, kernel: KernelDefinition) -> String {
            let mut source = kernel.name.clone();
            for instruction in kernel.body.iter() {
                source += &format!("\n{instruction:?}");
            }
            source
        }

        fn elem_size(&self, elem: Elem) -> usize {
            elem.size()
        }

        fn extension(&self) -> &'static str {
            "txt"
        }

        fn lang_tag(&self) -> &'static str {
            "text"
        }
    }

    fn copy(size: usize) -> OperationDescriptor {
        OperationDescriptor::elementwise(
            ElementwiseOp::Identity,
            OperandDescriptor::contiguous([size]),
            vec![Source::buffer([size])],
        )
    }

    #[test]
    fn display_wraps_the_source() {
        let kernel = CompiledKernel {
            name: "E_4".to_string(),
            source: "body".to_string(),
            launch: LaunchConfig::new(GridSize::new(4, 1, 1), BlockDim::default()),
            lang_tag: "cpp",
        };

        let expected = format!(
            "\n[START_KERNEL_COMPILATION]\nname: E_4\ngrid: (4, 1, 1)\nblock: (1, 1, 1)\ncache_key: {}\nsource:\n```cpp\nbody\n```\n[END_KERNEL_COMPILATION]\n",
            kernel.cache_key()
        );
        assert_eq!(kernel.to_string(), expected);
    }

    #[test]
    fn cache_key_is_the_md5_of_the_source() {
        let kernel = CompiledKernel {
            name: "E_4".to_string(),
            source: String::new(),
            launch: LaunchConfig::new(GridSize::new(4, 1, 1), BlockDim::default()),
            lang_tag: "cpp",
        };

        assert_eq!(kernel.cache_key(), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test_log::test]
    fn batch_keeps_input_order_and_names_repeats() {
        let mut session = KernelCompiler::with_lowerer(DebugCompiler, Lowerer::default());
        let descriptors = vec![copy(4), copy(8), copy(4), copy(0)];

        let compiled = session.compile_batch(&descriptors);
        let names: Vec<Option<String>> = compiled
            .iter()
            .map(|kernel| kernel.as_ref().ok().map(|kernel| kernel.name.clone()))
            .collect();

        assert_eq!(
            names,
            vec![
                Some("E_4".to_string()),
                Some("E_8".to_string()),
                Some("E_4n1".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn batch_lowering_matches_sequential_lowering() {
        let lowerer = Lowerer::default();
        let descriptors: Vec<_> = (1..32).map(copy).collect();

        let parallel = lower_batch(&lowerer, &descriptors);
        let sequential: Vec<_> = descriptors
            .iter()
            .map(|descriptor| lowerer.lower(descriptor))
            .collect();

        assert_eq!(parallel, sequential);
    }
}
