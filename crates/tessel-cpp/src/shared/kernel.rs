use std::fmt::Display;

use tessel_core::ir::{Id, LaunchConfig, Visibility};

use super::{Body, Dialect, Elem};

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Binding<D: Dialect> {
    pub id: Id,
    pub elem: Elem<D>,
    pub vis: Visibility,
    /// Minimum number of elements the launch must provide.
    pub size: usize,
}

impl<D: Dialect> Display for Binding<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.vis {
            Visibility::Read => write!(f, "const {}* data{}", self.elem, self.id),
            Visibility::ReadWrite => write!(f, "{}* data{}", self.elem, self.id),
        }
    }
}

/// A kernel in the C++ dialect `D`. Its `Display` is the complete source file.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeKernel<D: Dialect> {
    pub kernel_name: String,
    pub buffers: Vec<Binding<D>>,
    pub body: Body<D>,
    pub launch: LaunchConfig,
}

impl<D: Dialect> Display for ComputeKernel<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Program Scope -----------------------------------------------------
        D::compile_includes(f)?;
        D::compile_type_definitions(f)?;

        // Kernel signature --------------------------------------------------
        D::compile_kernel_signature(
            f,
            &self.kernel_name,
            &self.buffers,
            self.launch.block.num_elems(),
        )?;

        // Body --------------------------------------------------------------
        f.write_str(" {\n")?;
        write!(f, "{}", self.body)?;
        f.write_str("}")?;

        Ok(())
    }
}
