use std::fmt::Display;

use tessel_core::ir::{self as gpu, ConstantValue, Id};

use super::Dialect;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash)]
pub enum Elem<D: Dialect> {
    F32,
    F64,
    I32,
    _Dialect(std::marker::PhantomData<D>),
}

impl<D: Dialect> Elem<D> {
    pub fn size(&self) -> usize {
        match self {
            Elem::F32 | Elem::I32 => 4,
            Elem::F64 => 8,
            Elem::_Dialect(_) => 0,
        }
    }
}

impl<D: Dialect> From<gpu::Elem> for Elem<D> {
    fn from(elem: gpu::Elem) -> Self {
        match elem {
            gpu::Elem::F32 => Elem::F32,
            gpu::Elem::F64 => Elem::F64,
            gpu::Elem::I32 => Elem::I32,
        }
    }
}

impl<D: Dialect> Display for Elem<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        D::compile_elem(f, self)
    }
}

/// A literal of the element type it is used with.
#[derive(new, Debug, Clone, Copy, PartialEq)]
pub struct Constant<D: Dialect> {
    pub value: ConstantValue,
    pub elem: Elem<D>,
}

impl<D: Dialect> Constant<D> {
    pub fn is_negative(&self) -> bool {
        self.value.as_f64() < 0.0
    }
}

impl<D: Dialect> Display for Constant<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.elem {
            Elem::F32 | Elem::F64 => {
                let val = self.value.as_f64();
                if val.is_nan() {
                    f.write_str("NAN")
                } else if val.is_infinite() {
                    match val.is_sign_negative() {
                        true => f.write_str("-INFINITY"),
                        false => f.write_str("INFINITY"),
                    }
                } else if let Elem::F32 = self.elem {
                    write!(f, "{:?}f", val as f32)
                } else {
                    write!(f, "{val:?}")
                }
            }
            Elem::I32 => {
                let val = match self.value {
                    ConstantValue::Int(val) => val,
                    ConstantValue::Float(val) => val as i64,
                };
                // The literal 2147483648 doesn't fit an int.
                match val == i32::MIN as i64 {
                    true => f.write_str("(-2147483647-1)"),
                    false => write!(f, "{val}"),
                }
            }
            Elem::_Dialect(_) => Ok(()),
        }
    }
}

/// An element-typed value of the kernel body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Variable<D: Dialect> {
    Loaded(Id, Elem<D>),
    Local(Id, Elem<D>),
    Accumulator(Id, Elem<D>),
    Constant(Constant<D>),
}

impl<D: Dialect> Variable<D> {
    pub fn elem(&self) -> Elem<D> {
        match self {
            Variable::Loaded(_, elem) | Variable::Local(_, elem) | Variable::Accumulator(_, elem) => {
                *elem
            }
            Variable::Constant(constant) => constant.elem,
        }
    }

    pub fn from_value(value: gpu::Value, elem: Elem<D>) -> Self {
        match value {
            gpu::Value::Loaded(id) => Variable::Loaded(id, elem),
            gpu::Value::Local(id) => Variable::Local(id, elem),
            gpu::Value::Accumulator(id) => Variable::Accumulator(id, elem),
            gpu::Value::Constant(value) => Variable::Constant(Constant::new(value, elem)),
        }
    }

    /// Formats the variable as the operand of an operator, negative literals in parentheses.
    pub fn fmt_operand(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Constant(constant) if constant.is_negative() => write!(f, "({constant})"),
            _ => write!(f, "{self}"),
        }
    }
}

impl<D: Dialect> Display for Variable<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Variable::Loaded(id, _) => write!(f, "val{id}"),
            Variable::Local(id, _) => write!(f, "alu{id}"),
            Variable::Accumulator(id, _) => write!(f, "acc{id}"),
            Variable::Constant(constant) => write!(f, "{constant}"),
        }
    }
}
