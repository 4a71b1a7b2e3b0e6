use core::fmt::Display;

use serde::{Deserialize, Serialize};

/// Scalar element type of a kernel's buffers and values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Elem {
    #[default]
    F32,
    F64,
    I32,
}

impl Elem {
    /// Size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Elem::F32 | Elem::I32 => 4,
            Elem::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Elem::F32 | Elem::F64)
    }
}

impl Display for Elem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Elem::F32 => f.write_str("f32"),
            Elem::F64 => f.write_str("f64"),
            Elem::I32 => f.write_str("i32"),
        }
    }
}

/// A scalar constant, typed later by the element type of the kernel it appears in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstantValue {
    Float(f64),
    Int(i64),
}

impl ConstantValue {
    pub fn as_f64(&self) -> f64 {
        match self {
            ConstantValue::Float(val) => *val,
            ConstantValue::Int(val) => *val as f64,
        }
    }

    /// The additive identity for `elem`.
    pub fn zero(elem: Elem) -> Self {
        match elem.is_float() {
            true => ConstantValue::Float(0.0),
            false => ConstantValue::Int(0),
        }
    }
}

impl Default for ConstantValue {
    fn default() -> Self {
        ConstantValue::Float(0.0)
    }
}

impl Display for ConstantValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ConstantValue::Float(val) => write!(f, "{val:?}"),
            ConstantValue::Int(val) => write!(f, "{val}"),
        }
    }
}
