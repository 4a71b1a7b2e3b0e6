use core::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::INLINE_DIMS;

/// Element multipliers applied to each axis index when computing a linear offset.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Hash)]
pub struct Strides {
    dims: SmallVec<[usize; INLINE_DIMS]>,
}

impl Strides {
    pub fn new(dims: &[usize]) -> Self {
        Self {
            dims: SmallVec::from_slice(dims),
        }
    }

    pub fn new_raw(dims: SmallVec<[usize; INLINE_DIMS]>) -> Self {
        Self { dims }
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }
}

impl Deref for Strides {
    type Target = [usize];

    fn deref(&self) -> &Self::Target {
        &self.dims
    }
}

impl DerefMut for Strides {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.dims
    }
}

#[macro_export]
macro_rules! strides {
    () => (
        $crate::Strides::new_raw($crate::SmallVec::new())
    );
    ($elem:expr; $n:expr) => ({
        $crate::Strides::new_raw($crate::smallvec!($elem; $n))
    });
    ($($x:expr),+$(,)?) => ({
        $crate::Strides::new_raw($crate::smallvec!($($x),*))
    });
}

impl<const N: usize> From<[usize; N]> for Strides {
    fn from(dims: [usize; N]) -> Self {
        Strides::new(&dims)
    }
}

impl From<&[usize]> for Strides {
    fn from(dims: &[usize]) -> Self {
        Strides::new(dims)
    }
}

impl From<alloc::vec::Vec<usize>> for Strides {
    fn from(dims: alloc::vec::Vec<usize>) -> Self {
        Strides::new(&dims)
    }
}

impl FromIterator<usize> for Strides {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        Strides {
            dims: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn collected_strides_keep_axis_order() {
        let strides: Strides = [0, 0].into_iter().chain([7, 1]).collect();

        assert_eq!(strides, strides![0, 0, 7, 1]);
        assert_eq!(strides.rank(), 4);
        assert_eq!(Strides::from(alloc::vec![7, 1]), strides![7, 1]);
    }
}
