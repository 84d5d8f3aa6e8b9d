//! Dense 3D grid storage.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A dense 3D grid with x-major flat storage.
///
/// Flat index of cell `(i, j, k)` is `i + sx * (j + sy * k)`. The levelset
/// rasterizer produces a `DenseGrid<f32>`; the grid itself is value-type
/// agnostic.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DenseGrid<T> {
    size: [usize; 3],
    data: Vec<T>,
}

impl<T: Clone> DenseGrid<T> {
    /// Create a grid of the given size with every cell set to `fill`.
    #[must_use]
    pub fn new(size: [usize; 3], fill: T) -> Self {
        Self {
            data: vec![fill; size[0] * size[1] * size[2]],
            size,
        }
    }
}

impl<T> DenseGrid<T> {
    /// Grid size per axis.
    #[inline]
    #[must_use]
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Total number of cells.
    #[inline]
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.data.len()
    }

    /// Flat index of cell `(i, j, k)`. No bounds check.
    #[inline]
    #[must_use]
    pub fn idx(&self, i: usize, j: usize, k: usize) -> usize {
        i + self.size[0] * (j + self.size[1] * k)
    }

    /// True if `(i, j, k)` lies inside the grid.
    #[inline]
    #[must_use]
    pub fn in_bounds(&self, i: i64, j: i64, k: i64) -> bool {
        i >= 0
            && j >= 0
            && k >= 0
            && (i as usize) < self.size[0]
            && (j as usize) < self.size[1]
            && (k as usize) < self.size[2]
    }

    /// Cell value, or `None` if out of bounds.
    #[inline]
    #[must_use]
    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<&T> {
        if i < self.size[0] && j < self.size[1] && k < self.size[2] {
            self.data.get(self.idx(i, j, k))
        } else {
            None
        }
    }

    /// Cell value by indices. Panics if out of bounds.
    #[inline]
    #[must_use]
    pub fn at(&self, i: usize, j: usize, k: usize) -> &T {
        &self.data[self.idx(i, j, k)]
    }

    /// Set a cell value. Panics if out of bounds.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: T) {
        let idx = self.idx(i, j, k);
        self.data[idx] = value;
    }

    /// Flat cell storage.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Mutable flat cell storage.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }
}
