//! Grid containers used by every stage of the pipeline.
//!
//! All grids share one convention: cells are addressed `(x, y)` where `x` is the
//! column and `y` the row, and storage is row-major so the flat index of a cell
//! is `y * width + x`. The same flat index is used for mesh vertices, which lets
//! the triangle index buffer point straight into a [`VertexGrid`](crate::VertexGrid).

use crate::error::{Result, TerrainError};

/// Dense 2-D grid addressed by `(column, row)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid2<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid2<T> {
    /// Create a grid with every cell set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            width,
            height,
            cells: vec![value; width * height],
        }
    }
}

impl<T> Grid2<T> {
    /// Build a grid by evaluating `f(x, y)` for every cell in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                cells.push(f(x, y));
            }
        }
        Self { width, height, cells }
    }

    /// Reshape a flat row-major buffer into a grid.
    ///
    /// Fails if the buffer length is not exactly `width * height`.
    pub fn from_flat(width: usize, height: usize, cells: Vec<T>) -> Result<Self> {
        let expected = width * height;
        if cells.len() != expected {
            return Err(TerrainError::FlatLengthMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self { width, height, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Flat row-major index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height, "({x}, {y}) out of bounds");
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.cells[self.index(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.index(x, y);
        &mut self.cells[idx]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        *self.get_mut(x, y) = value;
    }

    /// Cells in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.cells
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.cells
    }

    pub fn into_vec(self) -> Vec<T> {
        self.cells
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.cells.iter()
    }
}

/// Marks which mesh cells have been claimed by a placed prop footprint.
pub type OccupancyGrid = Grid2<bool>;

/// Scalar elevations normalized to `[0, 1]`.
///
/// After normalization the minimum is exactly 0 and the maximum exactly 1,
/// unless every raw value was equal, in which case the whole field is 0.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    values: Grid2<f32>,
}

impl HeightField {
    /// Wrap raw (unnormalized) values and normalize them.
    pub fn from_raw(mut values: Grid2<f32>) -> Result<Self> {
        check_dimensions(values.width(), values.height())?;
        normalize(values.as_mut_slice());
        Ok(Self { values })
    }

    /// Wrap values that are already normalized.
    ///
    /// Useful for hand-built fields (flat test maps, imported masks). No
    /// normalization is applied.
    pub fn from_normalized(values: Grid2<f32>) -> Result<Self> {
        check_dimensions(values.width(), values.height())?;
        Ok(Self { values })
    }

    /// A field where every cell is `value`.
    pub fn flat(width: usize, height: usize, value: f32) -> Result<Self> {
        Self::from_normalized(Grid2::filled(width, height, value))
    }

    pub fn width(&self) -> usize {
        self.values.width()
    }

    pub fn height(&self) -> usize {
        self.values.height()
    }

    /// Height at column `x`, row `y`.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        *self.values.get(x, y)
    }

    pub fn grid(&self) -> &Grid2<f32> {
        &self.values
    }

    /// Smallest and largest value in the field.
    pub fn min_max(&self) -> (f32, f32) {
        min_max(self.values.as_slice())
    }

    /// Black-to-white RGBA8 pixels, row-major, one per cell.
    ///
    /// This is the noise-map preview: 0 maps to black and 1 to white.
    pub fn to_grayscale_rgba(&self) -> Vec<u8> {
        let mut pixels = Vec::with_capacity(self.values.len() * 4);
        for &v in self.values.iter() {
            let level = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            pixels.extend_from_slice(&[level, level, level, 255]);
        }
        pixels
    }
}

/// Both dimensions must be at least 1.
pub(crate) fn check_dimensions(width: usize, height: usize) -> Result<()> {
    if width < 1 || height < 1 {
        return Err(TerrainError::InvalidDimensions { width, height });
    }
    Ok(())
}

fn min_max(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

/// Remap `values` linearly so the smallest becomes 0 and the largest 1.
///
/// Two passes: find the range, then remap. A flat input (max == min) becomes all zeros.
pub fn normalize(values: &mut [f32]) {
    if values.is_empty() {
        return;
    }

    let (min, max) = min_max(values);
    let range = max - min;

    if range == 0.0 {
        values.fill(0.0);
        return;
    }

    for v in values.iter_mut() {
        *v = ((*v - min) / range).clamp(0.0, 1.0);
    }
}
