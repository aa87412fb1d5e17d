//! Row-major matrix buffers.
//!
//! Matrices are filled once, element by element, during ingestion and are only read afterwards.
//! The capacity is a compile-time constant while the dimensions are picked by the [crate::layout]
//! of the lab variant.
use heapless::Vec;

use crate::MAX_MATRIX_ELEMENTS;

/// Matrix dimensions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Dims {
    pub rows: usize,
    pub cols: usize,
}

impl Dims {
    #[inline]
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// Number of elements.
    #[inline]
    pub const fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("{rows}x{cols} matrix exceeds capacity of {capacity} elements")]
    TooLarge {
        rows: usize,
        cols: usize,
        capacity: usize,
    },
    #[error("expected {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("matrix is already full")]
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("index ({row}, {col}) out of bounds for {rows}x{cols} matrix")]
pub struct IndexError {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Owned contiguous row-major buffer of 8-bit unsigned elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix<const N: usize = MAX_MATRIX_ELEMENTS> {
    dims: Dims,
    data: Vec<u8, N>,
}

impl<const N: usize> Matrix<N> {
    /// Create an empty matrix which can then be filled with [Self::push].
    pub fn new(dims: Dims) -> Result<Self, CapacityError> {
        if dims.len() > N {
            return Err(CapacityError::TooLarge {
                rows: dims.rows,
                cols: dims.cols,
                capacity: N,
            });
        }
        Ok(Self {
            dims,
            data: Vec::new(),
        })
    }

    /// Create a completely filled matrix.
    pub fn from_slice(dims: Dims, data: &[u8]) -> Result<Self, CapacityError> {
        let mut matrix = Self::new(dims)?;
        if data.len() != dims.len() {
            return Err(CapacityError::LengthMismatch {
                expected: dims.len(),
                actual: data.len(),
            });
        }
        // Capacity was checked above.
        matrix
            .data
            .extend_from_slice(data)
            .map_err(|_| CapacityError::Full)?;
        Ok(matrix)
    }

    /// Append the next element in row-major order.
    pub fn push(&mut self, value: u8) -> Result<(), CapacityError> {
        if self.is_full() {
            return Err(CapacityError::Full);
        }
        self.data.push(value).map_err(|_| CapacityError::Full)
    }

    #[inline]
    pub const fn dims(&self) -> Dims {
        self.dims
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.data.len() == self.dims.len()
    }

    /// Number of elements filled in so far.
    #[inline]
    pub fn filled(&self) -> usize {
        self.data.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Result<u8, IndexError> {
        let err = IndexError {
            row,
            col,
            rows: self.dims.rows,
            cols: self.dims.cols,
        };
        if row >= self.dims.rows || col >= self.dims.cols {
            return Err(err);
        }
        self.data
            .get(row * self.dims.cols + col)
            .copied()
            .ok_or(err)
    }

    pub fn row(&self, row: usize) -> Result<&[u8], IndexError> {
        let err = IndexError {
            row,
            col: 0,
            rows: self.dims.rows,
            cols: self.dims.cols,
        };
        if row >= self.dims.rows {
            return Err(err);
        }
        let start = row * self.dims.cols;
        self.data.get(start..start + self.dims.cols).ok_or(err)
    }

    /// Flat row-major view of the filled elements.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }
}
