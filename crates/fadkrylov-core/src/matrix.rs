//! Rank-2 array view.
//!
//! Rank-1 views are plain slices. [`Matrix`] is the rank-2 counterpart: a
//! column-major buffer whose columns are contiguous, so a column can be handed
//! to any rank-1 kernel as `&[T]` or `&mut [T]` without copying.

use std::ops::{Index, IndexMut};

use crate::error::{Error, Result};
use crate::scalar::Scalar;

/// Dense column-major matrix of scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    nrows: usize,
    ncols: usize,
    data: Vec<T>,
}

impl<T: Clone> Matrix<T> {
    /// Create an `nrows x ncols` matrix filled with `value`.
    pub fn filled(nrows: usize, ncols: usize, value: T) -> Self {
        Self {
            nrows,
            ncols,
            data: vec![value; nrows * ncols],
        }
    }

    /// Create from column-major data.
    pub fn from_column_slice(nrows: usize, ncols: usize, data: &[T]) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(Error::DimensionMismatch {
                expected: nrows * ncols,
                actual: data.len(),
            });
        }
        Ok(Self {
            nrows,
            ncols,
            data: data.to_vec(),
        })
    }

    /// Create from row-major data.
    pub fn from_row_slice(nrows: usize, ncols: usize, data: &[T]) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(Error::DimensionMismatch {
                expected: nrows * ncols,
                actual: data.len(),
            });
        }
        Ok(Self::from_fn(nrows, ncols, |i, j| data[i * ncols + j].clone()))
    }

    /// Overwrite every element with `value`.
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|x| *x = value.clone());
    }
}

impl<T> Matrix<T> {
    /// Create from a function of `(row, col)`.
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            for i in 0..nrows {
                data.push(f(i, j));
            }
        }
        Self { nrows, ncols, data }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Extent along dimension `dim` (0 = rows, 1 = columns).
    ///
    /// # Panics
    /// Panics if `dim > 1`.
    pub fn extent(&self, dim: usize) -> usize {
        match dim {
            0 => self.nrows,
            1 => self.ncols,
            _ => panic!("Matrix has rank 2, no extent along dimension {dim}"),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Column `j` as a rank-1 view.
    #[inline]
    pub fn column(&self, j: usize) -> &[T] {
        &self.data[j * self.nrows..(j + 1) * self.nrows]
    }

    /// Column `j` as a mutable rank-1 view.
    #[inline]
    pub fn column_mut(&mut self, j: usize) -> &mut [T] {
        &mut self.data[j * self.nrows..(j + 1) * self.nrows]
    }

    /// Column-major backing storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Apply `f` elementwise into a new matrix of the same shape.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Matrix<U> {
        Matrix {
            nrows: self.nrows,
            ncols: self.ncols,
            data: self.data.iter().map(f).collect(),
        }
    }

    /// Fail unless `other` has the same shape.
    pub fn check_same_shape<U>(&self, other: &Matrix<U>) -> Result<()> {
        if self.nrows != other.nrows {
            return Err(Error::DimensionMismatch {
                expected: self.nrows,
                actual: other.nrows,
            });
        }
        if self.ncols != other.ncols {
            return Err(Error::DimensionMismatch {
                expected: self.ncols,
                actual: other.ncols,
            });
        }
        Ok(())
    }
}

impl<T: Scalar> Matrix<T> {
    /// Zero matrix of the given kind.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::filled(nrows, ncols, T::zero())
    }

    /// Value-only shadow of this matrix.
    pub fn values(&self) -> Matrix<f64> {
        self.map(T::value)
    }
}

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        debug_assert!(i < self.nrows && j < self.ncols);
        &self.data[j * self.nrows + i]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        debug_assert!(i < self.nrows && j < self.ncols);
        &mut self.data[j * self.nrows + i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalar::Dual;

    #[test]
    fn columns_are_contiguous() {
        let m = Matrix::from_fn(3, 2, |i, j| (10 * j + i) as f64);
        assert_eq!(m.column(0), &[0.0, 1.0, 2.0]);
        assert_eq!(m.column(1), &[10.0, 11.0, 12.0]);
        assert_eq!(m[(2, 1)], 12.0);
        assert_eq!(m.extent(0), 3);
        assert_eq!(m.extent(1), 2);
    }

    #[test]
    fn row_slice_is_transposed_into_columns() {
        let m = Matrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m.column(0), &[1.0, 4.0]);
        assert_eq!(m[(0, 2)], 3.0);
    }

    #[test]
    fn rejects_wrong_length() {
        let err = Matrix::from_column_slice(2, 2, &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            Error::DimensionMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn column_mut_writes_through() {
        let mut m: Matrix<Dual<1>> = Matrix::zeros(2, 2);
        m.column_mut(1)[0] = Dual::new(3.0, [1.0]);
        assert_eq!(m[(0, 1)].val(), 3.0);
        assert_eq!(m.values()[(0, 1)], 3.0);
    }

    #[test]
    fn shape_check() {
        let a: Matrix<f64> = Matrix::zeros(2, 3);
        let b: Matrix<f64> = Matrix::zeros(3, 2);
        assert!(a.check_same_shape(&a).is_ok());
        assert!(a.check_same_shape(&b).is_err());
    }
}
