//! Tensor - Dense Row-Major f32 Array
//!
//! The `Tensor` struct is the numeric workhorse of homegin. Node feature
//! matrices, layer weights, gradients and logits are all tensors. Matrix
//! products are parallelised over output rows with rayon.
//!
//! Only the operations the GIN pipeline needs are provided; most of them
//! require 2-D inputs.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// =============================================================================
// Tensor Struct
// =============================================================================

/// A dense, contiguous, row-major array of `f32` values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    /// Flattened values.
    data: Vec<f32>,
    /// Dimensions.
    shape: Vec<usize>,
}

impl Tensor {
    // =========================================================================
    // Constructors
    // =========================================================================

    /// Creates a tensor from flat data and a shape.
    ///
    /// Returns an error if the number of elements does not match the shape.
    pub fn from_vec(data: Vec<f32>, shape: &[usize]) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != data.len() {
            return Err(Error::shape_mismatch(shape, &[data.len()]));
        }
        Ok(Self {
            data,
            shape: shape.to_vec(),
        })
    }

    /// Creates a tensor filled with zeros.
    #[must_use]
    pub fn zeros(shape: &[usize]) -> Self {
        Self::full(shape, 0.0)
    }

    /// Creates a tensor filled with ones.
    #[must_use]
    pub fn ones(shape: &[usize]) -> Self {
        Self::full(shape, 1.0)
    }

    /// Creates a tensor filled with `value`.
    #[must_use]
    pub fn full(shape: &[usize], value: f32) -> Self {
        let numel: usize = shape.iter().product();
        Self {
            data: vec![value; numel],
            shape: shape.to_vec(),
        }
    }

    /// Stacks equally wide 2-D tensors on top of each other.
    pub fn concat_rows(parts: &[&Tensor]) -> Result<Self> {
        let Some(first) = parts.first() else {
            return Ok(Self::zeros(&[0, 0]));
        };
        let cols = first.cols()?;
        let mut rows = 0;
        let mut data = Vec::with_capacity(parts.iter().map(|p| p.numel()).sum());
        for part in parts {
            if part.cols()? != cols {
                return Err(Error::shape_mismatch(&[part.rows()?, cols], part.shape()));
            }
            rows += part.rows()?;
            data.extend_from_slice(&part.data);
        }
        Self::from_vec(data, &[rows, cols])
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Returns the shape.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of dimensions.
    #[must_use]
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// Returns the number of elements.
    #[must_use]
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns the number of rows of a 2-D tensor.
    pub fn rows(&self) -> Result<usize> {
        self.require_2d()?;
        Ok(self.shape[0])
    }

    /// Returns the number of columns of a 2-D tensor.
    pub fn cols(&self) -> Result<usize> {
        self.require_2d()?;
        Ok(self.shape[1])
    }

    /// Returns the values as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the values as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Returns a copy of the values.
    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        self.data.clone()
    }

    /// Consumes the tensor and returns its values.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Returns row `r` of a 2-D tensor.
    ///
    /// Panics if the tensor is not 2-D or `r` is out of range.
    #[must_use]
    pub fn row(&self, r: usize) -> &[f32] {
        let cols = self.shape[1];
        &self.data[r * cols..(r + 1) * cols]
    }

    /// Returns row `r` of a 2-D tensor mutably.
    pub fn row_mut(&mut self, r: usize) -> &mut [f32] {
        let cols = self.shape[1];
        &mut self.data[r * cols..(r + 1) * cols]
    }

    /// Reinterprets the tensor with a new shape of equal size.
    pub fn reshape(mut self, shape: &[usize]) -> Result<Self> {
        let numel: usize = shape.iter().product();
        if numel != self.data.len() {
            return Err(Error::shape_mismatch(shape, &self.shape));
        }
        self.shape = shape.to_vec();
        Ok(self)
    }

    fn require_2d(&self) -> Result<()> {
        if self.shape.len() == 2 {
            Ok(())
        } else {
            Err(Error::invalid_operation(format!(
                "expected a 2-D tensor, got shape {:?}",
                self.shape
            )))
        }
    }

    fn require_same_shape(&self, other: &Tensor) -> Result<()> {
        if self.shape == other.shape {
            Ok(())
        } else {
            Err(Error::shape_mismatch(&self.shape, &other.shape))
        }
    }

    // =========================================================================
    // Elementwise
    // =========================================================================

    /// Applies `f` to every element.
    #[must_use]
    pub fn map<F: Fn(f32) -> f32>(&self, f: F) -> Self {
        Self {
            data: self.data.iter().map(|&x| f(x)).collect(),
            shape: self.shape.clone(),
        }
    }

    /// Combines two equally shaped tensors elementwise.
    pub fn zip_map<F: Fn(f32, f32) -> f32>(&self, other: &Tensor, f: F) -> Result<Self> {
        self.require_same_shape(other)?;
        Ok(Self {
            data: self
                .data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
            shape: self.shape.clone(),
        })
    }

    /// Elementwise sum.
    pub fn add(&self, other: &Tensor) -> Result<Self> {
        self.zip_map(other, |a, b| a + b)
    }

    /// In-place elementwise sum.
    pub fn add_assign(&mut self, other: &Tensor) -> Result<()> {
        self.require_same_shape(other)?;
        for (a, b) in self.data.iter_mut().zip(other.data.iter()) {
            *a += b;
        }
        Ok(())
    }

    /// Multiplies every element by `factor`.
    #[must_use]
    pub fn scale(&self, factor: f32) -> Self {
        self.map(|x| x * factor)
    }

    /// Adds `bias` to every row of a 2-D tensor.
    pub fn add_row_vector(&self, bias: &[f32]) -> Result<Self> {
        let cols = self.cols()?;
        if bias.len() != cols {
            return Err(Error::shape_mismatch(&[cols], &[bias.len()]));
        }
        let mut out = self.clone();
        for row in out.data.chunks_mut(cols) {
            for (x, b) in row.iter_mut().zip(bias.iter()) {
                *x += b;
            }
        }
        Ok(out)
    }

    // =========================================================================
    // Reductions
    // =========================================================================

    /// Sums a 2-D tensor over its rows, giving one value per column.
    pub fn sum_rows(&self) -> Result<Vec<f32>> {
        let cols = self.cols()?;
        let mut out = vec![0.0f32; cols];
        for row in self.data.chunks(cols.max(1)) {
            for (acc, x) in out.iter_mut().zip(row.iter()) {
                *acc += x;
            }
        }
        Ok(out)
    }

    /// Returns the column index of the largest value in every row.
    ///
    /// Ties resolve to the first maximum.
    pub fn argmax_rows(&self) -> Result<Vec<usize>> {
        let cols = self.cols()?;
        if cols == 0 {
            return Err(Error::invalid_operation("argmax over zero columns"));
        }
        Ok(self
            .data
            .chunks(cols)
            .map(|row| {
                let mut best = 0;
                for (i, &v) in row.iter().enumerate() {
                    if v > row[best] {
                        best = i;
                    }
                }
                best
            })
            .collect())
    }

    // =========================================================================
    // Matrix Products
    // =========================================================================

    /// Matrix product `self @ other` for `(n, k) x (k, m)`.
    pub fn matmul(&self, other: &Tensor) -> Result<Self> {
        let (n, k) = (self.rows()?, self.cols()?);
        let (k2, m) = (other.rows()?, other.cols()?);
        if k != k2 {
            return Err(Error::shape_mismatch(&[k, m], other.shape()));
        }
        let mut out = vec![0.0f32; n * m];
        if m > 0 {
            out.par_chunks_mut(m).enumerate().for_each(|(i, out_row)| {
                let a_row = &self.data[i * k..(i + 1) * k];
                for (p, &a) in a_row.iter().enumerate() {
                    if a == 0.0 {
                        continue;
                    }
                    let b_row = &other.data[p * m..(p + 1) * m];
                    for (o, &b) in out_row.iter_mut().zip(b_row.iter()) {
                        *o += a * b;
                    }
                }
            });
        }
        Self::from_vec(out, &[n, m])
    }

    /// Product with a transposed right operand: `self @ other^T` for
    /// `(n, k) x (m, k)`.
    pub fn matmul_t(&self, other: &Tensor) -> Result<Self> {
        let (n, k) = (self.rows()?, self.cols()?);
        let (m, k2) = (other.rows()?, other.cols()?);
        if k != k2 {
            return Err(Error::shape_mismatch(&[m, k], other.shape()));
        }
        let mut out = vec![0.0f32; n * m];
        if m > 0 {
            out.par_chunks_mut(m).enumerate().for_each(|(i, out_row)| {
                let a_row = &self.data[i * k..(i + 1) * k];
                for (j, o) in out_row.iter_mut().enumerate() {
                    let b_row = &other.data[j * k..(j + 1) * k];
                    *o = a_row.iter().zip(b_row.iter()).map(|(a, b)| a * b).sum();
                }
            });
        }
        Self::from_vec(out, &[n, m])
    }

    /// Product with a transposed left operand: `self^T @ other` for
    /// `(n, k) x (n, m)`.
    pub fn t_matmul(&self, other: &Tensor) -> Result<Self> {
        let (n, k) = (self.rows()?, self.cols()?);
        let (n2, m) = (other.rows()?, other.cols()?);
        if n != n2 {
            return Err(Error::shape_mismatch(&[n, m], other.shape()));
        }
        let mut out = vec![0.0f32; k * m];
        if m > 0 {
            out.par_chunks_mut(m).enumerate().for_each(|(p, out_row)| {
                for i in 0..n {
                    let a = self.data[i * k + p];
                    if a == 0.0 {
                        continue;
                    }
                    let b_row = &other.data[i * m..(i + 1) * m];
                    for (o, &b) in out_row.iter_mut().zip(b_row.iter()) {
                        *o += a * b;
                    }
                }
            });
        }
        Self::from_vec(out, &[k, m])
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn t(data: &[f32], shape: &[usize]) -> Tensor {
        Tensor::from_vec(data.to_vec(), shape).unwrap()
    }

    #[test]
    fn test_from_vec_shape_check() {
        assert!(Tensor::from_vec(vec![1.0, 2.0, 3.0], &[2, 2]).is_err());
        let x = t(&[1.0, 2.0, 3.0, 4.0], &[2, 2]);
        assert_eq!(x.shape(), &[2, 2]);
        assert_eq!(x.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_matmul() {
        let a = t(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let b = t(&[7.0, 8.0, 9.0, 10.0, 11.0, 12.0], &[3, 2]);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.to_vec(), vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_transposed_products_agree() {
        let a = t(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &[2, 3]);
        let w = t(&[1.0, 0.0, -1.0, 2.0, 1.0, 0.5], &[2, 3]);
        // a @ w^T
        let direct = a.matmul_t(&w).unwrap();
        assert_eq!(direct.to_vec(), vec![-2.0, 5.5, -2.0, 16.0]);

        // a^T @ a is symmetric
        let gram = a.t_matmul(&a).unwrap();
        assert_eq!(gram.shape(), &[3, 3]);
        assert_eq!(gram.row(0)[1], gram.row(1)[0]);
        assert_eq!(gram.row(0)[0], 17.0);
    }

    #[test]
    fn test_matmul_shape_mismatch() {
        let a = Tensor::zeros(&[2, 3]);
        let b = Tensor::zeros(&[2, 3]);
        assert!(a.matmul(&b).is_err());
        assert!(a.matmul_t(&Tensor::zeros(&[4, 2])).is_err());
    }

    #[test]
    fn test_reductions() {
        let x = t(&[1.0, 5.0, 2.0, 7.0, 0.0, 7.0], &[2, 3]);
        assert_eq!(x.sum_rows().unwrap(), vec![8.0, 5.0, 9.0]);
        assert_eq!(x.argmax_rows().unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_concat_rows() {
        let a = t(&[1.0, 2.0], &[1, 2]);
        let b = t(&[3.0, 4.0, 5.0, 6.0], &[2, 2]);
        let c = Tensor::concat_rows(&[&a, &b]).unwrap();
        assert_eq!(c.shape(), &[3, 2]);
        assert_eq!(c.row(2), &[5.0, 6.0]);
        assert!(Tensor::concat_rows(&[&a, &Tensor::zeros(&[1, 3])]).is_err());
    }

    #[test]
    fn test_add_row_vector() {
        let x = Tensor::zeros(&[2, 2]);
        let y = x.add_row_vector(&[1.0, -1.0]).unwrap();
        assert_eq!(y.to_vec(), vec![1.0, -1.0, 1.0, -1.0]);
    }
}
