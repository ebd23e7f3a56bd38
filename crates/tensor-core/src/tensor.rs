// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type.

use crate::{Buffer, DType, Element, Shape, TensorError};
use memory_ledger::MemoryLedger;

/// An owned, n-dimensional tensor stored in one flat typed buffer.
///
/// # Memory Layout
/// Elements sit in the buffer in *storage* order: row-major over the
/// extents the tensor was created with. Shape transforms only edit the
/// [`Shape`]; every element access goes through [`Shape::index_of`].
///
/// # Accounting
/// Creating a tensor registers its footprint with
/// [`MemoryLedger::global()`]. [`Tensor::release`] takes it back out and
/// reports a ledger underflow as an error. Dropping a tensor without
/// calling `release` debits the ledger the same way; since `Drop` cannot
/// fail, an underflow on that path is logged at `error` level.
#[derive(Debug)]
pub struct Tensor {
    shape: Shape,
    buffer: Buffer,
    /// Bytes registered with the ledger and not yet debited.
    registered_bytes: usize,
}

impl Tensor {
    /// Allocates a zero-filled tensor.
    ///
    /// Fails with [`TensorError::InvalidShape`] if `rank` differs from
    /// `extents.len()` or any extent is zero.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{DType, Tensor};
    /// let t = Tensor::create(DType::F32, 2, &[2, 3]).unwrap();
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// t.release().unwrap();
    /// ```
    pub fn create(dtype: DType, rank: usize, extents: &[usize]) -> Result<Self, TensorError> {
        if rank != extents.len() {
            return Err(TensorError::InvalidShape {
                extents: extents.to_vec(),
                rank,
            });
        }
        let shape = Shape::new(extents.to_vec())?;
        let buffer = Buffer::zeros(dtype, shape.num_elements());
        Ok(Self::register(shape, buffer))
    }

    /// Allocates a zero-filled tensor whose rank is `extents.len()`.
    pub fn new(dtype: DType, extents: &[usize]) -> Result<Self, TensorError> {
        Self::create(dtype, extents.len(), extents)
    }

    /// Creates a tensor that takes ownership of `values` as its buffer.
    ///
    /// Returns [`TensorError::SizeMismatch`] if `values.len()` is not the
    /// product of `extents`.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Tensor;
    /// let t = Tensor::from_vec(&[3], vec![1.0f32, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_vec<T: Element>(extents: &[usize], values: Vec<T>) -> Result<Self, TensorError> {
        let shape = Shape::new(extents.to_vec())?;
        if values.len() != shape.num_elements() {
            return Err(TensorError::SizeMismatch {
                expected: shape.num_elements(),
                actual: values.len(),
            });
        }
        Ok(Self::register(shape, T::into_buffer(values)))
    }

    /// Creates a tensor whose element at flat storage offset `i` is `f(i)`.
    pub fn from_fn<T: Element>(
        extents: &[usize],
        f: impl FnMut(usize) -> T,
    ) -> Result<Self, TensorError> {
        let shape = Shape::new(extents.to_vec())?;
        let values = (0..shape.num_elements()).map(f).collect();
        Ok(Self::register(shape, T::into_buffer(values)))
    }

    fn register(shape: Shape, buffer: Buffer) -> Self {
        let registered_bytes = buffer.size_bytes();
        let total = MemoryLedger::global().register(registered_bytes);
        tracing::trace!(
            "tensor created: {} {shape}, {registered_bytes} bytes (ledger {total} bytes)",
            buffer.dtype()
        );
        Self {
            shape,
            buffer,
            registered_bytes,
        }
    }

    /// Releases the tensor and debits its footprint from the global ledger.
    ///
    /// # Errors
    /// Returns [`TensorError::LedgerUnderflow`] if the ledger holds fewer
    /// bytes than this tensor's footprint. The ledger is left as it was.
    pub fn release(mut self) -> Result<(), TensorError> {
        let bytes = std::mem::take(&mut self.registered_bytes);
        let total = MemoryLedger::global().release(bytes)?;
        tracing::trace!("tensor released: {bytes} bytes (ledger {total} bytes)");
        Ok(())
    }

    /// Replaces the buffer with one supplied by the caller.
    ///
    /// The buffer must hold the same dtype and element count, so the
    /// footprint and the ledger stay unchanged. The previous buffer is
    /// dropped.
    pub fn adopt_buffer(&mut self, buffer: Buffer) -> Result<(), TensorError> {
        if buffer.dtype() != self.dtype() {
            return Err(TensorError::TypeMismatch {
                op: "adopt_buffer",
                expected: self.dtype(),
                actual: buffer.dtype(),
            });
        }
        if buffer.len() != self.num_elements() {
            return Err(TensorError::SizeMismatch {
                expected: self.num_elements(),
                actual: buffer.len(),
            });
        }
        self.buffer = buffer;
        Ok(())
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.buffer.dtype()
    }

    /// Returns the number of axes.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the logical extents.
    pub fn extents(&self) -> &[usize] {
        self.shape.extents()
    }

    /// Returns the logical-to-storage axis map.
    pub fn axis_map(&self) -> &[usize] {
        self.shape.axis_map()
    }

    /// Returns the number of elements.
    pub fn num_elements(&self) -> usize {
        self.buffer.len()
    }

    /// Returns the memory footprint of this tensor's buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        self.buffer.size_bytes()
    }

    /// Returns the bytes held by all live tensors in the process.
    pub fn global_size_bytes() -> usize {
        MemoryLedger::global().allocated_bytes()
    }

    /// Returns the raw buffer.
    pub fn buffer(&self) -> &Buffer {
        &self.buffer
    }

    /// Maps a logical index tuple to a flat storage offset.
    pub fn index_of(&self, indices: &[usize]) -> Result<usize, TensorError> {
        self.shape.index_of(indices)
    }

    /// Borrows the buffer as `T`, in storage order.
    pub fn as_slice<T: Element>(&self) -> Result<&[T], TensorError> {
        T::slice(&self.buffer).ok_or(TensorError::TypeMismatch {
            op: "as_slice",
            expected: self.dtype(),
            actual: T::DTYPE,
        })
    }

    /// Mutably borrows the buffer as `T`, in storage order.
    pub fn as_slice_mut<T: Element>(&mut self) -> Result<&mut [T], TensorError> {
        let dtype = self.dtype();
        T::slice_mut(&mut self.buffer).ok_or(TensorError::TypeMismatch {
            op: "as_slice_mut",
            expected: dtype,
            actual: T::DTYPE,
        })
    }

    /// Reads the element at a logical index.
    pub fn get<T: Element>(&self, indices: &[usize]) -> Result<T, TensorError> {
        let offset = self.index_of(indices)?;
        Ok(self.as_slice::<T>()?[offset])
    }

    /// Writes the element at a logical index.
    pub fn set<T: Element>(&mut self, indices: &[usize], value: T) -> Result<(), TensorError> {
        let offset = self.index_of(indices)?;
        self.as_slice_mut::<T>()?[offset] = value;
        Ok(())
    }

    /// Sets every element to `value`.
    pub fn fill<T: Element>(&mut self, value: T) -> Result<(), TensorError> {
        self.as_slice_mut::<T>()?.fill(value);
        Ok(())
    }

    /// Copies `src` into the buffer, in storage order.
    pub fn copy_from_slice<T: Element>(&mut self, src: &[T]) -> Result<(), TensorError> {
        let dst = self.as_slice_mut::<T>()?;
        if dst.len() != src.len() {
            return Err(TensorError::SizeMismatch {
                expected: dst.len(),
                actual: src.len(),
            });
        }
        dst.copy_from_slice(src);
        Ok(())
    }

    /// Swaps two axes in place without moving data.
    pub fn transpose(&mut self, axis1: usize, axis2: usize) -> Result<&mut Self, TensorError> {
        self.shape.transpose(axis1, axis2)?;
        Ok(self)
    }

    /// Inserts a unit axis at `axis`.
    pub fn unsqueeze(&mut self, axis: usize) -> Result<&mut Self, TensorError> {
        self.shape.unsqueeze(axis)?;
        Ok(self)
    }

    /// Removes the unit axis at `axis`.
    pub fn squeeze(&mut self, axis: usize) -> Result<&mut Self, TensorError> {
        self.shape.squeeze(axis)?;
        Ok(self)
    }

    /// Replaces the extents, keeping the buffer in storage order.
    pub fn reshape(&mut self, new_extents: &[usize]) -> Result<&mut Self, TensorError> {
        self.shape.reshape(new_extents)?;
        Ok(self)
    }

    /// Copies the tensor into a new one whose storage order is the current
    /// logical order.
    pub fn to_contiguous(&self) -> Result<Tensor, TensorError> {
        match &self.buffer {
            Buffer::I16(v) => self.gather(v),
            Buffer::I32(v) => self.gather(v),
            Buffer::I64(v) => self.gather(v),
            Buffer::F32(v) => self.gather(v),
            Buffer::F64(v) => self.gather(v),
        }
    }

    fn gather<T: Element>(&self, src: &[T]) -> Result<Tensor, TensorError> {
        let extents = self.extents();
        let mut values = Vec::with_capacity(src.len());
        let mut index = vec![0; extents.len()];
        for _ in 0..src.len() {
            values.push(src[self.index_of(&index)?]);
            for axis in (0..extents.len()).rev() {
                index[axis] += 1;
                if index[axis] < extents[axis] {
                    break;
                }
                index[axis] = 0;
            }
        }
        Tensor::from_vec(extents, values)
    }
}

impl Drop for Tensor {
    fn drop(&mut self) {
        if self.registered_bytes == 0 {
            return;
        }
        if let Err(e) = MemoryLedger::global().release(self.registered_bytes) {
            tracing::error!("tensor dropped with inconsistent ledger: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create() {
        let t = Tensor::create(DType::F32, 2, &[2, 3]).unwrap();
        assert_eq!(t.size_bytes(), 24);
        assert_eq!(t.extents(), &[2, 3]);
        assert_eq!(t.axis_map(), &[0, 1]);
        assert_eq!(t.dtype(), DType::F32);
        assert!(t.as_slice::<f32>().unwrap().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_create_invalid_shape() {
        assert!(matches!(
            Tensor::create(DType::I32, 3, &[2, 3]),
            Err(TensorError::InvalidShape { rank: 3, .. })
        ));
        assert!(matches!(
            Tensor::new(DType::I32, &[2, 0]),
            Err(TensorError::InvalidShape { .. })
        ));
    }

    #[test]
    fn test_scalar_tensor() {
        let mut t = Tensor::new(DType::F64, &[]).unwrap();
        assert_eq!(t.num_elements(), 1);
        t.set::<f64>(&[], 2.5).unwrap();
        assert_eq!(t.get::<f64>(&[]).unwrap(), 2.5);
    }

    #[test]
    fn test_footprints_per_dtype() {
        let sizes = [
            (DType::I16, 24),
            (DType::I32, 48),
            (DType::I64, 96),
            (DType::F32, 48),
            (DType::F64, 96),
        ];
        for (dtype, bytes) in sizes {
            let t = Tensor::new(dtype, &[2, 3, 2]).unwrap();
            assert_eq!(t.size_bytes(), bytes, "{dtype}");
        }
    }

    #[test]
    fn test_from_vec_size_mismatch() {
        let result = Tensor::from_vec(&[2, 3], vec![0i64; 5]);
        assert!(matches!(
            result,
            Err(TensorError::SizeMismatch {
                expected: 6,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_get_set_through_transpose() {
        let mut t = Tensor::from_fn(&[3, 5], |i| i as f32).unwrap();
        assert_eq!(t.get::<f32>(&[1, 3]).unwrap(), 8.0);
        t.transpose(0, 1).unwrap();
        assert_eq!(t.extents(), &[5, 3]);
        assert_eq!(t.get::<f32>(&[3, 1]).unwrap(), 8.0);

        t.set::<f32>(&[4, 2], -1.0).unwrap();
        assert_eq!(t.as_slice::<f32>().unwrap()[14], -1.0);
    }

    #[test]
    fn test_typed_access_mismatch() {
        let mut t = Tensor::new(DType::I16, &[4]).unwrap();
        assert!(matches!(
            t.get::<f32>(&[0]),
            Err(TensorError::TypeMismatch {
                expected: DType::I16,
                actual: DType::F32,
                ..
            })
        ));
        assert!(t.fill(1i32).is_err());
        t.fill(7i16).unwrap();
        assert_eq!(t.as_slice::<i16>().unwrap(), &[7, 7, 7, 7]);
    }

    #[test]
    fn test_copy_from_slice() {
        let mut t = Tensor::new(DType::I32, &[2, 2]).unwrap();
        t.copy_from_slice(&[1i32, 2, 3, 4]).unwrap();
        assert_eq!(t.get::<i32>(&[1, 0]).unwrap(), 3);
        assert!(matches!(
            t.copy_from_slice(&[1i32, 2, 3]),
            Err(TensorError::SizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_adopt_buffer() {
        let mut t = Tensor::new(DType::F32, &[3]).unwrap();
        t.adopt_buffer(vec![1.0f32, 2.0, 3.0].into()).unwrap();
        assert_eq!(t.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0]);

        assert!(matches!(
            t.adopt_buffer(vec![1.0f64, 2.0, 3.0].into()),
            Err(TensorError::TypeMismatch { .. })
        ));
        assert!(matches!(
            t.adopt_buffer(vec![1.0f32].into()),
            Err(TensorError::SizeMismatch { .. })
        ));
        assert_eq!(t.as_slice::<f32>().unwrap(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_shape_transforms_chain() {
        let mut t = Tensor::new(DType::F32, &[3, 5]).unwrap();
        t.unsqueeze(0).unwrap().transpose(1, 2).unwrap();
        assert_eq!(t.extents(), &[1, 5, 3]);
        t.squeeze(0).unwrap();
        assert_eq!(t.extents(), &[5, 3]);
        assert_eq!(t.axis_map(), &[1, 0]);
    }

    #[test]
    fn test_squeeze_failure_leaves_tensor() {
        let mut t = Tensor::new(DType::F32, &[2, 1, 3]).unwrap();
        assert!(matches!(
            t.squeeze(0),
            Err(TensorError::AxisNotUnit { axis: 0, extent: 2 })
        ));
        assert_eq!(t.extents(), &[2, 1, 3]);
        assert_eq!(t.axis_map(), &[0, 1, 2]);
    }

    #[test]
    fn test_to_contiguous() {
        let mut t = Tensor::from_fn(&[2, 3], |i| i as i64).unwrap();
        t.transpose(0, 1).unwrap();
        let c = t.to_contiguous().unwrap();
        assert_eq!(c.extents(), &[3, 2]);
        assert_eq!(c.axis_map(), &[0, 1]);
        assert_eq!(c.as_slice::<i64>().unwrap(), &[0, 3, 1, 4, 2, 5]);
    }

    #[test]
    fn test_reshape_keeps_storage_order() {
        let mut t = Tensor::from_fn(&[2, 3], |i| i as i32).unwrap();
        t.reshape(&[3, 2]).unwrap();
        assert_eq!(t.get::<i32>(&[2, 1]).unwrap(), 5);
        assert!(t.reshape(&[4, 2]).is_err());
    }

    #[test]
    fn test_release() {
        let t = Tensor::new(DType::I64, &[4, 4]).unwrap();
        t.release().unwrap();
    }
}
