// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor shape descriptors and the lazy-transpose index mapping.
//!
//! A [`Shape`] carries two sequences of equal length:
//!
//! - `extents`: the *logical* size of each axis as callers currently see
//!   it, after any transposes.
//! - `axis_map`: for each logical position, the *storage* axis it came
//!   from. It starts as the identity, is permuted by [`Shape::transpose`]
//!   and grows or shrinks with [`Shape::unsqueeze`] and [`Shape::squeeze`].
//!
//! Transposing swaps entries of both sequences and never moves data.
//! [`Shape::index_of`] undoes the permutation on every call: it sorts the
//! logical index tuple back into storage order and then applies ordinary
//! row-major strides of the storage layout. No stride table is cached, so
//! the mapping costs O(rank²) per lookup, which is negligible for the small
//! ranks (≤ 6) tensors use here.

use crate::TensorError;
use std::fmt;

/// Logical extents plus their correspondence to storage axes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    extents: Vec<usize>,
    axis_map: Vec<usize>,
}

impl Shape {
    /// Creates a shape with an identity axis map.
    ///
    /// Fails with [`TensorError::InvalidShape`] if any extent is zero.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let s = Shape::new(vec![2, 3, 4]).unwrap();
    /// assert_eq!(s.rank(), 3);
    /// assert_eq!(s.num_elements(), 24);
    /// assert_eq!(s.axis_map(), &[0, 1, 2]);
    /// ```
    pub fn new(extents: Vec<usize>) -> Result<Self, TensorError> {
        if extents.contains(&0) {
            return Err(TensorError::InvalidShape {
                rank: extents.len(),
                extents,
            });
        }
        let axis_map = (0..extents.len()).collect();
        Ok(Self { extents, axis_map })
    }

    /// Returns the number of axes.
    pub fn rank(&self) -> usize {
        self.extents.len()
    }

    /// Returns the logical extents.
    pub fn extents(&self) -> &[usize] {
        &self.extents
    }

    /// Returns the storage axis behind each logical position.
    pub fn axis_map(&self) -> &[usize] {
        &self.axis_map
    }

    /// Returns the extent of one logical axis, or `None` if out of bounds.
    pub fn dim(&self, axis: usize) -> Option<usize> {
        self.extents.get(axis).copied()
    }

    /// Returns the total number of elements (1 for a scalar).
    pub fn num_elements(&self) -> usize {
        self.extents.iter().product()
    }

    /// Returns `true` if logical order equals storage order.
    pub fn is_identity(&self) -> bool {
        self.axis_map.iter().enumerate().all(|(i, &a)| i == a)
    }

    /// Maps a logical index tuple to a flat offset into the storage buffer.
    ///
    /// # Errors
    /// Returns [`TensorError::IndexOutOfRange`] if `indices` has the wrong
    /// length or any entry is not below its extent.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::Shape;
    /// let mut s = Shape::new(vec![3, 5]).unwrap();
    /// assert_eq!(s.index_of(&[1, 3]).unwrap(), 8);
    ///
    /// // After a transpose the same element is reached at swapped coordinates.
    /// s.transpose(0, 1).unwrap();
    /// assert_eq!(s.extents(), &[5, 3]);
    /// assert_eq!(s.index_of(&[3, 1]).unwrap(), 8);
    /// ```
    pub fn index_of(&self, indices: &[usize]) -> Result<usize, TensorError> {
        let rank = self.rank();
        if indices.len() != rank
            || indices
                .iter()
                .zip(&self.extents)
                .any(|(&index, &extent)| index >= extent)
        {
            return Err(TensorError::IndexOutOfRange {
                indices: indices.to_vec(),
                extents: self.extents.clone(),
            });
        }

        // Exchange-sort the index tuple by storage axis. The keys move
        // with their slots, so after the pass slot `p` holds the index and
        // the extent of storage axis `p` for any permutation, not only for
        // single transpositions.
        let mut keys = self.axis_map.clone();
        let mut reordered = indices.to_vec();
        let mut storage_extents = self.extents.clone();
        for i in 0..rank {
            for j in i + 1..rank {
                if keys[i] > keys[j] {
                    keys.swap(i, j);
                    reordered.swap(i, j);
                    storage_extents.swap(i, j);
                }
            }
        }

        let mut offset = 0;
        let mut multiplier = 1;
        for p in (0..rank).rev() {
            offset += reordered[p] * multiplier;
            multiplier *= storage_extents[p];
        }
        Ok(offset)
    }

    /// Swaps two logical axes. No data moves.
    pub fn transpose(&mut self, axis1: usize, axis2: usize) -> Result<(), TensorError> {
        let rank = self.rank();
        for axis in [axis1, axis2] {
            if axis >= rank {
                return Err(TensorError::AxisOutOfRange {
                    op: "transpose",
                    axis,
                    rank,
                });
            }
        }
        self.extents.swap(axis1, axis2);
        self.axis_map.swap(axis1, axis2);
        Ok(())
    }

    /// Inserts a unit axis at logical position `axis` (`axis <= rank`).
    ///
    /// The new axis becomes storage axis `axis`; storage axes at or above
    /// it are renumbered up by one. A unit axis only ever contributes index
    /// 0, so existing offsets are unchanged.
    pub fn unsqueeze(&mut self, axis: usize) -> Result<(), TensorError> {
        let rank = self.rank();
        if axis > rank {
            return Err(TensorError::AxisOutOfRange {
                op: "unsqueeze",
                axis,
                rank,
            });
        }
        for storage in self.axis_map.iter_mut() {
            if *storage >= axis {
                *storage += 1;
            }
        }
        self.extents.insert(axis, 1);
        self.axis_map.insert(axis, axis);
        Ok(())
    }

    /// Removes the unit axis at logical position `axis`.
    ///
    /// Leaves the shape untouched on error.
    pub fn squeeze(&mut self, axis: usize) -> Result<(), TensorError> {
        let rank = self.rank();
        if axis >= rank {
            return Err(TensorError::AxisOutOfRange {
                op: "squeeze",
                axis,
                rank,
            });
        }
        let extent = self.extents[axis];
        if extent != 1 {
            return Err(TensorError::AxisNotUnit { axis, extent });
        }
        self.extents.remove(axis);
        let removed = self.axis_map.remove(axis);
        for storage in self.axis_map.iter_mut() {
            if *storage > removed {
                *storage -= 1;
            }
        }
        Ok(())
    }

    /// Replaces the extents wholesale and resets the axis map to identity.
    ///
    /// The buffer is reinterpreted in storage order, so reshaping a
    /// transposed shape does not follow the transposed view; materialise
    /// it first with [`crate::Tensor::to_contiguous`] if that is wanted.
    pub fn reshape(&mut self, new_extents: &[usize]) -> Result<(), TensorError> {
        let expected = self.num_elements();
        let actual: usize = new_extents.iter().product();
        if actual != expected {
            return Err(TensorError::ElementCountMismatch { expected, actual });
        }
        self.extents = new_extents.to_vec();
        self.axis_map = (0..new_extents.len()).collect();
        Ok(())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, d) in self.extents.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, ")")
    }
}
