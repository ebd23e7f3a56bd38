// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Tensor kernels.
//!
//! Each kernel validates every operand before it allocates anything, then
//! allocates a fresh output tensor through the engine and fills it using
//! [`crate::Shape::index_of`] for every element, so transposed operands
//! are read correctly without being copied. Inputs are never modified.

mod batch_norm_op;
mod linear_op;
mod release;

pub use batch_norm_op::{batch_norm_2d, BatchNormParams, BatchNormParts, DEFAULT_EPSILON};
pub use linear_op::{linear, linear_with, LinearParams, LinearParts};
pub use release::ReleaseMode;

use crate::{DType, Tensor, TensorError};

/// Fails with `ShapeMismatch` unless `tensor` has the given rank.
fn require_rank(
    op: &'static str,
    constraint: &'static str,
    tensor: &Tensor,
    rank: usize,
) -> Result<(), TensorError> {
    if tensor.rank() != rank {
        return Err(TensorError::ShapeMismatch {
            op,
            constraint,
            lhs: tensor.extents().to_vec(),
            rhs: vec![rank],
        });
    }
    Ok(())
}

/// Fails with `TypeMismatch` at the first operand whose dtype differs from
/// `expected`.
fn require_dtype<'a>(
    op: &'static str,
    expected: DType,
    operands: impl IntoIterator<Item = &'a Tensor>,
) -> Result<(), TensorError> {
    for operand in operands {
        if operand.dtype() != expected {
            return Err(TensorError::TypeMismatch {
                op,
                expected,
                actual: operand.dtype(),
            });
        }
    }
    Ok(())
}
