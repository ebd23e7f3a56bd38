// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor operations.

use crate::DType;

/// Errors that can occur during tensor operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TensorError {
    /// The requested extents cannot describe a tensor (a zero extent, or a
    /// rank that disagrees with the number of extents).
    #[error("invalid shape: extents {extents:?} with rank {rank}")]
    InvalidShape { extents: Vec<usize>, rank: usize },

    /// An axis argument is outside the tensor's rank.
    #[error("axis {axis} out of range for {op} on a rank-{rank} tensor")]
    AxisOutOfRange {
        op: &'static str,
        axis: usize,
        rank: usize,
    },

    /// Squeeze was asked to remove an axis whose extent is not 1.
    #[error("cannot squeeze axis {axis}: extent is {extent}, not 1")]
    AxisNotUnit { axis: usize, extent: usize },

    /// A logical index falls outside the tensor's extents.
    #[error("index {indices:?} out of range for extents {extents:?}")]
    IndexOutOfRange {
        indices: Vec<usize>,
        extents: Vec<usize>,
    },

    /// A reshape target does not hold the same number of elements.
    #[error("element count mismatch: tensor holds {expected} elements, new extents hold {actual}")]
    ElementCountMismatch { expected: usize, actual: usize },

    /// A buffer or slice length does not match the tensor's element count.
    #[error("size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Kernel operands have incompatible shapes.
    #[error("incompatible shapes for {op} ({constraint}): {lhs:?} vs {rhs:?}")]
    ShapeMismatch {
        op: &'static str,
        constraint: &'static str,
        lhs: Vec<usize>,
        rhs: Vec<usize>,
    },

    /// An operand or accessor type does not match the tensor's dtype.
    #[error("type mismatch in {op}: expected {expected}, got {actual}")]
    TypeMismatch {
        op: &'static str,
        expected: DType,
        actual: DType,
    },

    /// The requested data type is not supported for this operation.
    #[error("unsupported dtype {dtype} for operation {op}")]
    UnsupportedDType { op: &'static str, dtype: DType },

    /// The global ledger refused a release.
    #[error(transparent)]
    LedgerUnderflow(#[from] memory_ledger::LedgerError),
}
