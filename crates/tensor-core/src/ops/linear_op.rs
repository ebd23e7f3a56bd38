// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Affine (fully connected) transform.

use super::release::{release_all, ReleaseMode};
use super::{require_dtype, require_rank};
use crate::{DType, Element, Shape, Tensor, TensorError};

/// The fixed parameters of a linear layer: `weight` of shape
/// `[out_features, in_features]` and an optional `bias` of shape
/// `[out_features]`.
#[derive(Debug)]
pub struct LinearParams {
    weight: Tensor,
    bias: Option<Tensor>,
}

/// The tensors handed back by a shallow [`LinearParams::release`].
#[derive(Debug)]
pub struct LinearParts {
    pub weight: Tensor,
    pub bias: Option<Tensor>,
}

impl LinearParams {
    /// Bundles a weight and an optional bias.
    ///
    /// Returns [`TensorError::TypeMismatch`] if they differ in dtype. Shapes
    /// are checked against the input when the kernel runs.
    pub fn new(weight: Tensor, bias: Option<Tensor>) -> Result<Self, TensorError> {
        require_dtype("linear params", weight.dtype(), bias.iter())?;
        Ok(Self { weight, bias })
    }

    pub fn weight(&self) -> &Tensor {
        &self.weight
    }

    pub fn bias(&self) -> Option<&Tensor> {
        self.bias.as_ref()
    }

    /// Releases the bundle.
    ///
    /// With [`ReleaseMode::Shallow`] the tensors come back as
    /// `Some(parts)` and are not touched. With [`ReleaseMode::Deep`] they
    /// are released through the ledger and `None` is returned.
    pub fn release(self, mode: ReleaseMode) -> Result<Option<LinearParts>, TensorError> {
        let Self { weight, bias } = self;
        match mode {
            ReleaseMode::Shallow => Ok(Some(LinearParts { weight, bias })),
            ReleaseMode::Deep => {
                release_all(std::iter::once(weight).chain(bias))?;
                Ok(None)
            }
        }
    }
}

/// Applies `output = input · weightᵀ + bias` with the bundled parameters.
///
/// See [`linear_with`].
pub fn linear(input: &Tensor, params: &LinearParams) -> Result<Tensor, TensorError> {
    linear_with(input, params.weight(), params.bias())
}

/// Applies `output[i, j] = Σ_k input[i, k] · weight[j, k] + bias[j]`.
///
/// # Arguments
/// * `input`: `[batch, in_features]`, or `[in_features]`, which is read
///   as a batch of one. The caller's tensor is not modified.
/// * `weight`: `[out_features, in_features]`; row `j` holds the
///   coefficients of output `j`.
/// * `bias`: optional `[out_features]`.
///
/// Returns a new `[batch, out_features]` tensor. Arithmetic stays in the
/// operands' own type: `i64` accumulates in `i64` with two's-complement
/// wrapping on overflow, `f32` accumulates in `f32`.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] naming the violated constraint,
/// [`TensorError::TypeMismatch`] if the operands differ in dtype, and
/// [`TensorError::UnsupportedDType`] for anything but `I64` and `F32`.
/// Nothing is allocated when an error is returned.
pub fn linear_with(
    input: &Tensor,
    weight: &Tensor,
    bias: Option<&Tensor>,
) -> Result<Tensor, TensorError> {
    const OP: &str = "linear";

    // A rank-1 input gains a leading batch axis on a private copy of its
    // shape; the buffer is shared, not duplicated.
    let mut input_shape = input.shape().clone();
    if input_shape.rank() == 1 {
        input_shape.unsqueeze(0)?;
    }

    if input_shape.rank() != 2 {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            constraint: "input must be rank 1 or 2",
            lhs: input.extents().to_vec(),
            rhs: vec![2],
        });
    }
    require_rank(OP, "weight must be rank 2", weight, 2)?;
    if let Some(bias) = bias {
        require_rank(OP, "bias must be rank 1", bias, 1)?;
    }
    if input_shape.dim(1) != weight.shape().dim(1) {
        return Err(TensorError::ShapeMismatch {
            op: OP,
            constraint: "input extent 1 must equal weight extent 1",
            lhs: input_shape.extents().to_vec(),
            rhs: weight.extents().to_vec(),
        });
    }
    if let Some(bias) = bias {
        if weight.shape().dim(0) != bias.shape().dim(0) {
            return Err(TensorError::ShapeMismatch {
                op: OP,
                constraint: "weight extent 0 must equal bias extent 0",
                lhs: weight.extents().to_vec(),
                rhs: bias.extents().to_vec(),
            });
        }
    }

    let dtype = input.dtype();
    require_dtype(OP, dtype, std::iter::once(weight).chain(bias))?;

    tracing::debug!(
        "linear: input {input_shape} x weight {} ({dtype})",
        weight.shape()
    );

    let output = match dtype {
        DType::I64 => linear_typed::<i64>(input, &input_shape, weight, bias)?,
        DType::F32 => linear_typed::<f32>(input, &input_shape, weight, bias)?,
        other => {
            return Err(TensorError::UnsupportedDType {
                op: OP,
                dtype: other,
            })
        }
    };

    tracing::debug!("linear: output {}", output.shape());
    Ok(output)
}

/// Multiply-accumulate in the element's own arithmetic.
trait Accumulate: Element {
    fn mul_acc(self, a: Self, b: Self) -> Self;
    fn add_acc(self, b: Self) -> Self;
}

impl Accumulate for i64 {
    fn mul_acc(self, a: Self, b: Self) -> Self {
        self.wrapping_add(a.wrapping_mul(b))
    }

    fn add_acc(self, b: Self) -> Self {
        self.wrapping_add(b)
    }
}

impl Accumulate for f32 {
    fn mul_acc(self, a: Self, b: Self) -> Self {
        self + a * b
    }

    fn add_acc(self, b: Self) -> Self {
        self + b
    }
}

fn linear_typed<T: Accumulate>(
    input: &Tensor,
    input_shape: &Shape,
    weight: &Tensor,
    bias: Option<&Tensor>,
) -> Result<Tensor, TensorError> {
    let batch = input_shape.extents()[0];
    let in_features = input_shape.extents()[1];
    let out_features = weight.extents()[0];

    let x = input.as_slice::<T>()?;
    let w = weight.as_slice::<T>()?;

    let mut output = Tensor::new(T::DTYPE, &[batch, out_features])?;
    let output_shape = output.shape().clone();
    let y = output.as_slice_mut::<T>()?;

    for i in 0..batch {
        for j in 0..out_features {
            let mut sum = T::zero();
            for k in 0..in_features {
                sum = sum.mul_acc(
                    x[input_shape.index_of(&[i, k])?],
                    w[weight.index_of(&[j, k])?],
                );
            }
            if let Some(bias) = bias {
                sum = sum.add_acc(bias.get::<T>(&[j])?);
            }
            y[output_shape.index_of(&[i, j])?] = sum;
        }
    }

    Ok(output)
}
