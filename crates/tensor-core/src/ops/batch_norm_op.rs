// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Channel-wise batch normalization over `[batch, channel, height, width]`.

use super::release::{release_all, ReleaseMode};
use super::{require_dtype, require_rank};
use crate::{DType, Element, Tensor, TensorError};
use num_traits::Float;

/// Epsilon used when the parameters carry none (PyTorch's default).
pub const DEFAULT_EPSILON: f64 = 1e-5;

/// Running statistics and affine parameters of a batch-norm layer.
///
/// Every tensor is rank 1 with one entry per channel.
#[derive(Debug)]
pub struct BatchNormParams {
    mean: Tensor,
    variance: Tensor,
    epsilon: Option<Tensor>,
    scale: Tensor,
    shift: Tensor,
}

/// The tensors handed back by a shallow [`BatchNormParams::release`].
#[derive(Debug)]
pub struct BatchNormParts {
    pub mean: Tensor,
    pub variance: Tensor,
    pub epsilon: Option<Tensor>,
    pub scale: Tensor,
    pub shift: Tensor,
}

impl BatchNormParams {
    /// Bundles the parameters. `scale` is gamma and `shift` is beta.
    ///
    /// Returns [`TensorError::TypeMismatch`] if they differ in dtype.
    pub fn new(
        mean: Tensor,
        variance: Tensor,
        epsilon: Option<Tensor>,
        scale: Tensor,
        shift: Tensor,
    ) -> Result<Self, TensorError> {
        require_dtype(
            "batch_norm params",
            mean.dtype(),
            [&variance, &scale, &shift].into_iter().chain(epsilon.iter()),
        )?;
        Ok(Self {
            mean,
            variance,
            epsilon,
            scale,
            shift,
        })
    }

    pub fn mean(&self) -> &Tensor {
        &self.mean
    }

    pub fn variance(&self) -> &Tensor {
        &self.variance
    }

    pub fn epsilon(&self) -> Option<&Tensor> {
        self.epsilon.as_ref()
    }

    pub fn scale(&self) -> &Tensor {
        &self.scale
    }

    pub fn shift(&self) -> &Tensor {
        &self.shift
    }

    fn named(&self) -> impl Iterator<Item = (&'static str, &Tensor)> + '_ {
        [
            ("mean", &self.mean),
            ("variance", &self.variance),
            ("scale", &self.scale),
            ("shift", &self.shift),
        ]
        .into_iter()
        .chain(self.epsilon.iter().map(|e| ("epsilon", e)))
    }

    /// Releases the bundle.
    ///
    /// With [`ReleaseMode::Shallow`] the tensors come back as
    /// `Some(parts)` and are not touched. With [`ReleaseMode::Deep`] they
    /// are released through the ledger and `None` is returned.
    pub fn release(self, mode: ReleaseMode) -> Result<Option<BatchNormParts>, TensorError> {
        let Self {
            mean,
            variance,
            epsilon,
            scale,
            shift,
        } = self;
        match mode {
            ReleaseMode::Shallow => Ok(Some(BatchNormParts {
                mean,
                variance,
                epsilon,
                scale,
                shift,
            })),
            ReleaseMode::Deep => {
                release_all([mean, variance, scale, shift].into_iter().chain(epsilon))?;
                Ok(None)
            }
        }
    }
}

/// Applies batch normalization with frozen statistics:
///
/// `output = (input - mean) / sqrt(variance + epsilon) * scale + shift`
///
/// The per-channel factors are folded once into
/// `coefficient = scale / sqrt(variance + epsilon)` and
/// `offset = shift - mean * coefficient`, so each element costs one
/// multiply-add.
///
/// # Arguments
/// * `input`: `[batch, channels, height, width]`.
/// * `params`: rank-1 tensors of length `channels`. A missing epsilon
///   means [`DEFAULT_EPSILON`] for every channel.
///
/// # Errors
/// Returns [`TensorError::ShapeMismatch`] for a wrong rank or channel
/// count, [`TensorError::TypeMismatch`] if the operands differ in dtype,
/// and [`TensorError::UnsupportedDType`] for integer dtypes. Nothing is
/// allocated when a validation error is returned, and the kernel's scratch
/// tensors never outlive the call.
pub fn batch_norm_2d(input: &Tensor, params: &BatchNormParams) -> Result<Tensor, TensorError> {
    const OP: &str = "batch_norm_2d";

    require_rank(OP, "input must be rank 4", input, 4)?;
    let channels = input.extents()[1];
    for (name, param) in params.named() {
        require_rank(OP, "parameters must be rank 1", param, 1)?;
        if param.shape().dim(0) != Some(channels) {
            tracing::debug!("batch_norm_2d: {name} has {} entries", param.num_elements());
            return Err(TensorError::ShapeMismatch {
                op: OP,
                constraint: "parameter length must equal input extent 1",
                lhs: param.extents().to_vec(),
                rhs: input.extents().to_vec(),
            });
        }
    }

    let dtype = input.dtype();
    require_dtype(OP, dtype, params.named().map(|(_, param)| param))?;

    tracing::debug!("batch_norm_2d: input {} ({dtype})", input.shape());

    let output = match dtype {
        DType::F32 => batch_norm_typed::<f32>(input, params)?,
        DType::F64 => batch_norm_typed::<f64>(input, params)?,
        other => {
            return Err(TensorError::UnsupportedDType {
                op: OP,
                dtype: other,
            })
        }
    };

    tracing::debug!("batch_norm_2d: output {}", output.shape());
    Ok(output)
}

fn batch_norm_typed<T: Element + Float>(
    input: &Tensor,
    params: &BatchNormParams,
) -> Result<Tensor, TensorError> {
    let extents = input.extents();
    let (batch, channels, height, width) = (extents[0], extents[1], extents[2], extents[3]);

    let mut default_epsilon = None;
    let epsilon: &Tensor = match params.epsilon() {
        Some(epsilon) => epsilon,
        None => {
            tracing::warn!("batch_norm_2d: no epsilon given, using {DEFAULT_EPSILON}");
            let value: T = num_traits::cast(DEFAULT_EPSILON).ok_or(TensorError::UnsupportedDType {
                op: "batch_norm_2d",
                dtype: T::DTYPE,
            })?;
            &*default_epsilon.insert(Tensor::from_fn(&[channels], |_| value)?)
        }
    };

    let mut coefficient = Tensor::new(T::DTYPE, &[channels])?;
    let mut offset = Tensor::new(T::DTYPE, &[channels])?;
    for c in 0..channels {
        let variance: T = params.variance().get(&[c])?;
        let eps: T = epsilon.get(&[c])?;
        let scale: T = params.scale().get(&[c])?;
        let mean: T = params.mean().get(&[c])?;
        let shift: T = params.shift().get(&[c])?;

        let coeff = scale / (variance + eps).sqrt();
        coefficient.set(&[c], coeff)?;
        offset.set(&[c], shift - mean * coeff)?;
    }

    let mut output = Tensor::new(T::DTYPE, extents)?;
    {
        let output_shape = output.shape().clone();
        let src = input.as_slice::<T>()?;
        let coeff = coefficient.as_slice::<T>()?;
        let bias = offset.as_slice::<T>()?;
        let dst = output.as_slice_mut::<T>()?;

        for c in 0..channels {
            for b in 0..batch {
                for h in 0..height {
                    for w in 0..width {
                        let index = [b, c, h, w];
                        dst[output_shape.index_of(&index)?] =
                            src[input.index_of(&index)?] * coeff[c] + bias[c];
                    }
                }
            }
        }
    }

    release_all([coefficient, offset].into_iter().chain(default_epsilon))?;
    Ok(output)
}
