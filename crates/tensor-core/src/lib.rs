// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Typed n-dimensional tensors over flat buffers, for small inference
//! kernels.
//!
//! This crate provides:
//! - [`Tensor`]: an owned tensor whose footprint is tracked by the global
//!   [`memory_ledger::MemoryLedger`].
//! - [`Shape`]: logical extents plus an axis map, so transpose and
//!   unsqueeze never move data.
//! - [`DType`], [`Element`] and [`Buffer`]: the five supported element
//!   types (`i16`, `i32`, `i64`, `f32`, `f64`) and their typed storage.
//! - Kernels: [`ops::linear`] and [`ops::batch_norm_2d`].
//!
//! # Example
//! ```
//! use tensor_core::ops::{linear, LinearParams, ReleaseMode};
//! use tensor_core::Tensor;
//!
//! let input = Tensor::from_vec(&[1, 2], vec![1.0f32, 2.0]).unwrap();
//! let weight = Tensor::from_vec(&[1, 2], vec![3.0f32, 4.0]).unwrap();
//! let params = LinearParams::new(weight, None).unwrap();
//!
//! let output = linear(&input, &params).unwrap();
//! assert_eq!(output.as_slice::<f32>().unwrap(), &[11.0]);
//!
//! params.release(ReleaseMode::Deep).unwrap();
//! output.release().unwrap();
//! ```

mod buffer;
mod dtype;
mod element;
mod error;
pub mod ops;
mod shape;
mod tensor;

pub use buffer::Buffer;
pub use dtype::DType;
pub use element::Element;
pub use error::TensorError;
pub use ops::{
    batch_norm_2d, linear, linear_with, BatchNormParams, LinearParams, ReleaseMode,
};
pub use shape::Shape;
pub use tensor::Tensor;
