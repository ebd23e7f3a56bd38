// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and the helpers they share.

pub mod batch_norm;
pub mod index;
pub mod linear;
pub mod memory;

use anyhow::anyhow;
use num_traits::NumCast;
use std::fmt::Display;
use tensor_core::{Buffer, DType, Element, Tensor};
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `-v` picks the level.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub(crate) fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║ {:^52} ║", format!("tensor-rt · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}

/// Creates a tensor whose element at storage offset `i` is `i`.
///
/// Fails if the largest offset cannot be represented in `dtype`.
pub(crate) fn sequential(dtype: DType, extents: &[usize]) -> anyhow::Result<Tensor> {
    filled(dtype, extents, |i| i)
}

/// Creates a tensor with every element set to `value` converted to `dtype`.
pub(crate) fn constant(dtype: DType, extents: &[usize], value: f64) -> anyhow::Result<Tensor> {
    filled(dtype, extents, |_| value)
}

/// Creates a tensor whose element at storage offset `i` is `f(i)`.
///
/// Every value goes through `num_traits::cast`, so a value the dtype
/// cannot hold is reported instead of truncated.
pub(crate) fn filled<N>(
    dtype: DType,
    extents: &[usize],
    f: impl Fn(usize) -> N,
) -> anyhow::Result<Tensor>
where
    N: NumCast + Copy + Display,
{
    match dtype {
        DType::I16 => filled_typed::<i16, N>(extents, f),
        DType::I32 => filled_typed::<i32, N>(extents, f),
        DType::I64 => filled_typed::<i64, N>(extents, f),
        DType::F32 => filled_typed::<f32, N>(extents, f),
        DType::F64 => filled_typed::<f64, N>(extents, f),
    }
}

fn filled_typed<T, N>(extents: &[usize], f: impl Fn(usize) -> N) -> anyhow::Result<Tensor>
where
    T: Element,
    N: NumCast + Copy + Display,
{
    let count: usize = extents.iter().product();
    let values = (0..count)
        .map(|i| {
            let value = f(i);
            num_traits::cast::<N, T>(value)
                .ok_or_else(|| anyhow!("value {value} does not fit in {}", T::DTYPE))
        })
        .collect::<anyhow::Result<Vec<T>>>()?;
    Ok(Tensor::from_vec(extents, values)?)
}

/// Formats the buffer in storage order, eliding the middle of long data.
pub(crate) fn preview(tensor: &Tensor, keep: usize) -> String {
    match tensor.buffer() {
        Buffer::I16(v) => elide(v, keep),
        Buffer::I32(v) => elide(v, keep),
        Buffer::I64(v) => elide(v, keep),
        Buffer::F32(v) => elide(v, keep),
        Buffer::F64(v) => elide(v, keep),
    }
}

/// Formats the element at a flat storage offset, or `-` past the end.
pub(crate) fn value_at(tensor: &Tensor, offset: usize) -> String {
    let value = match tensor.buffer() {
        Buffer::I16(v) => v.get(offset).map(ToString::to_string),
        Buffer::I32(v) => v.get(offset).map(ToString::to_string),
        Buffer::I64(v) => v.get(offset).map(ToString::to_string),
        Buffer::F32(v) => v.get(offset).map(ToString::to_string),
        Buffer::F64(v) => v.get(offset).map(ToString::to_string),
    };
    value.unwrap_or_else(|| "-".to_string())
}

fn elide<T: Display>(values: &[T], keep: usize) -> String {
    let join = |items: &[T]| {
        items
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    if keep == 0 || values.len() <= 2 * keep {
        return format!("[{}]", join(values));
    }
    format!(
        "[{}, ... ({} more) ..., {}]",
        join(&values[..keep]),
        values.len() - 2 * keep,
        join(&values[values.len() - keep..])
    )
}
