// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tensor-rt batch-norm` command.
//!
//! The input is index-filled. Channel `c` gets mean `c`, variance `c + 1`,
//! scale 1 and shift 0, so each channel's output is visibly rescaled.

use super::{banner, constant, filled, preview, sequential};
use crate::config::DemoConfig;
use anyhow::Context;
use tensor_core::ops::{batch_norm_2d, BatchNormParams, ReleaseMode};
use tensor_core::Tensor;

pub fn execute(config: &DemoConfig) -> anyhow::Result<()> {
    banner("Batch Norm");

    let dtype = config.dtype;
    let channels = config.channels;
    let extents = [config.batch, channels, config.height, config.width];

    println!("  Config:");
    println!("   Dtype:    {dtype}");
    println!("   Input:    {extents:?}");
    match config.epsilon {
        Some(eps) => println!("   Epsilon:  {eps}"),
        None => println!("   Epsilon:  kernel default"),
    }
    println!();

    let before = Tensor::global_size_bytes();

    let input = sequential(dtype, &extents)?;
    let mean = sequential(dtype, &[channels])?;
    let variance = filled(dtype, &[channels], |c| c as f64 + 1.0)?;
    let epsilon = config
        .epsilon
        .map(|eps| constant(dtype, &[channels], eps))
        .transpose()?;
    let scale = constant(dtype, &[channels], 1.0)?;
    let shift = constant(dtype, &[channels], 0.0)?;
    let params = BatchNormParams::new(mean, variance, epsilon, scale, shift)?;

    let output = batch_norm_2d(&input, &params).context("batch-norm kernel failed")?;

    println!("  Output:");
    println!("   Shape:    {}", output.shape());
    println!("   Data:     {}", preview(&output, config.preview_len));
    println!();
    println!("  Ledger:");
    println!(
        "   Live:     {} bytes (started at {before})",
        Tensor::global_size_bytes()
    );

    params.release(ReleaseMode::Deep)?;
    input.release()?;
    output.release()?;

    println!("   Released: {} bytes", Tensor::global_size_bytes());
    tracing::info!("batch-norm demo finished");
    Ok(())
}
