// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tensor-rt linear` command: run the linear kernel on index-filled
//! tensors and print the result.

use super::{banner, preview, sequential};
use crate::config::DemoConfig;
use anyhow::Context;
use tensor_core::ops::{linear, LinearParams, ReleaseMode};
use tensor_core::Tensor;

pub fn execute(config: &DemoConfig) -> anyhow::Result<()> {
    banner("Linear");

    let dtype = config.dtype;
    let input_extents = [config.batch, config.in_features];
    let weight_extents = [config.out_features, config.in_features];

    println!("  Config:");
    println!("   Dtype:    {dtype}");
    println!("   Input:    {input_extents:?}");
    println!("   Weight:   {weight_extents:?}");
    println!("   Bias:     {}", if config.bias { "yes" } else { "no" });
    println!();

    let before = Tensor::global_size_bytes();

    let input = sequential(dtype, &input_extents)?;
    let weight = sequential(dtype, &weight_extents)?;
    let bias = if config.bias {
        Some(sequential(dtype, &[config.out_features])?)
    } else {
        None
    };
    let params = LinearParams::new(weight, bias)?;

    let output = linear(&input, &params).context("linear kernel failed")?;

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
    tracing::info!("linear demo finished");
    Ok(())
}
