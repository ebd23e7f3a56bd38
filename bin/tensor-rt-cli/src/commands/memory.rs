// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tensor-rt memory` command: follow the global ledger through the
//! lifecycle of the linear demo's tensors.

use super::{banner, sequential};
use crate::config::DemoConfig;
use memory_ledger::MemoryLedger;
use tensor_core::ops::linear_with;
use tensor_core::Tensor;

pub fn execute(config: &DemoConfig) -> anyhow::Result<()> {
    banner("Memory Ledger");

    let dtype = config.dtype;
    let ledger = MemoryLedger::global();

    let input = sequential(dtype, &[config.batch, config.in_features])?;
    let weight = sequential(dtype, &[config.out_features, config.in_features])?;
    let bias = sequential(dtype, &[config.out_features])?;

    println!("  Footprints ({dtype}):");
    footprint("input", &input);
    footprint("weight", &weight);
    footprint("bias", &bias);

    let output = linear_with(&input, &weight, Some(&bias))?;
    footprint("output", &output);
    println!();

    println!("  Ledger:");
    println!("   Allocated:     {} bytes", ledger.allocated_bytes());

    for tensor in [input, weight, bias, output] {
        tensor.release()?;
    }
    println!("   After release: {} bytes", ledger.allocated_bytes());
    println!();
    println!("  {}", ledger.stats().summary());

    Ok(())
}

fn footprint(name: &str, tensor: &Tensor) {
    println!(
        "   {name:<8} {:<10} {:>6} bytes",
        tensor.shape().to_string(),
        tensor.size_bytes()
    );
}
