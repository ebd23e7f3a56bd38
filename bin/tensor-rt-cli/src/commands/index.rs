// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `tensor-rt index` command: show how a logical index reaches storage.

use super::{banner, sequential, value_at};
use crate::config::DemoConfig;
use anyhow::{bail, Context};

pub fn execute(
    config: &DemoConfig,
    extents: Vec<usize>,
    transposes: Vec<String>,
    at: Vec<usize>,
) -> anyhow::Result<()> {
    banner("Index Mapping");

    let swaps = transposes
        .iter()
        .map(|s| parse_axis_pair(s))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut tensor = sequential(config.dtype, &extents)?;
    println!("  Storage:   {} ({})", tensor.shape(), tensor.dtype());

    for (a, b) in swaps {
        tensor
            .transpose(a, b)
            .with_context(|| format!("cannot transpose axes {a},{b}"))?;
        println!("  Swap {a},{b}:  {}  axis map {:?}", tensor.shape(), tensor.axis_map());
    }

    let index = if at.is_empty() {
        vec![0; tensor.rank()]
    } else {
        at
    };
    let offset = tensor
        .index_of(&index)
        .with_context(|| format!("index {index:?} does not fit {}", tensor.shape()))?;

    println!();
    println!("  Index:     {index:?}");
    println!("  Offset:    {offset}");
    println!("  Value:     {}", value_at(&tensor, offset));

    tensor.release()?;
    Ok(())
}

/// Parses `"a,b"` into a pair of axes.
fn parse_axis_pair(s: &str) -> anyhow::Result<(usize, usize)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [a, b] = parts.as_slice() else {
        bail!("expected two comma-separated axes, got '{s}'");
    };
    let a = a.parse().with_context(|| format!("invalid axis '{a}'"))?;
    let b = b.parse().with_context(|| format!("invalid axis '{b}'"))?;
    Ok((a, b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_axis_pair() {
        assert_eq!(parse_axis_pair("0,1").unwrap(), (0, 1));
        assert_eq!(parse_axis_pair(" 2 , 0 ").unwrap(), (2, 0));
        assert!(parse_axis_pair("1").is_err());
        assert!(parse_axis_pair("1,2,3").is_err());
        assert!(parse_axis_pair("a,1").is_err());
    }
}
