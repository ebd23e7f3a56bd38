// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-rt
//!
//! Command-line demos for the tensor-core runtime.
//!
//! ## Usage
//! ```bash
//! # Run the linear kernel on index-filled tensors
//! tensor-rt linear --batch 3 --in-features 5 --out-features 2
//!
//! # Run batch normalization on a [batch, channels, height, width] input
//! tensor-rt batch-norm --channels 4 --epsilon 1e-3
//!
//! # Map a logical index to its storage offset after transposes
//! tensor-rt index --extents 2,3,4 --transpose 0,1 --transpose 1,2 --at 2,3,1
//!
//! # Follow the global memory ledger through a tensor lifecycle
//! tensor-rt memory
//! ```

mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::DemoConfig;
use tensor_core::DType;

#[derive(Parser)]
#[command(
    name = "tensor-rt",
    about = "Typed tensors with lazy transposition, linear and batch-norm kernels",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (command-line flags override it).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run `output = input · weightᵀ + bias` on index-filled tensors.
    Linear {
        /// Element type (i16, i32, i64, f32, f64).
        #[arg(short, long)]
        dtype: Option<DType>,

        /// Number of input rows.
        #[arg(short, long)]
        batch: Option<usize>,

        /// Input width.
        #[arg(long)]
        in_features: Option<usize>,

        /// Output width.
        #[arg(long)]
        out_features: Option<usize>,

        /// Skip the bias term.
        #[arg(long)]
        no_bias: bool,
    },

    /// Run channel-wise batch normalization.
    BatchNorm {
        /// Element type (f32 or f64).
        #[arg(short, long)]
        dtype: Option<DType>,

        /// Batch extent.
        #[arg(short, long)]
        batch: Option<usize>,

        /// Channel extent.
        #[arg(long)]
        channels: Option<usize>,

        /// Spatial height.
        #[arg(long)]
        height: Option<usize>,

        /// Spatial width.
        #[arg(long)]
        width: Option<usize>,

        /// Epsilon added to the variance (omit for the kernel default).
        #[arg(short, long)]
        epsilon: Option<f64>,
    },

    /// Map a logical index to its storage offset.
    Index {
        /// Comma-separated extents of the tensor, e.g. "2,3,4".
        #[arg(short, long, value_delimiter = ',', required = true)]
        extents: Vec<usize>,

        /// Axes to swap, "a,b". Repeat to compose transposes.
        #[arg(short, long)]
        transpose: Vec<String>,

        /// Comma-separated logical index to look up (defaults to all zeros).
        #[arg(short, long, value_delimiter = ',')]
        at: Vec<usize>,
    },

    /// Print tensor footprints and the global ledger through a lifecycle.
    Memory,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    let mut config = DemoConfig::load(cli.config.as_deref())?;
    tracing::debug!("loaded config:\n{}", config.to_toml()?);

    match cli.command {
        Commands::Linear {
            dtype,
            batch,
            in_features,
            out_features,
            no_bias,
        } => {
            override_with(&mut config.dtype, dtype);
            override_with(&mut config.batch, batch);
            override_with(&mut config.in_features, in_features);
            override_with(&mut config.out_features, out_features);
            config.bias &= !no_bias;
            commands::linear::execute(&config)
        }
        Commands::BatchNorm {
            dtype,
            batch,
            channels,
            height,
            width,
            epsilon,
        } => {
            override_with(&mut config.dtype, dtype);
            override_with(&mut config.batch, batch);
            override_with(&mut config.channels, channels);
            override_with(&mut config.height, height);
            override_with(&mut config.width, width);
            if epsilon.is_some() {
                config.epsilon = epsilon;
            }
            commands::batch_norm::execute(&config)
        }
        Commands::Index {
            extents,
            transpose,
            at,
        } => commands::index::execute(&config, extents, transpose, at),
        Commands::Memory => commands::memory::execute(&config),
    }
}

fn override_with<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
