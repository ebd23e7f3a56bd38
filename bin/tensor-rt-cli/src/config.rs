// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Demo configuration loaded from TOML files or built from defaults.
//!
//! # TOML Format
//! ```toml
//! dtype = "F32"
//! batch = 3
//! in_features = 5
//! out_features = 2
//! bias = true
//! channels = 2
//! height = 2
//! width = 2
//! epsilon = 1e-3
//! preview_len = 10
//! ```
//!
//! Every key is optional; missing keys take their default.

use anyhow::Context;
use std::path::Path;
use tensor_core::DType;

/// Sizes and options shared by the demo commands.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Element type of every demo tensor.
    pub dtype: DType,
    /// Leading (batch) extent of the demo inputs.
    pub batch: usize,
    /// Linear input width.
    pub in_features: usize,
    /// Linear output width.
    pub out_features: usize,
    /// Whether the linear demo carries a bias.
    pub bias: bool,
    /// Batch-norm channel count.
    pub channels: usize,
    /// Batch-norm spatial height.
    pub height: usize,
    /// Batch-norm spatial width.
    pub width: usize,
    /// Batch-norm epsilon. `None` lets the kernel use its default.
    pub epsilon: Option<f64>,
    /// How many leading and trailing values to print for long tensors.
    pub preview_len: usize,
}

impl DemoConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read config '{}'", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("invalid config '{}'", path.display()))
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).context("TOML parse error")
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string_pretty(self).context("TOML serialise error")
    }

    /// Loads `path` if given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                tracing::debug!("loading config from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Self::default()),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            dtype: DType::F32,
            batch: 3,
            in_features: 5,
            out_features: 2,
            bias: true,
            channels: 2,
            height: 2,
            width: 2,
            epsilon: None,
            preview_len: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let c = DemoConfig::default();
        assert_eq!(c.dtype, DType::F32);
        assert_eq!((c.batch, c.in_features, c.out_features), (3, 5, 2));
        assert!(c.bias);
        assert_eq!(c.epsilon, None);
        assert_eq!(c.preview_len, 10);
    }

    #[test]
    fn test_from_toml() {
        let toml = r#"
dtype = "I64"
batch = 4
bias = false
epsilon = 0.001
"#;
        let c = DemoConfig::from_toml(toml).unwrap();
        assert_eq!(c.dtype, DType::I64);
        assert_eq!(c.batch, 4);
        assert!(!c.bias);
        assert_eq!(c.epsilon, Some(0.001));
        // Unset keys keep their defaults.
        assert_eq!(c.in_features, 5);
        assert_eq!(c.channels, 2);
    }

    #[test]
    fn test_unknown_dtype_rejected() {
        assert!(DemoConfig::from_toml("dtype = \"F16\"").is_err());
    }

    #[test]
    fn test_to_toml_roundtrip() {
        let c = DemoConfig {
            dtype: DType::F64,
            epsilon: Some(1e-3),
            ..Default::default()
        };
        let back = DemoConfig::from_toml(&c.to_toml().unwrap()).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_missing_file() {
        let err = DemoConfig::from_file(Path::new("/nonexistent/tensor-rt.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }

    #[test]
    fn test_load_without_path() {
        assert_eq!(DemoConfig::load(None).unwrap(), DemoConfig::default());
    }
}
