// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Release policy for kernel parameter bundles.

use crate::{Tensor, TensorError};

/// How a parameter bundle treats the tensors it holds when it is released.
///
/// There is no `Default`; every release site names its mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseMode {
    /// Release only the bundle. The tensors are handed back to the caller
    /// untouched and stay live.
    Shallow,
    /// Release the bundle and every tensor in it through the ledger.
    Deep,
}

/// Releases every tensor, returning the first error after attempting all.
pub(crate) fn release_all(tensors: impl IntoIterator<Item = Tensor>) -> Result<(), TensorError> {
    let mut first_error = None;
    for tensor in tensors {
        if let Err(e) = tensor.release() {
            first_error.get_or_insert(e);
        }
    }
    first_error.map_or(Ok(()), Err)
}
