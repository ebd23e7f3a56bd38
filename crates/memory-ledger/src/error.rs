// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for ledger bookkeeping.

/// Errors raised by [`crate::MemoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// A release asked for more bytes than the ledger currently holds.
    ///
    /// This means a buffer was released twice or the ledger was corrupted
    /// from outside. It is never a recoverable user error.
    #[error("ledger underflow: releasing {requested} bytes, but only {allocated} bytes are registered")]
    Underflow { requested: usize, allocated: usize },
}
