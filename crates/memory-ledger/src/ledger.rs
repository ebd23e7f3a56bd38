// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The byte ledger itself.
//!
//! The runtime is single-threaded, but the counter is still an
//! `AtomicUsize` and the statistics sit behind a `Mutex`: the global ledger
//! is a `static`, and test harnesses create tensors from many threads.
//!
//! A release that would take the total below zero is refused with a
//! compare-and-swap, so an underflow never corrupts the running total.

use crate::{LedgerError, LedgerStats};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// The ledger every tensor in the process reports to.
static GLOBAL_LEDGER: MemoryLedger = MemoryLedger::new();

/// A running total of bytes held by live tensor buffers.
///
/// # Example
/// ```
/// use memory_ledger::MemoryLedger;
///
/// let ledger = MemoryLedger::new();
/// assert_eq!(ledger.register(24), 24);
/// assert_eq!(ledger.release(24).unwrap(), 0);
/// assert_eq!(ledger.stats().releases, 1);
/// ```
pub struct MemoryLedger {
    /// Currently registered bytes.
    allocated_bytes: AtomicUsize,
    /// Statistics (behind a Mutex since updates are infrequent).
    stats: Mutex<LedgerStats>,
}

impl MemoryLedger {
    /// Creates an empty ledger.
    pub const fn new() -> Self {
        Self {
            allocated_bytes: AtomicUsize::new(0),
            stats: Mutex::new(LedgerStats::new()),
        }
    }

    /// Returns the process-wide ledger. It starts at zero when the process
    /// starts.
    pub fn global() -> &'static MemoryLedger {
        &GLOBAL_LEDGER
    }

    /// Adds `size_bytes` to the total and returns the new total.
    pub fn register(&self, size_bytes: usize) -> usize {
        let total = self
            .allocated_bytes
            .fetch_add(size_bytes, Ordering::AcqRel)
            + size_bytes;

        if let Ok(mut stats) = self.stats.lock() {
            stats.record_registration(size_bytes, total);
        }

        total
    }

    /// Subtracts `size_bytes` from the total and returns the new total.
    ///
    /// Returns [`LedgerError::Underflow`] without modifying the total if
    /// fewer than `size_bytes` are registered.
    pub fn release(&self, size_bytes: usize) -> Result<usize, LedgerError> {
        let result = self.allocated_bytes.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |current| current.checked_sub(size_bytes),
        );

        match result {
            Ok(previous) => {
                if let Ok(mut stats) = self.stats.lock() {
                    stats.record_release();
                }
                Ok(previous - size_bytes)
            }
            Err(allocated) => {
                if let Ok(mut stats) = self.stats.lock() {
                    stats.record_underflow();
                }
                tracing::error!(
                    "ledger underflow: release of {size_bytes} bytes refused, {allocated} bytes registered"
                );
                Err(LedgerError::Underflow {
                    requested: size_bytes,
                    allocated,
                })
            }
        }
    }

    /// Returns the number of bytes currently registered.
    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes.load(Ordering::Acquire)
    }

    /// Returns a snapshot of the ledger statistics.
    pub fn stats(&self) -> LedgerStats {
        self.stats
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLedger")
            .field("allocated_bytes", &self.allocated_bytes())
            .finish()
    }
}
