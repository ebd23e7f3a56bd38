// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Ledger statistics for diagnostics.
//!
//! [`LedgerStats`] tracks cumulative metrics about tensor buffer traffic:
//! how many buffers were registered and released, the high-water mark, and
//! how many releases were refused because they would have underflowed.

/// Cumulative statistics about ledger usage.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct LedgerStats {
    /// Number of buffers registered.
    pub registrations: u64,
    /// Number of buffers released successfully.
    pub releases: u64,
    /// Number of releases refused because the total was too small.
    pub underflows: u64,
    /// Peak registered bytes.
    pub peak_allocated_bytes: usize,
    /// Total bytes ever registered (including released ones).
    pub cumulative_registered_bytes: u64,
}

impl LedgerStats {
    /// Creates empty statistics. Usable in `const` context.
    pub const fn new() -> Self {
        Self {
            registrations: 0,
            releases: 0,
            underflows: 0,
            peak_allocated_bytes: 0,
            cumulative_registered_bytes: 0,
        }
    }

    /// Returns the number of registrations not yet matched by a release.
    pub fn live_buffers(&self) -> u64 {
        self.registrations.saturating_sub(self.releases)
    }

    pub(crate) fn record_registration(&mut self, size: usize, current_bytes: usize) {
        self.registrations += 1;
        self.cumulative_registered_bytes += size as u64;
        if current_bytes > self.peak_allocated_bytes {
            self.peak_allocated_bytes = current_bytes;
        }
    }

    pub(crate) fn record_release(&mut self) {
        self.releases += 1;
    }

    pub(crate) fn record_underflow(&mut self) {
        self.underflows += 1;
    }

    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Buffers: {} registered, {} released, {} live, {} underflows, \
             peak {} bytes, {} bytes registered in total",
            self.registrations,
            self.releases,
            self.live_buffers(),
            self.underflows,
            self.peak_allocated_bytes,
            self.cumulative_registered_bytes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_const_new() {
        assert_eq!(LedgerStats::default(), LedgerStats::new());
        assert_eq!(LedgerStats::new().live_buffers(), 0);
    }

    #[test]
    fn test_peak_tracking() {
        let mut s = LedgerStats::new();
        s.record_registration(100, 100);
        s.record_registration(50, 150);
        s.record_release();
        s.record_registration(10, 60);
        assert_eq!(s.peak_allocated_bytes, 150);
        assert_eq!(s.cumulative_registered_bytes, 160);
        assert_eq!(s.live_buffers(), 2);
    }

    #[test]
    fn test_summary() {
        let mut s = LedgerStats::new();
        s.record_registration(64, 64);
        s.record_release();
        s.record_underflow();
        let summary = s.summary();
        assert!(summary.contains("1 registered"));
        assert!(summary.contains("1 released"));
        assert!(summary.contains("1 underflows"));
        assert!(summary.contains("peak 64 bytes"));
    }
}
