// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # memory-ledger
//!
//! A process-wide byte ledger for tensor buffers.
//!
//! Every tensor registers its buffer footprint here when it is created and
//! takes it back out when it is released. The ledger never owns memory; it
//! only keeps the books, so that a double release or a leaked scratch
//! buffer shows up as a number that does not return to its starting value.
//!
//! # Key Components
//!
//! - [`MemoryLedger`]: an atomic byte counter with a `const` constructor.
//!   [`MemoryLedger::global()`] is the single ledger all tensors report to.
//! - [`LedgerStats`]: cumulative bookkeeping metrics (peak usage,
//!   registration and release counts, underflow events).
//! - [`LedgerError`]: returned when a release would take the total below
//!   zero. The ledger is left untouched in that case.
//!
//! # Example
//! ```
//! use memory_ledger::MemoryLedger;
//!
//! let ledger = MemoryLedger::new();
//! ledger.register(60);
//! ledger.register(40);
//! assert_eq!(ledger.allocated_bytes(), 100);
//!
//! ledger.release(60).unwrap();
//! assert_eq!(ledger.allocated_bytes(), 40);
//!
//! // Releasing more than is on the books is a bookkeeping bug.
//! assert!(ledger.release(41).is_err());
//! assert_eq!(ledger.allocated_bytes(), 40);
//! ```

mod error;
mod ledger;
mod stats;

pub use error::LedgerError;
pub use ledger::MemoryLedger;
pub use stats::LedgerStats;
