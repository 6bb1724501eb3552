//! Durable bonus-point storage.
//!
//! [`BonusLedger`] is the in-memory map the queue ranks against. [`LedgerStore`]
//! owns the backing JSON file: it loads the map once at startup and rewrites the
//! whole file after every mutation. The two are split so the queue's critical
//! section only covers the in-memory change; the file write happens after the
//! lock is released.

mod ledger;
mod store;

pub use ledger::{BonusLedger, LedgerWrite};
pub use store::LedgerStore;

/// File name used inside the data directory when no path is configured
pub const LEDGER_FILE_NAME: &str = "bonus_points.json";
