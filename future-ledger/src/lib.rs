//! Future Ledger
//!
//! Deferred-credit ledger for an account-and-asset chain node: a sender
//! schedules a credit (native coin or fungible token) that becomes
//! spendable only at or after a future timestamp; the recipient later
//! withdraws everything matured in one call, at O(distinct maturity days)
//! cost instead of O(individual scheduled credits).
//!
//! # Architecture
//!
//! - **Maturity buckets**: credits maturing on the same day merge into one
//!   persisted tick, addressed by a deterministic (owner, asset, day) key
//! - **Linked buckets over point lookups**: ticks form a doubly linked
//!   list whose links are storage keys; the store needs no range scans
//! - **Cached summary**: count, total value, and boundary pointers live on
//!   the account record, kept consistent by every mutation
//! - **Single writer**: each operation runs synchronously inside one
//!   host-serialized state transition and commits atomically
//!
//! # Invariants
//!
//! - The summary's count and total always equal the reachable ticks' count
//!   and balance sum
//! - Reachable ticks have strictly increasing maturity days, no duplicates
//! - Live ticks always carry a positive balance (deleted, never zeroed)
//! - All arithmetic is checked; overflow aborts before anything persists

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod account;
pub mod config;
pub mod error;
pub mod future;
pub mod ledger;
pub mod storage;
pub mod types;

// Re-exports
pub use account::Account;
pub use config::Config;
pub use error::{Error, Result};
pub use future::FutureLedger;
pub use ledger::Ledger;
pub use storage::{CoinTicks, LedgerBatch, Storage, StorageStats, TickStore, TokenTicks};
pub use types::{
    AccountId, AssetId, FuturePage, FutureSummary, MaturityDay, ScheduledCredit, Tick, TickKey,
    TokenId, MAX_IDENTIFIER_LEN,
};
