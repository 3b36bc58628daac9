//! GreenLoop Rewards Core
//!
//! Engagement-accounting subsystem for the community rewards application:
//! an append-only point transaction ledger with per-user running balances,
//! daily activity streaks, a per-day scan quota and a balance leaderboard.
//!
//! # Architecture
//!
//! - **Ledger as source of truth**: every point-affecting action is an
//!   immutable transaction row; the per-user aggregate is derived state
//! - **Atomic awards**: ledger append and balance credit commit in one
//!   RocksDB write batch, so they can never silently diverge
//! - **Per-user serialization**: aggregate mutations for one user are
//!   guarded by an in-process async mutex; users never contend with each
//!   other and there is no global lock
//!
//! # Invariants
//!
//! - Balance conservation: aggregate balance == Σ(ledger deltas) per user
//! - Streak law: per day transition the streak resets to 1 or increments
//!   by 1, never anything else
//! - Quota bound: at most `daily_scan_limit` scans admitted per user per
//!   calendar day, under any concurrency

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod config;
pub mod error;
pub mod identity;
pub mod leaderboard;
pub mod lock;
pub mod metrics;
pub mod quota;
pub mod rewards;
pub mod storage;
pub mod streak;
pub mod types;

// Re-exports
pub use config::Config;
pub use error::{Error, Result};
pub use identity::IdentityProvider;
pub use lock::UserLocks;
pub use metrics::Metrics;
pub use rewards::{AwardOutcome, Rewards};
pub use storage::Storage;
pub use types::{
    LeaderboardEntry, PointTransaction, TransactionKind, UserAggregate, UserId,
};
