//! Core types for the rewards ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode)
//! - Memory safety (no unsafe code)
//! - Integer point arithmetic (no floats anywhere near balances)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User identifier (opaque string assigned by the identity provider)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get as bytes (storage key)
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Point-earning action category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum TransactionKind {
    /// Reward for a community post
    PostReward = 1,
    /// Event attendance reward
    EventAttendance = 2,
    /// Marketplace sale proceeds
    MarketplaceSale = 3,
    /// Recyclable-item scan reward (quota-gated)
    ScanRecyclableItem = 4,
    /// Anything else (manual adjustments, promotions)
    Other = 5,
}

impl TransactionKind {
    /// Canonical string tag (persisted-schema compatible)
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::PostReward => "POST_REWARD",
            TransactionKind::EventAttendance => "EVENT_ATTENDANCE",
            TransactionKind::MarketplaceSale => "MARKETPLACE_SALE",
            TransactionKind::ScanRecyclableItem => "SCAN_RECYCLABLE_ITEM",
            TransactionKind::Other => "OTHER",
        }
    }

    /// Parse from canonical tag
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "POST_REWARD" => Some(TransactionKind::PostReward),
            "EVENT_ATTENDANCE" => Some(TransactionKind::EventAttendance),
            "MARKETPLACE_SALE" => Some(TransactionKind::MarketplaceSale),
            "SCAN_RECYCLABLE_ITEM" => Some(TransactionKind::ScanRecyclableItem),
            "OTHER" => Some(TransactionKind::Other),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable point-earning/spending fact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointTransaction {
    /// Unique transaction ID (UUIDv7 for time-ordering)
    pub id: Uuid,

    /// User this transaction belongs to
    pub user_id: UserId,

    /// Display-name snapshot taken at write time
    pub user_name: String,

    /// Signed point delta (negative = debit)
    pub points: i64,

    /// Free-text reason shown in history
    pub reason: String,

    /// Action category
    pub kind: TransactionKind,

    /// Write timestamp
    pub timestamp: DateTime<Utc>,
}

/// Denormalized per-user running state derived from the ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAggregate {
    /// User ID (aggregate key)
    pub user_id: UserId,

    /// Display name (source for transaction snapshots)
    pub user_name: String,

    /// Running balance: sum of all transaction deltas for this user
    pub balance: i64,

    /// Time of last aggregate write
    pub last_updated: DateTime<Utc>,

    /// Consecutive-day activity count
    pub streak: u32,

    /// Last streak-affecting activity (None until first activity)
    pub last_activity: Option<DateTime<Utc>>,

    /// Per-day scan cap
    pub daily_scan_limit: u32,

    /// Scans consumed on `last_scan_date`; logically zero on any other day
    pub daily_scan_count: u32,

    /// Calendar date the scan counter belongs to
    pub last_scan_date: Option<NaiveDate>,
}

impl UserAggregate {
    /// Fresh aggregate with zeroed counters (registration)
    pub fn new(user_id: UserId, user_name: impl Into<String>, daily_scan_limit: u32) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            balance: 0,
            last_updated: Utc::now(),
            streak: 0,
            last_activity: None,
            daily_scan_limit,
            daily_scan_count: 0,
            last_scan_date: None,
        }
    }
}

/// One leaderboard row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// User ID
    pub user_id: UserId,

    /// Display name
    pub user_name: String,

    /// Balance at read time
    pub balance: i64,
}
