//! Main rewards orchestration layer
//!
//! This module ties together storage, streak tracking, quota admission and
//! ranking into a high-level API for engagement accounting.
//!
//! # Example
//!
//! ```no_run
//! use rewards_core::{Config, Rewards, TransactionKind, UserId};
//!
//! #[tokio::main]
//! async fn main() -> rewards_core::Result<()> {
//!     let rewards = Rewards::open(Config::default())?;
//!
//!     let user = UserId::new("user-1");
//!     rewards.register_user(user.clone(), "Ana").await?;
//!     rewards
//!         .award_points(&user, 20, "Community post", TransactionKind::PostReward, chrono::Utc::now())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

use crate::{
    leaderboard, quota, streak,
    types::{LeaderboardEntry, PointTransaction, TransactionKind, UserAggregate, UserId},
    Config, Error, Metrics, Result, Storage, UserLocks,
};
use chrono::{DateTime, NaiveDate, Utc};
use std::time::Instant;
use uuid::Uuid;

/// Result of one successful award
#[derive(Debug, Clone)]
pub struct AwardOutcome {
    /// Ledger row created by this award
    pub transaction_id: Uuid,

    /// Balance after the credit
    pub new_balance: i64,

    /// Streak after the touch
    pub streak: u32,
}

/// Main rewards interface
pub struct Rewards {
    /// Storage backend
    storage: Storage,

    /// Per-user serialization scopes
    locks: UserLocks,

    /// Prometheus metrics
    metrics: Metrics,

    /// Configuration
    config: Config,
}

impl Rewards {
    /// Open the rewards store with configuration
    pub fn open(config: Config) -> Result<Self> {
        let storage = Storage::open(&config)?;
        let metrics = Metrics::new()
            .map_err(|e| Error::Config(format!("Failed to create metrics: {}", e)))?;

        metrics
            .registered_users
            .set(storage.scan_aggregates()?.len() as i64);

        Ok(Self {
            storage,
            locks: UserLocks::new(),
            metrics,
            config,
        })
    }

    /// Register a user with zeroed counters
    ///
    /// Re-registration of an existing user is rejected; the aggregate is never
    /// silently overwritten.
    pub async fn register_user(
        &self,
        user_id: UserId,
        user_name: impl Into<String>,
    ) -> Result<UserAggregate> {
        let _guard = self.locks.acquire(&user_id).await;

        if self.storage.get_aggregate_opt(&user_id)?.is_some() {
            return Err(Error::UserExists(user_id.to_string()));
        }

        let agg = UserAggregate::new(
            user_id.clone(),
            user_name,
            self.config.quota.default_daily_scan_limit,
        );
        self.storage.put_aggregate(&agg)?;
        self.metrics.record_registration();

        tracing::info!(user_id = %user_id, "User registered");

        Ok(agg)
    }

    /// Award points: streak touch, ledger append, balance credit
    ///
    /// The ledger row, its history index entry and the updated aggregate are
    /// committed as one atomic write batch; the ledger can never diverge from
    /// the balance through this path. Negative deltas are accepted as debits,
    /// zero deltas are rejected.
    pub async fn award_points(
        &self,
        user_id: &UserId,
        points: i64,
        reason: impl Into<String>,
        kind: TransactionKind,
        now: DateTime<Utc>,
    ) -> Result<AwardOutcome> {
        if points == 0 {
            return Err(Error::InvalidAward("Zero point delta".to_string()));
        }

        let _guard = self.locks.acquire(user_id).await;
        let mut agg = self.storage.get_aggregate(user_id)?;

        self.commit_award(&mut agg, points, reason.into(), kind, now)
    }

    /// Award a recyclable-item scan, gated by the per-day quota
    ///
    /// Quota check, counter increment and the award itself run under a single
    /// serialization scope and commit in one write batch, so concurrent scans
    /// can never admit more than the daily limit.
    pub async fn award_scan(
        &self,
        user_id: &UserId,
        points: i64,
        reason: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<AwardOutcome> {
        if points == 0 {
            return Err(Error::InvalidAward("Zero point delta".to_string()));
        }

        let _guard = self.locks.acquire(user_id).await;
        let mut agg = self.storage.get_aggregate(user_id)?;

        if let Err(e) = quota::consume(&mut agg, now.date_naive()) {
            if matches!(e, Error::QuotaExceeded { .. }) {
                self.metrics.record_quota_rejection();
                tracing::warn!(user_id = %user_id, "Scan rejected by quota");
            }
            return Err(e);
        }

        self.commit_award(
            &mut agg,
            points,
            reason.into(),
            TransactionKind::ScanRecyclableItem,
            now,
        )
    }

    /// Shared award tail: must hold the user's lock
    fn commit_award(
        &self,
        agg: &mut UserAggregate,
        points: i64,
        reason: String,
        kind: TransactionKind,
        now: DateTime<Utc>,
    ) -> Result<AwardOutcome> {
        let started = Instant::now();

        // Streak is touched before the ledger write and exactly once per
        // award, independent of the points amount
        streak::touch(agg, now);

        let txn = PointTransaction {
            id: Uuid::now_v7(),
            user_id: agg.user_id.clone(),
            user_name: agg.user_name.clone(),
            points,
            reason,
            kind,
            timestamp: now,
        };

        agg.balance += points;
        agg.last_updated = Utc::now();

        self.storage.apply_award(&txn, agg)?;

        self.metrics.record_transaction();
        self.metrics
            .record_award_duration(started.elapsed().as_secs_f64());

        Ok(AwardOutcome {
            transaction_id: txn.id,
            new_balance: agg.balance,
            streak: agg.streak,
        })
    }

    /// Credit the balance without a ledger row
    ///
    /// Low-level aggregate operation; `award_points` is the normal path.
    /// Skipping the ledger leaves a gap that `verify_balance` will flag, so
    /// this is only appropriate for repairs and migrations.
    pub async fn credit(&self, user_id: &UserId, delta: i64) -> Result<i64> {
        let _guard = self.locks.acquire(user_id).await;

        let mut agg = self.storage.get_aggregate(user_id)?;
        agg.balance += delta;
        agg.last_updated = Utc::now();
        self.storage.put_aggregate(&agg)?;

        Ok(agg.balance)
    }

    /// Point-in-time balance; 0 when the aggregate does not exist yet
    pub fn balance(&self, user_id: &UserId) -> Result<i64> {
        Ok(self
            .storage
            .get_aggregate_opt(user_id)?
            .map(|a| a.balance)
            .unwrap_or(0))
    }

    /// Current streak
    pub fn streak(&self, user_id: &UserId) -> Result<u32> {
        Ok(self.storage.get_aggregate(user_id)?.streak)
    }

    /// Scans left today; pure read, the day rollover is never persisted here
    pub fn remaining_scans(&self, user_id: &UserId, today: NaiveDate) -> Result<u32> {
        let agg = self.storage.get_aggregate(user_id)?;
        Ok(quota::remaining(&agg, today))
    }

    /// Transaction history, newest-first
    ///
    /// Results are a snapshot; reissue the call for fresh data.
    pub fn history(
        &self,
        user_id: &UserId,
        limit: Option<usize>,
    ) -> Result<Vec<PointTransaction>> {
        self.storage.user_history(user_id, limit)
    }

    /// Top `n` users by balance, ties broken by ascending user id
    pub fn get_leaderboard(&self, n: usize) -> Result<Vec<LeaderboardEntry>> {
        let aggs = self.storage.scan_aggregates()?;
        Ok(leaderboard::rank(aggs, n))
    }

    /// Check invariant I1: aggregate balance equals the sum of ledger deltas
    ///
    /// Surfaces a mismatch as [`Error::Reconciliation`] so the caller can
    /// trigger [`Rewards::reconcile_balance`] instead of silently
    /// under-crediting.
    pub fn verify_balance(&self, user_id: &UserId) -> Result<()> {
        let agg = self.storage.get_aggregate(user_id)?;
        let ledger_total = self.storage.ledger_total(user_id)?;

        if ledger_total != agg.balance {
            return Err(Error::Reconciliation {
                user_id: user_id.to_string(),
                ledger_total,
                balance: agg.balance,
            });
        }

        Ok(())
    }

    /// Repair the aggregate balance from the ledger, returning the new balance
    pub async fn reconcile_balance(&self, user_id: &UserId) -> Result<i64> {
        let _guard = self.locks.acquire(user_id).await;

        let mut agg = self.storage.get_aggregate(user_id)?;
        let ledger_total = self.storage.ledger_total(user_id)?;

        if agg.balance != ledger_total {
            tracing::info!(
                user_id = %user_id,
                old_balance = agg.balance,
                new_balance = ledger_total,
                "Balance repaired from ledger"
            );
            agg.balance = ledger_total;
            agg.last_updated = Utc::now();
            self.storage.put_aggregate(&agg)?;
            self.metrics.record_reconciliation();
        }

        Ok(agg.balance)
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Close the underlying store
    pub fn close(self) -> Result<()> {
        self.storage.close()
    }
}
