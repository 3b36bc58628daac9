//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `rewards_transactions_total` - Total ledger transactions appended
//! - `rewards_quota_rejections_total` - Scan awards denied by the quota gate
//! - `rewards_reconciliations_total` - Balance repairs performed
//! - `rewards_award_duration_seconds` - Histogram of award latencies
//! - `rewards_registered_users` - Registered user count

use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone)]
pub struct Metrics {
    /// Total transactions appended
    pub transactions_total: IntCounter,

    /// Quota rejections
    pub quota_rejections_total: IntCounter,

    /// Balance repairs
    pub reconciliations_total: IntCounter,

    /// Award duration histogram
    pub award_duration: Histogram,

    /// Registered users
    pub registered_users: IntGauge,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let transactions_total = IntCounter::with_opts(Opts::new(
            "rewards_transactions_total",
            "Total ledger transactions appended",
        ))?;
        registry.register(Box::new(transactions_total.clone()))?;

        let quota_rejections_total = IntCounter::with_opts(Opts::new(
            "rewards_quota_rejections_total",
            "Scan awards denied by the quota gate",
        ))?;
        registry.register(Box::new(quota_rejections_total.clone()))?;

        let reconciliations_total = IntCounter::with_opts(Opts::new(
            "rewards_reconciliations_total",
            "Balance repairs performed",
        ))?;
        registry.register(Box::new(reconciliations_total.clone()))?;

        let award_duration = Histogram::with_opts(
            HistogramOpts::new(
                "rewards_award_duration_seconds",
                "Histogram of award latencies",
            )
            .buckets(vec![0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0]),
        )?;
        registry.register(Box::new(award_duration.clone()))?;

        let registered_users = IntGauge::with_opts(Opts::new(
            "rewards_registered_users",
            "Registered user count",
        ))?;
        registry.register(Box::new(registered_users.clone()))?;

        Ok(Self {
            transactions_total,
            quota_rejections_total,
            reconciliations_total,
            award_duration,
            registered_users,
            registry,
        })
    }

    /// Record a ledger append
    pub fn record_transaction(&self) {
        self.transactions_total.inc();
    }

    /// Record a quota rejection
    pub fn record_quota_rejection(&self) {
        self.quota_rejections_total.inc();
    }

    /// Record a balance repair
    pub fn record_reconciliation(&self) {
        self.reconciliations_total.inc();
    }

    /// Record award duration
    pub fn record_award_duration(&self, duration_seconds: f64) {
        self.award_duration.observe(duration_seconds);
    }

    /// Record a user registration
    pub fn record_registration(&self) {
        self.registered_users.inc();
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
