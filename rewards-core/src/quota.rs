//! Per-day scan quota admission control
//!
//! The quota is a pessimistic gate in front of the scan-triggered award path.
//! State lives on the user aggregate as `(daily_scan_limit, daily_scan_count,
//! last_scan_date)`; the counter is only meaningful for the date it was
//! written on. A date change resets the quota implicitly: reads on a new day
//! report the full limit without writing anything.

use crate::{error::Error, types::UserAggregate, Result};
use chrono::NaiveDate;

/// Scans left for `today` without modifying state
///
/// A pure read: the implicit day rollover is reported, never persisted.
pub fn remaining(agg: &UserAggregate, today: NaiveDate) -> u32 {
    if agg.last_scan_date != Some(today) {
        return agg.daily_scan_limit;
    }
    agg.daily_scan_limit.saturating_sub(agg.daily_scan_count)
}

/// Admit one scan for `today`, checked-and-incremented as one unit
///
/// Mutates the counter on acceptance; rejection leaves the aggregate
/// untouched. Returns the scans left after this one. Must run under the
/// per-user serialization scope, so no other consume can interleave between
/// the check and the increment.
pub fn consume(agg: &mut UserAggregate, today: NaiveDate) -> Result<u32> {
    let left = remaining(agg, today);
    if left == 0 {
        return Err(Error::QuotaExceeded {
            limit: agg.daily_scan_limit,
        });
    }

    if agg.last_scan_date != Some(today) {
        agg.daily_scan_count = 1;
        agg.last_scan_date = Some(today);
    } else {
        agg.daily_scan_count += 1;
    }

    Ok(left - 1)
}
