//! Day-over-day activity streak tracking
//!
//! The streak counts consecutive calendar days with at least one qualifying
//! activity. Transitions are driven by the whole-day difference between the
//! last activity and "now":
//!
//! - same day: no change (repeat awards do not inflate the streak)
//! - next day: streak + 1
//! - gap of more than one day, or first-ever activity: reset to 1
//! - negative difference (clock skew, backdated writes): no change

use crate::types::UserAggregate;
use chrono::{DateTime, Utc};

/// Outcome of a streak touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakTransition {
    /// Same calendar day (or skewed clock), nothing written
    Unchanged,
    /// Consecutive day, streak incremented
    Extended,
    /// Gap or first activity, streak reset to 1
    Reset,
}

/// Apply one activity touch to the aggregate, returning the transition taken
///
/// Mutates `streak` and `last_activity` in place; the caller persists the
/// aggregate. Must run under the per-user serialization scope.
pub fn touch(agg: &mut UserAggregate, now: DateTime<Utc>) -> StreakTransition {
    let last = match agg.last_activity {
        Some(last) => last,
        None => {
            agg.streak = 1;
            agg.last_activity = Some(now);
            return StreakTransition::Reset;
        }
    };

    let diff_days = (now.date_naive() - last.date_naive()).num_days();

    match diff_days {
        0 => StreakTransition::Unchanged,
        1 => {
            agg.streak += 1;
            agg.last_activity = Some(now);
            StreakTransition::Extended
        }
        d if d > 1 => {
            agg.streak = 1;
            agg.last_activity = Some(now);
            StreakTransition::Reset
        }
        // diff_days < 0: never advance on backdated clocks
        _ => StreakTransition::Unchanged,
    }
}
