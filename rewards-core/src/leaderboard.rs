//! Balance ranking over user aggregates
//!
//! Read-only view: descending by balance, ties broken by ascending user id so
//! repeated queries over the same data return the same order.

use crate::types::{LeaderboardEntry, UserAggregate};

/// Rank aggregates and keep the top `n`
pub fn rank(mut aggs: Vec<UserAggregate>, n: usize) -> Vec<LeaderboardEntry> {
    aggs.sort_by(|a, b| {
        b.balance
            .cmp(&a.balance)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    aggs.into_iter()
        .take(n)
        .map(|a| LeaderboardEntry {
            user_id: a.user_id,
            user_name: a.user_name,
            balance: a.balance,
        })
        .collect()
}
