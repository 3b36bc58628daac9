//! Identity seam for the application boundary
//!
//! Core operations always take an explicit [`UserId`]. The surrounding
//! application may let callers omit the id and fall back to the signed-in
//! actor; that defaulting happens here, at the boundary, never inside the
//! subsystem.

use crate::{error::Error, types::UserId, Result};

/// Source of the currently signed-in actor
pub trait IdentityProvider: Send + Sync {
    /// The signed-in user, if any
    fn current_user(&self) -> Option<UserId>;
}

/// Resolve an optional explicit user id against the provider
///
/// Explicit ids win; otherwise the provider's current user is used. Fails
/// with [`Error::Unauthenticated`] when neither is available.
pub fn resolve_actor(
    provider: &dyn IdentityProvider,
    explicit: Option<UserId>,
) -> Result<UserId> {
    explicit
        .or_else(|| provider.current_user())
        .ok_or(Error::Unauthenticated)
}
