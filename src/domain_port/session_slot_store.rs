use crate::application_port::*;
use crate::domain_model::*;

/// One live refresh jti per user. Every mutation is atomic per user:
/// concurrent rotations of the same slot must serialize, never both succeed.
#[async_trait::async_trait]
pub trait SessionSlotStore: Send + Sync {
    /// Overwrite the slot unconditionally (login). Any previously recorded
    /// jti is superseded, which invalidates every outstanding refresh token.
    async fn put_slot(&self, user_id: UserId, jti: &str, ttl_secs: u64) -> Result<(), AuthError>;

    /// Compare-and-swap: replace `expected` with `next` in one atomic step.
    /// Returns false, touching nothing, when the slot is empty or holds a
    /// different jti.
    async fn replace_slot(
        &self,
        user_id: UserId,
        expected: &str,
        next: &str,
        ttl_secs: u64,
    ) -> Result<bool, AuthError>;

    /// Empty the slot (logout). Revokes every outstanding refresh token for
    /// the user, presented or not.
    async fn clear_slot(&self, user_id: UserId) -> Result<(), AuthError>;

    async fn get_slot(&self, user_id: UserId) -> Result<Option<String>, AuthError>;
}
