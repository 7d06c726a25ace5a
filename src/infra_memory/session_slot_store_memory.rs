use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::time::Duration;

struct SlotEntry {
    jti: String,
    expires_at: DateTime<Utc>,
}

impl SlotEntry {
    fn new(jti: &str, ttl_secs: u64) -> Self {
        SlotEntry {
            jti: jti.to_string(),
            expires_at: Utc::now() + Duration::from_secs(ttl_secs),
        }
    }

    fn live(&self) -> bool {
        self.expires_at > Utc::now()
    }
}

/// DashMap-backed slot store for the `memory` backend and tests. Per-key
/// shard locking gives `replace_slot` the same atomicity the Redis script
/// provides.
pub struct MemorySessionSlotStore {
    slots: DashMap<UserId, SlotEntry>,
}

impl MemorySessionSlotStore {
    pub fn new() -> Self {
        MemorySessionSlotStore {
            slots: DashMap::new(),
        }
    }
}

impl Default for MemorySessionSlotStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionSlotStore for MemorySessionSlotStore {
    async fn put_slot(&self, user_id: UserId, jti: &str, ttl_secs: u64) -> Result<(), AuthError> {
        self.slots.insert(user_id, SlotEntry::new(jti, ttl_secs));
        Ok(())
    }

    async fn replace_slot(
        &self,
        user_id: UserId,
        expected: &str,
        next: &str,
        ttl_secs: u64,
    ) -> Result<bool, AuthError> {
        if let Some(mut entry) = self.slots.get_mut(&user_id) {
            if entry.live() && entry.jti == expected {
                *entry = SlotEntry::new(next, ttl_secs);
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn clear_slot(&self, user_id: UserId) -> Result<(), AuthError> {
        self.slots.remove(&user_id);
        Ok(())
    }

    async fn get_slot(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        Ok(self
            .slots
            .get(&user_id)
            .filter(|entry| entry.live())
            .map(|entry| entry.jti.clone()))
    }
}
