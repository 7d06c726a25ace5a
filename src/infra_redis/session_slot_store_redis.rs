use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

// GET/compare/SET as one script so concurrent rotations of the same slot
// serialize inside Redis. Returns 1 when the swap landed.
const REPLACE_SLOT_SCRIPT: &str = r#"
if redis.call('GET', KEYS[1]) == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2], 'EX', ARGV[3])
    return 1
end
return 0
"#;

pub struct RedisSessionSlotStore {
    conn: ConnectionManager,
    prefix: String,
    replace_script: Script,
}

impl RedisSessionSlotStore {
    pub fn new(conn: redis::aio::ConnectionManager, prefix: impl Into<String>) -> Self {
        RedisSessionSlotStore {
            conn,
            prefix: prefix.into(),
            replace_script: Script::new(REPLACE_SLOT_SCRIPT),
        }
    }

    fn key(&self, user_id: UserId) -> String {
        format!("{}:{}", self.prefix, user_id)
    }
}

#[async_trait::async_trait]
impl SessionSlotStore for RedisSessionSlotStore {
    async fn put_slot(&self, user_id: UserId, jti: &str, ttl_secs: u64) -> Result<(), AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(&key, jti, ttl_secs)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn replace_slot(
        &self,
        user_id: UserId,
        expected: &str,
        next: &str,
        ttl_secs: u64,
    ) -> Result<bool, AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let replaced: i64 = self
            .replace_script
            .key(&key)
            .arg(expected)
            .arg(next)
            .arg(ttl_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(replaced == 1)
    }

    async fn clear_slot(&self, user_id: UserId) -> Result<(), AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(())
    }

    async fn get_slot(&self, user_id: UserId) -> Result<Option<String>, AuthError> {
        let key = self.key(user_id);
        let mut conn = self.conn.clone();
        let val: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(val)
    }
}
