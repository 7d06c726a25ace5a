mod session_slot_store_redis;

pub use session_slot_store_redis::*;
