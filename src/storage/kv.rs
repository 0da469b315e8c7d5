use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Session not found: {0}")]
    SessionNotFound(Uuid),

    #[error("Data directory not found")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Capability interface over durable, synchronous, string-keyed storage.
///
/// Every engine mutation is a whole-document read-modify-write against a
/// single key, so the trait stays deliberately small. Implementations are
/// shared behind an `Arc` and must tolerate calls from any thread.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Persisted key names shared by the stores.
pub mod keys {
    use chrono::NaiveDate;

    /// Map of all sessions, keyed by session id.
    pub const SESSIONS: &str = "sessions";

    /// Pointer to the current session id.
    pub const CURRENT_SESSION: &str = "current_session";

    /// Concept memory map, keyed by concept id.
    pub const CONCEPTS: &str = "concepts";

    /// Daily log key for a calendar date (one document per day).
    pub fn daily(date: NaiveDate) -> String {
        format!("daily_{}", date.format("%Y-%m-%d"))
    }
}
