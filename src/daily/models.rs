use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One study event: a concept touched by a turn in some session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyEntry {
    pub concept_id: String,
    pub session_id: Uuid,
    #[serde(rename = "turn")]
    pub turn_number: u64,
    pub timestamp: DateTime<Utc>,
}

/// Persisted shape of one day's document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(super) struct DailyDoc {
    #[serde(default)]
    pub entries: Vec<DailyEntry>,
}
