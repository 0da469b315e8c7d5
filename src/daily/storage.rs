use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::storage::{keys, KeyValueStore, Result};

use super::models::{DailyDoc, DailyEntry};

/// Append-only log of study events, one document per calendar day.
pub struct DailyLog {
    store: Arc<dyn KeyValueStore>,
}

impl DailyLog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    fn load(&self, date: NaiveDate) -> Result<DailyDoc> {
        let raw = match self.store.get(&keys::daily(date))? {
            Some(raw) => raw,
            None => return Ok(DailyDoc::default()),
        };
        match serde_json::from_str(&raw) {
            Ok(doc) => Ok(doc),
            Err(err) => {
                log::warn!("Daily log for {} unreadable, starting empty: {}", date, err);
                Ok(DailyDoc::default())
            }
        }
    }

    /// Record that a turn touched a concept. Creates today's document on
    /// first use.
    pub fn append(
        &self,
        concept_id: &str,
        session_id: Uuid,
        turn_number: u64,
    ) -> Result<DailyEntry> {
        let today = Self::today();
        let mut doc = self.load(today)?;
        let entry = DailyEntry {
            concept_id: concept_id.to_string(),
            session_id,
            turn_number,
            timestamp: Utc::now(),
        };
        doc.entries.push(entry.clone());
        self.store
            .set(&keys::daily(today), &serde_json::to_string(&doc)?)?;
        Ok(entry)
    }

    /// Entries recorded on `date`, in append order; empty when nothing
    /// happened that day.
    pub fn entries_for(&self, date: NaiveDate) -> Result<Vec<DailyEntry>> {
        Ok(self.load(date)?.entries)
    }

    pub fn today_entries(&self) -> Result<Vec<DailyEntry>> {
        self.entries_for(Self::today())
    }
}
