use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::{keys, KeyValueStore, Result};

use super::models::{ConceptPatch, ConceptRecord};
use super::schedule;

/// Persisted shape of the concept map document.
#[derive(Debug, Default, Serialize, Deserialize)]
struct MemoryDoc {
    #[serde(default)]
    concepts: HashMap<String, ConceptRecord>,
}

/// Global concept memory, shared by every session.
pub struct ConceptStorage {
    store: Arc<dyn KeyValueStore>,
}

impl ConceptStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<MemoryDoc> {
        let raw = match self.store.get(keys::CONCEPTS)? {
            Some(raw) => raw,
            None => return Ok(MemoryDoc::default()),
        };
        match serde_json::from_str(&raw) {
            Ok(doc) => Ok(doc),
            Err(err) => {
                log::warn!("Concept memory unreadable, starting empty: {}", err);
                Ok(MemoryDoc::default())
            }
        }
    }

    fn save(&self, doc: &MemoryDoc) -> Result<()> {
        self.store.set(keys::CONCEPTS, &serde_json::to_string(doc)?)
    }

    /// The scheduler's notion of today (UTC calendar date).
    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    pub fn get(&self, concept_id: &str) -> Result<Option<ConceptRecord>> {
        Ok(self.load()?.concepts.get(concept_id).cloned())
    }

    /// Create the record with defaults if absent. Idempotent: an existing
    /// record is returned untouched.
    pub fn ensure(&self, concept_id: &str, name: &str) -> Result<ConceptRecord> {
        let mut doc = self.load()?;
        if let Some(existing) = doc.concepts.get(concept_id) {
            return Ok(existing.clone());
        }
        let record = ConceptRecord::new(concept_id, name, Self::today());
        doc.concepts.insert(concept_id.to_string(), record.clone());
        self.save(&doc)?;
        Ok(record)
    }

    /// Create-or-merge: defaults fill the gaps on creation, then the patch
    /// overrides whatever it names.
    pub fn upsert(&self, concept_id: &str, patch: ConceptPatch) -> Result<ConceptRecord> {
        let mut doc = self.load()?;
        let record = doc
            .concepts
            .entry(concept_id.to_string())
            .or_insert_with(|| ConceptRecord::new(concept_id, "", Self::today()));
        patch.apply_to(record);
        let record = record.clone();
        self.save(&doc)?;
        Ok(record)
    }

    /// Apply one review outcome. Returns `None` (and persists nothing) for
    /// a concept that was never tracked.
    pub fn review_outcome(
        &self,
        concept_id: &str,
        was_correct: bool,
    ) -> Result<Option<ConceptRecord>> {
        let mut doc = self.load()?;
        let Some(record) = doc.concepts.get_mut(concept_id) else {
            return Ok(None);
        };
        let was_mastered = record.mastered;
        schedule::apply_review(record, was_correct, Self::today());
        if record.mastered && !was_mastered {
            log::debug!("Concept mastered: {}", concept_id);
        }
        let record = record.clone();
        self.save(&doc)?;
        Ok(Some(record))
    }

    /// Records due for review today, soonest review date first.
    pub fn due_today(&self) -> Result<Vec<ConceptRecord>> {
        let today = Self::today();
        let mut due: Vec<ConceptRecord> = self
            .load()?
            .concepts
            .into_values()
            .filter(|c| c.is_due(today))
            .collect();
        due.sort_by(|a, b| {
            a.next_review
                .cmp(&b.next_review)
                .then_with(|| a.concept_id.cmp(&b.concept_id))
        });
        Ok(due)
    }

    /// Every tracked record, ordered by id for stable display.
    pub fn all(&self) -> Result<Vec<ConceptRecord>> {
        let mut records: Vec<ConceptRecord> = self.load()?.concepts.into_values().collect();
        records.sort_by(|a, b| a.concept_id.cmp(&b.concept_id));
        Ok(records)
    }

    /// Lowercased ids of every mastered concept, for tree pruning.
    pub fn mastered_ids(&self) -> Result<HashSet<String>> {
        Ok(self
            .load()?
            .concepts
            .iter()
            .filter(|(_, record)| record.mastered)
            .map(|(id, _)| id.to_lowercase())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::Duration;

    fn create_test_storage() -> ConceptStorage {
        ConceptStorage::new(Arc::new(MemoryStore::new()))
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let storage = create_test_storage();

        let first = storage.ensure("newton2", "Newton's second law").unwrap();
        let second = storage.ensure("newton2", "renamed").unwrap();

        assert_eq!(second, first);
        assert_eq!(storage.all().unwrap().len(), 1);
    }

    #[test]
    fn test_ensure_with_empty_name_uses_id() {
        let storage = create_test_storage();
        let record = storage.ensure("newton2", "").unwrap();
        assert_eq!(record.name, "newton2");
    }

    #[test]
    fn test_two_successes_master_and_reschedule() {
        let storage = create_test_storage();
        let today = Utc::now().date_naive();
        storage.ensure("newton2", "Newton's second law").unwrap();

        storage.review_outcome("newton2", true).unwrap();
        let record = storage.review_outcome("newton2", true).unwrap().unwrap();

        assert_eq!(record.repetition, 2);
        assert!((record.ease - 1.2).abs() < 1e-9);
        assert_eq!(record.correct_streak, 2);
        assert_eq!(record.next_review, today + Duration::days(17));
        assert!(record.mastered);
    }

    #[test]
    fn test_review_outcome_for_unknown_concept_is_none() {
        let storage = create_test_storage();
        assert!(storage.review_outcome("ghost", true).unwrap().is_none());
        assert!(storage.all().unwrap().is_empty());
    }

    #[test]
    fn test_due_today_filters_and_sorts() {
        let storage = create_test_storage();
        let today = Utc::now().date_naive();

        storage
            .upsert(
                "later",
                ConceptPatch {
                    next_review: Some(today - Duration::days(1)),
                    ..Default::default()
                },
            )
            .unwrap();
        storage
            .upsert(
                "earlier",
                ConceptPatch {
                    next_review: Some(today - Duration::days(3)),
                    ..Default::default()
                },
            )
            .unwrap();
        storage
            .upsert(
                "done",
                ConceptPatch {
                    next_review: Some(today - Duration::days(5)),
                    mastered: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        // Fresh records are scheduled a week out, so this one is not due.
        storage.ensure("fresh", "fresh").unwrap();

        let due = storage.due_today().unwrap();
        let ids: Vec<&str> = due.iter().map(|c| c.concept_id.as_str()).collect();
        assert_eq!(ids, vec!["earlier", "later"]);
    }

    #[test]
    fn test_upsert_merges_without_resetting_progress() {
        let storage = create_test_storage();
        storage.ensure("newton2", "Newton's second law").unwrap();
        storage.review_outcome("newton2", true).unwrap();

        let record = storage
            .upsert(
                "newton2",
                ConceptPatch {
                    name: Some("Second law of motion".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(record.name, "Second law of motion");
        assert_eq!(record.repetition, 1);
    }

    #[test]
    fn test_mastered_ids_are_lowercased() {
        let storage = create_test_storage();
        storage
            .upsert(
                "Newton2",
                ConceptPatch {
                    mastered: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        storage.ensure("sets", "Sets").unwrap();

        let ids = storage.mastered_ids().unwrap();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("newton2"));
    }

    #[test]
    fn test_corrupt_document_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::CONCEPTS, "not json").unwrap();
        let storage = ConceptStorage::new(store);

        assert!(storage.all().unwrap().is_empty());

        storage.ensure("newton2", "Newton's second law").unwrap();
        assert_eq!(storage.all().unwrap().len(), 1);
    }
}
