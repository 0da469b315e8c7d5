use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::schedule;

/// Spaced-repetition record for one concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConceptRecord {
    pub concept_id: String,
    pub name: String,
    /// Set once at creation, never moved afterwards.
    pub first_learned: NaiveDate,
    pub last_reviewed: NaiveDate,
    #[serde(default)]
    pub repetition: u32,
    pub ease: f64,
    pub next_review: NaiveDate,
    #[serde(default)]
    pub mastered: bool,
    #[serde(default)]
    pub correct_streak: u32,
}

impl ConceptRecord {
    /// New record with scheduling defaults: neutral ease, first review a
    /// base interval out. An empty name falls back to the id.
    pub fn new(concept_id: impl Into<String>, name: &str, today: NaiveDate) -> Self {
        let concept_id = concept_id.into();
        let name = if name.trim().is_empty() {
            concept_id.clone()
        } else {
            name.to_string()
        };
        Self {
            concept_id,
            name,
            first_learned: today,
            last_reviewed: today,
            repetition: 0,
            ease: 1.0,
            next_review: today + Duration::days(schedule::BASE_INTERVAL_DAYS),
            mastered: false,
            correct_streak: 0,
        }
    }

    /// Due when the review date has arrived and the concept is not yet
    /// mastered.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.next_review <= today && !self.mastered
    }
}

/// Partial update for [`ConceptStorage::upsert`](super::ConceptStorage::upsert).
/// Unset fields keep their current (or freshly defaulted) values.
#[derive(Debug, Clone, Default)]
pub struct ConceptPatch {
    pub name: Option<String>,
    pub first_learned: Option<NaiveDate>,
    pub last_reviewed: Option<NaiveDate>,
    pub repetition: Option<u32>,
    pub ease: Option<f64>,
    pub next_review: Option<NaiveDate>,
    pub mastered: Option<bool>,
    pub correct_streak: Option<u32>,
}

impl ConceptPatch {
    pub(super) fn apply_to(&self, record: &mut ConceptRecord) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(first_learned) = self.first_learned {
            record.first_learned = first_learned;
        }
        if let Some(last_reviewed) = self.last_reviewed {
            record.last_reviewed = last_reviewed;
        }
        if let Some(repetition) = self.repetition {
            record.repetition = repetition;
        }
        if let Some(ease) = self.ease {
            record.ease = ease;
        }
        if let Some(next_review) = self.next_review {
            record.next_review = next_review;
        }
        if let Some(mastered) = self.mastered {
            record.mastered = mastered;
        }
        if let Some(correct_streak) = self.correct_streak {
            record.correct_streak = correct_streak;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_defaults() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let record = ConceptRecord::new("newton2", "Newton's second law", today);

        assert_eq!(record.repetition, 0);
        assert_eq!(record.ease, 1.0);
        assert_eq!(record.correct_streak, 0);
        assert!(!record.mastered);
        assert_eq!(record.first_learned, today);
        assert_eq!(record.next_review, today + Duration::days(7));
    }

    #[test]
    fn test_empty_name_falls_back_to_id() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let record = ConceptRecord::new("newton2", "  ", today);
        assert_eq!(record.name, "newton2");
    }

    #[test]
    fn test_mastered_record_is_never_due() {
        let today = NaiveDate::from_ymd_opt(2026, 2, 10).unwrap();
        let mut record = ConceptRecord::new("newton2", "Newton's second law", today);
        record.next_review = today;
        assert!(record.is_due(today));

        record.mastered = true;
        assert!(!record.is_due(today));
    }
}
