//! Review scheduling
//!
//! Simplified interval scaling: ease is a multiplicative difficulty
//! modifier on a fixed base unit, and only correctness is observed.

use chrono::{Duration, NaiveDate};

use super::models::ConceptRecord;

/// Base scheduling unit in days.
pub const BASE_INTERVAL_DAYS: i64 = 7;
/// Ease adjustment applied per review outcome.
pub const EASE_STEP: f64 = 0.1;
/// Lower ease bound.
pub const MIN_EASE: f64 = 0.5;
/// Upper ease bound.
pub const MAX_EASE: f64 = 2.0;
/// Consecutive correct answers required for mastery.
pub const MASTERY_STREAK: u32 = 2;
/// Mastery must be reached within this many days of first exposure.
pub const MASTERY_WINDOW_DAYS: i64 = 30;

/// Apply one review outcome to a record.
///
/// Success bumps repetition, ease and streak; failure decays repetition
/// toward zero, lowers ease and resets the streak. The interval formula
/// uses a repetition factor of at least 1 after a failure, so the next
/// review is never scheduled for the same day.
pub fn apply_review(record: &mut ConceptRecord, was_correct: bool, today: NaiveDate) {
    if was_correct {
        record.repetition += 1;
        record.ease = (record.ease + EASE_STEP).min(MAX_EASE);
        record.correct_streak += 1;
    } else {
        record.repetition = record.repetition.saturating_sub(1);
        record.ease = (record.ease - EASE_STEP).max(MIN_EASE);
        record.correct_streak = 0;
    }

    let factor = if was_correct {
        record.repetition
    } else {
        record.repetition.max(1)
    };
    let interval = (BASE_INTERVAL_DAYS as f64 * factor as f64 * record.ease).round() as i64;

    record.last_reviewed = today;
    record.next_review = today + Duration::days(interval);

    // Mastery is one-way: once set it stays, and it is only reachable
    // inside the window after first exposure.
    if record.correct_streak >= MASTERY_STREAK
        && (today - record.first_learned).num_days() <= MASTERY_WINDOW_DAYS
    {
        record.mastered = true;
    }
}
