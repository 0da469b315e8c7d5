//! Recall scoring
//!
//! Ranks historical structured turns by how useful they are for
//! re-explaining a concept. A correctly-answered turn is worth a full
//! point; turns inside the recency horizon get a bonus that decays
//! linearly with age. Read-only and side-effect free.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::sessions::{ConversationTurn, Session};

/// Turns older than this many days get no recency bonus.
pub const RECENCY_HORIZON_DAYS: f64 = 90.0;
/// Maximum recency bonus, awarded to a turn recorded just now.
pub const RECENCY_BONUS: f64 = 0.3;

/// The best-scoring past turn for a concept, with where it came from.
#[derive(Debug, Clone)]
pub struct RecallMatch {
    pub score: f64,
    pub session_id: Uuid,
    pub session_title: String,
    pub turn: ConversationTurn,
}

/// Scan every session's turns for the best past explanation of
/// `concept_id`. Ties keep the first candidate encountered. Returns `None`
/// only when no turn mentions the concept at all; a zero-score candidate
/// still wins when it is the only one.
pub fn best_past_explanation(
    sessions: &[Session],
    concept_id: &str,
    now: DateTime<Utc>,
) -> Option<RecallMatch> {
    let mut best: Option<RecallMatch> = None;

    for session in sessions {
        for turn in &session.conversation_turns {
            if !turn.concepts.iter().any(|c| c == concept_id) {
                continue;
            }
            let score = score_turn(turn, now);
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(RecallMatch {
                    score,
                    session_id: session.id,
                    session_title: session.title.clone(),
                    turn: turn.clone(),
                });
            }
        }
    }

    best
}

fn score_turn(turn: &ConversationTurn, now: DateTime<Utc>) -> f64 {
    let mut score = 0.0;
    if turn.correct == Some(true) {
        score += 1.0;
    }
    let age_days = (now - turn.timestamp).num_milliseconds() as f64 / 86_400_000.0;
    if age_days <= RECENCY_HORIZON_DAYS {
        score += RECENCY_BONUS * (1.0 - age_days / RECENCY_HORIZON_DAYS);
    }
    score
}
