//! Turn orchestration
//!
//! Wires the stores and the gateway together for the three user actions:
//! sending a message, quick-starting a topic and starting a review. Each
//! action reads the current session, exchanges one request with the
//! backend and applies the returned deltas through the stores.

use std::sync::Arc;

use chrono::Utc;

use crate::concepts::{ConceptRecord, ConceptStorage};
use crate::daily::DailyLog;
use crate::gateway::{ChatRequest, ChatResponse, Gateway, SessionContext, SessionUpdate};
use crate::panel::{self, Progress};
use crate::recall::{self, RecallMatch};
use crate::sessions::{MessageRole, Session, SessionPatch, SessionStorage, TurnData, DEFAULT_TITLE};
use crate::storage::{KeyValueStore, Result};
use crate::tree::{mark_mastered, TreeNode};

/// Error bubble shown when the backend cannot be reached.
pub const GATEWAY_ERROR_TEXT: &str =
    "⚠️ Something went wrong. Please check if the server is running.";

/// One due concept paired with the most useful past explanation of it.
#[derive(Debug, Clone)]
pub struct ReviewItem {
    pub record: ConceptRecord,
    pub recall: Option<RecallMatch>,
}

/// The learning-assistant engine behind one browser tab.
pub struct Client {
    sessions: SessionStorage,
    concepts: ConceptStorage,
    daily: DailyLog,
    gateway: Box<dyn Gateway>,
}

impl Client {
    pub fn new(store: Arc<dyn KeyValueStore>, gateway: Box<dyn Gateway>) -> Self {
        Self {
            sessions: SessionStorage::new(store.clone()),
            concepts: ConceptStorage::new(store.clone()),
            daily: DailyLog::new(store),
            gateway,
        }
    }

    pub fn sessions(&self) -> &SessionStorage {
        &self.sessions
    }

    pub fn concepts(&self) -> &ConceptStorage {
        &self.concepts
    }

    pub fn daily(&self) -> &DailyLog {
        &self.daily
    }

    /// Run one user turn: persist the user message, exchange it with the
    /// backend and apply the returned deltas. A gateway failure leaves an
    /// error bubble in the history and changes nothing else.
    pub fn send_message(&self, text: &str) -> Result<Session> {
        let session = self
            .sessions
            .append_message(MessageRole::User, text, "message")?;

        let request = ChatRequest {
            message: text.to_string(),
            session_context: SessionContext::from(&session),
        };

        match self.gateway.send(&request) {
            Ok(response) => self.apply_response(response),
            Err(err) => {
                log::warn!("Gateway call failed: {}", err);
                self.sessions
                    .append_message(MessageRole::Bot, GATEWAY_ERROR_TEXT, "error")
            }
        }
    }

    /// Kick off a topic the way the welcome-screen buttons do.
    pub fn quick_start(&self, topic: &str) -> Result<Session> {
        self.send_message(&format!("Learn: {}", topic))
    }

    /// Build the review plan: every concept due today, each paired with
    /// the best past explanation the history can offer.
    pub fn start_review(&self) -> Result<Vec<ReviewItem>> {
        let due = self.concepts.due_today()?;
        if due.is_empty() {
            return Ok(Vec::new());
        }
        let sessions = self.sessions.list()?;
        let now = Utc::now();
        Ok(due
            .into_iter()
            .map(|record| {
                let recall = recall::best_past_explanation(&sessions, &record.concept_id, now);
                ReviewItem { record, recall }
            })
            .collect())
    }

    /// Progress header state for the current session.
    pub fn progress(&self) -> Result<Progress> {
        Ok(panel::progress(&self.sessions.current()?))
    }

    /// The current session's tree with already-mastered concepts re-tagged,
    /// ready for display.
    pub fn tree_view(&self) -> Result<Option<TreeNode>> {
        let session = self.sessions.current()?;
        let Some(tree) = session.tree else {
            return Ok(None);
        };
        let mastered = self.concepts.mastered_ids()?;
        Ok(Some(mark_mastered(&tree, &mastered)))
    }

    fn apply_response(&self, response: ChatResponse) -> Result<Session> {
        self.sessions
            .append_message(MessageRole::Bot, &response.response, &response.kind)?;
        if let Some(update) = response.session_update {
            self.apply_update(update)?;
        }
        if let Some(data) = response.turn_data {
            self.record_turn(data)?;
        }
        self.sessions.current()
    }

    fn apply_update(&self, update: SessionUpdate) -> Result<()> {
        let SessionUpdate {
            tree,
            is_new_tree,
            topic,
            teaching_order,
            current_index,
            waiting_for_synthesis,
            current_question,
            attempt_count,
            target_topic,
            explained_current,
        } = update;

        let resolved_topic = topic.or_else(|| target_topic.clone());

        let mut patch = SessionPatch {
            teaching_order,
            current_index,
            waiting_for_synthesis,
            current_question,
            attempt_count,
            target_topic,
            explained_current,
            ..Default::default()
        };

        match tree {
            Some(tree) if is_new_tree => {
                let topic = resolved_topic
                    .clone()
                    .unwrap_or_else(|| tree.topic.clone());
                self.sessions.merge_topic_tree(tree, &topic)?;
            }
            Some(tree) => patch.tree = Some(tree),
            None => {}
        }

        // The first resolved topic becomes the session title.
        if let Some(topic) = resolved_topic {
            if self.sessions.current()?.title == DEFAULT_TITLE {
                patch.title = Some(topic);
            }
        }

        self.sessions.update(patch)?;
        Ok(())
    }

    /// Append the structured turn and feed its concepts through the memory
    /// engine and the daily log.
    fn record_turn(&self, data: TurnData) -> Result<()> {
        let session_id = self.sessions.current()?.id;
        let turn = self.sessions.append_turn(data)?;

        for concept_id in &turn.concepts {
            self.concepts.ensure(concept_id, "")?;
            if let Some(correct) = turn.correct {
                self.concepts.review_outcome(concept_id, correct)?;
            }
            self.daily.append(concept_id, session_id, turn.turn_number)?;
        }
        Ok(())
    }
}
