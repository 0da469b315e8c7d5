//! Backend chat gateway
//!
//! The backend is stateless: every request carries the full learning-state
//! snapshot, every response carries the reply text plus an optional sparse
//! session patch and an optional structured turn. Implementations own the
//! transport; the engine only sees these types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sessions::{Session, TurnData};
use crate::tree::{TeachingStep, TreeNode};

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Malformed response: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Stateless request/response exchange with the teaching backend.
pub trait Gateway: Send + Sync {
    fn send(&self, request: &ChatRequest) -> std::result::Result<ChatResponse, GatewayError>;
}

/// One user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub session_context: SessionContext,
}

/// Snapshot of the current session's learning state, sent on every turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionContext {
    pub tree: Option<TreeNode>,
    pub teaching_order: Vec<TeachingStep>,
    pub current_index: usize,
    pub waiting_for_synthesis: bool,
    pub current_question: Option<String>,
    pub attempt_count: u32,
    pub target_topic: Option<String>,
    pub all_topics: Vec<String>,
    pub explained_current: bool,
}

impl From<&Session> for SessionContext {
    fn from(session: &Session) -> Self {
        Self {
            tree: session.tree.clone(),
            teaching_order: session.teaching_order.clone(),
            current_index: session.current_index,
            waiting_for_synthesis: session.waiting_for_synthesis,
            current_question: session.current_question.clone(),
            attempt_count: session.attempt_count,
            target_topic: session.target_topic.clone(),
            all_topics: session.all_topics.clone(),
            explained_current: session.explained_current,
        }
    }
}

/// Backend reply: display text plus the structured deltas to apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    /// Display category ("message", "explanation", "synthesis_question",
    /// "feedback", "tree").
    #[serde(rename = "type", default = "default_response_kind")]
    pub kind: String,
    #[serde(default)]
    pub session_update: Option<SessionUpdate>,
    #[serde(default)]
    pub turn_data: Option<TurnData>,
}

fn default_response_kind() -> String {
    "message".to_string()
}

/// Sparse patch for the current session; absent fields leave the session
/// untouched. A tree arriving with `is_new_tree` goes through the merge
/// fold; without it the tree field is overwritten like any other.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionUpdate {
    pub tree: Option<TreeNode>,
    pub is_new_tree: bool,
    pub topic: Option<String>,
    pub teaching_order: Option<Vec<TeachingStep>>,
    pub current_index: Option<usize>,
    pub waiting_for_synthesis: Option<bool>,
    pub current_question: Option<String>,
    pub attempt_count: Option<u32>,
    pub target_topic: Option<String>,
    pub explained_current: Option<bool>,
}
