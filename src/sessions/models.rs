use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tree::{fold, TeachingStep, TreeNode};

/// Title given to a session until its first topic resolves.
pub const DEFAULT_TITLE: &str = "New Chat";

/// Chat history keeps this many messages; older ones are dropped.
pub const HISTORY_RETENTION: usize = 200;

/// One learning conversation thread with its accumulated knowledge state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Accumulated knowledge tree; absent until the first topic is learned.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<TreeNode>,
    #[serde(default)]
    pub teaching_order: Vec<TeachingStep>,
    #[serde(default)]
    pub current_index: usize,
    #[serde(default)]
    pub waiting_for_synthesis: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question: Option<String>,
    #[serde(default)]
    pub attempt_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_topic: Option<String>,
    #[serde(default)]
    pub all_topics: Vec<String>,
    #[serde(default)]
    pub explained_current: bool,

    #[serde(default)]
    pub chat_history: Vec<ChatMessage>,
    #[serde(default)]
    pub conversation_turns: Vec<ConversationTurn>,
    /// Source of turn numbers; never decremented, so numbers are unique
    /// for the life of the session.
    #[serde(default)]
    pub turn_counter: u64,
}

impl Session {
    pub fn new(title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            created_at: now,
            updated_at: now,
            tree: None,
            teaching_order: Vec::new(),
            current_index: 0,
            waiting_for_synthesis: false,
            current_question: None,
            attempt_count: 0,
            target_topic: None,
            all_topics: Vec::new(),
            explained_current: false,
            chat_history: Vec::new(),
            conversation_turns: Vec::new(),
            turn_counter: 0,
        }
    }

    pub(super) fn push_message(&mut self, message: ChatMessage) {
        self.chat_history.push(message);
        if self.chat_history.len() > HISTORY_RETENTION {
            let excess = self.chat_history.len() - HISTORY_RETENTION;
            self.chat_history.drain(..excess);
        }
    }

    pub(super) fn next_turn(&mut self, data: TurnData) -> ConversationTurn {
        self.turn_counter += 1;
        let turn = ConversationTurn {
            turn_number: self.turn_counter,
            timestamp: Utc::now(),
            user: data.user,
            concepts: data.concepts,
            explanation: data.explanation,
            check_question: data.check_question,
            user_answer: data.user_answer,
            correct: data.correct,
        };
        self.conversation_turns.push(turn.clone());
        turn
    }

    /// Fold a freshly-taught topic's tree into this session's accumulated
    /// tree. The first topic is adopted verbatim and resets `all_topics`;
    /// later topics accumulate under the sentinel wrapper and append their
    /// name if it is not already listed.
    pub(super) fn merge_topic_tree(&mut self, incoming: TreeNode, topic: String) {
        let had_tree = self.tree.is_some();
        self.tree = Some(fold(self.tree.take(), incoming));
        if !had_tree {
            self.all_topics = vec![topic.clone()];
        } else if !self.all_topics.contains(&topic) {
            self.all_topics.push(topic.clone());
        }
        self.target_topic = Some(topic);
    }
}

/// A lightweight row for the session list, without messages or turns.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_topic: Option<String>,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Bot,
}

/// One display message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Display category ("message", "explanation", "error", ...), open set.
    #[serde(rename = "type", default = "default_message_kind")]
    pub kind: String,
    pub rendered_time: String,
}

fn default_message_kind() -> String {
    "message".to_string()
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: &str, kind: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            kind: kind.to_string(),
            rendered_time: Local::now().format("%H:%M").to_string(),
        }
    }
}

/// One structured teaching exchange, as persisted in a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub turn_number: u64,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concepts: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct: Option<bool>,
}

/// Turn payload as delivered by the backend; number and timestamp are
/// assigned at append time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnData {
    pub user: Option<String>,
    pub concepts: Vec<String>,
    pub explanation: Option<String>,
    pub check_question: Option<String>,
    pub user_answer: Option<String>,
    pub correct: Option<bool>,
}

/// Sparse update applied to the current session; unset fields are left
/// unchanged.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub title: Option<String>,
    pub tree: Option<TreeNode>,
    pub teaching_order: Option<Vec<TeachingStep>>,
    pub current_index: Option<usize>,
    pub waiting_for_synthesis: Option<bool>,
    pub current_question: Option<String>,
    pub attempt_count: Option<u32>,
    pub target_topic: Option<String>,
    pub all_topics: Option<Vec<String>>,
    pub explained_current: Option<bool>,
}

impl SessionPatch {
    pub(super) fn apply_to(self, session: &mut Session) {
        if let Some(title) = self.title {
            session.title = title;
        }
        if let Some(tree) = self.tree {
            session.tree = Some(tree);
        }
        if let Some(teaching_order) = self.teaching_order {
            session.teaching_order = teaching_order;
        }
        if let Some(current_index) = self.current_index {
            session.current_index = current_index;
        }
        if let Some(waiting_for_synthesis) = self.waiting_for_synthesis {
            session.waiting_for_synthesis = waiting_for_synthesis;
        }
        if let Some(current_question) = self.current_question {
            session.current_question = Some(current_question);
        }
        if let Some(attempt_count) = self.attempt_count {
            session.attempt_count = attempt_count;
        }
        if let Some(target_topic) = self.target_topic {
            session.target_topic = Some(target_topic);
        }
        if let Some(all_topics) = self.all_topics {
            session.all_topics = all_topics;
        }
        if let Some(explained_current) = self.explained_current {
            session.explained_current = explained_current;
        }
    }
}
