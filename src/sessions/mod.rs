//! Learning sessions
//!
//! One session per conversation thread: chat history, structured turns and
//! the accumulated knowledge state for the topics taught in it. The storage
//! keeps a single persisted map of all sessions plus a pointer to the
//! current one, mirrored on every mutation.

mod models;
mod storage;

pub use models::{
    ChatMessage, ConversationTurn, MessageRole, Session, SessionPatch, SessionSummary, TurnData,
    DEFAULT_TITLE, HISTORY_RETENTION,
};
pub use storage::SessionStorage;
