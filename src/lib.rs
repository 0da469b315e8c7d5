//! State engine of a conversational learning assistant.
//!
//! The backend does the teaching; this crate owns everything the client
//! keeps locally: sessions with their chat history and knowledge trees,
//! the spaced-repetition concept memory, the daily activity log, and the
//! panel renderings derived from them. [`Client`] ties the stores to a
//! [`Gateway`] implementation and drives one request/response turn at a
//! time.

pub mod client;
pub mod concepts;
pub mod daily;
pub mod gateway;
pub mod panel;
pub mod recall;
pub mod sessions;
pub mod storage;
pub mod tree;

pub use client::{Client, ReviewItem, GATEWAY_ERROR_TEXT};
pub use gateway::{Gateway, GatewayError};
pub use storage::{FileStore, KeyValueStore, MemoryStore, Result, StorageError};
