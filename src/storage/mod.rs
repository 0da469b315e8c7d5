//! Key-value persistence layer
//!
//! The engine never talks to a concrete backend directly: everything goes
//! through the [`KeyValueStore`] capability trait. The real client sits on
//! origin-scoped browser storage; on desktop we persist one JSON document
//! per key under a data directory; tests use the in-memory store.

mod file;
mod kv;
mod memory;

pub use file::FileStore;
pub use kv::{keys, KeyValueStore, Result, StorageError};
pub use memory::MemoryStore;
