//! Concept memory
//!
//! Globally-tracked spaced-repetition records, one per concept, independent
//! of any single session. `schedule` holds the pure update formula;
//! `ConceptStorage` persists the record map behind the key-value store.

mod models;
pub mod schedule;
mod storage;

pub use models::{ConceptPatch, ConceptRecord};
pub use storage::ConceptStorage;
