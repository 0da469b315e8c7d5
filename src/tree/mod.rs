//! Knowledge trees
//!
//! A session accumulates one prerequisite tree per topic it learns. This
//! module owns the node representation, the fold that merges a new topic's
//! tree into the accumulated one, and the derivations the UI and teaching
//! flow need: the bottom-up teaching order, mastered-node tagging, and a
//! plain-text outline.

mod merge;
mod node;
mod order;

pub use merge::{fold, SENTINEL_TOPIC};
pub use node::{NodeKind, TreeNode};
pub use order::{mark_mastered, teaching_order, TeachingStep};
