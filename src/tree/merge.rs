use super::node::{NodeKind, TreeNode};

/// Topic of the synthetic root introduced when a session accumulates a
/// second tree.
pub const SENTINEL_TOPIC: &str = "Session Knowledge";

/// Fold a newly-taught tree into a session's accumulated tree.
///
/// The first tree is adopted as-is. The second one triggers the single
/// re-wrap: both trees become children of a sentinel root. From then on
/// new trees are appended flat as further children; an already-wrapped
/// tree is never wrapped again, so each topic's internal structure stays
/// intact.
pub fn fold(existing: Option<TreeNode>, incoming: TreeNode) -> TreeNode {
    match existing {
        None => incoming,
        Some(mut current) => {
            if current.topic == SENTINEL_TOPIC && current.kind == NodeKind::Root {
                current.children.push(incoming);
                current
            } else {
                TreeNode {
                    topic: SENTINEL_TOPIC.to_string(),
                    kind: NodeKind::Root,
                    explanation: None,
                    children: vec![current, incoming],
                }
            }
        }
    }
}
