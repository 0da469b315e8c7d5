use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::node::{NodeKind, TreeNode};

/// One entry of the linear teaching plan derived from a tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeachingStep {
    pub topic: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub explanation: String,
}

/// Derive the bottom-up teaching sequence: post-order traversal, so every
/// prerequisite comes before the concept that needs it. Topics are
/// deduplicated case-insensitively, keeping the first occurrence.
pub fn teaching_order(root: &TreeNode) -> Vec<TeachingStep> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    walk(root, &mut order, &mut seen);
    order
}

fn walk(node: &TreeNode, order: &mut Vec<TeachingStep>, seen: &mut HashSet<String>) {
    for child in &node.children {
        walk(child, order, seen);
    }
    let key = node.topic.trim().to_lowercase();
    if seen.insert(key) {
        order.push(TeachingStep {
            topic: node.topic.clone(),
            kind: node.kind.clone(),
            explanation: node.explanation.clone().unwrap_or_default(),
        });
    }
}

/// Re-tag every node whose topic is in `mastered` (lowercased ids) as
/// `MASTERED`, leaving the rest of the tree untouched. Used to gray out
/// already-known concepts before display.
pub fn mark_mastered(node: &TreeNode, mastered: &HashSet<String>) -> TreeNode {
    let kind = if mastered.contains(&node.topic.trim().to_lowercase()) {
        NodeKind::Mastered
    } else {
        node.kind.clone()
    };
    TreeNode {
        topic: node.topic.clone(),
        kind,
        explanation: node.explanation.clone(),
        children: node
            .children
            .iter()
            .map(|child| mark_mastered(child, mastered))
            .collect(),
    }
}
