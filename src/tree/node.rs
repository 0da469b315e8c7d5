use serde::{Deserialize, Serialize};

/// Tag on a tree node. The backend emits uppercase strings and may add new
/// ones at any time, so unknown tags round-trip through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Root,
    Concept,
    Fact,
    Leaf,
    Mastered,
    Other(String),
}

impl Default for NodeKind {
    fn default() -> Self {
        Self::Concept
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "ROOT" => NodeKind::Root,
            "CONCEPT" => NodeKind::Concept,
            "FACT" => NodeKind::Fact,
            "LEAF" => NodeKind::Leaf,
            "MASTERED" => NodeKind::Mastered,
            _ => NodeKind::Other(s),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Root => "ROOT".to_string(),
            NodeKind::Concept => "CONCEPT".to_string(),
            NodeKind::Fact => "FACT".to_string(),
            NodeKind::Leaf => "LEAF".to_string(),
            NodeKind::Mastered => "MASTERED".to_string(),
            NodeKind::Other(s) => s,
        }
    }
}

/// One node of a prerequisite tree. Each child is owned by exactly one
/// parent; there are no back-references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub topic: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn new(topic: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            topic: topic.into(),
            kind,
            explanation: None,
            children: Vec::new(),
        }
    }

    /// Render the subtree as an indented text outline, facts marked.
    pub fn to_text(&self) -> String {
        let mut lines = Vec::new();
        self.write_lines(0, &mut lines);
        lines.join("\n")
    }

    fn write_lines(&self, indent: usize, lines: &mut Vec<String>) {
        let marker = if self.kind == NodeKind::Fact {
            " [FACT]"
        } else {
            ""
        };
        lines.push(format!("{}├─ {}{}", "  ".repeat(indent), self.topic, marker));
        for child in &self.children {
            child.write_lines(indent + 1, lines);
        }
    }
}
