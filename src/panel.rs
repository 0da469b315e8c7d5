//! Sidebar panel rendering
//!
//! Plain-text renditions of the sidebar panels: the concept memory, the
//! daily activity log, the current session's structured turns, the tree
//! outline and the progress header. Everything here is a pure formatter
//! over already-loaded state.

use std::collections::HashSet;

use chrono::{NaiveDate, SecondsFormat};

use crate::concepts::ConceptRecord;
use crate::daily::DailyEntry;
use crate::sessions::Session;
use crate::tree::{NodeKind, TreeNode};

/// Placeholder shown before the first topic produces a tree.
pub const EMPTY_TREE_TEXT: &str = "Ask me to learn a topic to see the tree here.";

const EXPLANATION_PREVIEW_CHARS: usize = 200;

/// The memory panel: one block per tracked concept, in the given order.
pub fn memory_overview(records: &[ConceptRecord]) -> String {
    if records.is_empty() {
        return "(no concepts learned yet)".to_string();
    }
    let mut text = String::new();
    for record in records {
        text.push_str(&format!("## {}\n", record.concept_id));
        text.push_str(&format!("name: {}\n", record.name));
        text.push_str(&format!("first_learned: {}\n", record.first_learned));
        text.push_str(&format!("last_reviewed: {}\n", record.last_reviewed));
        text.push_str(&format!("repetition: {}\n", record.repetition));
        text.push_str(&format!("ease: {:.1}\n", record.ease));
        text.push_str(&format!("next_review: {}\n", record.next_review));
        text.push_str(&format!("mastered: {}\n\n", record.mastered));
    }
    text
}

/// The daily panel: every concept touched on `date`, in log order.
pub fn daily_log(date: NaiveDate, entries: &[DailyEntry]) -> String {
    if entries.is_empty() {
        return "(no activity today)".to_string();
    }
    let mut text = format!("# Daily log {}\n\n## Concepts\n", date);
    for entry in entries {
        text.push_str(&format!("- concept_id: {}\n", entry.concept_id));
        text.push_str(&format!("  session: {}\n", entry.session_id));
        text.push_str(&format!("  turn: {}\n", entry.turn_number));
        text.push_str(&format!(
            "  time: {}\n",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
    }
    text
}

/// The conversation panel: the session's structured turns, long
/// explanations cut to a preview.
pub fn conversation_log(session: &Session) -> String {
    if session.conversation_turns.is_empty() {
        return "(no structured turns yet)".to_string();
    }
    let mut text = format!(
        "# Conversation {}\ndate: {}\n\n",
        session.id,
        session.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    );
    for turn in &session.conversation_turns {
        text.push_str(&format!("## Turn {}\n", turn.turn_number));
        text.push_str(&format!("user: {}\n", turn.user.as_deref().unwrap_or("")));
        text.push_str(&format!("concepts: {}\n", turn.concepts.join(", ")));
        if let Some(explanation) = &turn.explanation {
            let preview: String = explanation.chars().take(EXPLANATION_PREVIEW_CHARS).collect();
            text.push_str(&format!("explanation: {}...\n", preview));
        }
        if let Some(question) = &turn.check_question {
            text.push_str(&format!("check_question: {}\n", question));
        }
        if let Some(answer) = &turn.user_answer {
            text.push_str(&format!("user_answer: {}\n", answer));
        }
        if let Some(correct) = turn.correct {
            text.push_str(&format!("correct: {}\n", correct));
        }
        text.push('\n');
    }
    text
}

/// Progress header state derived from one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: u8,
    pub label: String,
    /// Header subtitle; only present once a topic is being taught.
    pub status: Option<String>,
}

pub fn progress(session: &Session) -> Progress {
    let total = session.teaching_order.len();
    let completed = session.current_index.min(total);
    let percent = if total > 0 {
        ((completed as f64 / total as f64) * 100.0).round() as u8
    } else {
        0
    };

    let label = if session.current_index < total {
        format!(
            "Now learning: {}",
            session.teaching_order[session.current_index].topic
        )
    } else if let Some(target) = &session.target_topic {
        format!("Topic: {}", target)
    } else {
        String::new()
    };

    let status = session.target_topic.as_ref().map(|_| {
        if session.waiting_for_synthesis {
            "Synthesis question".to_string()
        } else {
            format!("Step {} of {}", session.current_index + 1, total)
        }
    });

    Progress {
        completed,
        total,
        percent,
        label,
        status,
    }
}

/// Banner text for the review nudge, or `None` when nothing is due.
pub fn review_banner(due_count: usize) -> Option<String> {
    if due_count == 0 {
        return None;
    }
    let plural = if due_count > 1 { "s" } else { "" };
    Some(format!("{} concept{} due for review", due_count, plural))
}

/// The tree panel: an indented outline with a status icon per node.
///
/// A node already taught (before the current step) or known to be mastered
/// gets a check mark, the step being taught gets an arrow, facts get a
/// diamond and everything else a circle.
pub fn tree_outline(session: &Session, mastered: &HashSet<String>) -> String {
    let Some(tree) = &session.tree else {
        return EMPTY_TREE_TEXT.to_string();
    };
    let order: Vec<String> = session
        .teaching_order
        .iter()
        .map(|step| step.topic.trim().to_lowercase())
        .collect();
    let mut text = String::new();
    outline_node(tree, 0, session.current_index, &order, mastered, &mut text);
    text
}

fn outline_node(
    node: &TreeNode,
    depth: usize,
    current_index: usize,
    order: &[String],
    mastered: &HashSet<String>,
    out: &mut String,
) {
    let topic_lower = node.topic.trim().to_lowercase();
    let order_index = order.iter().position(|topic| *topic == topic_lower);

    let icon = if node.kind == NodeKind::Mastered || mastered.contains(&topic_lower) {
        '✓'
    } else if order_index.map_or(false, |i| i < current_index) {
        '✓'
    } else if order_index == Some(current_index) {
        '▶'
    } else if node.kind == NodeKind::Fact {
        '◆'
    } else {
        '○'
    };

    out.push_str(&"  ".repeat(depth));
    out.push(icon);
    out.push(' ');
    out.push_str(&node.topic);
    out.push('\n');

    for child in &node.children {
        outline_node(child, depth + 1, current_index, order, mastered, out);
    }
}
