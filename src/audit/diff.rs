//! Diff generation for audit logging
//!
//! Compares two snapshots of the same record field by field and renders the
//! differences in a user-friendly format.

use serde::{Deserialize, Serialize};

use crate::models::{EntitySnapshot, Field};

/// One changed field, with both values rendered for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: Field,
    pub before: String,
    pub after: String,
}

/// Every user-visible field that differs between two snapshots
pub fn field_changes(before: &EntitySnapshot, after: &EntitySnapshot) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut compare = |field, old: String, new: String| {
        if old != new {
            changes.push(FieldChange {
                field,
                before: old,
                after: new,
            });
        }
    };

    compare(Field::Name, format_text(&before.name), format_text(&after.name));
    compare(
        Field::Description,
        format_text(&before.description),
        format_text(&after.description),
    );
    compare(Field::Class, before.class.clone(), after.class.clone());
    compare(Field::Order, before.order.to_string(), after.order.to_string());
    compare(
        Field::Enabled,
        before.enabled.to_string(),
        after.enabled.to_string(),
    );

    changes
}

/// Join changes into one line, `None` when nothing changed
pub fn summarize(changes: &[FieldChange]) -> Option<String> {
    if changes.is_empty() {
        return None;
    }
    let parts: Vec<String> = changes
        .iter()
        .map(|c| format!("{}: {} -> {}", c.field, c.before, c.after))
        .collect();
    Some(parts.join(", "))
}

/// Format an optional text value for display, truncating long strings
fn format_text(value: &Option<String>) -> String {
    match value {
        None => "null".to_string(),
        Some(s) if s.chars().count() > 50 => {
            let head: String = s.chars().take(47).collect();
            format!("\"{}...\"", head)
        }
        Some(s) => format!("\"{}\"", s),
    }
}
