//! Audit entry data structures
//!
//! Defines the structure of audit log entries: the operation performed and
//! cleartext snapshots of the record before and after it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Change, EntityId, EntitySnapshot};

use super::diff::{field_changes, summarize};

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Record was created
    Create,
    /// Record was updated
    Update,
    /// Record was deleted
    Delete,
}

impl From<Change> for Operation {
    fn from(change: Change) -> Self {
        match change {
            Change::Added => Operation::Create,
            Change::Modified => Operation::Update,
            Change::Deleted => Operation::Delete,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the entry was recorded (UTC)
    pub timestamp: DateTime<Utc>,

    pub operation: Operation,

    /// Item kind name, e.g. "TaxRegime"
    pub kind: String,

    pub entity_id: EntityId,

    /// Name of the record, taken from its latest state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// State before the operation (for updates/deletes)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<EntitySnapshot>,

    /// State after the operation (for creates/updates)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<EntitySnapshot>,

    /// Human-readable diff summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff_summary: Option<String>,
}

impl AuditEntry {
    /// Build an entry from whichever states are known
    ///
    /// The diff summary is filled in when both states are present.
    pub fn new(
        kind: &str,
        operation: Operation,
        before: Option<EntitySnapshot>,
        after: Option<EntitySnapshot>,
    ) -> Self {
        let latest = after.as_ref().or(before.as_ref());
        let entity_id = latest.map_or(EntityId::new(0), |s| s.id);
        let entity_name = latest.and_then(|s| s.name.clone());
        let diff_summary = match (&before, &after) {
            (Some(before), Some(after)) => summarize(&field_changes(before, after)),
            _ => None,
        };

        Self {
            timestamp: Utc::now(),
            operation,
            kind: kind.to_string(),
            entity_id,
            entity_name,
            before,
            after,
            diff_summary,
        }
    }

    pub fn created(kind: &str, after: EntitySnapshot) -> Self {
        Self::new(kind, Operation::Create, None, Some(after))
    }

    pub fn updated(kind: &str, before: EntitySnapshot, after: EntitySnapshot) -> Self {
        Self::new(kind, Operation::Update, Some(before), Some(after))
    }

    pub fn deleted(kind: &str, before: EntitySnapshot) -> Self {
        Self::new(kind, Operation::Delete, Some(before), None)
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.kind,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(diff) = &self.diff_summary {
            output.push_str(&format!("\n  Changes: {}", diff));
        }

        output
    }
}
