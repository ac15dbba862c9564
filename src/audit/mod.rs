//! Audit trail for list changes
//!
//! Turns UPDATE extracts and DIFF lists into audit entries with before/after
//! snapshots, and records them in an append-only audit log.
//!
//! # Example
//!
//! ```rust,ignore
//! use entity_lists::audit::AuditLogger;
//!
//! let logger = AuditLogger::new(paths.audit_log());
//! let extract = data.commit_edit(&mut edit)?;
//! logger.record(&extract)?;
//! ```

mod diff;
mod entry;
mod logger;

pub use diff::{field_changes, summarize, FieldChange};
pub use entry::{AuditEntry, Operation};
pub use logger::AuditLogger;

use crate::error::{ListError, ListResult};
use crate::list::EntityList;
use crate::models::{Change, EntityKind};

/// Audit entries for every classified item of an UPDATE or DIFF list
pub fn trail<K: EntityKind>(changes: &EntityList<K>) -> ListResult<Vec<AuditEntry>> {
    if !changes.style().is_change_set() {
        return Err(ListError::unsupported("audit trail", changes.style()));
    }

    let entries = changes
        .iter()
        .filter_map(|item| {
            let change = item.change()?;
            let prior = changes.base_of(item).map(|base| base.snapshot());
            let current = item.snapshot();
            let (before, after) = match change {
                Change::Added => (None, Some(current)),
                Change::Modified => (prior, Some(current)),
                Change::Deleted => (prior.or(Some(current)), None),
            };
            Some(AuditEntry::new(K::KIND_NAME, change.into(), before, after))
        })
        .collect();
    Ok(entries)
}
