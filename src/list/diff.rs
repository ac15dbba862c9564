//! Structural comparison of two snapshots

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{ListError, ListResult};
use crate::models::{Change, Entity, EntityId, EntityKind};

use super::{EntityList, ListStyle};

impl<K: EntityKind> EntityList<K> {
    /// Compare this snapshot against an earlier one of the same kind
    ///
    /// Records are matched by id. Added items (no base) and modified items
    /// (linked to a copy of their previous state) come first, interleaved in
    /// this list's order. Deleted items follow in `previous` order as
    /// disabled copies of their previous state. Unchanged records are left
    /// out.
    pub fn diff_against(&self, previous: &EntityList<K>) -> ListResult<EntityList<K>> {
        for style in [self.style, previous.style] {
            if !style.is_snapshot() {
                return Err(ListError::unsupported("diff_against", style));
            }
        }

        let previous_by_id: HashMap<EntityId, &Entity<K>> =
            previous.items.iter().map(|e| (e.id(), e)).collect();
        let mut diff = self.derived(ListStyle::Diff);

        for item in &self.items {
            match previous_by_id.get(&item.id()) {
                None => diff
                    .items
                    .push(Entity::derive_from(item, None).with_change(Change::Added)),
                Some(prior) if item.is_identical(prior) => {}
                Some(prior) => {
                    let handle = diff.push_base(Entity::derive_from(prior, None));
                    let modified = Entity::derive_from(item, Some(handle));
                    diff.items.push(modified.with_change(Change::Modified));
                }
            }
        }

        let current_ids: HashSet<EntityId> = self.items.iter().map(|e| e.id()).collect();
        for prior in previous.items.iter().filter(|e| !current_ids.contains(&e.id())) {
            let handle = diff.push_base(Entity::derive_from(prior, None));
            let mut deleted = Entity::derive_from(prior, Some(handle)).with_change(Change::Deleted);
            deleted.set_enabled(false);
            diff.items.push(deleted);
        }

        debug!(
            kind = K::KIND_NAME,
            current = self.items.len(),
            previous = previous.items.len(),
            changes = diff.items.len(),
            "Computed diff"
        );
        Ok(diff)
    }
}
