//! Edit sessions
//!
//! An EDIT list is a field-for-field copy of a CORE list whose base arena
//! holds the CORE state at the time the session began. Edits touch only the
//! copies. The update extract compares each copy against its base; commit
//! turns the session itself into the new CORE list.

use tracing::{debug, info, warn};

use crate::error::{ListError, ListResult};
use crate::models::{BaseRef, Change, EncryptedField, Entity, EntityId, EntityKind, ErrorSet};

use super::{EntityList, ListStyle};

impl<K: EntityKind> EntityList<K> {
    /// Start an edit session over this CORE list
    pub fn to_edit_list(&self) -> ListResult<EntityList<K>> {
        self.require(ListStyle::Core, "to_edit_list")?;

        let mut edit = self.derived(ListStyle::Edit);
        edit.bases = self
            .items
            .iter()
            .map(|item| Entity::derive_from(item, None))
            .collect();
        edit.items = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| Entity::derive_from(item, Some(BaseRef::new(index))))
            .collect();

        debug!(kind = K::KIND_NAME, items = edit.items.len(), "Opened edit session");
        Ok(edit)
    }

    /// Insert a blank item into an edit session
    ///
    /// The item gets a provisional (negative) id and the next free order,
    /// and is handed to `populate` before being validated. Validation errors
    /// stay on the item.
    pub fn add_new_item<F>(&mut self, class: K::Class, populate: F) -> ListResult<EntityId>
    where
        F: FnOnce(&mut Entity<K>),
    {
        self.require(ListStyle::Edit, "add_new_item")?;

        let order = self.next_order()?;
        let id = self.next_provisional_id()?;

        let mut entity = Entity::new(
            id,
            self.control_id,
            class,
            EncryptedField::from_cleartext(String::new()),
        );
        entity.set_order(order);
        populate(&mut entity);

        let index = self.insert_sorted(entity);
        self.validate_at(index);

        debug!(kind = K::KIND_NAME, id = %id, "Inserted new item into edit session");
        Ok(id)
    }

    /// Change one item of an edit session
    ///
    /// The item is re-validated afterwards; returns whether it is valid.
    pub fn edit_item<F>(&mut self, id: EntityId, edit: F) -> ListResult<bool>
    where
        F: FnOnce(&mut Entity<K>),
    {
        self.require(ListStyle::Edit, "edit_item")?;

        let index = self.position(id)?;
        edit(&mut self.items[index]);
        self.resort();
        self.validate_item(id)
    }

    /// Remove an item from an edit session
    ///
    /// If the item came from the CORE list its base stays in the arena and
    /// the update extract reports it as deleted.
    pub fn remove_item(&mut self, id: EntityId) -> ListResult<Entity<K>> {
        self.require(ListStyle::Edit, "remove_item")?;

        let index = self.position(id)?;
        let removed = self.items.remove(index);
        debug!(kind = K::KIND_NAME, id = %id, "Removed item from edit session");
        Ok(removed)
    }

    /// Items of this session that differ from the CORE state
    ///
    /// Added and modified items come first in session order, followed by
    /// deleted items in CORE order. Modified and deleted items link to a copy
    /// of their prior state.
    pub fn to_update_extract(&self) -> ListResult<EntityList<K>> {
        self.require(ListStyle::Edit, "to_update_extract")?;

        let mut update = self.derived(ListStyle::Update);
        let mut referenced = vec![false; self.bases.len()];

        for item in &self.items {
            let base = item.base().and_then(|handle| {
                referenced[handle.index()] = true;
                self.bases.get(handle.index())
            });

            match base {
                None => update
                    .items
                    .push(Entity::derive_from(item, None).with_change(Change::Added)),
                Some(base) if item.is_identical(base) => {}
                Some(base) => {
                    let handle = update.push_base(Entity::derive_from(base, None));
                    let modified = Entity::derive_from(item, Some(handle));
                    update.items.push(modified.with_change(Change::Modified));
                }
            }
        }

        for (index, base) in self.bases.iter().enumerate() {
            if referenced[index] {
                continue;
            }
            let handle = update.push_base(Entity::derive_from(base, None));
            let mut deleted = Entity::derive_from(base, Some(handle)).with_change(Change::Deleted);
            deleted.set_enabled(false);
            update.items.push(deleted);
        }

        debug!(kind = K::KIND_NAME, changes = update.items.len(), "Built update extract");
        Ok(update)
    }

    /// Finish the session, turning this list into the new CORE list
    ///
    /// Every item is validated first; if any fails, the session stays open
    /// with the errors recorded and the first failure is returned.
    /// Provisional ids are replaced by permanent ones before the update
    /// extract is built, so the extract carries the final ids.
    pub fn commit(&mut self) -> ListResult<EntityList<K>> {
        self.require(ListStyle::Edit, "commit")?;

        self.validate_all();
        if let Some(invalid) = self.first_invalid() {
            let invalid_count = self.items.iter().filter(|e| e.has_errors()).count();
            warn!(
                kind = K::KIND_NAME,
                id = %invalid.id(),
                invalid = invalid_count,
                "Commit refused"
            );
            return Err(ListError::Validation {
                kind: K::KIND_NAME,
                id: invalid.id(),
                errors: invalid.errors().clone(),
            });
        }

        let pending: Vec<usize> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, item)| item.base().is_none() && item.id().is_provisional())
            .map(|(index, _)| index)
            .collect();
        let mut assigned = Vec::with_capacity(pending.len());
        for _ in &pending {
            let id = self.next_id()?;
            self.claim_id(id);
            assigned.push(id);
        }
        for (index, id) in pending.into_iter().zip(assigned) {
            self.items[index].set_id(id);
        }

        let extract = self.to_update_extract()?;

        for item in &mut self.items {
            item.set_base(None);
            item.set_errors(ErrorSet::new());
        }
        self.bases.clear();
        self.next_provisional = -1;
        self.style = ListStyle::Core;
        self.resort();

        info!(
            kind = K::KIND_NAME,
            added = extract.with_change(Change::Added).count(),
            modified = extract.with_change(Change::Modified).count(),
            deleted = extract.with_change(Change::Deleted).count(),
            "Committed edit session"
        );
        Ok(extract)
    }
}
