//! The generic entity list
//!
//! A list owns its entities outright. Derived lists (EDIT, UPDATE, DIFF) also
//! own a base arena: value copies of the prior states their entities link to
//! through [`BaseRef`] handles. Nothing in a list ever aliases another list.

use std::fmt;

use tracing::debug;

use crate::crypto::{EncryptedData, KeyResolver, SharedKeys};
use crate::error::{ListError, ListResult};
use crate::models::{BaseRef, Change, ControlId, Entity, EntityId, EntityKind, Field};

use super::ListStyle;

/// Persistable form of one item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedRecord {
    pub id: EntityId,
    pub control_id: ControlId,
    pub change: Option<Change>,
    pub name: EncryptedData,
    pub description: Option<EncryptedData>,
}

pub struct EntityList<K: EntityKind> {
    pub(super) style: ListStyle,
    pub(super) control_id: ControlId,
    pub(super) keys: SharedKeys,
    pub(super) items: Vec<Entity<K>>,
    pub(super) bases: Vec<Entity<K>>,
    pub(super) next_provisional: i32,
    /// Highest permanent id this list or its ancestors ever allocated
    pub(super) high_water: i32,
}

impl<K: EntityKind> EntityList<K> {
    /// Create an empty CORE list sealing new items under `control_id`
    pub fn new(control_id: ControlId, keys: SharedKeys) -> Self {
        Self::with_style(ListStyle::Core, control_id, keys)
    }

    pub(super) fn with_style(style: ListStyle, control_id: ControlId, keys: SharedKeys) -> Self {
        Self {
            style,
            control_id,
            keys,
            items: Vec::new(),
            bases: Vec::new(),
            next_provisional: -1,
            high_water: 0,
        }
    }

    /// An empty list of the given style sharing this list's binding
    pub(super) fn derived(&self, style: ListStyle) -> Self {
        let mut list = Self::with_style(style, self.control_id, self.keys.clone());
        list.high_water = self.high_water;
        list
    }

    pub fn style(&self) -> ListStyle {
        self.style
    }

    /// Control id new items are sealed under
    pub fn control_id(&self) -> ControlId {
        self.control_id
    }

    pub fn keys(&self) -> &dyn KeyResolver {
        &*self.keys
    }

    pub(crate) fn shared_keys(&self) -> &SharedKeys {
        &self.keys
    }

    /// Singular item name of the kind, e.g. "TaxRegime"
    pub fn item_kind_name(&self) -> &'static str {
        K::KIND_NAME
    }

    pub fn list_name(&self) -> &'static str {
        K::LIST_NAME
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in list order
    pub fn iter(&self) -> impl Iterator<Item = &Entity<K>> {
        self.items.iter()
    }

    /// Enabled items in list order
    pub fn active(&self) -> impl Iterator<Item = &Entity<K>> {
        self.items.iter().filter(|e| e.is_enabled())
    }

    pub fn find_by_id(&self, id: EntityId) -> Option<&Entity<K>> {
        self.items.iter().find(|e| e.id() == id)
    }

    /// Look up by cleartext name, preferring an enabled item
    pub fn find_by_name(&self, name: &str) -> Option<&Entity<K>> {
        let mut matches = self.items.iter().filter(|e| e.name() == Some(name));
        let first = matches.next()?;
        if first.is_enabled() {
            return Some(first);
        }
        matches.find(|e| e.is_enabled()).or(Some(first))
    }

    /// The prior state an item links to, if any
    pub fn base_of(&self, entity: &Entity<K>) -> Option<&Entity<K>> {
        entity.base().and_then(|base| self.bases.get(base.index()))
    }

    /// Items carrying the given change tag
    pub fn with_change(&self, change: Change) -> impl Iterator<Item = &Entity<K>> {
        self.items
            .iter()
            .filter(move |e| e.change() == Some(change))
    }

    /// Validate every item, recording errors on each
    ///
    /// Returns true when no item has errors.
    pub fn validate_all(&mut self) -> bool {
        for index in 0..self.items.len() {
            self.validate_at(index);
        }
        self.items.iter().all(|e| !e.has_errors())
    }

    /// Re-run validation for one item
    pub fn validate_item(&mut self, id: EntityId) -> ListResult<bool> {
        let index = self.position(id)?;
        self.validate_at(index);
        Ok(!self.items[index].has_errors())
    }

    /// First item with recorded errors
    pub fn first_invalid(&self) -> Option<&Entity<K>> {
        self.items.iter().find(|e| e.has_errors())
    }

    /// Move every item to a new control id
    ///
    /// Cached ciphertext is dropped so each item is resealed under the new
    /// key on its next persistence.
    pub fn rekey(&mut self, control_id: ControlId) -> ListResult<()> {
        if self.style.is_read_only() {
            return Err(ListError::unsupported("rekey", self.style));
        }
        self.keys.resolve(control_id)?;

        let keys = self.keys.clone();
        for item in &mut self.items {
            item.move_to_control(control_id, &*keys)?;
        }
        self.control_id = control_id;

        debug!(
            kind = K::KIND_NAME,
            control = %control_id,
            items = self.items.len(),
            "Rekeyed list"
        );
        Ok(())
    }

    /// Seal every item under its control key for persistence
    ///
    /// Cached ciphertext is reused; stale or missing ciphertext is produced.
    pub fn seal_all(&mut self) -> ListResult<Vec<SealedRecord>> {
        let keys = self.keys.clone();
        let mut records = Vec::with_capacity(self.items.len());
        for item in &mut self.items {
            let name = item.name_ciphertext(&*keys)?.clone();
            let description = item.description_ciphertext(&*keys)?.cloned();
            records.push(SealedRecord {
                id: item.id(),
                control_id: item.control_id(),
                change: item.change(),
                name,
                description,
            });
        }
        Ok(records)
    }

    /// Adopt a standalone snapshot as the authoritative list of a dataset
    pub(crate) fn into_core(mut self) -> ListResult<Self> {
        if !self.style.is_snapshot() {
            return Err(ListError::unsupported("into_core", self.style));
        }
        self.style = ListStyle::Core;
        Ok(self)
    }

    pub(super) fn validate_at(&mut self, index: usize) {
        let errors = self.items[index].check(self);
        self.items[index].set_errors(errors);
    }

    pub(super) fn position(&self, id: EntityId) -> ListResult<usize> {
        self.items
            .iter()
            .position(|e| e.id() == id)
            .ok_or(ListError::NotFound {
                kind: K::KIND_NAME,
                id,
            })
    }

    pub(super) fn require(&self, style: ListStyle, operation: &'static str) -> ListResult<()> {
        if self.style == style {
            Ok(())
        } else {
            Err(ListError::unsupported(operation, self.style))
        }
    }

    /// Insert keeping (order, id) ordering; returns the index
    pub(super) fn insert_sorted(&mut self, entity: Entity<K>) -> usize {
        let key = (entity.order(), entity.id());
        let index = self
            .items
            .partition_point(|e| (e.order(), e.id()) < key);
        self.items.insert(index, entity);
        index
    }

    pub(super) fn resort(&mut self) {
        self.items.sort_by_key(|e| (e.order(), e.id()));
    }

    pub(super) fn push_base(&mut self, entity: Entity<K>) -> BaseRef {
        self.bases.push(entity);
        BaseRef::new(self.bases.len() - 1)
    }

    /// Next permanent id, never reusing one that was handed out before
    pub(super) fn next_id(&self) -> ListResult<EntityId> {
        let max = self
            .items
            .iter()
            .chain(self.bases.iter())
            .map(|e| e.id().value())
            .fold(self.high_water.max(0), i32::max);
        max.checked_add(1)
            .map(EntityId::new)
            .ok_or(ListError::Exhausted {
                kind: K::KIND_NAME,
                field: Field::Id,
            })
    }

    pub(super) fn next_order(&self) -> ListResult<i32> {
        match self.items.iter().map(|e| e.order()).max() {
            None => Ok(0),
            Some(max) => max.checked_add(1).ok_or(ListError::Exhausted {
                kind: K::KIND_NAME,
                field: Field::Order,
            }),
        }
    }

    pub(super) fn next_provisional_id(&mut self) -> ListResult<EntityId> {
        let id = EntityId::new(self.next_provisional);
        self.next_provisional =
            self.next_provisional
                .checked_sub(1)
                .ok_or(ListError::Exhausted {
                    kind: K::KIND_NAME,
                    field: Field::Id,
                })?;
        Ok(id)
    }

    /// Record a permanent id as allocated
    pub(super) fn claim_id(&mut self, id: EntityId) {
        self.high_water = self.high_water.max(id.value());
    }

    pub(super) fn name_in_use(&self, name: &str) -> bool {
        self.items
            .iter()
            .any(|e| e.is_enabled() && e.name() == Some(name))
    }
}

impl<K: EntityKind> fmt::Debug for EntityList<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityList")
            .field("kind", &K::LIST_NAME)
            .field("style", &self.style)
            .field("control_id", &self.control_id)
            .field("items", &self.items)
            .finish()
    }
}

impl<'a, K: EntityKind> IntoIterator for &'a EntityList<K> {
    type Item = &'a Entity<K>;
    type IntoIter = std::slice::Iter<'a, Entity<K>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
