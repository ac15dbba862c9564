//! The generic versioned entity
//!
//! An entity is one record of a reference-data or transaction list: identity,
//! enabled flag, sort order, class tag and its encrypted name and description.
//! Entities in derived lists also carry a base link to their prior state and,
//! for change extracts and diffs, the kind of change they represent.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::crypto::{EncryptedData, KeyResolver};
use crate::error::ListResult;
use crate::list::EntityList;

use super::{ClassTag, ControlId, EncryptedField, EntityId, EntityKind, ErrorSet, Field};
use super::ValidationFailure;

/// Handle to the prior state of an entity in its list's base arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BaseRef(usize);

impl BaseRef {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }
}

/// How an entity in an update extract or diff differs from its prior state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Change {
    Added,
    Modified,
    Deleted,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Change::Added => write!(f, "ADDED"),
            Change::Modified => write!(f, "MODIFIED"),
            Change::Deleted => write!(f, "DELETED"),
        }
    }
}

/// Cleartext view of an entity, used for audit records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub control_id: ControlId,
    pub enabled: bool,
    pub order: i32,
    pub class: String,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single versioned record
pub struct Entity<K: EntityKind> {
    id: EntityId,
    control_id: ControlId,
    enabled: bool,
    order: i32,
    class: K::Class,
    name: EncryptedField,
    description: Option<EncryptedField>,
    base: Option<BaseRef>,
    change: Option<Change>,
    errors: ErrorSet,
}

impl<K: EntityKind> Entity<K> {
    pub(crate) fn new(
        id: EntityId,
        control_id: ControlId,
        class: K::Class,
        name: EncryptedField,
    ) -> Self {
        Self {
            id,
            control_id,
            enabled: true,
            order: 0,
            class,
            name,
            description: None,
            base: None,
            change: None,
            errors: ErrorSet::new(),
        }
    }

    /// Copy every field of `source`, linking back to it through `base`
    ///
    /// Validation errors and change tags are not carried over.
    pub(crate) fn derive_from(source: &Entity<K>, base: Option<BaseRef>) -> Self {
        Self {
            id: source.id,
            control_id: source.control_id,
            enabled: source.enabled,
            order: source.order,
            class: source.class,
            name: source.name.clone(),
            description: source.description.clone(),
            base,
            change: None,
            errors: ErrorSet::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn control_id(&self) -> ControlId {
        self.control_id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn class(&self) -> K::Class {
        self.class
    }

    /// Cleartext name; always present for entities held in a list
    pub fn name(&self) -> Option<&str> {
        self.name.cleartext()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_ref().and_then(|d| d.cleartext())
    }

    pub fn name_field(&self) -> &EncryptedField {
        &self.name
    }

    pub fn description_field(&self) -> Option<&EncryptedField> {
        self.description.as_ref()
    }

    /// Handle of the prior state in the owning list, see [`EntityList::base_of`]
    pub fn base(&self) -> Option<BaseRef> {
        self.base
    }

    pub fn change(&self) -> Option<Change> {
        self.change
    }

    pub fn errors(&self) -> &ErrorSet {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name.set_cleartext(name);
    }

    pub fn set_description(&mut self, description: Option<String>) {
        let Some(value) = description else {
            self.description = None;
            return;
        };
        if let Some(field) = self.description.as_mut() {
            field.set_cleartext(value);
        } else {
            self.description = Some(EncryptedField::from_cleartext(value));
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_order(&mut self, order: i32) {
        self.order = order;
    }

    pub(crate) fn set_description_field(&mut self, field: Option<EncryptedField>) {
        self.description = field;
    }

    pub(crate) fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    pub(crate) fn set_base(&mut self, base: Option<BaseRef>) {
        self.base = base;
    }

    pub(crate) fn with_change(mut self, change: Change) -> Self {
        self.change = Some(change);
        self
    }

    pub(crate) fn set_errors(&mut self, errors: ErrorSet) {
        self.errors = errors;
    }

    /// Decrypt every sealed field with the key of this entity's control
    pub fn reveal(&mut self, keys: &dyn KeyResolver) -> ListResult<()> {
        if self.name.cleartext().is_some()
            && self.description.as_ref().map_or(true, |d| d.cleartext().is_some())
        {
            return Ok(());
        }

        let key = keys.resolve(self.control_id)?;
        let id = self.id;
        self.name
            .decrypt(key)
            .map_err(|e| e.at_field(K::KIND_NAME, id, Field::Name))?;
        if let Some(description) = self.description.as_mut() {
            description
                .decrypt(key)
                .map_err(|e| e.at_field(K::KIND_NAME, id, Field::Description))?;
        }
        Ok(())
    }

    /// Ciphertext of the name under this entity's control key
    pub fn name_ciphertext(&mut self, keys: &dyn KeyResolver) -> ListResult<&EncryptedData> {
        let key = keys.resolve(self.control_id)?;
        let (kind, id) = (K::KIND_NAME, self.id);
        self.name
            .ciphertext(key)
            .map_err(|e| e.at_field(kind, id, Field::Name))
    }

    /// Ciphertext of the description, if the entity has one
    pub fn description_ciphertext(
        &mut self,
        keys: &dyn KeyResolver,
    ) -> ListResult<Option<&EncryptedData>> {
        let key = keys.resolve(self.control_id)?;
        let (kind, id) = (K::KIND_NAME, self.id);
        match self.description.as_mut() {
            Some(field) => field
                .ciphertext(key)
                .map(Some)
                .map_err(|e| e.at_field(kind, id, Field::Description)),
            None => Ok(None),
        }
    }

    /// Move the entity to another control, dropping cached ciphertext
    pub(crate) fn move_to_control(
        &mut self,
        control_id: ControlId,
        keys: &dyn KeyResolver,
    ) -> ListResult<()> {
        if control_id == self.control_id {
            return Ok(());
        }
        self.rebind(control_id, keys)
    }

    /// Adopt `control_id` unconditionally, dropping cached ciphertext
    pub(crate) fn rebind(
        &mut self,
        control_id: ControlId,
        keys: &dyn KeyResolver,
    ) -> ListResult<()> {
        self.reveal(keys)?;
        self.name.invalidate_ciphertext()?;
        if let Some(description) = self.description.as_mut() {
            description.invalidate_ciphertext()?;
        }
        self.control_id = control_id;
        Ok(())
    }

    /// Same logical record: ids match
    pub fn is_same_record(&self, other: &Entity<K>) -> bool {
        self.id == other.id
    }

    /// Same record with every user-visible field equal
    pub fn is_identical(&self, other: &Entity<K>) -> bool {
        let descriptions_match = match (&self.description, &other.description) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_value(b),
            _ => false,
        };

        self.is_same_record(other)
            && self.enabled == other.enabled
            && self.order == other.order
            && self.class == other.class
            && self.name.same_value(&other.name)
            && descriptions_match
    }

    /// Run every rule against this entity and its peers in `list`
    pub fn check(&self, list: &EntityList<K>) -> ErrorSet {
        let mut errors = ErrorSet::new();

        match self.name() {
            None => errors.push(Field::Name, ValidationFailure::Unreadable),
            Some(name) => {
                if name.trim().is_empty() {
                    errors.push(Field::Name, ValidationFailure::Missing);
                } else {
                    let len = name.chars().count();
                    if len > K::NAME_LEN {
                        errors.push(
                            Field::Name,
                            ValidationFailure::TooLong {
                                len,
                                max: K::NAME_LEN,
                            },
                        );
                    }
                    if name.chars().any(char::is_control) {
                        errors.push(Field::Name, ValidationFailure::InvalidCharacters);
                    }
                    if let Some(failure) = K::check_name(name) {
                        errors.push(Field::Name, failure);
                    }
                }
            }
        }

        if let Some(field) = &self.description {
            match field.cleartext() {
                None => errors.push(Field::Description, ValidationFailure::Unreadable),
                Some(description) => {
                    let len = description.chars().count();
                    if len > K::DESC_LEN {
                        errors.push(
                            Field::Description,
                            ValidationFailure::TooLong {
                                len,
                                max: K::DESC_LEN,
                            },
                        );
                    }
                    if description.chars().any(char::is_control) {
                        errors.push(Field::Description, ValidationFailure::InvalidCharacters);
                    }
                }
            }
        }

        if self.order < 0 {
            errors.push(Field::Order, ValidationFailure::Negative);
        }

        let peers = || list.iter().filter(|peer| !std::ptr::eq(*peer, self));

        if peers().any(|peer| peer.id == self.id) {
            errors.push(Field::Id, ValidationFailure::Duplicate);
        }

        if self.enabled {
            if let Some(name) = self.name() {
                if peers().any(|peer| peer.enabled && peer.name() == Some(name)) {
                    errors.push(Field::Name, ValidationFailure::Duplicate);
                }
            }
        }

        if K::UNIQUE_ORDER && peers().any(|peer| peer.order == self.order) {
            errors.push(Field::Order, ValidationFailure::Duplicate);
        }

        if K::UNIQUE_CLASS && peers().any(|peer| peer.class == self.class) {
            errors.push(Field::Class, ValidationFailure::Duplicate);
        }

        K::validate_extra(self, &mut errors);
        errors
    }

    /// Validate against the peers in `list`, replacing the recorded errors
    pub fn validate(&mut self, list: &EntityList<K>) {
        self.errors = self.check(list);
    }

    pub fn snapshot(&self) -> EntitySnapshot {
        EntitySnapshot {
            id: self.id,
            control_id: self.control_id,
            enabled: self.enabled,
            order: self.order,
            class: self.class.name().to_string(),
            name: self.name().map(str::to_string),
            description: self.description().map(str::to_string),
        }
    }
}

impl<K: EntityKind> Clone for Entity<K> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            control_id: self.control_id,
            enabled: self.enabled,
            order: self.order,
            class: self.class,
            name: self.name.clone(),
            description: self.description.clone(),
            base: self.base,
            change: self.change,
            errors: self.errors.clone(),
        }
    }
}

impl<K: EntityKind> fmt::Debug for Entity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(K::KIND_NAME)
            .field("id", &self.id)
            .field("control_id", &self.control_id)
            .field("enabled", &self.enabled)
            .field("order", &self.order)
            .field("class", &self.class)
            .field("base", &self.base)
            .field("change", &self.change)
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl<K: EntityKind> fmt::Display for Entity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", K::KIND_NAME, self.id)
    }
}
