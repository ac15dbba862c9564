//! Adding items to CORE lists
//!
//! Single adds are atomic: the list either gains the validated entity or is
//! left exactly as it was. Bulk loads apply a [`LoadPolicy`] on top of that.

use std::fmt;

use tracing::{debug, warn};

use crate::crypto::{EncryptedData, KeyResolver};
use crate::error::{ListError, ListResult};
use crate::models::{
    ClassTag, ControlId, EncryptedField, Entity, EntityId, EntityKind, ErrorSet, Field,
    ValidationFailure,
};

use super::{EntityList, ListStyle};

/// How a text field of a new item was supplied
#[derive(Clone)]
enum FieldInput {
    Clear(String),
    Sealed(EncryptedData),
    /// Stored with both forms; verified on bind
    Pair(String, EncryptedData),
}

impl FieldInput {
    fn bind(self, control_id: ControlId, keys: &dyn KeyResolver) -> ListResult<EncryptedField> {
        match self {
            Self::Clear(value) => Ok(EncryptedField::from_cleartext(value)),
            Self::Sealed(data) => Ok(EncryptedField::from_ciphertext(control_id, data)),
            Self::Pair(value, data) => {
                EncryptedField::from_pair(value, data, keys.resolve(control_id)?)
            }
        }
    }
}

/// Field values for an item about to be added
///
/// Unset ids and orders are allocated by the list: the next id after the
/// highest in use and the next order after the highest in use.
pub struct NewEntity<K: EntityKind> {
    id: Option<EntityId>,
    control_id: Option<ControlId>,
    enabled: bool,
    order: Option<i32>,
    class: K::Class,
    name: FieldInput,
    description: Option<FieldInput>,
}

impl<K: EntityKind> NewEntity<K> {
    /// New data entered in cleartext
    pub fn new(class: K::Class, name: impl Into<String>) -> Self {
        Self {
            id: None,
            control_id: None,
            enabled: true,
            order: None,
            class,
            name: FieldInput::Clear(name.into()),
            description: None,
        }
    }

    /// A stored record whose name is only available as ciphertext
    pub fn sealed(
        id: EntityId,
        control_id: ControlId,
        class: K::Class,
        name: EncryptedData,
    ) -> Self {
        Self {
            id: Some(id),
            control_id: Some(control_id),
            enabled: true,
            order: None,
            class,
            name: FieldInput::Sealed(name),
            description: None,
        }
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_control(mut self, control_id: ControlId) -> Self {
        self.control_id = Some(control_id);
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn disabled(self) -> Self {
        self.with_enabled(false)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(FieldInput::Clear(description.into()));
        self
    }

    pub fn with_sealed_description(mut self, description: EncryptedData) -> Self {
        self.description = Some(FieldInput::Sealed(description));
        self
    }

    /// Name stored in both forms; the ciphertext must decode to `value`
    pub fn with_stored_name(mut self, value: impl Into<String>, data: EncryptedData) -> Self {
        self.name = FieldInput::Pair(value.into(), data);
        self
    }
}

impl<K: EntityKind> fmt::Debug for NewEntity<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewEntity")
            .field("kind", &K::KIND_NAME)
            .field("id", &self.id)
            .field("control_id", &self.control_id)
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

/// What to do when one item of a bulk load is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPolicy {
    /// Roll back the whole load
    #[default]
    AbortOnError,
    /// Drop the item and continue with the next
    SkipInvalid,
}

/// An item refused during a bulk load
#[derive(Debug)]
pub struct RejectedItem {
    /// Zero-based position in the input
    pub position: usize,
    pub error: ListError,
}

/// Outcome of [`EntityList::load_items`]
#[derive(Debug, Default)]
pub struct LoadReport {
    pub accepted: Vec<EntityId>,
    pub rejected: Vec<RejectedItem>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

impl<K: EntityKind> EntityList<K> {
    /// Add one validated item
    ///
    /// Explicit ids must be positive; zero and below belong to edit sessions.
    /// Fails with `DuplicateId` or `DuplicateName` before insertion and with
    /// `Validation` after; in every failure case the list is unchanged.
    pub fn add_item(&mut self, item: NewEntity<K>) -> ListResult<EntityId> {
        self.require(ListStyle::Core, "add_item")?;

        let id = match item.id {
            Some(id) if id.value() <= 0 => {
                let mut errors = ErrorSet::new();
                errors.push(Field::Id, ValidationFailure::NotPositive);
                return Err(ListError::Validation {
                    kind: K::KIND_NAME,
                    id,
                    errors,
                });
            }
            Some(id) => id,
            None => self.next_id()?,
        };
        let order = match item.order {
            Some(order) => order,
            None => self.next_order()?,
        };
        let control_id = item.control_id.unwrap_or(self.control_id);

        let name = item
            .name
            .bind(control_id, &*self.keys)
            .map_err(|e| e.at_field(K::KIND_NAME, id, Field::Name))?;
        let mut entity = Entity::new(id, control_id, item.class, name);
        entity.set_order(order);
        entity.set_enabled(item.enabled);
        if let Some(description) = item.description {
            let field = description
                .bind(control_id, &*self.keys)
                .map_err(|e| e.at_field(K::KIND_NAME, id, Field::Description))?;
            entity.set_description_field(Some(field));
        }
        entity.reveal(&*self.keys)?;

        if self.find_by_id(id).is_some() {
            return Err(ListError::DuplicateId {
                kind: K::KIND_NAME,
                id,
            });
        }
        if entity.is_enabled() {
            if let Some(name) = entity.name() {
                if self.name_in_use(name) {
                    return Err(ListError::DuplicateName {
                        kind: K::KIND_NAME,
                        name: name.to_string(),
                    });
                }
            }
        }

        let index = self.insert_sorted(entity);
        self.validate_at(index);
        if self.items[index].has_errors() {
            let rejected = self.items.remove(index);
            return Err(ListError::Validation {
                kind: K::KIND_NAME,
                id,
                errors: rejected.errors().clone(),
            });
        }
        self.claim_id(id);

        debug!(kind = K::KIND_NAME, id = %id, control = %control_id, "Added item");
        Ok(id)
    }

    /// Add many items under a load policy
    ///
    /// Key and decryption failures abort the load under either policy. An
    /// aborted load removes every item it had already accepted.
    pub fn load_items<I>(&mut self, items: I, policy: LoadPolicy) -> ListResult<LoadReport>
    where
        I: IntoIterator<Item = NewEntity<K>>,
    {
        self.require(ListStyle::Core, "load_items")?;

        let mut report = LoadReport::default();
        for (position, item) in items.into_iter().enumerate() {
            match self.add_item(item) {
                Ok(id) => report.accepted.push(id),
                Err(error) if policy == LoadPolicy::SkipInvalid && !error.is_key_failure() => {
                    warn!(kind = K::KIND_NAME, position, error = %error, "Skipped invalid item");
                    report.rejected.push(RejectedItem { position, error });
                }
                Err(error) => {
                    warn!(
                        kind = K::KIND_NAME,
                        position,
                        rolled_back = report.accepted.len(),
                        "Load aborted"
                    );
                    self.items.retain(|e| !report.accepted.contains(&e.id()));
                    return Err(error);
                }
            }
        }

        debug!(
            kind = K::KIND_NAME,
            accepted = report.accepted.len(),
            rejected = report.rejected.len(),
            "Loaded items"
        );
        Ok(report)
    }

    /// Add one item for every class tag not yet present
    ///
    /// Each default is named after its class and placed at the class's
    /// canonical order.
    pub fn populate_defaults(&mut self) -> ListResult<Vec<EntityId>> {
        self.require(ListStyle::Core, "populate_defaults")?;

        let missing: Vec<K::Class> = K::Class::all()
            .iter()
            .copied()
            .filter(|class| !self.items.iter().any(|e| e.class() == *class))
            .collect();

        let mut added = Vec::with_capacity(missing.len());
        for class in missing {
            let item = NewEntity::new(class, class.name()).with_order(class.default_order());
            added.push(self.add_item(item)?);
        }
        Ok(added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::encrypt_string;
    use crate::test_support::{
        core_list, frequency_list, key_ring, FrequencyClass, TaxRegime, TaxRegimeClass, CONTROL,
        SECOND_CONTROL,
    };

    fn regime(name: &str) -> NewEntity<TaxRegime> {
        NewEntity::new(TaxRegimeClass::Standard, name)
    }

    #[test]
    fn test_add_allocates_ids_and_orders() {
        let mut list = core_list();
        let first = list.add_item(regime("Basic")).unwrap();
        let second = list.add_item(regime("Higher")).unwrap();

        assert_eq!(first, EntityId::new(1));
        assert_eq!(second, EntityId::new(2));
        assert_eq!(list.find_by_id(second).unwrap().order(), 1);
        assert_eq!(list.find_by_id(first).unwrap().control_id(), CONTROL);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut list = core_list();
        list.add_item(regime("Basic").with_id(EntityId::new(4))).unwrap();

        let result = list.add_item(regime("Higher").with_id(EntityId::new(4)));
        assert!(matches!(result, Err(ListError::DuplicateId { id, .. }) if id == EntityId::new(4)));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_duplicate_enabled_name_rejected() {
        let mut list = core_list();
        list.add_item(regime("Basic")).unwrap();

        let result = list.add_item(regime("Basic"));
        assert!(matches!(
            result,
            Err(ListError::DuplicateName { ref name, .. }) if name == "Basic"
        ));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_disabled_items_may_share_names() {
        let mut list = core_list();
        list.add_item(regime("Basic")).unwrap();
        list.add_item(regime("Basic").disabled()).unwrap();
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_validation_failure_leaves_list_unchanged() {
        let mut list = core_list();
        list.add_item(regime("Basic")).unwrap();

        let err = list.add_item(regime("   ")).unwrap_err();
        assert!(err.is_validation());
        let errors = err.validation_errors().unwrap();
        assert!(errors.contains(Field::Name, &ValidationFailure::Missing));
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_kind_name_rule_applies() {
        let mut list = core_list();
        let err = list.add_item(regime("Basic|Higher")).unwrap_err();
        assert!(err.validation_errors().unwrap().has(Field::Name));
    }

    #[test]
    fn test_add_refused_outside_core() {
        let list = core_list();
        let mut edit = list.to_edit_list().unwrap();
        let result = edit.add_item(regime("Basic"));
        assert!(matches!(
            result,
            Err(ListError::UnsupportedOperation { operation: "add_item", style: ListStyle::Edit })
        ));
    }

    #[test]
    fn test_sealed_item_is_decrypted_on_add() {
        let ring = key_ring();
        let data = encrypt_string("Basic", ring.resolve(SECOND_CONTROL).unwrap()).unwrap();
        let mut list = core_list();

        let id = list
            .add_item(NewEntity::sealed(
                EntityId::new(3),
                SECOND_CONTROL,
                TaxRegimeClass::Standard,
                data,
            ))
            .unwrap();

        let item = list.find_by_id(id).unwrap();
        assert_eq!(item.name(), Some("Basic"));
        assert_eq!(item.control_id(), SECOND_CONTROL);
        assert_eq!(item.name_field().sealed_under(), Some(SECOND_CONTROL));
    }

    #[test]
    fn test_sealed_item_with_wrong_control_fails() {
        let ring = key_ring();
        let data = encrypt_string("Basic", ring.resolve(SECOND_CONTROL).unwrap()).unwrap();
        let mut list = core_list();

        let err = list
            .add_item(NewEntity::sealed(EntityId::new(3), CONTROL, TaxRegimeClass::Standard, data))
            .unwrap_err();
        assert!(matches!(err, ListError::Decryption { location: Some(_), .. }));
        assert!(list.is_empty());
    }

    #[test]
    fn test_stored_pair_must_match() {
        let ring = key_ring();
        let data = encrypt_string("Basic", ring.resolve(CONTROL).unwrap()).unwrap();
        let mut list = core_list();

        let err = list
            .add_item(regime("ignored").with_stored_name("Higher", data.clone()))
            .unwrap_err();
        assert!(matches!(err, ListError::Decryption { .. }));

        list.add_item(regime("ignored").with_stored_name("Basic", data)).unwrap();
        assert!(list.find_by_name("Basic").is_some());
    }

    #[test]
    fn test_load_skip_invalid_continues() {
        let mut list = core_list();
        let report = list
            .load_items(
                vec![regime("Basic"), regime(""), regime("Basic"), regime("Higher")],
                LoadPolicy::SkipInvalid,
            )
            .unwrap();

        assert_eq!(report.accepted.len(), 2);
        let positions: Vec<_> = report.rejected.iter().map(|r| r.position).collect();
        assert_eq!(positions, vec![1, 2]);
        assert!(report.rejected[1].error.to_string().contains("already in use"));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_load_abort_rolls_back() {
        let mut list = core_list();
        list.add_item(regime("Existing")).unwrap();

        let result = list.load_items(
            vec![regime("Basic"), regime("Existing"), regime("Higher")],
            LoadPolicy::AbortOnError,
        );

        assert!(matches!(result, Err(ListError::DuplicateName { .. })));
        assert_eq!(list.len(), 1);
        assert!(list.find_by_name("Basic").is_none());
    }

    #[test]
    fn test_load_key_failure_aborts_even_when_skipping() {
        let mut list = core_list();
        let orphan = NewEntity::sealed(
            EntityId::new(8),
            ControlId::new(42),
            TaxRegimeClass::Standard,
            encrypt_string("x", key_ring().resolve(CONTROL).unwrap()).unwrap(),
        );

        let result = list.load_items(vec![regime("Basic"), orphan], LoadPolicy::SkipInvalid);
        assert!(matches!(result, Err(ListError::KeyNotFound(_))));
        assert!(list.is_empty());
    }

    #[test]
    fn test_populate_defaults_fills_missing_classes() {
        let mut list = core_list();
        list.add_item(NewEntity::new(TaxRegimeClass::Standard, "Custom")).unwrap();

        let added = list.populate_defaults().unwrap();

        assert_eq!(added.len(), TaxRegimeClass::all().len() - 1);
        let archive = list.find_by_name(TaxRegimeClass::Archive.name()).unwrap();
        assert_eq!(archive.order(), TaxRegimeClass::Archive.default_order());
    }

    #[test]
    fn test_unique_class_enforced() {
        let mut list = frequency_list();
        list.add_item(NewEntity::new(FrequencyClass::Weekly, "Weekly")).unwrap();

        let err = list
            .add_item(NewEntity::new(FrequencyClass::Weekly, "Every week"))
            .unwrap_err();
        assert!(err
            .validation_errors()
            .unwrap()
            .contains(Field::Class, &ValidationFailure::Duplicate));
    }

    #[test]
    fn test_unique_order_enforced() {
        let mut list = frequency_list();
        list.add_item(NewEntity::new(FrequencyClass::Weekly, "Weekly").with_order(0)).unwrap();

        let err = list
            .add_item(NewEntity::new(FrequencyClass::Monthly, "Monthly").with_order(0))
            .unwrap_err();
        assert!(err.validation_errors().unwrap().has(Field::Order));
    }

    #[test]
    fn test_non_positive_ids_rejected() {
        let mut list = core_list();
        for raw in [0, -1] {
            let err = list
                .add_item(regime("Legacy").with_id(EntityId::new(raw)))
                .unwrap_err();
            assert!(err
                .validation_errors()
                .unwrap()
                .contains(Field::Id, &ValidationFailure::NotPositive));
        }
        assert!(list.is_empty());
    }

    #[test]
    fn test_provisional_ids_stay_free_of_core_items() {
        let mut list = core_list();
        list.add_item(regime("Basic").with_id(EntityId::new(5))).unwrap();
        let mut edit = list.to_edit_list().unwrap();

        let id = edit.add_new_item(TaxRegimeClass::Archive, |e| e.set_name("Legacy")).unwrap();

        assert!(id.is_provisional());
        assert!(!edit.find_by_id(id).unwrap().has_errors());
    }

    #[test]
    fn test_id_space_exhausted() {
        let mut list = core_list();
        list.add_item(regime("Last").with_id(EntityId::new(i32::MAX))).unwrap();

        let err = list.add_item(regime("Next")).unwrap_err();

        assert!(matches!(err, ListError::Exhausted { field: Field::Id, .. }));
        assert_eq!(err.to_string(), "TaxRegime id values are exhausted");
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_order_space_exhausted() {
        let mut list = core_list();
        list.add_item(regime("Last").with_order(i32::MAX)).unwrap();

        let err = list.add_item(regime("Next")).unwrap_err();

        assert!(matches!(err, ListError::Exhausted { field: Field::Order, .. }));
        assert_eq!(list.len(), 1);
    }
}
