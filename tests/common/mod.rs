//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use entity_lists::crypto::{ControlKey, KeyRing, SharedKeys};
use entity_lists::list::{EntityList, NewEntity};
use entity_lists::models::{ClassTag, ControlId, EntityId, EntityKind, ValidationFailure};
use entity_lists::DataSet;

pub const CONTROL: ControlId = ControlId::new(1);
pub const OTHER_CONTROL: ControlId = ControlId::new(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxTypeClass {
    Income,
    Social,
    Other,
}

impl ClassTag for TaxTypeClass {
    fn all() -> &'static [Self] {
        &[Self::Income, Self::Social, Self::Other]
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Income => "Income tax",
            Self::Social => "Social security",
            Self::Other => "Other",
        }
    }
}

/// Test kind: tax types, one name rule and nothing else
pub struct TaxType;

impl EntityKind for TaxType {
    type Class = TaxTypeClass;
    const KIND_NAME: &'static str = "TaxType";
    const LIST_NAME: &'static str = "TaxTypes";

    fn check_name(name: &str) -> Option<ValidationFailure> {
        name.starts_with(char::is_whitespace)
            .then_some(ValidationFailure::Rule("must not start with whitespace"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayPeriodClass {
    Weekly,
    Fortnightly,
    Monthly,
}

impl ClassTag for PayPeriodClass {
    fn all() -> &'static [Self] {
        &[Self::Weekly, Self::Fortnightly, Self::Monthly]
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Fortnightly => "Fortnightly",
            Self::Monthly => "Monthly",
        }
    }
}

/// One entry per class, each at its own order
pub struct PayPeriod;

impl EntityKind for PayPeriod {
    type Class = PayPeriodClass;
    const KIND_NAME: &'static str = "PayPeriod";
    const LIST_NAME: &'static str = "PayPeriods";
    const UNIQUE_ORDER: bool = true;
    const UNIQUE_CLASS: bool = true;
}

/// Deterministic keys for both test controls
pub fn key_ring() -> KeyRing {
    KeyRing::new()
        .with_key(ControlKey::from_bytes(CONTROL, [7; 32]))
        .with_key(ControlKey::from_bytes(OTHER_CONTROL, [9; 32]))
}

pub fn shared_keys() -> SharedKeys {
    Arc::new(key_ring())
}

pub fn dataset() -> DataSet {
    DataSet::new(CONTROL, shared_keys())
}

pub fn empty_list() -> EntityList<TaxType> {
    EntityList::new(CONTROL, shared_keys())
}

/// CORE list holding `(id, name)` pairs, ordered as given
pub fn list_of(items: &[(i32, &str)]) -> EntityList<TaxType> {
    let mut list = empty_list();
    for (position, (id, name)) in items.iter().enumerate() {
        list.add_item(
            NewEntity::new(TaxTypeClass::Income, *name)
                .with_id(EntityId::new(*id))
                .with_order(position as i32),
        )
        .expect("fixture item is valid");
    }
    list
}

/// Initialise a tracing subscriber once; RUST_LOG controls the output
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
