//! Kinds and fixtures shared by unit tests

use std::sync::Arc;

use crate::crypto::{ControlKey, KeyRing, SharedKeys};
use crate::dataset::DataSet;
use crate::list::{EntityList, NewEntity};
use crate::models::{ClassTag, ControlId, Entity, EntityKind, ErrorSet, Field, ValidationFailure};

pub const CONTROL: ControlId = ControlId::new(1);
pub const SECOND_CONTROL: ControlId = ControlId::new(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxRegimeClass {
    Standard,
    LowSalary,
    Archive,
}

impl ClassTag for TaxRegimeClass {
    fn all() -> &'static [Self] {
        &[Self::Standard, Self::LowSalary, Self::Archive]
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::LowSalary => "Low salary",
            Self::Archive => "Archive",
        }
    }
}

pub struct TaxRegime;

impl EntityKind for TaxRegime {
    type Class = TaxRegimeClass;
    const KIND_NAME: &'static str = "TaxRegime";
    const LIST_NAME: &'static str = "TaxRegimes";

    fn check_name(name: &str) -> Option<ValidationFailure> {
        name.contains('|')
            .then_some(ValidationFailure::Rule("must not contain '|'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyClass {
    Weekly,
    Monthly,
    Annual,
}

impl FrequencyClass {
    pub const ALL: [FrequencyClass; 3] = [Self::Weekly, Self::Monthly, Self::Annual];
}

impl ClassTag for FrequencyClass {
    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Annual => "Annual",
        }
    }
}

pub struct Frequency;

impl EntityKind for Frequency {
    type Class = FrequencyClass;
    const KIND_NAME: &'static str = "Frequency";
    const LIST_NAME: &'static str = "Frequencies";
    const NAME_LEN: usize = 20;
    const UNIQUE_ORDER: bool = true;
    const UNIQUE_CLASS: bool = true;

    fn validate_extra(entity: &Entity<Self>, errors: &mut ErrorSet) {
        if entity.order() >= 100 {
            errors.push(Field::Order, ValidationFailure::Rule("must be below 100"));
        }
    }
}

pub fn key_ring() -> KeyRing {
    KeyRing::new()
        .with_key(ControlKey::from_bytes(CONTROL, [0x11; 32]))
        .with_key(ControlKey::from_bytes(SECOND_CONTROL, [0x22; 32]))
}

pub fn keys() -> SharedKeys {
    Arc::new(key_ring())
}

pub fn core_list() -> EntityList<TaxRegime> {
    EntityList::new(CONTROL, keys())
}

pub fn frequency_list() -> EntityList<Frequency> {
    EntityList::new(CONTROL, keys())
}

/// CORE list of Standard regimes with ids 1.. and orders 0.. in name order
pub fn list_with(names: &[&str]) -> EntityList<TaxRegime> {
    let mut list = core_list();
    for name in names {
        list.add_item(NewEntity::new(TaxRegimeClass::Standard, *name))
            .unwrap();
    }
    list
}

pub fn dataset(control_id: ControlId) -> DataSet {
    DataSet::new(control_id, keys())
}
