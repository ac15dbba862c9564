//! Entity kinds and class tags
//!
//! Every reference-data kind (tax regimes, frequencies, ...) shares the same
//! entity and list machinery. A kind only supplies its class-tag enumeration,
//! a display name and a handful of rule switches.

use std::fmt::Debug;
use std::hash::Hash;

use super::{Entity, ErrorSet, ValidationFailure};

/// The fixed sub-kinds an entity kind is divided into
pub trait ClassTag: Copy + Eq + Hash + Debug + 'static {
    /// Every class, in canonical order
    fn all() -> &'static [Self];

    /// Stable name, also used as the default entity name
    fn name(&self) -> &'static str;

    /// Position in the canonical order
    fn default_order(&self) -> i32 {
        Self::all()
            .iter()
            .position(|c| c == self)
            .map_or(0, |p| p as i32)
    }
}

/// Per-kind configuration of the generic entity list
pub trait EntityKind: Sized + 'static {
    type Class: ClassTag;

    /// Singular item name, e.g. "TaxRegime"
    const KIND_NAME: &'static str;

    /// Plural list name, e.g. "TaxRegimes"
    const LIST_NAME: &'static str;

    const NAME_LEN: usize = 50;
    const DESC_LEN: usize = 100;

    /// Whether two entities in a list may share an order value
    const UNIQUE_ORDER: bool = false;

    /// Whether each class may appear at most once in a list
    const UNIQUE_CLASS: bool = false;

    /// Extra name-format rule
    fn check_name(_name: &str) -> Option<ValidationFailure> {
        None
    }

    /// Extra rules that look at the whole entity
    fn validate_extra(_entity: &Entity<Self>, _errors: &mut ErrorSet) {}
}
