//! Core data models for entity lists
//!
//! This module contains the generic entity, its encrypted fields, the
//! per-kind configuration traits and the validation vocabulary.

pub mod entity;
pub mod field;
pub mod ids;
pub mod kind;
pub mod validation;

pub use entity::{BaseRef, Change, Entity, EntitySnapshot};
pub use field::{EncryptedField, SealedValue};
pub use ids::{ControlId, EntityId};
pub use kind::{ClassTag, EntityKind};
pub use validation::{ErrorSet, Field, FieldError, ValidationFailure};
