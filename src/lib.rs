//! entity-lists - Versioned, encrypted reference-data lists
//!
//! This library keeps typed lists of small records (tax regimes, payment
//! frequencies and the like) whose names and descriptions are stored
//! encrypted. Lists can be edited in sessions, turned into change extracts
//! for a persistence layer, copied between datasets and diffed against
//! earlier snapshots.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `models`: Entities, encrypted fields, kinds and validation failures
//! - `list`: The generic entity list and its styles
//! - `dataset`: The container owning one CORE list per kind
//! - `crypto`: AES-256-GCM sealing and Argon2id key derivation
//! - `audit`: Audit trail for change extracts and diffs
//! - `config`: Path and settings management
//! - `error`: Custom error types
//!
//! # Example
//!
//! ```rust,ignore
//! use entity_lists::config::{Settings, StorePaths};
//! use entity_lists::list::NewEntity;
//!
//! let paths = StorePaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut data = settings.open_dataset(&passphrase)?;
//!
//! let mut regimes = data.new_core_list::<TaxRegime>();
//! regimes.add_item(NewEntity::new(TaxRegimeClass::Standard, "Basic"))?;
//! data.install(regimes)?;
//! ```

pub mod audit;
pub mod config;
pub mod crypto;
pub mod dataset;
pub mod error;
pub mod list;
pub mod models;

#[cfg(test)]
pub(crate) mod test_support;

pub use dataset::{DataSet, DataSetDiff};
pub use error::{ListError, ListResult};
pub use list::{EntityList, ListStyle, NewEntity};
pub use models::{ClassTag, Entity, EntityId, EntityKind};
