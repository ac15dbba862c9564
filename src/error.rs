//! Custom error types for entity-lists
//!
//! This module defines the error hierarchy for the crate using thiserror
//! for ergonomic error definitions.

use thiserror::Error;

use crate::list::ListStyle;
use crate::models::{ControlId, EntityId, ErrorSet, Field};

/// The main error type for entity-list operations
#[derive(Error, Debug)]
pub enum ListError {
    /// An item with this id is already present in the list
    #[error("{kind} already exists: {id}")]
    DuplicateId { kind: &'static str, id: EntityId },

    /// An enabled item already uses this name
    #[error("{kind} name is already in use: '{name}'")]
    DuplicateName { kind: &'static str, name: String },

    /// One or more validation rules failed for an item
    #[error("{kind} {id} is invalid: {errors}")]
    Validation {
        kind: &'static str,
        id: EntityId,
        errors: ErrorSet,
    },

    /// Ciphertext could not be opened with the supplied key
    #[error("Decryption failed{}: {reason}", location_suffix(.location))]
    Decryption {
        location: Option<String>,
        reason: String,
    },

    /// The key resolver has no key for this control id
    #[error("No key registered for control {0}")]
    KeyNotFound(ControlId),

    /// Mutation attempted on a list style that does not allow it
    #[error("{operation} is not supported on a {style} list")]
    UnsupportedOperation {
        operation: &'static str,
        style: ListStyle,
    },

    /// Entity not found errors
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: EntityId },

    /// No further id or order value can be allocated
    #[error("{kind} {field} values are exhausted")]
    Exhausted { kind: &'static str, field: Field },

    /// A dataset has no list of the requested kind
    #[error("No {0} list is installed")]
    MissingList(&'static str),

    /// Encryption errors
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),
}

fn location_suffix(location: &Option<String>) -> String {
    match location {
        Some(location) => format!(" for {}", location),
        None => String::new(),
    }
}

impl ListError {
    /// Create a decryption error without location context
    pub fn decryption(reason: impl Into<String>) -> Self {
        Self::Decryption {
            location: None,
            reason: reason.into(),
        }
    }

    /// Create an unsupported-operation error
    pub fn unsupported(operation: &'static str, style: ListStyle) -> Self {
        Self::UnsupportedOperation { operation, style }
    }

    /// Attach entity and field context to a decryption error
    ///
    /// Other variants are returned unchanged.
    pub fn at_field(self, kind: &'static str, id: EntityId, field: Field) -> Self {
        match self {
            Self::Decryption { reason, .. } => Self::Decryption {
                location: Some(format!("{} {} {}", kind, id, field)),
                reason,
            },
            other => other,
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::KeyNotFound(_) | Self::MissingList(_)
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if a mutation was refused because of the list style
    pub fn is_read_only_violation(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. })
    }

    /// Key or decryption failure; never skipped during bulk loads
    pub fn is_key_failure(&self) -> bool {
        matches!(self, Self::Decryption { .. } | Self::KeyNotFound(_))
    }

    /// The collected validation failures, if this is a validation error
    pub fn validation_errors(&self) -> Option<&ErrorSet> {
        match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ListError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for ListError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for entity-list operations
pub type ListResult<T> = Result<T, ListError>;
