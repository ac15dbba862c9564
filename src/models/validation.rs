//! Validation failures
//!
//! Rules never stop at the first failure: every broken rule for an entity is
//! recorded in an [`ErrorSet`] so the whole set can be surfaced at once.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Entity fields that validation rules refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Id,
    Name,
    Description,
    Order,
    Class,
    Enabled,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Name => write!(f, "name"),
            Field::Description => write!(f, "description"),
            Field::Order => write!(f, "order"),
            Field::Class => write!(f, "class"),
            Field::Enabled => write!(f, "enabled"),
        }
    }
}

/// A single broken rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationFailure {
    Missing,
    TooLong { len: usize, max: usize },
    InvalidCharacters,
    Duplicate,
    Negative,
    /// Zero or below where a positive value is required
    NotPositive,
    /// Cleartext was never materialized, so rules could not run
    Unreadable,
    /// Kind-specific rule
    Rule(&'static str),
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => write!(f, "value is required"),
            Self::TooLong { len, max } => {
                write!(f, "too long ({} chars, max {})", len, max)
            }
            Self::InvalidCharacters => write!(f, "contains control characters"),
            Self::Duplicate => write!(f, "value is already in use"),
            Self::Negative => write!(f, "cannot be negative"),
            Self::NotPositive => write!(f, "must be greater than zero"),
            Self::Unreadable => write!(f, "value has not been decrypted"),
            Self::Rule(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ValidationFailure {}

/// A broken rule attached to the field it concerns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub failure: ValidationFailure,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.failure)
    }
}

/// All broken rules for one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSet {
    errors: Vec<FieldError>,
}

impl ErrorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: Field, failure: ValidationFailure) {
        self.errors.push(FieldError { field, failure });
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Whether any rule failed for `field`
    pub fn has(&self, field: Field) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Whether `failure` was recorded against `field`
    pub fn contains(&self, field: Field, failure: &ValidationFailure) -> bool {
        self.errors
            .iter()
            .any(|e| e.field == field && &e.failure == failure)
    }

    pub fn clear(&mut self) {
        self.errors.clear();
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = &'a FieldError;
    type IntoIter = std::slice::Iter<'a, FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
