//! List styles
//!
//! The style records which role a list plays. Only CORE lists accept new
//! items and only EDIT lists accept element-level edits; every other style is
//! built in one shot and stays read-only.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    /// The authoritative list of a dataset
    Core,
    /// A mutable editing session over a CORE list
    Edit,
    /// New, modified and deleted items of an edit session
    Update,
    /// Independent duplicate sharing the source's key resolver
    Copy,
    /// Independent duplicate rebound to another dataset
    Clone,
    /// Structural comparison of two snapshots
    Diff,
}

impl ListStyle {
    /// Styles that are full snapshots of a dataset's items
    pub fn is_snapshot(&self) -> bool {
        matches!(self, Self::Core | Self::Copy | Self::Clone)
    }

    /// Styles whose items carry a change classification
    pub fn is_change_set(&self) -> bool {
        matches!(self, Self::Update | Self::Diff)
    }

    /// Styles that refuse every element-level mutation
    pub fn is_read_only(&self) -> bool {
        !matches!(self, Self::Core | Self::Edit)
    }
}

impl fmt::Display for ListStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Core => write!(f, "CORE"),
            Self::Edit => write!(f, "EDIT"),
            Self::Update => write!(f, "UPDATE"),
            Self::Copy => write!(f, "COPY"),
            Self::Clone => write!(f, "CLONE"),
            Self::Diff => write!(f, "DIFF"),
        }
    }
}
