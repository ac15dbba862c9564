//! Strongly-typed integer identifiers
//!
//! Entity ids and control ids are both plain integers on disk; the newtype
//! wrappers keep them from being mixed up at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Macro to generate integer ID newtype wrappers
macro_rules! define_id {
    ($name:ident, $inner:ty, $display_prefix:literal) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name($inner);

        impl $name {
            /// Wrap a raw value
            pub const fn new(value: $inner) -> Self {
                Self(value)
            }

            /// Get the raw value
            pub const fn value(&self) -> $inner {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<$inner> for $name {
            fn from(value: $inner) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.strip_prefix($display_prefix).unwrap_or(s);
                Ok(Self(s.trim().parse()?))
            }
        }
    };
}

define_id!(EntityId, i32, "#");
define_id!(ControlId, u32, "ctl-");

impl EntityId {
    /// Provisional ids handed out inside an edit session are negative
    pub fn is_provisional(&self) -> bool {
        self.0 < 0
    }
}

impl ControlId {
    /// Control id of entities stored before encryption was introduced
    pub const LEGACY: ControlId = ControlId(0);

    /// Whether this is the pre-encryption control id
    pub fn is_legacy(&self) -> bool {
        self.0 == 0
    }
}

impl Default for ControlId {
    fn default() -> Self {
        Self::LEGACY
    }
}
