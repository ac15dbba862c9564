//! Control keys and key resolution
//!
//! Every entity's encrypted fields are sealed under the key of its control
//! id. The list layer never holds a global key; it asks a [`KeyResolver`]
//! for the key of a specific control.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{ListError, ListResult};
use crate::models::ControlId;

/// A 256-bit key bound to the control id it protects
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ControlKey {
    #[zeroize(skip)]
    control_id: ControlId,
    key: [u8; 32],
}

impl ControlKey {
    /// Wrap raw key material
    pub fn from_bytes(control_id: ControlId, key: [u8; 32]) -> Self {
        Self { control_id, key }
    }

    /// Generate a random key
    pub fn generate(control_id: ControlId) -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { control_id, key }
    }

    pub fn control_id(&self) -> ControlId {
        self.control_id
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl fmt::Debug for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlKey")
            .field("control_id", &self.control_id)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Resolves the key protecting a control id
pub trait KeyResolver {
    /// Fails with [`ListError::KeyNotFound`] for unknown controls
    fn resolve(&self, control_id: ControlId) -> ListResult<&ControlKey>;
}

/// Key resolver shared between a dataset and the lists it creates
pub type SharedKeys = Arc<dyn KeyResolver + Send + Sync>;

/// In-memory key resolver holding one key per control id
#[derive(Debug, Clone, Default)]
pub struct KeyRing {
    keys: HashMap<ControlId, ControlKey>,
}

impl KeyRing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key, replacing any previous key for the same control
    pub fn insert(&mut self, key: ControlKey) {
        self.keys.insert(key.control_id(), key);
    }

    /// Builder-style [`KeyRing::insert`]
    pub fn with_key(mut self, key: ControlKey) -> Self {
        self.insert(key);
        self
    }

    pub fn contains(&self, control_id: ControlId) -> bool {
        self.keys.contains_key(&control_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Registered control ids, ascending
    pub fn controls(&self) -> Vec<ControlId> {
        let mut ids: Vec<_> = self.keys.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl KeyResolver for KeyRing {
    fn resolve(&self, control_id: ControlId) -> ListResult<&ControlKey> {
        self.keys
            .get(&control_id)
            .ok_or(ListError::KeyNotFound(control_id))
    }
}
