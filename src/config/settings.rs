//! Settings for entity-lists
//!
//! Holds the registered control ids with their key derivation parameters,
//! the control new items are sealed under, and audit preferences. Settings
//! are loaded and flushed explicitly; lists only ever see the [`KeyRing`]
//! unlocked from them.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::file_io::{read_json, write_json_atomic};
use super::paths::StorePaths;
use crate::audit::AuditLogger;
use crate::crypto::{
    decrypt_string, derive_key, encrypt_string, ControlKey, EncryptedData, KeyDerivationParams,
    KeyRing, SecureString,
};
use crate::dataset::DataSet;
use crate::error::{ListError, ListResult};
use crate::models::ControlId;

/// Current settings schema
pub const SCHEMA_VERSION: u32 = 1;

/// Plaintext sealed into each control's verification token
const VERIFICATION_TEXT: &str = "entity-lists control verification";

/// A registered control and how to re-derive its key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlRecord {
    pub control_id: ControlId,
    pub key_params: KeyDerivationParams,
    /// Known text sealed under the derived key, to detect a wrong passphrase
    pub verification: EncryptedData,
    pub created_at: DateTime<Utc>,
}

/// Persisted preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Control id new items are sealed under
    #[serde(default)]
    pub active_control: ControlId,

    #[serde(default)]
    pub controls: Vec<ControlRecord>,

    /// Whether committed changes are written to the audit log
    #[serde(default = "default_audit_enabled")]
    pub audit_enabled: bool,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn default_audit_enabled() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            active_control: ControlId::LEGACY,
            controls: Vec::new(),
            audit_enabled: default_audit_enabled(),
        }
    }
}

impl Settings {
    /// Whether any control key has been registered
    pub fn is_encryption_enabled(&self) -> bool {
        !self.controls.is_empty()
    }

    pub fn control(&self, control_id: ControlId) -> Option<&ControlRecord> {
        self.controls.iter().find(|c| c.control_id == control_id)
    }

    /// Load settings from disk, or defaults if none were saved yet
    ///
    /// Defaults are not written until [`Settings::save`] is called.
    pub fn load_or_create(paths: &StorePaths) -> ListResult<Self> {
        let Some(settings) = read_json::<Settings, _>(paths.settings_file())? else {
            return Ok(Settings::default());
        };

        if settings.schema_version > SCHEMA_VERSION {
            return Err(ListError::Config(format!(
                "Settings schema version {} is newer than supported version {}",
                settings.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(settings)
    }

    /// Flush settings to disk
    pub fn save(&self, paths: &StorePaths) -> ListResult<()> {
        paths.ensure_directories()?;
        write_json_atomic(paths.settings_file(), self)
    }

    /// Register a new control keyed by `passphrase` and make it active
    pub fn register_control(&mut self, passphrase: &SecureString) -> ListResult<ControlKey> {
        self.register_control_with(passphrase, KeyDerivationParams::new())
    }

    /// [`Settings::register_control`] with explicit derivation parameters
    pub fn register_control_with(
        &mut self,
        passphrase: &SecureString,
        key_params: KeyDerivationParams,
    ) -> ListResult<ControlKey> {
        let next = self
            .controls
            .iter()
            .map(|c| c.control_id.value())
            .max()
            .unwrap_or(ControlId::LEGACY.value())
            + 1;
        let control_id = ControlId::new(next);

        let key = derive_key(passphrase, &key_params, control_id)?;
        let verification = encrypt_string(VERIFICATION_TEXT, &key)?;

        self.controls.push(ControlRecord {
            control_id,
            key_params,
            verification,
            created_at: Utc::now(),
        });
        self.active_control = control_id;

        info!(control = %control_id, "Registered control");
        Ok(key)
    }

    /// Derive and verify every registered control key
    ///
    /// A wrong passphrase fails with `Decryption` naming the control.
    pub fn unlock(&self, passphrase: &SecureString) -> ListResult<KeyRing> {
        let mut ring = KeyRing::new();
        for record in &self.controls {
            let key = derive_key(passphrase, &record.key_params, record.control_id)?;
            let verified = decrypt_string(&record.verification, &key)
                .map(|text| text == VERIFICATION_TEXT)
                .unwrap_or(false);
            if !verified {
                return Err(ListError::Decryption {
                    location: Some(format!("control {}", record.control_id)),
                    reason: "wrong passphrase".into(),
                });
            }
            ring.insert(key);
        }

        debug!(controls = ring.len(), "Unlocked control keys");
        Ok(ring)
    }

    /// Unlock the keys and create an empty dataset sealing under the active control
    pub fn open_dataset(&self, passphrase: &SecureString) -> ListResult<DataSet> {
        let ring = self.unlock(passphrase)?;
        Ok(DataSet::new(self.active_control, Arc::new(ring)))
    }

    /// Logger for committed changes, or `None` when auditing is switched off
    pub fn audit_logger(&self, paths: &StorePaths) -> Option<AuditLogger> {
        if !self.audit_enabled {
            debug!("Audit log disabled");
            return None;
        }
        Some(AuditLogger::new(paths.audit_log()))
    }
}
