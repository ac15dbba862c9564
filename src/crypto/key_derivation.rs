//! Control key derivation with Argon2id
//!
//! One passphrase unlocks every control. Each control still gets its own
//! key: the control id is appended to the stored salt before hashing, so
//! the same passphrase and salt yield unrelated keys for different controls.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::{ListError, ListResult};
use crate::models::ControlId;

use super::ControlKey;

const KEY_LEN: usize = 32;

/// Argon2id settings stored alongside each registered control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Random salt, base64 without padding
    pub salt: String,
    /// Memory cost in KiB
    pub memory_cost: u32,
    /// Iterations
    pub time_cost: u32,
    pub parallelism: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self::with_values(String::new(), 64 * 1024, 3, 4)
    }
}

impl KeyDerivationParams {
    /// Default costs with a fresh random salt
    pub fn new() -> Self {
        Self {
            salt: SaltString::generate(&mut OsRng).to_string(),
            ..Self::default()
        }
    }

    pub fn with_values(salt: String, memory_cost: u32, time_cost: u32, parallelism: u32) -> Self {
        Self {
            salt,
            memory_cost,
            time_cost,
            parallelism,
        }
    }

    /// Random salt with cheap costs, for tests and fixtures
    pub fn fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            ..Self::new()
        }
    }

    fn hasher(&self) -> ListResult<Argon2<'static>> {
        let params = Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            Some(KEY_LEN),
        )
        .map_err(|e| ListError::Encryption(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }

    /// Stored salt bytes followed by the control id
    fn control_salt(&self, control_id: ControlId) -> ListResult<Vec<u8>> {
        let salt = SaltString::from_b64(&self.salt)
            .map_err(|e| ListError::Encryption(format!("Invalid salt: {}", e)))?;
        let mut bytes = salt.as_str().as_bytes().to_vec();
        bytes.extend_from_slice(&control_id.value().to_le_bytes());
        Ok(bytes)
    }
}

/// Derive the key for `control_id` from a passphrase
pub fn derive_key(
    passphrase: &str,
    params: &KeyDerivationParams,
    control_id: ControlId,
) -> ListResult<ControlKey> {
    let salt = params.control_salt(control_id)?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    params
        .hasher()?
        .hash_password_into(passphrase.as_bytes(), &salt, &mut key[..])
        .map_err(|e| ListError::Encryption(format!("Key derivation failed: {}", e)))?;

    Ok(ControlKey::from_bytes(control_id, *key))
}
