//! AES-256-GCM encryption/decryption
//!
//! Provides authenticated encryption for sensitive text fields. Each seal
//! generates a unique nonce, and the control id of the key is bound into the
//! authentication tag so a payload only opens under the control it was sealed
//! for.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{ListError, ListResult};

use super::ControlKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

const FORMAT_VERSION: u8 = 1;

/// A sealed payload: format version, nonce and ciphertext with tag
///
/// Serializes as a single base64 string; `to_bytes`/`from_bytes` give the
/// packed form for binary storage columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct EncryptedData {
    version: u8,
    nonce: [u8; NONCE_SIZE],
    ciphertext: Vec<u8>,
}

impl EncryptedData {
    /// Packed length in bytes
    pub fn len(&self) -> usize {
        1 + NONCE_SIZE + self.ciphertext.len()
    }

    /// A sealed payload always carries at least its tag
    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }

    /// Pack as `version || nonce || ciphertext`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.push(self.version);
        bytes.extend_from_slice(&self.nonce);
        bytes.extend_from_slice(&self.ciphertext);
        bytes
    }

    /// Unpack bytes produced by [`EncryptedData::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> ListResult<Self> {
        if bytes.len() < 1 + NONCE_SIZE + TAG_SIZE {
            return Err(ListError::decryption("sealed data too short"));
        }

        let version = bytes[0];
        if version != FORMAT_VERSION {
            return Err(ListError::decryption(format!(
                "unsupported encryption version: {}",
                version
            )));
        }

        let mut nonce = [0u8; NONCE_SIZE];
        nonce.copy_from_slice(&bytes[1..1 + NONCE_SIZE]);

        Ok(Self {
            version,
            nonce,
            ciphertext: bytes[1 + NONCE_SIZE..].to_vec(),
        })
    }

    /// Encode the packed form as base64
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode from base64
    pub fn from_base64(encoded: &str) -> ListResult<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| ListError::decryption(format!("invalid base64: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl From<EncryptedData> for String {
    fn from(data: EncryptedData) -> Self {
        data.to_base64()
    }
}

impl TryFrom<String> for EncryptedData {
    type Error = ListError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_base64(&value)
    }
}

fn cipher_for(key: &ControlKey) -> ListResult<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| ListError::Encryption(format!("Failed to create cipher: {}", e)))
}

/// Encrypt plaintext under a control key
pub fn encrypt(plaintext: &[u8], key: &ControlKey) -> ListResult<EncryptedData> {
    let cipher = cipher_for(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let aad = key.control_id().value().to_be_bytes();
    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &aad,
            },
        )
        .map_err(|e| ListError::Encryption(format!("Encryption failed: {}", e)))?;

    Ok(EncryptedData {
        version: FORMAT_VERSION,
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Decrypt a sealed payload with a control key
///
/// Fails if the key (or its control id) differs from the one used to seal,
/// or if the payload was tampered with.
pub fn decrypt(encrypted: &EncryptedData, key: &ControlKey) -> ListResult<Vec<u8>> {
    if encrypted.version != FORMAT_VERSION {
        return Err(ListError::decryption(format!(
            "unsupported encryption version: {}",
            encrypted.version
        )));
    }

    let cipher = cipher_for(key)?;
    let nonce = Nonce::from_slice(&encrypted.nonce);
    let aad = key.control_id().value().to_be_bytes();

    cipher
        .decrypt(
            nonce,
            Payload {
                msg: &encrypted.ciphertext,
                aad: &aad,
            },
        )
        .map_err(|_| ListError::decryption("invalid key or corrupted data"))
}

/// Encrypt a string
pub fn encrypt_string(plaintext: &str, key: &ControlKey) -> ListResult<EncryptedData> {
    encrypt(plaintext.as_bytes(), key)
}

/// Decrypt to a string
pub fn decrypt_string(encrypted: &EncryptedData, key: &ControlKey) -> ListResult<String> {
    let plaintext = decrypt(encrypted, key)?;
    String::from_utf8(plaintext)
        .map_err(|e| ListError::decryption(format!("invalid UTF-8 in decrypted data: {}", e)))
}
