//! Encrypted text fields
//!
//! A field holds its cleartext, its ciphertext, or both. The missing side is
//! derived on demand with an explicit key and cached. Ciphertext remembers
//! the control id it was sealed under, so a cached payload is only reused
//! for a key of that same control.

use std::fmt;

use crate::crypto::{decrypt_string, encrypt_string, ControlKey, EncryptedData};
use crate::error::{ListError, ListResult};

use super::ControlId;

/// Ciphertext together with the control it was sealed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedValue {
    control_id: ControlId,
    data: EncryptedData,
}

impl SealedValue {
    pub fn new(control_id: ControlId, data: EncryptedData) -> Self {
        Self { control_id, data }
    }

    pub fn control_id(&self) -> ControlId {
        self.control_id
    }

    fn open(&self, key: &ControlKey) -> ListResult<String> {
        if key.control_id() != self.control_id {
            return Err(ListError::decryption(format!(
                "sealed under {}, key is for {}",
                self.control_id,
                key.control_id()
            )));
        }
        decrypt_string(&self.data, key)
    }
}

#[derive(Clone)]
enum FieldState {
    Clear(String),
    Sealed(SealedValue),
    Both { clear: String, sealed: SealedValue },
}

/// A text value that is persisted encrypted
#[derive(Clone)]
pub struct EncryptedField {
    state: FieldState,
}

impl EncryptedField {
    /// New data entered in cleartext
    pub fn from_cleartext(value: impl Into<String>) -> Self {
        Self {
            state: FieldState::Clear(value.into()),
        }
    }

    /// Data loaded from storage in sealed form
    pub fn from_ciphertext(control_id: ControlId, data: EncryptedData) -> Self {
        Self {
            state: FieldState::Sealed(SealedValue::new(control_id, data)),
        }
    }

    /// Data loaded with both forms present
    ///
    /// The ciphertext is opened and compared against the cleartext; a
    /// mismatch is reported as a decryption failure.
    pub fn from_pair(
        value: impl Into<String>,
        data: EncryptedData,
        key: &ControlKey,
    ) -> ListResult<Self> {
        let clear = value.into();
        let sealed = SealedValue::new(key.control_id(), data);
        if sealed.open(key)? != clear {
            return Err(ListError::decryption(
                "ciphertext does not match the stored cleartext",
            ));
        }
        Ok(Self {
            state: FieldState::Both { clear, sealed },
        })
    }

    /// Replace the value; any cached ciphertext becomes stale
    ///
    /// Setting the value it already holds keeps the cached ciphertext.
    pub fn set_cleartext(&mut self, value: impl Into<String>) {
        let value = value.into();
        if self.cleartext() == Some(value.as_str()) {
            return;
        }
        self.state = FieldState::Clear(value);
    }

    /// The cleartext, if it has been materialized
    pub fn cleartext(&self) -> Option<&str> {
        match &self.state {
            FieldState::Clear(clear) | FieldState::Both { clear, .. } => Some(clear),
            FieldState::Sealed(_) => None,
        }
    }

    /// The cleartext, decrypting and caching it if necessary
    pub fn decrypt(&mut self, key: &ControlKey) -> ListResult<&str> {
        if let FieldState::Sealed(sealed) = &self.state {
            let clear = sealed.open(key)?;
            let sealed = sealed.clone();
            self.state = FieldState::Both { clear, sealed };
        }
        self.cleartext()
            .ok_or_else(|| ListError::decryption("field has no cleartext"))
    }

    /// The ciphertext for `key`, sealing and caching it if necessary
    ///
    /// A cached payload sealed under a different control is replaced, which
    /// requires the cleartext to be available.
    pub fn ciphertext(&mut self, key: &ControlKey) -> ListResult<&EncryptedData> {
        let reseal = match &self.state {
            FieldState::Sealed(sealed) | FieldState::Both { sealed, .. }
                if sealed.control_id == key.control_id() =>
            {
                None
            }
            FieldState::Sealed(sealed) => {
                return Err(ListError::decryption(format!(
                    "cannot reseal a value held only as ciphertext under {}",
                    sealed.control_id
                )));
            }
            FieldState::Clear(clear) | FieldState::Both { clear, .. } => Some(clear.clone()),
        };

        if let Some(clear) = reseal {
            let data = encrypt_string(&clear, key)?;
            self.state = FieldState::Both {
                clear,
                sealed: SealedValue::new(key.control_id(), data),
            };
        }

        match &self.state {
            FieldState::Sealed(sealed) | FieldState::Both { sealed, .. } => Ok(&sealed.data),
            FieldState::Clear(_) => Err(ListError::Encryption("field was not sealed".into())),
        }
    }

    /// Drop cached ciphertext so the next persistence reseals
    ///
    /// Fails if the field is only held as ciphertext.
    pub fn invalidate_ciphertext(&mut self) -> ListResult<()> {
        match &self.state {
            FieldState::Clear(_) => Ok(()),
            FieldState::Both { clear, .. } => {
                self.state = FieldState::Clear(clear.clone());
                Ok(())
            }
            FieldState::Sealed(sealed) => Err(ListError::decryption(format!(
                "value under {} must be decrypted before it can be rekeyed",
                sealed.control_id
            ))),
        }
    }

    /// Control id of the cached ciphertext, if any
    pub fn sealed_under(&self) -> Option<ControlId> {
        match &self.state {
            FieldState::Sealed(sealed) | FieldState::Both { sealed, .. } => {
                Some(sealed.control_id)
            }
            FieldState::Clear(_) => None,
        }
    }

    /// Logical equality: both cleartexts known and equal
    pub fn same_value(&self, other: &EncryptedField) -> bool {
        match (self.cleartext(), other.cleartext()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

// Cleartext stays out of Debug output
impl fmt::Debug for EncryptedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedField")
            .field("clear", &self.cleartext().is_some())
            .field("sealed_under", &self.sealed_under())
            .finish()
    }
}
