//! Cryptographic functions for entity lists
//!
//! Provides AES-256-GCM field encryption with Argon2id key derivation,
//! keyed per control id.

pub mod encryption;
pub mod key_derivation;
pub mod keys;
pub mod secure_memory;

pub use encryption::{decrypt, decrypt_string, encrypt, encrypt_string, EncryptedData};
pub use key_derivation::{derive_key, KeyDerivationParams};
pub use keys::{ControlKey, KeyResolver, KeyRing, SharedKeys};
pub use secure_memory::SecureString;
