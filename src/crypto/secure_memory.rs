//! Passphrase holder that wipes itself on drop

use std::fmt;
use std::ops::Deref;

use zeroize::Zeroizing;

/// Passphrase used to unlock control keys
///
/// Never printed: `Debug` and `Display` only show the length.
pub struct SecureString(Zeroizing<String>);

impl SecureString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Deref for SecureString {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString({} bytes)", self.0.len())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED {} bytes]", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_through_to_passphrase() {
        let passphrase = SecureString::from(String::from("hunter2"));
        assert_eq!(passphrase.len(), 7);
        assert_eq!(passphrase.as_str(), "hunter2");
    }

    #[test]
    fn test_never_formats_contents() {
        let passphrase: SecureString = "secret".into();
        assert_eq!(format!("{:?}", passphrase), "SecureString(6 bytes)");
        assert_eq!(passphrase.to_string(), "[REDACTED 6 bytes]");
    }
}
