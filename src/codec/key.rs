//! Master key handling
//!
//! SECURITY: the master key is only ever held inside a zeroizing `SecretBox`.
//! - It is never serialized
//! - `Debug` output is redacted
//! - The raw environment value is zeroized as soon as it has been copied

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretBox};
use zeroize::Zeroize;

/// Required master key length in bytes (AES-256)
pub const MASTER_KEY_LEN: usize = 32;

/// Process-wide symmetric key used to seal key share envelopes
pub struct MasterKey {
    key: SecretBox<[u8; MASTER_KEY_LEN]>,
}

impl MasterKey {
    /// Load the master key from an environment variable
    ///
    /// The variable's UTF-8 bytes are the key and must be exactly
    /// [`MASTER_KEY_LEN`] bytes long. Length is measured in bytes, not
    /// characters, so a value with multi-byte characters is rejected unless its
    /// encoded form is 32 bytes.
    pub fn from_env(var_name: &str) -> Result<Self> {
        let mut value = std::env::var(var_name).map_err(|_| {
            Error::Config(format!(
                "{} must be set and be {} bytes long",
                var_name, MASTER_KEY_LEN
            ))
        })?;

        let len = value.len();
        let key = Self::from_bytes(value.as_bytes());
        value.zeroize();

        key.map_err(|_| {
            Error::Config(format!(
                "{} must be exactly {} bytes long, got {} bytes",
                var_name, MASTER_KEY_LEN, len
            ))
        })
    }

    /// Create a master key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != MASTER_KEY_LEN {
            return Err(Error::Config(format!(
                "Master key must be exactly {} bytes long, got {} bytes",
                MASTER_KEY_LEN,
                bytes.len()
            )));
        }

        let mut key = Box::new([0u8; MASTER_KEY_LEN]);
        key.copy_from_slice(bytes);
        Ok(Self {
            key: SecretBox::new(key),
        })
    }

    pub(crate) fn expose(&self) -> &[u8; MASTER_KEY_LEN] {
        self.key.expose_secret()
    }
}

// Implement Debug manually to avoid exposing the key
impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
