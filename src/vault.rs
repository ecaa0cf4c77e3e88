//! Key share vault
//!
//! Ties the codec to a share repository: shares are sealed before they reach
//! storage and opened after they leave it. Wallet pre-generation calls
//! [`KeyShareVault::store_share`]; signing workflows call
//! [`KeyShareVault::load_share`] to rehydrate a session.

use crate::codec::EnvelopeCodec;
use crate::error::require_non_empty;
use crate::store::ShareRepository;
use crate::Result;

/// Encrypting front end over a [`ShareRepository`]
#[derive(Debug)]
pub struct KeyShareVault<R> {
    codec: EnvelopeCodec,
    repository: R,
}

impl<R: ShareRepository> KeyShareVault<R> {
    pub fn new(codec: EnvelopeCodec, repository: R) -> Self {
        Self { codec, repository }
    }

    /// Encrypt `plaintext` and upsert it for `identifier`
    pub async fn store_share(&self, identifier: &str, plaintext: &str) -> Result<()> {
        require_non_empty("identifier", identifier)?;
        let envelope = self.codec.encrypt(plaintext)?;
        self.repository.set_share(identifier, &envelope).await
    }

    /// Load and decrypt the share stored for `identifier`
    ///
    /// A stored envelope that cannot be decrypted is an error, never `None`.
    pub async fn load_share(&self, identifier: &str) -> Result<Option<String>> {
        match self.repository.get_share(identifier).await? {
            Some(envelope) => self.codec.decrypt(&envelope).map(Some),
            None => Ok(None),
        }
    }

    pub fn codec(&self) -> &EnvelopeCodec {
        &self.codec
    }

    /// The underlying repository, for raw envelope access
    pub fn repository(&self) -> &R {
        &self.repository
    }
}
