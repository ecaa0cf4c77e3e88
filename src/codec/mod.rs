//! Envelope encryption for key shares
//!
//! Key shares are sealed with AES-256-CBC and PKCS#7 padding under the
//! process master key. Every call draws a fresh 16-byte IV from the OS RNG,
//! so encrypting the same share twice never yields the same envelope.
//!
//! Decryption rejects malformed envelopes, bad padding and non-UTF-8 output.
//! These checks are what catch a wrong master key or a corrupted record; a
//! failure is always an error and never an empty or default plaintext.
//!
//! Envelopes carry no MAC, so tamper detection is probabilistic. A modified
//! single-block envelope is rejected with overwhelming probability. In a
//! multi-block envelope a modified byte can occasionally survive the padding
//! and UTF-8 checks and decrypt to altered text; it never decrypts to the
//! original share.

mod envelope;
mod key;

pub use envelope::{Envelope, ENVELOPE_SEPARATOR, IV_LEN};
pub use key::{MasterKey, MASTER_KEY_LEN};

use crate::config::ENCRYPTION_KEY_ENV;
use crate::error::require_non_empty;
use crate::{Error, Result};
use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroize;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const BLOCK_LEN: usize = 16;

/// Encrypts and decrypts envelopes under a loaded master key
///
/// Construct once at startup and share it; the key is read and validated only
/// when the codec is built.
#[derive(Debug)]
pub struct EnvelopeCodec {
    key: MasterKey,
}

impl EnvelopeCodec {
    pub fn new(key: MasterKey) -> Self {
        Self { key }
    }

    /// Build a codec from the master key in `var_name`
    pub fn from_env(var_name: &str) -> Result<Self> {
        MasterKey::from_env(var_name).map(Self::new)
    }

    /// Encrypt a key share into a self-contained envelope string
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        require_non_empty("plaintext", plaintext)?;
        Ok(self.seal(plaintext.as_bytes())?.to_string())
    }

    /// Recover the key share sealed in `envelope`
    pub fn decrypt(&self, envelope: &str) -> Result<String> {
        require_non_empty("envelope", envelope)?;
        let envelope: Envelope = envelope.parse()?;
        self.open(&envelope)
    }

    fn seal(&self, plaintext: &[u8]) -> Result<Envelope> {
        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let cipher = Aes256CbcEnc::new_from_slices(self.key.expose(), &iv)
            .map_err(|e| Error::Config(format!("Invalid cipher parameters: {}", e)))?;
        let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        Ok(Envelope::new(iv, ciphertext))
    }

    fn open(&self, envelope: &Envelope) -> Result<String> {
        let ciphertext = envelope.ciphertext();
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
            return Err(Error::Decryption(format!(
                "Ciphertext length {} is not a positive multiple of {}",
                ciphertext.len(),
                BLOCK_LEN
            )));
        }

        let cipher = Aes256CbcDec::new_from_slices(self.key.expose(), envelope.iv())
            .map_err(|e| Error::Decryption(format!("Invalid cipher parameters: {}", e)))?;
        let plaintext = cipher
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| {
                Error::Decryption(
                    "Invalid padding. The master key may be incorrect or the envelope corrupted."
                        .to_string(),
                )
            })?;

        let plaintext = String::from_utf8(plaintext).map_err(|e| {
            e.into_bytes().zeroize();
            Error::Decryption(
                "Decrypted data is not valid text. The master key may be incorrect.".to_string(),
            )
        })?;

        if plaintext.is_empty() {
            return Err(Error::Decryption(
                "Decrypted key share is empty. The master key may be incorrect.".to_string(),
            ));
        }

        Ok(plaintext)
    }
}

/// Read the master key from `ENCRYPTION_KEY`
pub fn get_master_key() -> Result<MasterKey> {
    MasterKey::from_env(ENCRYPTION_KEY_ENV)
}

/// Encrypt a key share under the master key in `ENCRYPTION_KEY`
///
/// The key is read on every call, so a missing or malformed key is reported
/// as [`Error::Config`] before any cipher work happens.
pub fn encrypt(plaintext: &str) -> Result<String> {
    require_non_empty("plaintext", plaintext)?;
    EnvelopeCodec::new(get_master_key()?).encrypt(plaintext)
}

/// Decrypt an envelope under the master key in `ENCRYPTION_KEY`
pub fn decrypt(envelope: &str) -> Result<String> {
    require_non_empty("envelope", envelope)?;
    EnvelopeCodec::new(get_master_key()?).decrypt(envelope)
}
