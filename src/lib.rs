//! Key Share Vault
//!
//! Encrypted at-rest storage for MPC wallet key shares:
//! - Seal shares into self-describing AES-256-CBC envelopes under a master key
//! - Persist one envelope per identifier in SQLite with atomic upserts
//! - Open the store lazily with single-flight initialization
//!
//! # Security Model
//!
//! - The master key comes from the environment and lives only in a zeroizing
//!   secret container; it is never serialized or logged
//! - Storage only ever sees envelopes, never plaintext shares
//! - Decryption failures are always errors, never silently empty values

pub mod codec;
pub mod config;
pub mod store;
pub mod vault;

mod error;

// Re-export commonly used types
pub use codec::{decrypt, encrypt, get_master_key, Envelope, EnvelopeCodec, MasterKey};
pub use config::{Config, StoreConfig, DATABASE_PATH_ENV, ENCRYPTION_KEY_ENV};
pub use error::{Error, Result};
pub use store::{MemoryShareStore, ShareRepository, ShareStore};
pub use vault::KeyShareVault;
