//! Persistent key share storage
//!
//! Stores opaque ciphertext envelopes keyed by identifier (typically the
//! owner's email address). Envelopes are never decrypted here; see
//! [`crate::vault`] for the encrypt-then-store composition.

mod memory;
mod sqlite;

pub use memory::MemoryShareStore;
pub use sqlite::{ShareStore, TABLE_NAME};

use crate::Result;
use async_trait::async_trait;

/// Keyed storage of ciphertext envelopes
///
/// Implementations reject empty identifiers and envelopes with
/// [`crate::Error::Validation`] and treat `set_share` as an upsert.
#[async_trait]
pub trait ShareRepository: Send + Sync {
    /// Fetch the envelope stored for `identifier`, or `None` if there is none
    async fn get_share(&self, identifier: &str) -> Result<Option<String>>;

    /// Insert or replace the envelope stored for `identifier`
    async fn set_share(&self, identifier: &str, envelope: &str) -> Result<()>;
}
