//! Environment-driven configuration
//!
//! These tests mutate process environment variables, so they live in their
//! own test binary, away from the SQLite-backed unit tests.

use keyshare_vault::{
    decrypt, encrypt, Config, EnvelopeCodec, Error, MasterKey, DATABASE_PATH_ENV,
    ENCRYPTION_KEY_ENV,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

const TEST_KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";

// Serializes tests within this binary that touch the environment
static ENV_LOCK: Mutex<()> = Mutex::new(());

#[test]
fn master_key_from_env_counts_bytes() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let var = "KEYSHARE_TEST_MASTER_KEY_FROM_ENV";

    std::env::remove_var(var);
    assert!(matches!(MasterKey::from_env(var), Err(Error::Config(_))));

    std::env::set_var(var, "too-short");
    let err = MasterKey::from_env(var).unwrap_err();
    assert!(err.to_string().contains("got 9 bytes"));

    // 31 characters, 32 bytes
    std::env::set_var(var, "é123456789abcdef0123456789abcde");
    assert!(MasterKey::from_env(var).is_ok());

    // 32 characters, 33 bytes
    std::env::set_var(var, "é123456789abcdef0123456789abcdef");
    assert!(matches!(MasterKey::from_env(var), Err(Error::Config(_))));

    std::env::set_var(var, std::str::from_utf8(TEST_KEY).unwrap());
    let from_env = EnvelopeCodec::from_env(var).unwrap();
    let from_bytes = EnvelopeCodec::new(MasterKey::from_bytes(TEST_KEY).unwrap());
    let envelope = from_env.encrypt("share-blob-123").unwrap();
    assert_eq!(from_bytes.decrypt(&envelope).unwrap(), "share-blob-123");

    std::env::remove_var(var);
}

#[test]
fn encrypt_and_decrypt_read_encryption_key() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    std::env::remove_var(ENCRYPTION_KEY_ENV);
    assert!(matches!(encrypt("share-blob-123"), Err(Error::Config(_))));
    assert!(matches!(decrypt("00:00"), Err(Error::Config(_))));

    // Argument validation happens before the key is read
    assert!(matches!(encrypt(""), Err(Error::Validation(_))));

    std::env::set_var(ENCRYPTION_KEY_ENV, "0123456789abcdef");
    assert!(matches!(encrypt("share-blob-123"), Err(Error::Config(_))));

    std::env::set_var(ENCRYPTION_KEY_ENV, std::str::from_utf8(TEST_KEY).unwrap());
    let envelope = encrypt("share-blob-123").unwrap();
    assert_eq!(decrypt(&envelope).unwrap(), "share-blob-123");

    let codec = EnvelopeCodec::new(MasterKey::from_bytes(TEST_KEY).unwrap());
    assert_eq!(codec.decrypt(&envelope).unwrap(), "share-blob-123");

    std::env::remove_var(ENCRYPTION_KEY_ENV);
}

#[test]
fn config_file_with_env_override() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "store": {{ "database_path": "from-file.db" }} }}"#
    )
    .unwrap();

    std::env::remove_var(DATABASE_PATH_ENV);
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.store.database_path, PathBuf::from("from-file.db"));

    std::env::set_var(DATABASE_PATH_ENV, "from-env.db");
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.store.database_path, PathBuf::from("from-env.db"));
    assert_eq!(Config::from_env().store.database_path, PathBuf::from("from-env.db"));

    std::env::remove_var(DATABASE_PATH_ENV);
}
