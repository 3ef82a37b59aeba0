//! secrets
//!
//! Secret storage abstraction for host tokens.
//!
//! # Architecture
//!
//! Secrets are stored through the `SecretStore` trait:
//!
//! - [`FileSecretStore`]: Stores in `~/.upstep/secrets.toml` (default)
//! - [`MemorySecretStore`]: In-process store for tests and `--token` overrides
//!
//! # Security
//!
//! - Secrets are **never** logged or included in error messages
//! - File store uses 0600 permissions on Unix (owner read/write only)
//! - All writes are atomic (temp file + rename)
//!
//! # Example
//!
//! ```ignore
//! use upstep::secrets::{create_store, token_key};
//!
//! let store = create_store("file")?;
//! store.set(&token_key("github.com"), "ghp_xxxx...")?;
//! ```

mod file_store;
mod traits;

use std::collections::HashMap;
use std::sync::Mutex;

pub use file_store::FileSecretStore;
pub use traits::{token_key, SecretError, SecretStore};

/// The default secret store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Create a secret store based on the provider name.
///
/// # Providers
///
/// - `"file"` (default): [`FileSecretStore`] storing in `~/.upstep/secrets.toml`
/// - `"memory"`: [`MemorySecretStore`], empty and not persisted
///
/// # Errors
///
/// Unknown provider names and file store initialization errors.
pub fn create_store(provider: &str) -> Result<Box<dyn SecretStore>, SecretError> {
    match provider {
        "file" => Ok(Box::new(FileSecretStore::new()?)),
        "memory" => Ok(Box::new(MemorySecretStore::default())),
        other => Err(SecretError::ProviderNotAvailable(format!(
            "unknown secret provider: '{}' (valid: file, memory)",
            other
        ))),
    }
}

/// Names accepted by [`create_store`].
pub fn valid_provider_names() -> &'static [&'static str] {
    &["file", "memory"]
}

/// In-memory secret store.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    /// Create a store pre-populated with `(key, value)` pairs.
    pub fn with_secrets<I, K, V>(secrets: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            secrets: Mutex::new(
                secrets
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, SecretError> {
        self.secrets
            .lock()
            .map_err(|_| SecretError::ReadError("secret store lock poisoned".into()))
    }
}

impl SecretStore for MemorySecretStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecretError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecretError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecretError> {
        self.lock()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_memory_store() {
        let store = create_store("memory").unwrap();
        assert!(store.get("github.com.token").unwrap().is_none());
    }

    #[test]
    fn create_unknown_provider() {
        match create_store("vault") {
            Err(SecretError::ProviderNotAvailable(msg)) => assert!(msg.contains("vault")),
            Err(e) => panic!("unexpected error type: {:?}", e),
            Ok(_) => panic!("expected error"),
        }
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemorySecretStore::with_secrets([("a.token", "1")]);
        assert!(store.exists("a.token").unwrap());
        store.set("b.token", "2").unwrap();
        store.delete("a.token").unwrap();
        assert!(!store.exists("a.token").unwrap());
        assert_eq!(store.get("b.token").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn provider_names_are_creatable() {
        assert!(valid_provider_names().contains(&DEFAULT_PROVIDER));
        assert!(create_store("memory").is_ok());
    }
}
