use crate::common::Credential;
use crate::error::AuthError;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Durable home of the OAuth credential.
///
/// Callers treat a `get` followed by a `put` as one step; the bridge only ever
/// touches the store from within the OAuth manager.
pub trait CredentialStore: Send + Sync {
    /// Current credential; an empty one if nothing was stored
    fn get(&self) -> Result<Credential, AuthError>;

    fn put(&self, credential: &Credential) -> Result<(), AuthError>;

    /// Forget both tokens and the expiry
    fn clear(&self) -> Result<(), AuthError>;
}

/// File-backed store, one JSON document readable only by the owner
pub struct TokenStore {
    token_path: PathBuf,
}

impl TokenStore {
    pub fn new() -> Result<Self, AuthError> {
        let cache_dir = Self::get_cache_dir()?;
        Self::at(cache_dir.join("credential.json"))
    }

    /// Store the credential at an explicit path
    pub fn at(token_path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let token_path = token_path.into();

        // Create parent directory if it doesn't exist
        if let Some(parent) = token_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to create token directory: {}", e))
                })?;
            }
        }

        Ok(Self { token_path })
    }

    fn get_cache_dir() -> Result<PathBuf, AuthError> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| AuthError::Configuration("Could not find cache directory".to_string()))?
            .join("ourawatch");
        Ok(cache_dir)
    }

    pub fn path(&self) -> &Path {
        &self.token_path
    }
}

impl CredentialStore for TokenStore {
    fn get(&self) -> Result<Credential, AuthError> {
        if !self.token_path.exists() {
            return Ok(Credential::default());
        }

        let json = fs::read_to_string(&self.token_path)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to read token: {}", e)))?;

        Ok(serde_json::from_str(&json)?)
    }

    fn put(&self, credential: &Credential) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(credential)?;

        fs::write(&self.token_path, json)
            .map_err(|e| AuthError::TokenStorage(format!("Failed to save token: {}", e)))?;

        // Set permissions to 0600 (read/write for owner only)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.token_path)
                .map_err(|e| {
                    AuthError::TokenStorage(format!("Failed to get file permissions: {}", e))
                })?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.token_path, perms).map_err(|e| {
                AuthError::TokenStorage(format!("Failed to set file permissions: {}", e))
            })?;
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        if self.token_path.exists() {
            fs::remove_file(&self.token_path)
                .map_err(|e| AuthError::TokenStorage(format!("Failed to delete token: {}", e)))?;
        }
        Ok(())
    }
}

/// Process-local store for tests and throwaway sessions
#[derive(Default)]
pub struct MemoryTokenStore {
    credential: Mutex<Credential>,
    writes: Mutex<usize>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            credential: Mutex::new(credential),
            writes: Mutex::new(0),
        }
    }

    /// Number of successful `put` calls
    pub fn writes(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryTokenStore {
    fn get(&self) -> Result<Credential, AuthError> {
        Ok(self
            .credential
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn put(&self, credential: &Credential) -> Result<(), AuthError> {
        *self.credential.lock().unwrap_or_else(PoisonError::into_inner) = credential.clone();
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.credential.lock().unwrap_or_else(PoisonError::into_inner) = Credential::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("ourawatch-auth-{}-{}", std::process::id(), name))
            .join("credential.json")
    }

    fn sample() -> Credential {
        Credential {
            access_token: Some("access".into()),
            refresh_token: Some("refresh".into()),
            expires_at: Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()),
        }
    }

    #[test]
    fn missing_file_reads_as_empty_credential() {
        let store = TokenStore::at(temp_path("missing")).unwrap();
        assert_eq!(store.get().unwrap(), Credential::default());
    }

    #[test]
    fn put_get_clear_cycle() {
        let store = TokenStore::at(temp_path("cycle")).unwrap();

        store.put(&sample()).unwrap();
        assert_eq!(store.get().unwrap(), sample());

        store.clear().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get().unwrap(), Credential::default());

        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let store = TokenStore::at(temp_path("perms")).unwrap();
        store.put(&sample()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        store.clear().unwrap();
    }

    #[test]
    fn memory_store_counts_writes() {
        let store = MemoryTokenStore::new();
        store.put(&sample()).unwrap();
        store.clear().unwrap();

        assert_eq!(store.writes(), 1);
        assert_eq!(store.get().unwrap(), Credential::default());
    }
}
