use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Keychain service name
const SERVICE_NAME: &str = "petdesk";

/// Keychain account / persisted entry key
const TOKEN_KEY: &str = "token";

/// Credential file name in the data directory
const CREDENTIAL_FILE: &str = "credential.json";

/// Single source of truth for the current bearer token.
///
/// None of the operations fail from the caller's point of view. Backends that
/// persist log write failures and keep serving the in-memory value.
pub trait CredentialStore: Send + Sync {
    /// Current token, or None if never set or cleared.
    fn get(&self) -> Option<String>;

    /// Store `token`, replacing any previous value. The shape is not validated.
    fn set(&self, token: &str);

    /// Remove the token. Clearing an absent token is a no-op.
    fn clear(&self);

    fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

fn read_lock(lock: &RwLock<Option<String>>) -> RwLockReadGuard<'_, Option<String>> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock(lock: &RwLock<Option<String>>) -> RwLockWriteGuard<'_, Option<String>> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<String> {
        read_lock(&self.token).clone()
    }

    fn set(&self, token: &str) {
        *write_lock(&self.token) = Some(token.to_string());
    }

    fn clear(&self) {
        *write_lock(&self.token) = None;
    }
}

// ============================================================================
// File-backed
// ============================================================================

/// On-disk shape: exactly one `"token"` entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCredential {
    token: String,
}

/// Token persisted as JSON in the user's data directory.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    token: RwLock<Option<String>>,
}

impl FileCredentialStore {
    /// Open the store at the default location (`<data_dir>/petdesk/credential.json`).
    pub fn open_default() -> Result<Self> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(Self::open(data_dir.join(SERVICE_NAME).join(CREDENTIAL_FILE)))
    }

    /// Open the store at `path`. A missing or unreadable file reads as absent.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let token = match Self::load(&path) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Ignoring unreadable credential file");
                None
            }
        };
        Self {
            path,
            token: RwLock::new(token),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .context("Failed to read credential file")?;
        let stored: StoredCredential = serde_json::from_str(&contents)
            .context("Failed to parse credential file")?;
        Ok(Some(stored.token))
    }

    fn save(&self, token: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string(&StoredCredential {
            token: token.to_string(),
        })?;
        std::fs::write(&self.path, contents)?;
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<String> {
        read_lock(&self.token).clone()
    }

    fn set(&self, token: &str) {
        let mut guard = write_lock(&self.token);
        *guard = Some(token.to_string());
        if let Err(e) = self.save(token) {
            warn!(error = %e, path = %self.path.display(), "Failed to persist credential");
        }
    }

    fn clear(&self) {
        let mut guard = write_lock(&self.token);
        *guard = None;
        if let Err(e) = self.remove() {
            warn!(error = %e, path = %self.path.display(), "Failed to remove credential file");
        }
    }
}

// ============================================================================
// OS keychain
// ============================================================================

/// Token held in the OS keychain.
///
/// The value read at open is cached so a keychain hiccup after login does not
/// drop the session mid-run. Native stores are enabled for macOS, Windows and
/// Linux (kernel keyutils); other targets get keyring's per-entry mock.
pub struct KeyringCredentialStore {
    entry: Entry,
    token: RwLock<Option<String>>,
}

impl KeyringCredentialStore {
    pub fn open() -> Result<Self> {
        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        warn!("No native keychain on this platform, token will not outlive the process");

        Self::open_entry(SERVICE_NAME, TOKEN_KEY)
    }

    fn open_entry(service: &str, account: &str) -> Result<Self> {
        let entry = Entry::new(service, account)
            .context("Failed to create keyring entry")?;
        let token = match entry.get_password() {
            Ok(token) => Some(token),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read token from keychain");
                None
            }
        };
        Ok(Self {
            entry,
            token: RwLock::new(token),
        })
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self) -> Option<String> {
        read_lock(&self.token).clone()
    }

    fn set(&self, token: &str) {
        let mut guard = write_lock(&self.token);
        *guard = Some(token.to_string());
        if let Err(e) = self.entry.set_password(token) {
            warn!(error = %e, "Failed to store token in keychain");
        }
    }

    fn clear(&self) {
        let mut guard = write_lock(&self.token);
        *guard = None;
        match self.entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => warn!(error = %e, "Failed to delete token from keychain"),
        }
        debug!("Keychain token cleared");
    }
}
