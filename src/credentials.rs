//! Provider credentials and their on-disk store.

use crate::error::ForgeError;
use crate::provider::ProviderId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Provider id to API key. An absent or empty key means "not configured".
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    keys: BTreeMap<ProviderId, String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a key; blank keys clear the provider.
    pub fn set(&mut self, provider: ProviderId, api_key: impl Into<String>) {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            self.keys.remove(&provider);
        } else {
            self.keys.insert(provider, api_key);
        }
    }

    pub fn with(mut self, provider: ProviderId, api_key: impl Into<String>) -> Self {
        self.set(provider, api_key);
        self
    }

    /// Key for `provider`, or the empty string when not configured.
    pub fn get(&self, provider: ProviderId) -> &str {
        self.keys.get(&provider).map(String::as_str).unwrap_or("")
    }

    pub fn is_configured(&self, provider: ProviderId) -> bool {
        !self.get(provider).is_empty()
    }

    pub fn any_configured(&self) -> bool {
        ProviderId::ALL.iter().any(|p| self.is_configured(*p))
    }

    /// First configured provider in preference order.
    pub fn first_configured(&self) -> Option<ProviderId> {
        ProviderId::ALL.into_iter().find(|p| self.is_configured(*p))
    }

    /// Overlay every configured key from `other`.
    pub fn merge(&mut self, other: &Credentials) {
        for (provider, key) in &other.keys {
            self.set(*provider, key.clone());
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for provider in self.keys.keys() {
            map.entry(&provider.as_str(), &"<redacted>");
        }
        map.finish()
    }
}

/// Persisted provider selection: the active provider plus its keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCredentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_provider: Option<ProviderId>,
    #[serde(default)]
    pub keys: Credentials,
}

/// JSON file holding [`SavedCredentials`].
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    const FILE_NAME: &'static str = "credentials.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load saved credentials; a missing file yields the empty default.
    pub fn load(&self) -> Result<SavedCredentials, ForgeError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No saved credentials");
            return Ok(SavedCredentials::default());
        }
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            ForgeError::Storage(format!(
                "Failed to read credentials {}: {}",
                self.path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ForgeError::Storage(format!(
                "Could not load saved keys from {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    pub fn save(&self, saved: &SavedCredentials) -> Result<(), ForgeError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ForgeError::Storage(format!("Failed to create data directory: {}", e))
            })?;
        }
        let raw = serde_json::to_string_pretty(saved)
            .map_err(|e| ForgeError::Storage(format!("Failed to encode credentials: {}", e)))?;
        std::fs::write(&self.path, raw).map_err(|e| {
            ForgeError::Storage(format!(
                "Failed to write credentials {}: {}",
                self.path.display(),
                e
            ))
        })?;
        restrict_permissions(&self.path)?;
        debug!(path = %self.path.display(), "Credentials saved");
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<(), ForgeError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<(), ForgeError> {
    Ok(())
}
