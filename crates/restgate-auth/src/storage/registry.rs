//! Application registry persistence.
//!
//! The registry is small and read-mostly, so backends store it as a single
//! snapshot document rather than row by row.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::AuthResult;
use crate::types::Application;

/// Serialized registry state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Id of the application used when a request names none.
    #[serde(default)]
    pub default_application_id: Option<String>,

    /// Applications keyed by id, in insertion order.
    #[serde(default)]
    pub applications: IndexMap<String, Application>,
}

/// Storage operations for the application registry.
#[async_trait]
pub trait RegistryStorage: Send + Sync {
    /// Loads the persisted snapshot, or `None` if nothing has been saved yet.
    async fn load(&self) -> AuthResult<Option<RegistrySnapshot>>;

    /// Replaces the persisted snapshot.
    async fn save(&self, snapshot: &RegistrySnapshot) -> AuthResult<()>;
}

/// Registry persisted as a pretty-printed JSON document.
///
/// Saves write a sibling temp file and rename it over the target so a crash
/// never leaves a truncated registry behind.
#[derive(Debug, Clone)]
pub struct JsonFileRegistryStorage {
    path: PathBuf,
}

impl JsonFileRegistryStorage {
    /// Creates a backend for `path`. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the registry document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "registry.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl RegistryStorage for JsonFileRegistryStorage {
    async fn load(&self) -> AuthResult<Option<RegistrySnapshot>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> AuthResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            applications = snapshot.applications.len(),
            "Registry saved"
        );
        Ok(())
    }
}
