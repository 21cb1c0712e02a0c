//! Application registry.
//!
//! Holds the configured applications and the default selection. Reads take a
//! shared lock; every mutation takes the exclusive lock, applies the change to
//! a copy of the snapshot, persists that copy through the [`RegistryStorage`]
//! backend and only then publishes it. A failed save leaves the in-memory
//! registry untouched.
//!
//! Because `set_default` clears and sets flags under one exclusive lock, two
//! concurrent calls can never leave two defaults behind; the last writer wins.

use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::RwLock;

use crate::AuthResult;
use crate::error::AuthError;
use crate::secret::generate_api_token;
use crate::storage::{MemoryRegistryStorage, RegistrySnapshot, RegistryStorage};
use crate::types::{Application, ApplicationDraft};

/// Registry of applications keyed by id.
pub struct ApplicationRegistry {
    state: RwLock<RegistrySnapshot>,
    storage: Arc<dyn RegistryStorage>,
}

impl std::fmt::Debug for ApplicationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationRegistry").finish_non_exhaustive()
    }
}

impl ApplicationRegistry {
    /// Creates an empty registry persisted through `storage`.
    #[must_use]
    pub fn new(storage: Arc<dyn RegistryStorage>) -> Self {
        Self {
            state: RwLock::new(RegistrySnapshot::default()),
            storage,
        }
    }

    /// Creates an empty registry that persists nowhere but memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryRegistryStorage::new()))
    }

    /// Loads the registry from `storage`, starting empty if nothing is saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    pub async fn load(storage: Arc<dyn RegistryStorage>) -> AuthResult<Self> {
        let snapshot = storage.load().await?.unwrap_or_default();
        tracing::info!(
            applications = snapshot.applications.len(),
            default_application_id = ?snapshot.default_application_id,
            "Application registry loaded"
        );
        Ok(Self {
            state: RwLock::new(snapshot),
            storage,
        })
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Looks up an application by id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ApplicationNotFound` if no such application exists.
    pub async fn resolve(&self, id: &str) -> AuthResult<Application> {
        self.state
            .read()
            .await
            .applications
            .get(id)
            .cloned()
            .ok_or_else(|| AuthError::application_not_found(id))
    }

    /// Returns the default application.
    ///
    /// The configured default id is honoured only when that application still
    /// exists and is itself flagged default.
    pub async fn get_default(&self) -> Option<Application> {
        let state = self.state.read().await;
        let id = state.default_application_id.as_deref()?;
        state
            .applications
            .get(id)
            .filter(|app| app.is_default)
            .cloned()
    }

    /// All applications in insertion order.
    pub async fn list_all(&self) -> IndexMap<String, Application> {
        self.state.read().await.applications.clone()
    }

    /// Id recorded as the default, if any.
    pub async fn default_application_id(&self) -> Option<String> {
        self.state.read().await.default_application_id.clone()
    }

    /// Number of registered applications.
    pub async fn len(&self) -> usize {
        self.state.read().await.applications.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Registers a new, non-default application with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` for an invalid draft, or a storage
    /// error if persisting fails.
    pub async fn create(&self, draft: ApplicationDraft) -> AuthResult<Application> {
        draft.validate().map_err(AuthError::invalid_input)?;

        let mut state = self.state.write().await;
        let mut id = Application::generate_id();
        while state.applications.contains_key(&id) {
            id = Application::generate_id();
        }

        let app = Application::new(id, draft.name.trim(), draft.method);
        let mut next = state.clone();
        next.applications.insert(app.id.clone(), app.clone());
        self.commit(&mut state, next).await?;

        tracing::info!(application_id = %app.id, method = %app.method, "Application created");
        Ok(app)
    }

    /// Replaces the name and method of an application, keeping its id,
    /// default flag and token override.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ApplicationNotFound`, `AuthError::InvalidInput`,
    /// or a storage error.
    pub async fn update(&self, id: &str, draft: ApplicationDraft) -> AuthResult<Application> {
        draft.validate().map_err(AuthError::invalid_input)?;

        let mut state = self.state.write().await;
        let mut next = state.clone();
        let app = next
            .applications
            .get_mut(id)
            .ok_or_else(|| AuthError::application_not_found(id))?;
        app.name = draft.name.trim().to_string();
        app.method = draft.method;
        let updated = app.clone();
        self.commit(&mut state, next).await?;

        tracing::info!(application_id = %id, method = %updated.method, "Application updated");
        Ok(updated)
    }

    /// Removes an application. Deleting the default leaves no default; no
    /// other application is promoted.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ApplicationNotFound` or a storage error.
    pub async fn delete(&self, id: &str) -> AuthResult<Application> {
        let mut state = self.state.write().await;
        let mut next = state.clone();
        let removed = next
            .applications
            .shift_remove(id)
            .ok_or_else(|| AuthError::application_not_found(id))?;
        if next.default_application_id.as_deref() == Some(id) {
            next.default_application_id = None;
        }
        self.commit(&mut state, next).await?;

        tracing::info!(
            application_id = %id,
            was_default = removed.is_default,
            "Application deleted"
        );
        Ok(removed)
    }

    /// Makes `id` the only default application.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ApplicationNotFound` or a storage error.
    pub async fn set_default(&self, id: &str) -> AuthResult<Application> {
        let mut state = self.state.write().await;
        if !state.applications.contains_key(id) {
            return Err(AuthError::application_not_found(id));
        }

        let mut next = state.clone();
        for (app_id, app) in next.applications.iter_mut() {
            app.is_default = app_id == id;
        }
        next.default_application_id = Some(id.to_string());
        let selected = next.applications[id].clone();
        self.commit(&mut state, next).await?;

        tracing::info!(application_id = %id, "Default application set");
        Ok(selected)
    }

    /// Generates and stores a new per-application token, returning it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::ApplicationNotFound` or a storage error.
    pub async fn rotate_token(&self, id: &str) -> AuthResult<String> {
        let token = generate_api_token();

        let mut state = self.state.write().await;
        let mut next = state.clone();
        next.applications
            .get_mut(id)
            .ok_or_else(|| AuthError::application_not_found(id))?
            .api_token = Some(token.clone());
        self.commit(&mut state, next).await?;

        tracing::info!(application_id = %id, "Application token rotated");
        Ok(token)
    }

    /// Imports `applications` when the registry is empty. Returns the number
    /// imported; an already populated registry is left alone.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the seeds carry more than one
    /// default, or a storage error.
    pub async fn seed_if_empty(&self, applications: &[Application]) -> AuthResult<usize> {
        let mut state = self.state.write().await;
        if !state.applications.is_empty() || applications.is_empty() {
            return Ok(0);
        }

        let mut defaults = applications.iter().filter(|a| a.is_default);
        let default = defaults.next().map(|a| a.id.clone());
        if defaults.next().is_some() {
            return Err(AuthError::configuration(
                "at most one seeded application may be default",
            ));
        }

        let next = RegistrySnapshot {
            default_application_id: default,
            applications: applications
                .iter()
                .map(|app| (app.id.clone(), app.clone()))
                .collect(),
        };
        let count = next.applications.len();
        self.commit(&mut state, next).await?;

        tracing::info!(applications = count, "Application registry seeded from configuration");
        Ok(count)
    }

    async fn commit(
        &self,
        state: &mut RegistrySnapshot,
        next: RegistrySnapshot,
    ) -> AuthResult<()> {
        if let Err(e) = self.storage.save(&next).await {
            tracing::error!(error = %e, "Failed to persist application registry");
            return Err(e);
        }
        *state = next;
        Ok(())
    }
}
