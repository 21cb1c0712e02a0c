//! In-memory storage backends.
//!
//! Used by the server when no database is configured, and throughout the
//! test suites.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::RwLock;

use super::audit::AuditStorage;
use super::registry::{RegistrySnapshot, RegistryStorage};
use super::user::{User, UserStorage};
use crate::AuthResult;
use crate::audit::{AuditFilter, AuditLogEntry, AuditStats, NewAuditEntry};

// =============================================================================
// Users
// =============================================================================

/// User store backed by concurrent maps.
#[derive(Debug, Default)]
pub struct MemoryUserStorage {
    by_id: DashMap<String, User>,
    /// username -> id
    by_username: DashMap<String, String>,
}

impl MemoryUserStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `users`.
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let storage = Self::new();
        for user in users {
            storage.insert(user);
        }
        storage
    }

    /// Inserts or replaces a user.
    pub fn insert(&self, user: User) {
        if let Some(previous) = self.by_id.get(&user.id)
            && previous.username != user.username
        {
            self.by_username.remove(&previous.username);
        }
        self.by_username.insert(user.username.clone(), user.id.clone());
        self.by_id.insert(user.id.clone(), user);
    }

    /// Removes a user by id, returning it if present.
    pub fn remove(&self, user_id: &str) -> Option<User> {
        let (_, user) = self.by_id.remove(user_id)?;
        self.by_username.remove(&user.username);
        Some(user)
    }

    /// Activates or blocks a user. Returns `false` if the user is unknown.
    pub fn set_active(&self, user_id: &str, active: bool) -> bool {
        match self.by_id.get_mut(user_id) {
            Some(mut user) => {
                user.active = active;
                true
            }
            None => false,
        }
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl UserStorage for MemoryUserStorage {
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>> {
        Ok(self.by_id.get(user_id).map(|u| u.clone()))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let Some(id) = self.by_username.get(username).map(|id| id.clone()) else {
            return Ok(None);
        };
        self.find_by_id(&id).await
    }
}

// =============================================================================
// Audit log
// =============================================================================

/// Audit store kept in a vector. The schema flag mimics a database table so
/// the logger's lazy-creation path behaves the same against every backend.
#[derive(Debug, Default)]
pub struct MemoryAuditStorage {
    schema_ready: AtomicBool,
    next_id: AtomicI64,
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl MemoryAuditStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditStorage for MemoryAuditStorage {
    async fn schema_exists(&self) -> AuthResult<bool> {
        Ok(self.schema_ready.load(Ordering::Acquire))
    }

    async fn create_schema(&self) -> AuthResult<()> {
        self.schema_ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn insert(&self, entry: &NewAuditEntry) -> AuthResult<i64> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.entries.write().await.push(entry.clone().into_entry(id));
        Ok(id)
    }

    async fn query(
        &self,
        filter: &AuditFilter,
        limit: usize,
        offset: usize,
    ) -> AuthResult<Vec<AuditLogEntry>> {
        let entries = self.entries.read().await;
        let mut matched: Vec<&AuditLogEntry> =
            entries.iter().filter(|e| filter.matches(e)).collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));

        Ok(matched
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &AuditFilter) -> AuthResult<u64> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| filter.matches(e)).count() as u64)
    }

    async fn delete_all(&self) -> AuthResult<u64> {
        let mut entries = self.entries.write().await;
        let deleted = entries.len() as u64;
        entries.clear();
        Ok(deleted)
    }

    async fn stats(&self, now: i64) -> AuthResult<AuditStats> {
        let entries = self.entries.read().await;
        Ok(AuditStats::tally(entries.iter().map(|e| e.timestamp), now))
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Registry backend that keeps the last saved snapshot in memory.
#[derive(Debug, Default)]
pub struct MemoryRegistryStorage {
    snapshot: RwLock<Option<RegistrySnapshot>>,
}

impl MemoryRegistryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryStorage for MemoryRegistryStorage {
    async fn load(&self) -> AuthResult<Option<RegistrySnapshot>> {
        Ok(self.snapshot.read().await.clone())
    }

    async fn save(&self, snapshot: &RegistrySnapshot) -> AuthResult<()> {
        *self.snapshot.write().await = Some(snapshot.clone());
        Ok(())
    }
}
