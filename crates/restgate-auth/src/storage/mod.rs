//! Storage traits for gateway data.
//!
//! This module defines storage interfaces for:
//!
//! - User accounts (looked up during credential validation)
//! - The application registry
//! - The authentication audit log
//!
//! # Implementations
//!
//! In-memory backends live in [`memory`]; the registry also has a JSON file
//! backend. Database-backed storage is provided in separate crates:
//!
//! - `restgate-auth-postgres` - PostgreSQL audit log backend

pub mod audit;
pub mod memory;
pub mod registry;
pub mod user;

pub use audit::AuditStorage;
pub use memory::{MemoryAuditStorage, MemoryRegistryStorage, MemoryUserStorage};
pub use registry::{JsonFileRegistryStorage, RegistrySnapshot, RegistryStorage};
pub use user::{User, UserBuilder, UserStorage};
