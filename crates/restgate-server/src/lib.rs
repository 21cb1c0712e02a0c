pub mod admin;
pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use admin::{ADMIN_PREFIX, AdminAuth, admin_routes};
pub use config::{AppConfig, AuditBackend, LoggingConfig, PostgresStorageConfig, ServerConfig, StorageConfig};
pub use observability::init_tracing;
pub use server::{AppState, RestgateServer, ServerBuilder, build_app, build_router};
