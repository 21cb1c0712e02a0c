use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use restgate_auth::{
    ApplicationRegistry, AuditLogger, AuditStorage, AuthGateway, JsonFileRegistryStorage,
    MemoryAuditStorage, MemoryRegistryStorage, MemoryUserStorage, RegistryStorage,
    authenticate_request,
};
use restgate_auth_postgres::PostgresAuditStorage;
use tower_http::trace::TraceLayer;

use crate::{
    admin,
    config::{AppConfig, AuditBackend},
    handlers,
};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AuthGateway>,
    pub users: Arc<MemoryUserStorage>,
    /// Bearer token guarding the admin API.
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    /// Wires storage backends, seeds the registry and builds the gateway.
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let registry_storage: Arc<dyn RegistryStorage> = match &cfg.storage.registry_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Using file-backed application registry");
                Arc::new(JsonFileRegistryStorage::new(path))
            }
            None => Arc::new(MemoryRegistryStorage::new()),
        };
        let registry = Arc::new(ApplicationRegistry::load(registry_storage).await?);
        let seeded = registry.seed_if_empty(&cfg.gateway.applications).await?;
        tracing::info!(
            applications = registry.len().await,
            seeded,
            "Application registry ready"
        );

        let audit_storage: Arc<dyn AuditStorage> = match cfg.storage.audit {
            AuditBackend::Memory => Arc::new(MemoryAuditStorage::new()),
            AuditBackend::Postgres => {
                let pg = cfg.storage.postgres.clone().unwrap_or_default();
                Arc::new(PostgresAuditStorage::connect_lazy(
                    &pg.url,
                    pg.pool_size,
                    Duration::from_millis(pg.acquire_timeout_ms),
                )?)
            }
        };
        let audit = AuditLogger::new(audit_storage);
        if !audit.ensure_store_exists().await {
            tracing::warn!("Audit log store unavailable; authentication attempts will not be recorded");
        }

        let users = Arc::new(MemoryUserStorage::with_users(cfg.users.iter().cloned()));
        tracing::info!(users = users.len(), "User store loaded");

        let gateway = AuthGateway::new(cfg.gateway.clone(), registry, users.clone(), audit);

        Ok(Self {
            gateway: Arc::new(gateway),
            users,
            admin_token: cfg.server.admin_token.as_deref().map(Arc::from),
        })
    }
}

pub struct RestgateServer {
    addr: SocketAddr,
    app: Router,
}

pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg).await?;
    Ok(build_router(state, cfg.server.body_limit_bytes))
}

pub fn build_router(state: AppState, body_limit: usize) -> Router {
    let mut router = Router::new()
        // Health endpoints
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .route("/readyz", get(handlers::readyz))
        // Sample gated resource
        .route("/jsonapi/{*path}", get(handlers::jsonapi_resource));

    if state.admin_token.is_some() {
        router = router.nest(admin::ADMIN_PREFIX, admin::admin_routes());
    } else {
        tracing::warn!("server.admin_token not set; admin API disabled");
    }

    router
        // Middleware stack (order: body limit -> trace -> gateway)
        .layer(middleware::from_fn_with_state(
            state.gateway.clone(),
            authenticate_request,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>, latency: std::time::Duration, span: &tracing::Span| {
                        span.record("http.status_code", tracing::field::display(res.status().as_u16()));
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<RestgateServer> {
        let app = build_app(&self.config).await?;

        Ok(RestgateServer {
            addr: self.addr,
            app,
        })
    }
}

impl RestgateServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(
            listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
