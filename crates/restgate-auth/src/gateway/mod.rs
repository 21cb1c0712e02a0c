//! Authentication gateway.
//!
//! [`AuthGateway::authenticate`] runs once per inbound request:
//!
//! 1. Applicability: gated path segment or format query parameter, minus the
//!    exempt prefixes and the login path. Nothing else is touched.
//! 2. Application resolution: `auth-method` header, else the default.
//! 3. Strategy dispatch on the application's method.
//! 4. Audit and outcome.
//!
//! The configuration is an immutable [`GatewayConfig`] snapshot. Each request
//! loads the current snapshot once; [`AuthGateway::reload_config`] swaps in a
//! new one without blocking in-flight requests.

pub mod request;

use std::sync::Arc;

use arc_swap::ArcSwap;

pub use request::{APPLICATION_HEADER, RequestInfo};

use crate::audit::{ANONYMOUS, AuditLogger, AuditStatus, NewAuditEntry, UNKNOWN_METHOD};
use crate::AuthResult;
use crate::config::GatewayConfig;
use crate::error::{ErrorCode, Rejection};
use crate::registry::ApplicationRegistry;
use crate::storage::{User, UserStorage};
use crate::types::{Application, Principal};
use crate::validators::{Strategy, ValidationContext};

/// Result of running the gateway on a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    /// The gateway does not handle this request; pass it through untouched.
    NotApplicable,
    /// Authenticated.
    Allow(Principal),
    /// Rejected; the request must be terminated.
    Deny(Rejection),
}

/// Per-request authentication gateway.
pub struct AuthGateway {
    config: ArcSwap<GatewayConfig>,
    registry: Arc<ApplicationRegistry>,
    users: Arc<dyn UserStorage>,
    audit: AuditLogger,
}

impl std::fmt::Debug for AuthGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthGateway")
            .field("enabled", &self.config.load().enabled)
            .finish_non_exhaustive()
    }
}

impl AuthGateway {
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        registry: Arc<ApplicationRegistry>,
        users: Arc<dyn UserStorage>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            registry,
            users,
            audit,
        }
    }

    /// Current configuration snapshot.
    #[must_use]
    pub fn config(&self) -> Arc<GatewayConfig> {
        self.config.load_full()
    }

    /// Validates and installs a new configuration snapshot. An invalid
    /// configuration is rejected and the current one stays in place.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` describing the validation failure.
    pub fn reload_config(&self, config: GatewayConfig) -> AuthResult<()> {
        config.validate()?;
        tracing::info!(enabled = config.enabled, "Gateway configuration reloaded");
        self.config.store(Arc::new(config));
        Ok(())
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<ApplicationRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Returns `true` if the gateway handles this request.
    #[must_use]
    pub fn applies(&self, request: &RequestInfo<'_>) -> bool {
        applies(&self.config.load(), request)
    }

    /// Authenticates a request.
    pub async fn authenticate(&self, request: &RequestInfo<'_>) -> GatewayOutcome {
        let config = self.config.load_full();
        if !applies(&config, request) {
            return GatewayOutcome::NotApplicable;
        }

        let application = match self.resolve_application(request).await {
            Ok(app) => app,
            Err(code) => {
                return self
                    .deny(request, UNKNOWN_METHOD, Rejection::from(code))
                    .await;
            }
        };

        let strategy = Strategy::for_method(application.method);
        if !strategy.is_enforced() {
            tracing::debug!(
                application_id = %application.id,
                method = %application.method,
                "Application method is not enforced, passing request through"
            );
            return GatewayOutcome::NotApplicable;
        }

        let method_name = application.method.audit_name();
        let ctx = ValidationContext {
            users: self.users.as_ref(),
            expected_token: application.expected_token(config.api_token.as_deref()),
        };

        let user = match strategy.validate(request.headers, &ctx).await {
            Ok(user) => user,
            Err(rejection) => return self.deny(request, method_name, rejection).await,
        };

        let Some(user) = self.reload_user(&user).await else {
            return self
                .deny(request, method_name, Rejection::AccessDenied)
                .await;
        };

        self.audit
            .record(self.entry(request, method_name, &user.username, AuditStatus::Success, 200, None))
            .await;

        tracing::debug!(
            application_id = %application.id,
            user_id = %user.id,
            "Request authenticated"
        );
        GatewayOutcome::Allow(Principal::from_user(&user, application.id))
    }

    async fn resolve_application(&self, request: &RequestInfo<'_>) -> Result<Application, ErrorCode> {
        match request.application_selector() {
            Some(id) => self.registry.resolve(id).await.map_err(|_| {
                tracing::info!(application_id = %id, "Invalid application id in request");
                ErrorCode::InvalidApplicationId
            }),
            None => match self.registry.get_default().await {
                Some(app) => {
                    tracing::debug!(application_id = %app.id, "Using default application");
                    Ok(app)
                }
                None => {
                    tracing::info!("No application header and no default application configured");
                    Err(ErrorCode::MissingHeader)
                }
            },
        }
    }

    /// Re-loads the validated user by id. A vanished user or a failing store
    /// yields `None`.
    async fn reload_user(&self, user: &User) -> Option<User> {
        match self.users.find_by_id(&user.id).await {
            Ok(Some(fresh)) => Some(fresh),
            Ok(None) => {
                tracing::warn!(user_id = %user.id, "Validated user vanished before reload");
                None
            }
            Err(e) => {
                tracing::error!(user_id = %user.id, error = %e, "Failed to reload validated user");
                None
            }
        }
    }

    async fn deny(
        &self,
        request: &RequestInfo<'_>,
        method_name: &str,
        rejection: Rejection,
    ) -> GatewayOutcome {
        self.audit
            .record(self.entry(
                request,
                method_name,
                ANONYMOUS,
                AuditStatus::Failure,
                rejection.audit_code(),
                Some(rejection.audit_message().to_string()),
            ))
            .await;

        tracing::info!(
            endpoint = %request.path(),
            method = method_name,
            response_code = rejection.audit_code(),
            "Request denied"
        );
        GatewayOutcome::Deny(rejection)
    }

    fn entry(
        &self,
        request: &RequestInfo<'_>,
        method_name: &str,
        username: &str,
        status: AuditStatus,
        response_code: u16,
        error_message: Option<String>,
    ) -> NewAuditEntry {
        NewAuditEntry {
            timestamp: self.audit.now(),
            username: username.to_string(),
            client_ip: request.client_ip.clone(),
            http_method: request.method.to_string(),
            endpoint_url: request.endpoint_url(),
            authentication_method: method_name.to_string(),
            status,
            response_code,
            error_message,
            user_agent: request.user_agent().map(str::to_string),
        }
    }
}

fn applies(config: &GatewayConfig, request: &RequestInfo<'_>) -> bool {
    if !config.enabled {
        return false;
    }

    let rules = &config.paths;
    let path = request.path();
    if path == rules.login_path {
        return false;
    }
    if rules
        .exempt_prefixes
        .iter()
        .any(|prefix| path.starts_with(prefix.as_str()))
    {
        return false;
    }

    path.contains(rules.gated_segment.as_str()) || request.has_query_param(&rules.format_query_param)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::storage::{MemoryAuditStorage, MemoryUserStorage};
    use axum::http::Request;
    use axum::http::request::Parts;

    fn gateway(enabled: bool) -> AuthGateway {
        AuthGateway::new(
            GatewayConfig {
                enabled,
                ..GatewayConfig::default()
            },
            Arc::new(ApplicationRegistry::in_memory()),
            Arc::new(MemoryUserStorage::new()),
            AuditLogger::new(Arc::new(MemoryAuditStorage::new())),
        )
    }

    fn parts(uri: &str) -> Parts {
        Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    fn applies_to(gateway: &AuthGateway, uri: &str) -> bool {
        let parts = parts(uri);
        gateway.applies(&RequestInfo::from_parts(&parts))
    }

    #[test]
    fn test_applicability() {
        let gateway = gateway(true);
        assert!(applies_to(&gateway, "/jsonapi/node/article"));
        assert!(applies_to(&gateway, "/site/jsonapi/node"));
        assert!(applies_to(&gateway, "/node/1?_format=json"));
        assert!(applies_to(&gateway, "/node/1?page=1&_format=json"));

        assert!(!applies_to(&gateway, "/node/1"));
        assert!(!applies_to(&gateway, "/jsonapi"));
        assert!(!applies_to(&gateway, "/node/1?format=json"));
        assert!(!applies_to(&gateway, "/admin/config/services/jsonapi/settings"));
        assert!(!applies_to(&gateway, "/user/login?_format=json"));
    }

    #[test]
    fn test_disabled_gateway_never_applies() {
        let gateway = gateway(false);
        assert!(!applies_to(&gateway, "/jsonapi/node/article"));
        assert!(!applies_to(&gateway, "/node/1?_format=json"));
    }

    #[tokio::test]
    async fn test_reload_config() {
        let gateway = gateway(false);
        assert!(!applies_to(&gateway, "/jsonapi/node"));

        gateway
            .reload_config(GatewayConfig {
                enabled: true,
                ..GatewayConfig::default()
            })
            .unwrap();
        assert!(applies_to(&gateway, "/jsonapi/node"));

        let invalid = GatewayConfig {
            enabled: false,
            api_token: Some(" ".to_string()),
            ..GatewayConfig::default()
        };
        let err = gateway.reload_config(invalid).unwrap_err();
        assert!(matches!(err, AuthError::Configuration { .. }));
        assert!(err.is_server_error());
        assert!(gateway.config().enabled);
    }

    #[tokio::test]
    async fn test_missing_header_without_default() {
        let gateway = gateway(true);
        let parts = parts("/jsonapi/node");
        let outcome = gateway.authenticate(&RequestInfo::from_parts(&parts)).await;

        let GatewayOutcome::Deny(Rejection::Api(err)) = outcome else {
            panic!("expected a structured rejection");
        };
        assert_eq!(err.error, ErrorCode::MissingHeader);
        assert_eq!(err.http_code, 400);
    }
}
