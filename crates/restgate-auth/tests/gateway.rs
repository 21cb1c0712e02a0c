//! End-to-end gateway behaviour against in-memory stores.

use std::sync::Arc;

use axum::http::Request;
use axum::http::request::Parts;
use base64::{Engine, engine::general_purpose::STANDARD};
use time::macros::date;

use restgate_auth::audit::ANONYMOUS;
use restgate_auth::{
    ApiKeyMode, Application, ApplicationDraft, ApplicationRegistry, AuditFilter, AuditLogger,
    AuditStatus, AuthGateway, AuthMethod, ErrorCode, FixedClock, GatewayConfig, GatewayOutcome,
    MemoryAuditStorage, MemoryUserStorage, Rejection, RequestInfo, User,
};

const TOKEN: &str = "global-api-token";
const NOW: i64 = 1_709_285_400; // 2024-03-01T09:30:00Z

struct Harness {
    gateway: AuthGateway,
    users: Arc<MemoryUserStorage>,
    clock: Arc<FixedClock>,
}

impl Harness {
    async fn new() -> Self {
        let users = Arc::new(MemoryUserStorage::with_users([
            User::builder("alice").id("u-alice").add_role("editor").build(),
            User::builder("mallory").id("u-mallory").active(false).build(),
        ]));
        let clock = Arc::new(FixedClock::new(NOW));
        let audit = AuditLogger::with_clock(Arc::new(MemoryAuditStorage::new()), clock.clone());

        let registry = Arc::new(ApplicationRegistry::in_memory());
        let mut basic = Application::new("basic001", "Basic app", AuthMethod::Basic);
        basic.is_default = true;
        let header = Application::new(
            "header01",
            "Header app",
            AuthMethod::ApiKey {
                mode: ApiKeyMode::Header,
            },
        );
        let jwt = Application::new("jwtapp01", "JWT app", AuthMethod::Jwt);
        registry
            .seed_if_empty(&[basic, header, jwt])
            .await
            .expect("seed registry");

        let config = GatewayConfig {
            enabled: true,
            api_token: Some(TOKEN.to_string()),
            ..GatewayConfig::default()
        };

        Self {
            gateway: AuthGateway::new(config, registry, users.clone(), audit),
            users,
            clock,
        }
    }

    async fn run(&self, uri: &str, headers: &[(&str, String)]) -> GatewayOutcome {
        let parts = parts(uri, headers);
        self.gateway.authenticate(&RequestInfo::from_parts(&parts)).await
    }

    async fn entries(&self) -> Vec<restgate_auth::AuditLogEntry> {
        self.gateway
            .audit()
            .query(&AuditFilter::default(), 100, 0)
            .await
            .unwrap()
    }
}

fn parts(uri: &str, headers: &[(&str, String)]) -> Parts {
    let mut builder = Request::builder().uri(uri).header("user-agent", "itest/1.0");
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    builder.body(()).unwrap().into_parts().0
}

fn basic(raw: &str) -> (&'static str, String) {
    ("authorization", format!("Basic {}", STANDARD.encode(raw)))
}

fn api_key(raw: &str) -> (&'static str, String) {
    ("api-key", STANDARD.encode(raw))
}

fn app(id: &str) -> (&'static str, String) {
    ("auth-method", id.to_string())
}

fn denied_code(outcome: GatewayOutcome) -> ErrorCode {
    match outcome {
        GatewayOutcome::Deny(Rejection::Api(err)) => err.error,
        other => panic!("expected structured denial, got {other:?}"),
    }
}

#[tokio::test]
async fn basic_app_without_credentials_is_missing_authorization_header() {
    let h = Harness::new().await;

    for uri in ["/jsonapi/node/article", "/node/1?_format=json"] {
        let outcome = h.run(uri, &[]).await;
        let GatewayOutcome::Deny(Rejection::Api(err)) = outcome else {
            panic!("expected denial for {uri}");
        };
        assert_eq!(err.error, ErrorCode::MissingAuthorizationHeader);
        assert_eq!(err.http_code, 401);
    }
}

#[tokio::test]
async fn colonless_payload_is_format_error_not_user_error() {
    let h = Harness::new().await;

    let outcome = h.run("/jsonapi/node", &[basic("alice")]).await;
    assert_eq!(denied_code(outcome), ErrorCode::InvalidAuthorizationHeader);

    let outcome = h
        .run("/jsonapi/node", &[app("header01"), api_key("alice")])
        .await;
    assert_eq!(denied_code(outcome), ErrorCode::InvalidApiKeyFormat);
}

#[tokio::test]
async fn blocked_user_is_denied_with_one_failure_entry() {
    let h = Harness::new().await;

    let outcome = h
        .run("/jsonapi/node", &[basic(&format!("mallory:{TOKEN}"))])
        .await;
    let GatewayOutcome::Deny(Rejection::Api(err)) = outcome else {
        panic!("expected denial");
    };
    assert_eq!(err.error, ErrorCode::UserBlocked);
    assert_eq!(err.http_code, 403);

    let entries = h.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, AuditStatus::Failure);
    assert_eq!(entries[0].response_code, 403);
    assert_eq!(entries[0].username, ANONYMOUS);
    assert_eq!(entries[0].authentication_method, "basic_auth");
    assert_eq!(
        entries[0].error_message.as_deref(),
        Some("The user is blocked or inactive.")
    );
}

#[tokio::test]
async fn valid_credentials_allow_with_one_success_entry() {
    let h = Harness::new().await;

    let outcome = h
        .run("/jsonapi/node/article?page=2", &[basic(&format!("alice:{TOKEN}"))])
        .await;
    let GatewayOutcome::Allow(principal) = outcome else {
        panic!("expected allow");
    };
    assert_eq!(principal.id, "u-alice");
    assert_eq!(principal.username, "alice");
    assert_eq!(principal.roles, vec!["editor"]);
    assert_eq!(principal.application_id, "basic001");

    let entries = h.entries().await;
    assert_eq!(entries.len(), 1);
    let entry = &entries[0];
    assert_eq!(entry.status, AuditStatus::Success);
    assert_eq!(entry.response_code, 200);
    assert_eq!(entry.username, "alice");
    assert_eq!(entry.timestamp, NOW);
    assert_eq!(entry.http_method, "GET");
    assert_eq!(entry.endpoint_url, "/jsonapi/node/article?page=2");
    assert_eq!(entry.user_agent.as_deref(), Some("itest/1.0"));
    assert!(entry.error_message.is_none());
}

#[tokio::test]
async fn header_mode_api_key() {
    let h = Harness::new().await;

    let outcome = h
        .run("/jsonapi/node", &[app("header01"), api_key(&format!("alice:{TOKEN}"))])
        .await;
    assert!(matches!(outcome, GatewayOutcome::Allow(_)));

    let outcome = h
        .run("/jsonapi/node", &[app(" header01 "), basic(&format!("alice:{TOKEN}"))])
        .await;
    assert_eq!(denied_code(outcome), ErrorCode::MissingApiKeyHeader);

    let entries = h.entries().await;
    assert!(entries.iter().all(|e| e.authentication_method == "api_key"));
}

#[tokio::test]
async fn wrong_secret_and_unknown_user() {
    let h = Harness::new().await;

    let outcome = h.run("/jsonapi/node", &[basic("alice:nope")]).await;
    assert_eq!(denied_code(outcome), ErrorCode::InvalidApiKey);

    let outcome = h.run("/jsonapi/node", &[basic("nobody:nope")]).await;
    let GatewayOutcome::Deny(Rejection::Api(err)) = outcome else {
        panic!("expected denial");
    };
    assert_eq!(err.error, ErrorCode::UserDoesNotExist);
    assert_eq!(err.http_code, 404);
}

#[tokio::test]
async fn per_application_token_overrides_global() {
    let h = Harness::new().await;
    let token = h.gateway.registry().rotate_token("basic001").await.unwrap();

    let outcome = h
        .run("/jsonapi/node", &[basic(&format!("alice:{TOKEN}"))])
        .await;
    assert_eq!(denied_code(outcome), ErrorCode::InvalidApiKey);

    let outcome = h
        .run("/jsonapi/node", &[basic(&format!("alice:{token}"))])
        .await;
    assert!(matches!(outcome, GatewayOutcome::Allow(_)));
}

#[tokio::test]
async fn application_resolution_failures() {
    let h = Harness::new().await;

    let outcome = h.run("/jsonapi/node", &[app("zzzzzzzz")]).await;
    let GatewayOutcome::Deny(Rejection::Api(err)) = outcome else {
        panic!("expected denial");
    };
    assert_eq!(err.error, ErrorCode::InvalidApplicationId);
    assert_eq!(err.http_code, 400);

    let outcome = h.run("/jsonapi/node", &[app("  ")]).await;
    assert_eq!(denied_code(outcome), ErrorCode::InvalidApplicationId);

    h.gateway.registry().delete("basic001").await.unwrap();
    let outcome = h.run("/jsonapi/node", &[]).await;
    assert_eq!(denied_code(outcome), ErrorCode::MissingHeader);

    let entries = h.entries().await;
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().all(|e| e.authentication_method == "unknown"));
    assert!(entries.iter().all(|e| e.response_code == 400));
}

#[tokio::test]
async fn unenforced_method_passes_through_without_audit() {
    let h = Harness::new().await;

    let outcome = h.run("/jsonapi/node", &[app("jwtapp01")]).await;
    assert_eq!(outcome, GatewayOutcome::NotApplicable);
    assert!(h.entries().await.is_empty());
}

#[tokio::test]
async fn non_gated_paths_never_validate_or_audit() {
    let h = Harness::new().await;

    for uri in [
        "/node/1",
        "/api/users?format=json",
        "/admin/config/services/jsonapi/resource_types",
        "/user/login?_format=json",
    ] {
        let outcome = h.run(uri, &[basic("alice:nope")]).await;
        assert_eq!(outcome, GatewayOutcome::NotApplicable, "{uri}");
    }
    assert!(h.entries().await.is_empty());
}

#[tokio::test]
async fn vanished_user_fails_closed() {
    struct VanishingUsers(MemoryUserStorage);

    #[async_trait::async_trait]
    impl restgate_auth::UserStorage for VanishingUsers {
        async fn find_by_id(&self, _: &str) -> restgate_auth::AuthResult<Option<User>> {
            Ok(None)
        }
        async fn find_by_username(&self, name: &str) -> restgate_auth::AuthResult<Option<User>> {
            self.0.find_by_username(name).await
        }
    }

    let h = Harness::new().await;
    let users = VanishingUsers(MemoryUserStorage::with_users([User::builder("alice").build()]));
    let gateway = AuthGateway::new(
        h.gateway.config().as_ref().clone(),
        h.gateway.registry().clone(),
        Arc::new(users),
        h.gateway.audit().clone(),
    );

    let parts = parts("/jsonapi/node", &[basic(&format!("alice:{TOKEN}"))]);
    let outcome = gateway.authenticate(&RequestInfo::from_parts(&parts)).await;
    assert_eq!(outcome, GatewayOutcome::Deny(Rejection::AccessDenied));

    let entries = h.entries().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, AuditStatus::Failure);
    assert_eq!(entries[0].response_code, 403);
    assert_eq!(entries[0].error_message.as_deref(), Some("Access denied"));
}

#[tokio::test]
async fn blocking_user_takes_effect_immediately() {
    let h = Harness::new().await;
    let creds = [basic(&format!("alice:{TOKEN}"))];

    assert!(matches!(h.run("/jsonapi/node", &creds).await, GatewayOutcome::Allow(_)));
    h.users.set_active("u-alice", false);
    assert_eq!(
        denied_code(h.run("/jsonapi/node", &creds).await),
        ErrorCode::UserBlocked
    );
}

#[tokio::test]
async fn date_filter_is_inclusive_to_end_of_day() {
    let h = Harness::new().await;
    let creds = [basic(&format!("alice:{TOKEN}"))];

    // 2024-02-29 23:59:59, 2024-03-01 00:00:00, 2024-03-02 23:59:59, 2024-03-03 00:00:00
    for ts in [1_709_251_199, 1_709_251_200, 1_709_423_999, 1_709_424_000] {
        h.clock.set(ts);
        h.run("/jsonapi/node", &creds).await;
    }

    let filter = AuditFilter {
        date_from: Some(date!(2024 - 03 - 01)),
        date_to: Some(date!(2024 - 03 - 02)),
        ..AuditFilter::default()
    };
    let rows = h.gateway.audit().query(&filter, 100, 0).await.unwrap();
    let stamps: Vec<i64> = rows.iter().map(|r| r.timestamp).collect();
    assert_eq!(stamps, vec![1_709_423_999, 1_709_251_200]);
    assert_eq!(h.gateway.audit().count(&filter).await.unwrap(), 2);
}

#[tokio::test]
async fn purge_all_then_count_is_zero() {
    let h = Harness::new().await;
    for _ in 0..4 {
        h.run("/jsonapi/node", &[basic("alice:nope")]).await;
    }

    let audit = h.gateway.audit();
    let before = audit.count(&AuditFilter::default()).await.unwrap();
    assert_eq!(before, 4);
    assert_eq!(audit.purge_all().await.unwrap(), before);
    assert_eq!(audit.count(&AuditFilter::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn set_default_switches_fallback_application() {
    let h = Harness::new().await;
    let registry = h.gateway.registry();

    let created = registry
        .create(ApplicationDraft {
            name: "Partner".to_string(),
            method: AuthMethod::ApiKey {
                mode: ApiKeyMode::Header,
            },
        })
        .await
        .unwrap();
    registry.set_default(&created.id).await.unwrap();

    let outcome = h.run("/jsonapi/node", &[]).await;
    assert_eq!(denied_code(outcome), ErrorCode::MissingApiKeyHeader);
}
