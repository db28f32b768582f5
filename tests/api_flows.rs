//! End-to-end HTTP flows against the in-memory providers.

use std::sync::Arc;
use std::time::Instant;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use metrics_exporter_prometheus::PrometheusBuilder;
use serde_json::{json, Value};
use tower::ServiceExt;

use ares_backend::application::AppServices;
use ares_backend::config::AdminAuthMode;
use ares_backend::domain::account::CreateAccountDto;
use ares_backend::domain::{
    CredentialExchange, CustomClaims, Document, DocumentStore, IdentityProvider,
};
use ares_backend::interfaces::http::{create_api_router, RouterContext};
use ares_backend::Providers;

struct TestApp {
    router: Router,
    providers: Providers,
}

impl TestApp {
    fn new(mode: AdminAuthMode) -> Self {
        let providers = Providers::memory(4);
        let services = AppServices::new(&providers, mode);
        let router = create_api_router(RouterContext {
            services: Some(services),
            provider: "memory".into(),
            base_url: "http://localhost:3000".into(),
            cors_origin: "*".into(),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
            started_at: Arc::new(Instant::now()),
        });
        Self { router, providers }
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        bearer: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = bearer {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(&self, username: &str, email: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            "/api/auth/register",
            Some(json!({"email": email, "password": "secret1", "username": username})),
            None,
        )
        .await
    }

    async fn lookup(&self, handle: &str, email: &str, password: &str) -> (StatusCode, Value) {
        self.call(
            Method::POST,
            &format!("/api/auth/user/{}", handle),
            Some(json!({"email": email, "password": password})),
            None,
        )
        .await
    }

    /// Registers `root` and grants it the admin claim directly on the provider.
    async fn admin(&self) -> String {
        let (status, body) = self.register("root", "root@example.com").await;
        assert_eq!(status, StatusCode::CREATED);
        let uid = body["data"]["user"]["uid"].as_str().unwrap().to_string();
        let mut claims = CustomClaims::new();
        claims.insert("admin".into(), json!(true));
        self.providers
            .identity
            .set_custom_user_claims(&uid, &claims)
            .await
            .unwrap();
        uid
    }

    async fn admin_call(&self, method: Method, uri: &str, mut body: Value) -> (StatusCode, Value) {
        body["email"] = json!("root@example.com");
        body["password"] = json!("secret1");
        self.call(method, uri, Some(body), None).await
    }
}

#[tokio::test]
async fn register_then_lookup_returns_zeroed_profile() {
    let app = TestApp::new(AdminAuthMode::Password);
    let (status, body) = app.register("ada", "ada@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["displayName"], "ada");

    let (status, body) = app.lookup("ada", "ada@example.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    let profile = &body["data"]["profile"];
    for counter in ["coins", "xp", "kills", "deaths", "matches"] {
        assert_eq!(profile[counter], 0, "{} should start at zero", counter);
    }
    for list in ["friends", "guns", "friendRequests"] {
        assert_eq!(profile[list], json!([]), "{} should start empty", list);
    }
    assert_eq!(profile["username"], "ada");
}

#[tokio::test]
async fn taken_handle_is_rejected_without_a_usable_account() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.register("ada", "ada@example.com").await;

    let (status, body) = app.register("ada", "impostor@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "USERNAME_TAKEN");

    let (status, _) = app.lookup("ada", "impostor@example.com", "secret1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn duplicate_email_is_rejected() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.register("ada", "ada@example.com").await;
    let (status, body) = app.register("ada2", "ada@example.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "EMAIL_TAKEN");
}

#[tokio::test]
async fn invalid_registration_is_a_validation_error() {
    let app = TestApp::new(AdminAuthMode::Password);
    let (status, body) = app.register("a/b", "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, body) = app
        .call(Method::POST, "/api/auth/register", Some(json!({"email": "x"})), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn wrong_password_is_401_whether_or_not_the_handle_exists() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.register("ada", "ada@example.com").await;

    for handle in ["ada", "nobody"] {
        let (status, body) = app.lookup(handle, "ada@example.com", "wrong-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }

    let (status, body) = app.lookup("nobody", "ada@example.com", "secret1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");
}

#[tokio::test]
async fn missing_profile_is_404_only_for_authenticated_callers() {
    let app = TestApp::new(AdminAuthMode::Password);
    let (_, ada) = app.register("ada", "ada@example.com").await;
    let uid = ada["data"]["user"]["uid"].as_str().unwrap();
    app.providers.documents.delete("users", uid).await.unwrap();

    let (status, body) = app.lookup("ada", "ada@example.com", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");

    let (status, body) = app.lookup("ada", "ada@example.com", "secret1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "PROFILE_NOT_FOUND");
}

#[tokio::test]
async fn malformed_profile_answers_like_an_unknown_handle() {
    let app = TestApp::new(AdminAuthMode::Password);
    let (_, ada) = app.register("ada", "ada@example.com").await;
    let uid = ada["data"]["user"]["uid"].as_str().unwrap();
    let mut patch = Document::new();
    patch.insert("kills".into(), json!({"nested": true}));
    app.providers
        .documents
        .update("users", uid, patch)
        .await
        .unwrap();

    for handle in ["ada", "nobody"] {
        let (status, body) = app.lookup(handle, "ada@example.com", "wrong-password").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", handle);
        assert_eq!(body["error"]["code"], "INVALID_CREDENTIALS");
    }

    let (status, body) = app.lookup("ada", "ada@example.com", "secret1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "PROFILE_NOT_FOUND");
}

#[tokio::test]
async fn non_numeric_skin_tag_is_readable() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.admin().await;
    app.register("ada", "ada@example.com").await;

    let (status, body) = app
        .admin_call(
            Method::POST,
            "/api/admin/user/update",
            json!({"targetUserEmail": "ada@example.com", "profile": {"skinTag": "red"}}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile"]["skinTag"], "red");

    let (status, body) = app.lookup("ada", "ada@example.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile"]["skinTag"], "red");
}

#[tokio::test]
async fn strangers_are_forbidden_and_admins_are_not() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.register("ada", "ada@example.com").await;
    let (_, bob) = app.register("bob", "bob@example.com").await;

    let (status, body) = app.lookup("ada", "bob@example.com", "secret1").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let bob_uid = bob["data"]["user"]["uid"].as_str().unwrap();
    let mut claims = CustomClaims::new();
    claims.insert("admin".into(), json!(true));
    app.providers
        .identity
        .set_custom_user_claims(bob_uid, &claims)
        .await
        .unwrap();

    let (status, body) = app.lookup("ada", "bob@example.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["profile"]["username"], "ada");
}

#[tokio::test]
async fn profile_update_applies_only_allowed_fields() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.admin().await;
    app.register("ada", "ada@example.com").await;

    let (status, body) = app
        .admin_call(
            Method::POST,
            "/api/admin/user/update",
            json!({"targetUserEmail": "ada@example.com", "profile": {"username": "x", "email": "y"}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "NO_FIELDS_PROVIDED");

    let (status, body) = app
        .admin_call(
            Method::POST,
            "/api/admin/user/update",
            json!({
                "targetUserEmail": "ada@example.com",
                "profile": {"coins": 250, "guns": ["rifle"], "username": "hijacked"}
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["accountUpdated"], false);

    let (_, body) = app.lookup("ada", "ada@example.com", "secret1").await;
    let profile = &body["data"]["profile"];
    assert_eq!(profile["coins"], 250);
    assert_eq!(profile["guns"], json!(["rifle"]));
    assert_eq!(profile["username"], "ada");
    assert_ne!(profile["updatedAt"], profile["createdAt"]);
}

#[tokio::test]
async fn negative_counters_are_rejected() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.admin().await;
    app.register("ada", "ada@example.com").await;

    let (status, body) = app
        .admin_call(
            Method::POST,
            "/api/admin/user/update",
            json!({"targetUserEmail": "ada@example.com", "profile": {"coins": -5}}),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn deleting_an_unknown_email_has_no_side_effects() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.admin().await;
    app.register("ada", "ada@example.com").await;

    let (status, body) = app
        .admin_call(
            Method::DELETE,
            "/api/admin/user",
            json!({"targetUserEmail": "ghost@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "USER_NOT_FOUND");

    let (_, body) = app
        .admin_call(Method::POST, "/api/admin/users/count", json!({}))
        .await;
    assert_eq!(body["data"]["count"], 2);
    let (status, _) = app.lookup("ada", "ada@example.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn admin_delete_frees_the_handle() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.admin().await;
    app.register("ada", "ada@example.com").await;

    let (status, _) = app
        .admin_call(
            Method::DELETE,
            "/api/admin/user",
            json!({"targetUserEmail": "ada@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.register("ada", "ada2@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn listing_spans_provider_pages_without_duplicates() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.admin().await;
    for i in 0..1004 {
        app.providers
            .identity
            .create_user(&CreateAccountDto {
                email: format!("player{}@example.com", i),
                password: "secret1".into(),
                display_name: None,
            })
            .await
            .unwrap();
    }

    let (status, body) = app
        .admin_call(Method::POST, "/api/admin/users", json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"]["users"].as_array().unwrap();
    assert_eq!(users.len(), 1005);
    assert_eq!(body["data"]["total"], 1005);

    let mut uids: Vec<&str> = users.iter().map(|u| u["uid"].as_str().unwrap()).collect();
    uids.sort_unstable();
    uids.dedup();
    assert_eq!(uids.len(), 1005);
}

#[tokio::test]
async fn admin_routes_reject_missing_and_non_admin_credentials() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.admin().await;
    app.register("ada", "ada@example.com").await;

    let (status, _) = app
        .call(Method::POST, "/api/admin/users", Some(json!({})), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/admin/users",
            Some(json!({"email": "ada@example.com", "password": "secret1"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/admin/users",
            Some(json!({"email": "root@example.com", "password": "nope!!"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_mode_accepts_bearer_id_tokens() {
    let app = TestApp::new(AdminAuthMode::Token);
    app.admin().await;

    let exchange = app.providers.exchange.clone().unwrap();
    let signed_in = exchange
        .sign_in_with_password("root@example.com", "secret1")
        .await
        .unwrap();

    let (status, body) = app
        .call(Method::GET, "/api/admin/users/count", None, Some(&signed_in.id_token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["count"], 1);

    let (status, _) = app
        .admin_call(Method::POST, "/api/admin/users/count", json!({}))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn set_admin_and_disable_accept_lenient_flags() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.admin().await;
    app.register("ada", "ada@example.com").await;
    app.register("bob", "bob@example.com").await;

    let (status, body) = app
        .admin_call(
            Method::POST,
            "/api/admin/set-admin",
            json!({"targetUserEmail": "bob@example.com", "isAdmin": "true"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customClaims"]["admin"], true);

    let (status, _) = app.lookup("ada", "bob@example.com", "secret1").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .admin_call(
            Method::POST,
            "/api/admin/user/disable",
            json!({"targetUserEmail": "ada@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["disabled"], true);

    let (status, _) = app.lookup("ada", "ada@example.com", "secret1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn self_delete_removes_account_and_profile() {
    let app = TestApp::new(AdminAuthMode::Password);
    app.register("ada", "ada@example.com").await;

    let (status, _) = app
        .call(
            Method::DELETE,
            "/api/auth/user",
            Some(json!({"email": "ada@example.com", "password": "wrong!!"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .call(
            Method::DELETE,
            "/api/auth/user",
            Some(json!({"email": "ada@example.com", "password": "secret1"})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = app.lookup("ada", "ada@example.com", "secret1").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn health_and_root_describe_the_service() {
    let app = TestApp::new(AdminAuthMode::Password);
    let (status, body) = app.call(Method::GET, "/api/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["provider"], "memory");

    let (status, body) = app.call(Method::GET, "/", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["endpoints"]["register"].is_string());

    let (status, body) = app.call(Method::GET, "/status", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "online");
}
