//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    http::{HeaderValue, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::AppServices;
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiErrorBody, ApiResponse};
use crate::interfaces::http::middleware::admin_auth_middleware;
use crate::interfaces::http::modules::metrics::{
    http_metrics_middleware, prometheus_metrics, MetricsState,
};
use crate::interfaces::http::modules::{admin, auth, health};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Identity-provider ID token (admin routes, token or any mode)",
                        ))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::service_info,
        health::legacy_status,
        health::health_check,
        auth::register,
        auth::lookup_profile,
        auth::delete_own_account,
        admin::list_users,
        admin::count_users,
        admin::set_admin,
        admin::set_disabled,
        admin::update_user,
        admin::delete_user,
    ),
    components(
        schemas(
            ApiErrorBody,
            health::HealthResponse,
            health::StatusResponse,
            health::ServiceInfo,
            auth::RegisterRequest,
            auth::CredentialsRequest,
            auth::AccountSummary,
            auth::RegisterResponse,
            auth::ProfileResponse,
            auth::DeletedAccount,
            admin::TargetUserRequest,
            admin::SetAdminRequest,
            admin::SetDisabledRequest,
            admin::UpdateUserRequest,
            admin::AccountDto,
            admin::AccountMetadataDto,
            admin::UserListResponse,
            admin::UserCountResponse,
            admin::UserUpdateResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and service description"),
        (name = "Authentication", description = "Registration, credential-gated profile lookup, self-deletion"),
        (name = "Admin", description = "User management for accounts carrying the admin claim"),
    ),
    info(
        title = "Ares Backend API",
        version = "2.0.0",
        description = "Accounts and player profiles on top of a managed identity provider and document store",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Everything the router needs besides the services.
#[derive(Clone)]
pub struct RouterContext {
    /// `None` when the providers could not be configured; `/api/*` then
    /// answers 503 apart from the health probe.
    pub services: Option<AppServices>,
    pub provider: String,
    pub base_url: String,
    pub cors_origin: String,
    pub metrics: PrometheusHandle,
    pub started_at: Arc<Instant>,
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origin.trim() == "*" {
        return cors.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origin
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    cors.allow_origin(AllowOrigin::list(origins))
}

fn api_routes(services: AppServices) -> Router {
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/user/{username}", post(auth::lookup_profile))
        .route("/user", delete(auth::delete_own_account));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users).post(admin::list_users))
        .route(
            "/users/count",
            get(admin::count_users).post(admin::count_users),
        )
        .route("/set-admin", post(admin::set_admin))
        .route("/user/disable", post(admin::set_disabled))
        .route("/user/update", post(admin::update_user))
        .route("/user", delete(admin::delete_user))
        .layer(middleware::from_fn_with_state(
            services.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/admin", admin_routes)
        .with_state(services)
}

fn fallback_response(uri: &Uri, degraded: bool) -> Response {
    if degraded && uri.path().starts_with("/api/") {
        return DomainError::ServiceUnavailable(
            "Identity provider is not configured".into(),
        )
        .into_response();
    }
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(
            "NOT_FOUND",
            format!("Route {} not found", uri.path()),
        )),
    )
        .into_response()
}

/// Create the application router with all routes
pub fn create_api_router(ctx: RouterContext) -> Router {
    let degraded = ctx.services.is_none();

    let health_state = health::HealthState {
        started_at: ctx.started_at.clone(),
        provider: ctx.provider.clone(),
        base_url: ctx.base_url.clone(),
    };
    let health_routes = Router::new()
        .route("/", get(health::service_info))
        .route("/status", get(health::legacy_status))
        .route("/api/health", get(health::health_check))
        .with_state(health_state);

    let metrics_routes = Router::new()
        .route("/metrics", get(prometheus_metrics))
        .with_state(MetricsState {
            handle: ctx.metrics.clone(),
        });

    let mut router = Router::new()
        .merge(health_routes)
        .merge(metrics_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    if let Some(services) = ctx.services {
        router = router.merge(api_routes(services));
    }

    router
        .fallback(move |uri: Uri| async move { fallback_response(&uri, degraded) })
        .layer(middleware::from_fn(http_metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&ctx.cors_origin))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use tower::ServiceExt;

    fn degraded_router() -> Router {
        create_api_router(RouterContext {
            services: None,
            provider: "unavailable".into(),
            base_url: "http://localhost:3000".into(),
            cors_origin: "*".into(),
            metrics: PrometheusBuilder::new().build_recorder().handle(),
            started_at: Arc::new(Instant::now()),
        })
    }

    async fn get_status(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn degraded_api_answers_503() {
        let (status, body) = get_status(degraded_router(), "/api/admin/users").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn health_still_answers_when_degraded() {
        let (status, body) = get_status(degraded_router(), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn unknown_routes_are_json_404() {
        let (status, body) = get_status(degraded_router(), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let (status, body) = get_status(degraded_router(), "/api-docs/openapi.json").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"].get("/api/auth/register").is_some());
    }

    async fn preflight_origin(allowed: &str, origin: &str) -> Option<String> {
        let router = Router::new()
            .route("/api/health", get(|| async { "ok" }))
            .layer(cors_layer(allowed));
        let response = router
            .oneshot(
                Request::options("/api/health")
                    .header("origin", origin)
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        response
            .headers()
            .get("access-control-allow-origin")
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[tokio::test]
    async fn cors_echoes_listed_origins_only() {
        let allowed = "https://a.example, https://b.example";
        assert_eq!(
            preflight_origin(allowed, "https://b.example").await.as_deref(),
            Some("https://b.example")
        );
        assert_eq!(preflight_origin(allowed, "https://evil.example").await, None);
    }

    #[tokio::test]
    async fn cors_wildcard_allows_any_origin() {
        assert_eq!(
            preflight_origin("*", "https://anywhere.example").await.as_deref(),
            Some("*")
        );
    }
}
