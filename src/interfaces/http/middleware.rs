//! Admin authentication middleware for Axum
//!
//! Admin callers prove who they are either with `Authorization: Bearer
//! <idToken>` or with their own `email`/`password` inside the JSON body.
//! The body is buffered so the handler can still extract it afterwards.

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;

use crate::application::{AppServices, PresentedCredentials};
use crate::domain::{Account, DomainError};

/// Largest admin request body accepted.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The verified admin, inserted into request extensions.
#[derive(Clone, Debug)]
pub struct AdminCaller(pub Account);

fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn body_credentials(bytes: &[u8]) -> (Option<String>, Option<String>) {
    let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(bytes) else {
        return (None, None);
    };
    let field = |name: &str| body.get(name).and_then(Value::as_str).map(String::from);
    (field("email"), field("password"))
}

/// Verifies admin credentials before any `/api/admin/*` handler runs.
pub async fn admin_auth_middleware(
    State(services): State<AppServices>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return DomainError::Validation("Request body is too large or unreadable".into())
                .into_response()
        }
    };

    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
        .map(String::from);
    let (email, password) = body_credentials(&bytes);

    let presented = PresentedCredentials {
        bearer,
        email,
        password,
    };

    match services.admin_gate.authenticate(&presented).await {
        Ok(caller) => {
            let mut request = Request::from_parts(parts, Body::from(bytes));
            request.extensions_mut().insert(AdminCaller(caller));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
