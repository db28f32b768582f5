//! Self-service account handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use super::dto::{
    AccountSummary, CredentialsRequest, DeletedAccount, ProfileResponse, RegisterRequest,
    RegisterResponse,
};
use crate::application::{AppServices, Registration};
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiResponse, ValidatedJson};

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Authentication",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account, handle and profile created", body = ApiResponse<RegisterResponse>),
        (status = 400, description = "Validation failed, handle or email taken")
    )
)]
pub async fn register(
    State(services): State<AppServices>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResponse>>), DomainError> {
    let registered = services
        .accounts
        .register(Registration {
            email: request.email,
            password: request.password,
            username: request.username,
        })
        .await?;

    let response = RegisterResponse {
        user: AccountSummary::from(&registered.account),
        profile: registered.profile,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "User registered successfully",
            response,
        )),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/user/{username}",
    tag = "Authentication",
    params(("username" = String, Path, description = "Handle to look up")),
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Profile of the handle's owner", body = ApiResponse<ProfileResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Caller is neither the owner nor an admin"),
        (status = 404, description = "Unknown handle or missing profile"),
        (status = 500, description = "Credential verification not configured")
    )
)]
pub async fn lookup_profile(
    State(services): State<AppServices>,
    Path(username): Path<String>,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> Result<Json<ApiResponse<ProfileResponse>>, DomainError> {
    let (uid, profile) = services
        .accounts
        .lookup_profile(&username, &request.email, &request.password)
        .await?;
    Ok(Json(ApiResponse::success(ProfileResponse { uid, profile })))
}

#[utoipa::path(
    delete,
    path = "/api/auth/user",
    tag = "Authentication",
    request_body = CredentialsRequest,
    responses(
        (status = 200, description = "Caller's account, handle and profile deleted", body = ApiResponse<DeletedAccount>),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn delete_own_account(
    State(services): State<AppServices>,
    ValidatedJson(request): ValidatedJson<CredentialsRequest>,
) -> Result<Json<ApiResponse<DeletedAccount>>, DomainError> {
    services
        .accounts
        .delete_own_account(&request.email, &request.password)
        .await?;

    info!(email = %request.email, "User deleted own account");
    Ok(Json(ApiResponse::with_message(
        "User account deleted successfully",
        DeletedAccount {
            email: request.email,
        },
    )))
}
