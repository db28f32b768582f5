//! Admin handlers
//!
//! All routes sit behind [`admin_auth_middleware`](crate::interfaces::http::middleware::admin_auth_middleware).

use axum::{extract::State, Extension, Json};
use tracing::info;

use super::dto::{
    AccountDto, SetAdminRequest, SetDisabledRequest, TargetUserRequest, UpdateUserRequest,
    UserCountResponse, UserListResponse, UserUpdateResponse,
};
use crate::application::{AdminUserUpdate, AppServices};
use crate::domain::DomainError;
use crate::interfaces::http::common::{ApiResponse, ValidatedJson};
use crate::interfaces::http::middleware::AdminCaller;

#[utoipa::path(
    post,
    path = "/api/admin/users",
    tag = "Admin",
    responses(
        (status = 200, description = "Every account, newest first", body = ApiResponse<UserListResponse>),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Caller is not an admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(services): State<AppServices>,
) -> Result<Json<ApiResponse<UserListResponse>>, DomainError> {
    let users: Vec<AccountDto> = services
        .admin
        .list_users()
        .await?
        .into_iter()
        .map(AccountDto::from)
        .collect();
    Ok(Json(ApiResponse::success(UserListResponse {
        total: users.len(),
        users,
    })))
}

#[utoipa::path(
    post,
    path = "/api/admin/users/count",
    tag = "Admin",
    responses(
        (status = 200, description = "Number of accounts", body = ApiResponse<UserCountResponse>)
    ),
    security(("bearer_auth" = []))
)]
pub async fn count_users(
    State(services): State<AppServices>,
) -> Result<Json<ApiResponse<UserCountResponse>>, DomainError> {
    let count = services.admin.count_users().await?;
    Ok(Json(ApiResponse::success(UserCountResponse { count })))
}

#[utoipa::path(
    post,
    path = "/api/admin/set-admin",
    tag = "Admin",
    request_body = SetAdminRequest,
    responses(
        (status = 200, description = "Admin claim merged", body = ApiResponse<AccountDto>),
        (status = 404, description = "No account with that email")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_admin(
    State(services): State<AppServices>,
    Extension(AdminCaller(caller)): Extension<AdminCaller>,
    ValidatedJson(request): ValidatedJson<SetAdminRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, DomainError> {
    let account = services
        .admin
        .set_admin_claim(&request.target_user_email, request.is_admin)
        .await?;

    info!(
        admin = %caller.uid,
        target = %request.target_user_email,
        is_admin = request.is_admin,
        "Admin claim set"
    );
    let message = if request.is_admin {
        format!("{} is now an admin", request.target_user_email)
    } else {
        format!("{} is no longer an admin", request.target_user_email)
    };
    Ok(Json(ApiResponse::with_message(
        message,
        AccountDto::from(account),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/user/disable",
    tag = "Admin",
    request_body = SetDisabledRequest,
    responses(
        (status = 200, description = "Disabled flag updated", body = ApiResponse<AccountDto>),
        (status = 404, description = "No account with that email")
    ),
    security(("bearer_auth" = []))
)]
pub async fn set_disabled(
    State(services): State<AppServices>,
    Extension(AdminCaller(caller)): Extension<AdminCaller>,
    ValidatedJson(request): ValidatedJson<SetDisabledRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, DomainError> {
    let account = services
        .admin
        .set_user_disabled(&request.target_user_email, request.disabled)
        .await?;

    info!(
        admin = %caller.uid,
        target = %request.target_user_email,
        disabled = request.disabled,
        "Account disabled flag set"
    );
    let verb = if request.disabled { "disabled" } else { "enabled" };
    Ok(Json(ApiResponse::with_message(
        format!("User {} {}", request.target_user_email, verb),
        AccountDto::from(account),
    )))
}

#[utoipa::path(
    post,
    path = "/api/admin/user/update",
    tag = "Admin",
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Account and/or profile updated", body = ApiResponse<UserUpdateResponse>),
        (status = 400, description = "Nothing to update or invalid field values"),
        (status = 404, description = "No account or profile for that email")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    State(services): State<AppServices>,
    Extension(AdminCaller(caller)): Extension<AdminCaller>,
    ValidatedJson(request): ValidatedJson<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserUpdateResponse>>, DomainError> {
    let outcome = services
        .admin
        .update_user(
            &request.target_user_email,
            AdminUserUpdate {
                display_name: request.display_name,
                custom_claims: request.custom_claims,
                profile: request.profile,
            },
        )
        .await?;

    info!(admin = %caller.uid, target = %request.target_user_email, "User updated");
    Ok(Json(ApiResponse::with_message(
        "User updated successfully",
        UserUpdateResponse {
            user: AccountDto::from(outcome.account),
            account_updated: outcome.account_updated,
            profile_fields: outcome
                .profile_fields
                .map(|fields| fields.into_iter().map(String::from).collect()),
            profile: outcome.profile,
        },
    )))
}

#[utoipa::path(
    delete,
    path = "/api/admin/user",
    tag = "Admin",
    request_body = TargetUserRequest,
    responses(
        (status = 200, description = "Account, handle and profile deleted", body = ApiResponse<AccountDto>),
        (status = 404, description = "No account with that email")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    State(services): State<AppServices>,
    Extension(AdminCaller(caller)): Extension<AdminCaller>,
    ValidatedJson(request): ValidatedJson<TargetUserRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, DomainError> {
    let deleted = services
        .admin
        .delete_user(&request.target_user_email)
        .await?;

    info!(admin = %caller.uid, uid = %deleted.uid, "User deleted by admin");
    Ok(Json(ApiResponse::with_message(
        format!("User {} deleted", request.target_user_email),
        AccountDto::from(deleted),
    )))
}
