//! Self-service DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{Account, Profile};
use crate::shared::validate_handle_chars;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(
        length(min = 3, max = 50, message = "username must be 3 to 50 characters"),
        custom(function = "validate_handle_chars")
    )]
    pub username: String,
}

/// Email/password pair proving who the caller is.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CredentialsRequest {
    #[validate(length(min = 1, message = "email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            uid: account.uid.clone(),
            email: account.email.clone(),
            display_name: account.display_name.clone(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResponse {
    pub user: AccountSummary,
    #[schema(value_type = Object)]
    pub profile: Profile,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub uid: String,
    #[schema(value_type = Object)]
    pub profile: Profile,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedAccount {
    pub email: String,
}
