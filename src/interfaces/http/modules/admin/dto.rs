//! Admin DTOs
//!
//! Requests may also carry the admin's own `email`/`password`; those are
//! consumed by the admin middleware and ignored here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{Account, CustomClaims, Document, Profile};

fn default_true() -> bool {
    true
}

/// Accepts `true`/`false` or the strings `"true"`/`"false"`.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a boolean, got {}",
            other
        ))),
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetUserRequest {
    #[validate(email(message = "targetUserEmail must be a valid email"))]
    pub target_user_email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetAdminRequest {
    #[validate(email(message = "targetUserEmail must be a valid email"))]
    pub target_user_email: String,
    /// Defaults to `true`.
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub is_admin: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetDisabledRequest {
    #[validate(email(message = "targetUserEmail must be a valid email"))]
    pub target_user_email: String,
    /// Defaults to `true`.
    #[serde(default = "default_true", deserialize_with = "lenient_bool")]
    pub disabled: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(email(message = "targetUserEmail must be a valid email"))]
    pub target_user_email: String,
    #[validate(length(max = 256, message = "displayName is too long"))]
    pub display_name: Option<String>,
    /// Merged into the existing claims; `null` values remove a claim.
    #[schema(value_type = Option<Object>)]
    pub custom_claims: Option<CustomClaims>,
    /// Allow-listed profile fields; other keys are dropped.
    #[schema(value_type = Option<Object>)]
    pub profile: Option<Document>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadataDto {
    pub creation_time: Option<DateTime<Utc>>,
    pub last_sign_in_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountDto {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: Option<String>,
    pub disabled: bool,
    pub metadata: AccountMetadataDto,
    #[schema(value_type = Object)]
    pub custom_claims: CustomClaims,
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            uid: account.uid,
            email: account.email,
            email_verified: account.email_verified,
            display_name: account.display_name,
            disabled: account.disabled,
            metadata: AccountMetadataDto {
                creation_time: account.metadata.creation_time,
                last_sign_in_time: account.metadata.last_sign_in_time,
            },
            custom_claims: account.custom_claims,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    pub total: usize,
    pub users: Vec<AccountDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateResponse {
    pub user: AccountDto,
    pub account_updated: bool,
    /// Profile fields written, absent when no profile part was sent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_fields: Option<Vec<String>>,
    /// Stored profile after the write.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub profile: Option<Profile>,
}
