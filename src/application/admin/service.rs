//! Administrative user management
//!
//! Every operation here assumes the caller already passed the
//! [`AdminAuthenticator`](crate::application::identity::AdminAuthenticator).
//! Targets are addressed by email.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use super::listing::{account_stream, collect_unique};
use crate::application::accounts::AccountLifecycle;
use crate::domain::account::{find_reserved_claim, merge_claims, UpdateAccountDto, ADMIN_CLAIM};
use crate::domain::profile::ProfileRepositoryInterface;
use crate::domain::{
    Account, CustomClaims, Document, DomainError, DomainResult, IdentityProvider, Profile,
    ProfileUpdate,
};

/// Optional parts of an admin update. At least one must be present.
#[derive(Debug, Clone, Default)]
pub struct AdminUserUpdate {
    pub display_name: Option<String>,
    pub custom_claims: Option<CustomClaims>,
    pub profile: Option<Document>,
}

/// What an admin update actually changed.
#[derive(Debug, Clone)]
pub struct AdminUpdateOutcome {
    pub account: Account,
    pub account_updated: bool,
    /// Wire names of the profile fields written, when a profile part was sent.
    pub profile_fields: Option<Vec<&'static str>>,
    /// The stored profile after the write, when a profile part was sent.
    pub profile: Option<Profile>,
}

pub struct AdminService {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepositoryInterface>,
    lifecycle: Arc<AccountLifecycle>,
}

impl AdminService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepositoryInterface>,
        lifecycle: Arc<AccountLifecycle>,
    ) -> Self {
        Self {
            identity,
            profiles,
            lifecycle,
        }
    }

    /// All accounts, newest first.
    pub async fn list_users(&self) -> DomainResult<Vec<Account>> {
        let mut accounts = collect_unique(account_stream(self.identity.clone())).await?;
        accounts.sort_by(|a, b| b.metadata.creation_time.cmp(&a.metadata.creation_time));
        Ok(accounts)
    }

    pub async fn count_users(&self) -> DomainResult<usize> {
        Ok(collect_unique(account_stream(self.identity.clone()))
            .await?
            .len())
    }

    /// Merges `{admin: is_admin}` into the target's claims; other claims
    /// are preserved.
    pub async fn set_admin_claim(&self, email: &str, is_admin: bool) -> DomainResult<Account> {
        let target = self.lifecycle.resolve_by_email(email).await?;

        let mut patch = CustomClaims::new();
        patch.insert(ADMIN_CLAIM.to_string(), Value::Bool(is_admin));
        let claims = merge_claims(&target.custom_claims, &patch);
        self.identity
            .set_custom_user_claims(&target.uid, &claims)
            .await?;

        info!(uid = %target.uid, is_admin, "Admin claim updated");
        Ok(self.identity.get_user(&target.uid).await?)
    }

    pub async fn set_user_disabled(&self, email: &str, disabled: bool) -> DomainResult<Account> {
        let target = self.lifecycle.resolve_by_email(email).await?;
        let account = self
            .identity
            .update_user(
                &target.uid,
                &UpdateAccountDto {
                    disabled: Some(disabled),
                    ..Default::default()
                },
            )
            .await?;

        info!(uid = %account.uid, disabled, "Account disabled flag updated");
        Ok(account)
    }

    /// Applies the account part, then the profile part. Input for both is
    /// checked before anything is written.
    pub async fn update_user(
        &self,
        email: &str,
        update: AdminUserUpdate,
    ) -> DomainResult<AdminUpdateOutcome> {
        if update.display_name.is_none()
            && update.custom_claims.is_none()
            && update.profile.is_none()
        {
            return Err(DomainError::NoFieldsProvided);
        }

        if let Some(claims) = &update.custom_claims {
            if let Some(reserved) = find_reserved_claim(claims) {
                return Err(DomainError::Validation(format!(
                    "Custom claim '{}' is reserved",
                    reserved
                )));
            }
        }

        let profile_update = update
            .profile
            .as_ref()
            .map(ProfileUpdate::from_fields)
            .transpose()?;

        let target = self.lifecycle.resolve_by_email(email).await?;

        let account_dto = UpdateAccountDto {
            display_name: update.display_name,
            disabled: None,
            custom_claims: update
                .custom_claims
                .map(|patch| merge_claims(&target.custom_claims, &patch)),
        };

        let account_updated = !account_dto.is_empty();
        let mut account = if account_updated {
            self.identity.update_user(&target.uid, &account_dto).await?
        } else {
            target
        };

        let (profile_fields, profile) = match profile_update {
            Some(profile_update) => {
                self.profiles
                    .update(&account.uid, &profile_update, &Utc::now().to_rfc3339())
                    .await?;
                let stored = match self.profiles.find(&account.uid).await {
                    Ok(stored) => stored,
                    Err(e) => {
                        warn!(uid = %account.uid, error = %e, "Updated profile could not be re-read");
                        None
                    }
                };
                (Some(profile_update.field_names()), stored)
            }
            None => (None, None),
        };

        if account_updated {
            account = self.identity.get_user(&account.uid).await?;
        }

        info!(
            uid = %account.uid,
            account_updated,
            profile_fields = ?profile_fields,
            "User updated by admin"
        );
        Ok(AdminUpdateOutcome {
            account,
            account_updated,
            profile_fields,
            profile,
        })
    }

    /// Returns the account as it was before deletion.
    pub async fn delete_user(&self, email: &str) -> DomainResult<Account> {
        let target = self.lifecycle.resolve_by_email(email).await?;
        self.lifecycle.delete(&target).await?;
        Ok(target)
    }
}
