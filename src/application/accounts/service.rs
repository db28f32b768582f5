//! Self-service account operations

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use validator::Validate;

use super::lifecycle::AccountLifecycle;
use crate::application::identity::{authorize_profile_access, CredentialVerifier};
use crate::domain::account::CreateAccountDto;
use crate::domain::profile::{HandleRepositoryInterface, ProfileRepositoryInterface};
use crate::domain::{Account, DomainError, DomainResult, IdentityProvider, Profile};
use crate::shared::{describe_validation_errors, is_registrable_handle, validate_handle_chars};

/// Input for [`AccountService::register`].
#[derive(Debug, Clone, Validate)]
pub struct Registration {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[validate(
        length(min = 3, max = 50, message = "Username must be 3 to 50 characters"),
        custom(function = "validate_handle_chars")
    )]
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct RegisteredAccount {
    pub account: Account,
    pub profile: Profile,
}

pub struct AccountService {
    identity: Arc<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileRepositoryInterface>,
    handles: Arc<dyn HandleRepositoryInterface>,
    verifier: Arc<CredentialVerifier>,
    lifecycle: Arc<AccountLifecycle>,
}

impl AccountService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileRepositoryInterface>,
        handles: Arc<dyn HandleRepositoryInterface>,
        verifier: Arc<CredentialVerifier>,
        lifecycle: Arc<AccountLifecycle>,
    ) -> Self {
        Self {
            identity,
            profiles,
            handles,
            verifier,
            lifecycle,
        }
    }

    // ── Registration ───────────────────────────────────────────────

    pub async fn register(&self, input: Registration) -> DomainResult<RegisteredAccount> {
        let input = Registration {
            email: input.email.trim().to_string(),
            username: input.username.trim().to_string(),
            password: input.password,
        };
        input
            .validate()
            .map_err(|e| DomainError::Validation(describe_validation_errors(&e)))?;
        let Registration {
            email,
            password,
            username,
        } = input;

        if self.handles.find_uid(&username).await?.is_some() {
            return Err(DomainError::UsernameTaken(username));
        }

        let account = self
            .identity
            .create_user(&CreateAccountDto {
                email: email.clone(),
                password,
                display_name: Some(username.clone()),
            })
            .await?;

        if let Err(e) = self.handles.claim(&username, &account.uid).await {
            warn!(
                uid = %account.uid,
                username = %username,
                error = %e,
                "Handle claim failed after account creation; account left orphaned"
            );
            return Err(e);
        }

        let profile = Profile::new(&username, &email, &Utc::now().to_rfc3339());
        self.profiles.create(&account.uid, &profile).await?;

        info!(uid = %account.uid, username = %username, "Account registered");
        Ok(RegisteredAccount { account, profile })
    }

    // ── Lookup ─────────────────────────────────────────────────────

    /// Resolves `handle` and returns its owner's uid and profile, provided the
    /// caller authenticates and is either the owner or an admin.
    ///
    /// Handle resolution, the profile read and credential verification run
    /// regardless of whether the handle exists, and nothing the reads turn
    /// up is reported before the credentials check out. An unknown handle
    /// and a wrong password therefore look the same to an outsider.
    pub async fn lookup_profile(
        &self,
        handle: &str,
        email: &str,
        password: &str,
    ) -> DomainResult<(String, Profile)> {
        let owner = if is_registrable_handle(handle) {
            self.handles.find_uid(handle).await
        } else {
            Ok(None)
        };

        let profile = match &owner {
            Ok(Some(uid)) => self.profiles.find(uid).await,
            _ if is_registrable_handle(handle) => self.profiles.find(handle).await,
            _ => Ok(None),
        };

        let caller = self.verifier.verify_password(email, password).await?;

        let Some(owner) = owner? else {
            return Err(DomainError::UserNotFound);
        };

        authorize_profile_access(&caller, &owner)?;

        match profile {
            Ok(Some(profile)) => Ok((owner, profile)),
            Ok(None) => {
                warn!(uid = %owner, handle, "Handle maps to an account without a profile");
                Err(DomainError::ProfileNotFound { uid: owner })
            }
            Err(e @ DomainError::ServiceUnavailable(_)) => Err(e),
            Err(e) => {
                warn!(uid = %owner, handle, error = %e, "Stored profile is unreadable");
                Err(DomainError::ProfileNotFound { uid: owner })
            }
        }
    }

    // ── Deletion ───────────────────────────────────────────────────

    /// Deletes the caller's own account after verifying the credentials.
    pub async fn delete_own_account(&self, email: &str, password: &str) -> DomainResult<()> {
        let caller = self.verifier.verify_password(email, password).await?;
        self.lifecycle.delete(&caller).await
    }
}
