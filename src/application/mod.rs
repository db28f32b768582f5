//! Application layer
//!
//! Use-cases built on the domain ports. [`AppServices`] wires them from a
//! set of [`Providers`].

pub mod accounts;
pub mod admin;
pub mod identity;

use std::sync::Arc;

use crate::config::AdminAuthMode;
use crate::domain::profile::{HandleRepositoryInterface, ProfileRepositoryInterface};
use crate::infrastructure::repositories::{HandleRepository, ProfileRepository};
use crate::infrastructure::Providers;

pub use accounts::{AccountLifecycle, AccountService, RegisteredAccount, Registration};
pub use admin::{AdminService, AdminUpdateOutcome, AdminUserUpdate};
pub use identity::{AdminAuthenticator, CredentialVerifier, PresentedCredentials};

/// Everything the HTTP layer calls into.
#[derive(Clone)]
pub struct AppServices {
    pub accounts: Arc<AccountService>,
    pub admin: Arc<AdminService>,
    pub admin_gate: Arc<AdminAuthenticator>,
}

impl AppServices {
    pub fn new(providers: &Providers, admin_auth_mode: AdminAuthMode) -> Self {
        let profiles: Arc<dyn ProfileRepositoryInterface> =
            Arc::new(ProfileRepository::new(providers.documents.clone()));
        let handles: Arc<dyn HandleRepositoryInterface> =
            Arc::new(HandleRepository::new(providers.documents.clone()));

        let verifier = Arc::new(CredentialVerifier::new(
            providers.identity.clone(),
            providers.exchange.clone(),
        ));
        let lifecycle = Arc::new(AccountLifecycle::new(
            providers.identity.clone(),
            profiles.clone(),
            handles.clone(),
        ));

        Self {
            accounts: Arc::new(AccountService::new(
                providers.identity.clone(),
                profiles.clone(),
                handles,
                verifier.clone(),
                lifecycle.clone(),
            )),
            admin: Arc::new(AdminService::new(
                providers.identity.clone(),
                profiles,
                lifecycle,
            )),
            admin_gate: Arc::new(AdminAuthenticator::new(verifier, admin_auth_mode)),
        }
    }
}
