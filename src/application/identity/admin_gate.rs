use std::sync::Arc;

use tracing::{info, warn};

use super::authorization::require_admin;
use super::credentials::CredentialVerifier;
use crate::config::AdminAuthMode;
use crate::domain::{Account, DomainError, DomainResult};

/// Whatever the caller of an admin endpoint sent to prove who they are.
#[derive(Debug, Clone, Default)]
pub struct PresentedCredentials {
    pub bearer: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl PresentedCredentials {
    fn body_pair(&self) -> Option<(&str, &str)> {
        match (self.email.as_deref(), self.password.as_deref()) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}

/// Authenticates admin callers according to the configured [`AdminAuthMode`].
pub struct AdminAuthenticator {
    verifier: Arc<CredentialVerifier>,
    mode: AdminAuthMode,
}

impl AdminAuthenticator {
    pub fn new(verifier: Arc<CredentialVerifier>, mode: AdminAuthMode) -> Self {
        Self { verifier, mode }
    }

    pub fn mode(&self) -> AdminAuthMode {
        self.mode
    }

    pub async fn authenticate(&self, presented: &PresentedCredentials) -> DomainResult<Account> {
        let caller = match self.mode {
            AdminAuthMode::Password => self.with_password(presented).await?,
            AdminAuthMode::Token => self.with_token(presented).await?,
            AdminAuthMode::Any => {
                if presented.bearer.is_some() {
                    self.with_token(presented).await?
                } else {
                    self.with_password(presented).await?
                }
            }
        };

        if let Err(e) = require_admin(&caller) {
            warn!(uid = %caller.uid, "Non-admin caller attempted an admin operation");
            return Err(e);
        }
        info!(uid = %caller.uid, "Admin caller authenticated");
        Ok(caller)
    }

    async fn with_password(&self, presented: &PresentedCredentials) -> DomainResult<Account> {
        let (email, password) = presented
            .body_pair()
            .ok_or_else(|| DomainError::Validation("Email and password are required".into()))?;
        self.verifier.verify_password(email, password).await
    }

    async fn with_token(&self, presented: &PresentedCredentials) -> DomainResult<Account> {
        let token = presented
            .bearer
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(DomainError::InvalidCredentials)?;
        self.verifier.verify_token(token).await
    }
}
