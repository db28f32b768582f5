//! Credential verifier
//!
//! Email/password pairs are only ever accepted after a real sign-in exchange
//! with the identity provider. Without a configured exchange every check
//! fails with a configuration error rather than being skipped.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::{
    Account, CredentialExchange, DomainError, DomainResult, IdentityProvider, ProviderError,
};

pub struct CredentialVerifier {
    identity: Arc<dyn IdentityProvider>,
    exchange: Option<Arc<dyn CredentialExchange>>,
}

impl CredentialVerifier {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        exchange: Option<Arc<dyn CredentialExchange>>,
    ) -> Self {
        Self { identity, exchange }
    }

    /// Returns the caller's account, re-read from the provider so its claims
    /// are current.
    pub async fn verify_password(&self, email: &str, password: &str) -> DomainResult<Account> {
        let Some(exchange) = &self.exchange else {
            error!("Password sign-in is not configured; rejecting credential check");
            return Err(DomainError::ServerConfiguration(
                "Credential verification is not configured".into(),
            ));
        };

        let signed_in = match exchange.sign_in_with_password(email, password).await {
            Ok(result) => result,
            Err(ProviderError::NotConfigured(msg)) => {
                error!(error = %msg, "Sign-in endpoint rejected the server configuration");
                return Err(DomainError::ServerConfiguration(msg));
            }
            Err(e) => {
                debug!(error = %e, "Password sign-in failed");
                return Err(DomainError::InvalidCredentials);
            }
        };

        self.load_caller(&signed_in.uid).await
    }

    /// Verifies a provider-issued ID token.
    pub async fn verify_token(&self, id_token: &str) -> DomainResult<Account> {
        let uid = match self.identity.verify_id_token(id_token).await {
            Ok(uid) => uid,
            Err(ProviderError::NotConfigured(msg)) => {
                return Err(DomainError::ServerConfiguration(msg));
            }
            Err(e) => {
                debug!(error = %e, "ID token rejected");
                return Err(DomainError::InvalidCredentials);
            }
        };

        self.load_caller(&uid).await
    }

    async fn load_caller(&self, uid: &str) -> DomainResult<Account> {
        let account = match self.identity.get_user(uid).await {
            Ok(account) => account,
            Err(ProviderError::UserNotFound) => {
                warn!(uid, "Signed-in account vanished before it could be read");
                return Err(DomainError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if account.disabled {
            return Err(DomainError::InvalidCredentials);
        }
        Ok(account)
    }
}
