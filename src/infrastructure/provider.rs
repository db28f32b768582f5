//! Turns [`AppConfig`] into provider clients

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{AppConfig, FirebaseConfig, ProviderBackend};
use crate::domain::{CredentialExchange, DocumentStore, IdentityProvider};
use crate::infrastructure::firebase::{
    http_client, AccessTokenProvider, FirebaseHttp, FirebaseIdentity, FirebasePasswordSignIn,
    FirestoreDocuments, ServiceAccountKey,
};
use crate::infrastructure::memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
use crate::shared::{ProviderError, ProviderResult};

/// The provider ports the services are built from.
#[derive(Clone)]
pub struct Providers {
    pub identity: Arc<dyn IdentityProvider>,
    /// `None` when password sign-in is not configured.
    pub exchange: Option<Arc<dyn CredentialExchange>>,
    pub documents: Arc<dyn DocumentStore>,
    pub backend: ProviderBackend,
}

impl Providers {
    /// Fresh in-memory providers.
    pub fn memory(bcrypt_cost: u32) -> Self {
        let identity = Arc::new(InMemoryIdentityProvider::with_bcrypt_cost(bcrypt_cost));
        Self {
            identity: identity.clone(),
            exchange: Some(identity),
            documents: Arc::new(InMemoryDocumentStore::new()),
            backend: ProviderBackend::Memory,
        }
    }
}

pub fn build_providers(config: &AppConfig) -> ProviderResult<Providers> {
    match config.provider.backend {
        ProviderBackend::Memory => {
            info!("Using in-memory identity and document providers");
            Ok(Providers::memory(config.provider.memory_bcrypt_cost))
        }
        ProviderBackend::Firebase => build_firebase(&config.firebase),
    }
}

fn build_firebase(config: &FirebaseConfig) -> ProviderResult<Providers> {
    let client = http_client()?;

    let (project_id, tokens) = if config.emulator {
        let project_id = config.project_id.clone().ok_or_else(|| {
            ProviderError::NotConfigured("firebase.project_id is required".into())
        })?;
        info!(project_id, "Using Firebase emulators");
        (project_id, AccessTokenProvider::emulator(client.clone()))
    } else {
        let key = service_account_key(config)?;
        let project_id = config.project_id.clone().unwrap_or(key.project_id.clone());
        let tokens = AccessTokenProvider::service_account(client.clone(), &key)?;
        (project_id, tokens)
    };

    let http = Arc::new(FirebaseHttp::new(client, Arc::new(tokens)));

    let identity = Arc::new(FirebaseIdentity::new(
        http.clone(),
        &config.auth_endpoint,
        &project_id,
        config.web_api_key.clone(),
    ));
    let exchange: Option<Arc<dyn CredentialExchange>> = match &config.web_api_key {
        Some(key) => Some(Arc::new(FirebasePasswordSignIn::new(
            http.clone(),
            &config.auth_endpoint,
            key.clone(),
        ))),
        None => {
            warn!("FIREBASE_WEB_API_KEY is not set: credential verification will fail");
            None
        }
    };
    let documents = Arc::new(FirestoreDocuments::new(
        http,
        &config.firestore_endpoint,
        &project_id,
    )?);

    info!(project_id, "Firebase providers configured");
    Ok(Providers {
        identity,
        exchange,
        documents,
        backend: ProviderBackend::Firebase,
    })
}

fn service_account_key(config: &FirebaseConfig) -> ProviderResult<ServiceAccountKey> {
    if let Some(path) = &config.service_account_path {
        return ServiceAccountKey::from_file(path);
    }
    match (&config.project_id, &config.client_email, &config.private_key) {
        (Some(project_id), Some(client_email), Some(private_key)) => Ok(
            ServiceAccountKey::from_parts(project_id, client_email, private_key),
        ),
        _ => Err(ProviderError::NotConfigured(
            "Firebase credentials missing: set FIREBASE_SERVICE_ACCOUNT_PATH or \
             FIREBASE_PROJECT_ID, FIREBASE_CLIENT_EMAIL and FIREBASE_PRIVATE_KEY"
                .into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_firebase_credentials_fail() {
        let err = build_providers(&AppConfig::default()).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn emulator_needs_no_credentials() {
        let mut config = AppConfig::default();
        config.firebase.emulator = true;
        config.firebase.project_id = Some("demo-ares".into());
        config.firebase.auth_endpoint = "http://localhost:9099/identitytoolkit.googleapis.com".into();
        config.firebase.firestore_endpoint = "http://localhost:8080".into();
        let providers = build_providers(&config).unwrap();
        assert_eq!(providers.backend, ProviderBackend::Firebase);
        assert!(providers.exchange.is_none());
    }

    #[test]
    fn memory_backend_offers_sign_in() {
        let mut config = AppConfig::default();
        config.provider.backend = ProviderBackend::Memory;
        config.provider.memory_bcrypt_cost = 4;
        let providers = build_providers(&config).unwrap();
        assert!(providers.exchange.is_some());
    }
}
