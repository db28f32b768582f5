//! OAuth2 access tokens for the Google REST APIs
//!
//! A service account signs a JWT-bearer assertion and exchanges it at the
//! token endpoint. The token is cached and shared by every request until
//! shortly before it expires. Emulators accept the literal token `owner`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use super::service_account::ServiceAccountKey;
use crate::infrastructure::crypto::jwt::sign_assertion;
use crate::shared::{ProviderError, ProviderResult};

const SCOPES: &str = "https://www.googleapis.com/auth/cloud-platform \
                      https://www.googleapis.com/auth/datastore \
                      https://www.googleapis.com/auth/identitytoolkit \
                      https://www.googleapis.com/auth/userinfo.email";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const EMULATOR_TOKEN: &str = "owner";
const REFRESH_MARGIN_SECS: i64 = 60;

enum Credentials {
    ServiceAccount {
        client_email: String,
        token_uri: String,
        key: EncodingKey,
    },
    Emulator,
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        self.expires_at - Duration::seconds(REFRESH_MARGIN_SECS) > Utc::now()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

pub struct AccessTokenProvider {
    http: reqwest::Client,
    credentials: Credentials,
    cache: RwLock<Option<CachedToken>>,
}

impl AccessTokenProvider {
    pub fn service_account(http: reqwest::Client, key: &ServiceAccountKey) -> ProviderResult<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes()).map_err(|e| {
            ProviderError::NotConfigured(format!("invalid service account private key: {}", e))
        })?;

        Ok(Self {
            http,
            credentials: Credentials::ServiceAccount {
                client_email: key.client_email.clone(),
                token_uri: key.token_uri.clone(),
                key: encoding_key,
            },
            cache: RwLock::new(None),
        })
    }

    pub fn emulator(http: reqwest::Client) -> Self {
        Self {
            http,
            credentials: Credentials::Emulator,
            cache: RwLock::new(None),
        }
    }

    pub async fn token(&self) -> ProviderResult<String> {
        let (client_email, token_uri, key) = match &self.credentials {
            Credentials::Emulator => return Ok(EMULATOR_TOKEN.to_string()),
            Credentials::ServiceAccount {
                client_email,
                token_uri,
                key,
            } => (client_email, token_uri, key),
        };

        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.value.clone());
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.value.clone());
            }
        }

        let assertion = sign_assertion(client_email, SCOPES, token_uri, key).map_err(|e| {
            ProviderError::NotConfigured(format!("cannot sign service account assertion: {}", e))
        })?;

        let response = self
            .http
            .post(token_uri.as_str())
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Unauthenticated(format!(
                "token exchange failed with status {}",
                status
            )));
        }

        let token: TokenResponse = response.json().await?;
        debug!(expires_in = token.expires_in, "Obtained provider access token");

        *cache = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        });
        Ok(token.access_token)
    }
}
