//! JWT handling
//!
//! HS256 ID tokens issued by the in-memory identity provider, and the RS256
//! assertion a Google service account exchanges for an OAuth access token.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// ID token configuration
#[derive(Clone)]
pub struct IdTokenConfig {
    /// Secret key for signing tokens
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: i64,
    /// Issuer and audience claim
    pub issuer: String,
}

impl Default for IdTokenConfig {
    fn default() -> Self {
        Self {
            secret: uuid::Uuid::new_v4().to_string(),
            ttl_secs: 3600,
            issuer: "ares-backend".to_string(),
        }
    }
}

/// ID token claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdTokenClaims {
    /// Subject (account uid)
    pub sub: String,
    pub email: Option<String>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
    pub aud: String,
}

impl IdTokenClaims {
    pub fn new(uid: &str, email: Option<&str>, config: &IdTokenConfig) -> Self {
        let now = Utc::now();
        let exp = now + Duration::seconds(config.ttl_secs);

        Self {
            sub: uid.to_string(),
            email: email.map(str::to_string),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: config.issuer.clone(),
            aud: config.issuer.clone(),
        }
    }
}

/// Create an ID token for an account
pub fn create_id_token(
    uid: &str,
    email: Option<&str>,
    config: &IdTokenConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = IdTokenClaims::new(uid, email, config);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
}

/// Verify and decode an ID token
pub fn verify_id_token(
    token: &str,
    config: &IdTokenConfig,
) -> Result<IdTokenClaims, jsonwebtoken::errors::Error> {
    let mut validation = Validation::default();
    validation.set_issuer(&[&config.issuer]);
    validation.set_audience(&[&config.issuer]);

    let token_data = decode::<IdTokenClaims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )?;

    Ok(token_data.claims)
}

/// Claims of the OAuth 2.0 JWT-bearer assertion signed with a service
/// account key.
#[derive(Debug, Serialize)]
pub struct AssertionClaims<'a> {
    pub iss: &'a str,
    pub scope: &'a str,
    pub aud: &'a str,
    pub iat: i64,
    pub exp: i64,
}

/// Sign an RS256 assertion valid for one hour.
pub fn sign_assertion(
    client_email: &str,
    scope: &str,
    audience: &str,
    key: &EncodingKey,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = AssertionClaims {
        iss: client_email,
        scope,
        aud: audience,
        iat: now,
        exp: now + 3600,
    };
    encode(&Header::new(Algorithm::RS256), &claims, key)
}
