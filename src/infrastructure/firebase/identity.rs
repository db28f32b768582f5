//! Identity Toolkit (Firebase Authentication) REST adapter

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::client::FirebaseHttp;
use crate::domain::account::{
    Account, AccountMetadata, AccountPage, CreateAccountDto, CustomClaims, SignInResult,
    UpdateAccountDto,
};
use crate::domain::ports::{CredentialExchange, IdentityProvider};
use crate::shared::{ProviderError, ProviderResult};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    local_id: String,
    email: Option<String>,
    #[serde(default)]
    email_verified: bool,
    display_name: Option<String>,
    #[serde(default)]
    disabled: bool,
    /// Milliseconds since the epoch, as a string.
    created_at: Option<String>,
    last_login_at: Option<String>,
    /// JSON object serialized as a string.
    custom_attributes: Option<String>,
}

fn parse_millis(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| s.parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
}

impl From<UserRecord> for Account {
    fn from(record: UserRecord) -> Self {
        let custom_claims = record
            .custom_attributes
            .as_deref()
            .and_then(|raw| serde_json::from_str::<CustomClaims>(raw).ok())
            .unwrap_or_default();

        Account {
            metadata: AccountMetadata {
                creation_time: parse_millis(record.created_at.as_deref()),
                last_sign_in_time: parse_millis(record.last_login_at.as_deref()),
            },
            uid: record.local_id,
            email: record.email,
            email_verified: record.email_verified,
            display_name: record.display_name,
            disabled: record.disabled,
            custom_claims,
        }
    }
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    users: Vec<UserRecord>,
    next_page_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    local_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignInResponse {
    local_id: String,
    id_token: String,
    #[serde(default)]
    expires_in: String,
}

fn encode_claims(claims: &CustomClaims) -> ProviderResult<String> {
    serde_json::to_string(claims).map_err(|e| ProviderError::Decode(e.to_string()))
}

/// Admin operations go to `{endpoint}/v1/projects/{project}/accounts*` with
/// the service-account token; ID-token lookup uses the public API-key
/// endpoint.
pub struct FirebaseIdentity {
    http: Arc<FirebaseHttp>,
    project_url: String,
    public_url: String,
    web_api_key: Option<String>,
}

impl FirebaseIdentity {
    pub fn new(
        http: Arc<FirebaseHttp>,
        endpoint: &str,
        project_id: &str,
        web_api_key: Option<String>,
    ) -> Self {
        let endpoint = endpoint.trim_end_matches('/');
        Self {
            http,
            project_url: format!("{}/v1/projects/{}", endpoint, project_id),
            public_url: format!("{}/v1", endpoint),
            web_api_key,
        }
    }

    async fn lookup(&self, operation: &'static str, body: Value) -> ProviderResult<Account> {
        let url = format!("{}/accounts:lookup", self.project_url);
        let response: LookupResponse = self
            .http
            .authorized(operation, self.http.client().post(url).json(&body))
            .await?;
        response
            .users
            .into_iter()
            .next()
            .map(Account::from)
            .ok_or(ProviderError::UserNotFound)
    }

    async fn update(&self, operation: &'static str, body: Value) -> ProviderResult<()> {
        let url = format!("{}/accounts:update", self.project_url);
        let _: IgnoredAny = self
            .http
            .authorized(operation, self.http.client().post(url).json(&body))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn create_user(&self, dto: &CreateAccountDto) -> ProviderResult<Account> {
        let mut body = json!({
            "email": dto.email,
            "password": dto.password,
        });
        if let Some(name) = &dto.display_name {
            body["displayName"] = Value::String(name.clone());
        }

        let url = format!("{}/accounts", self.project_url);
        let created: CreateResponse = self
            .http
            .authorized("create_user", self.http.client().post(url).json(&body))
            .await?;
        self.get_user(&created.local_id).await
    }

    async fn get_user(&self, uid: &str) -> ProviderResult<Account> {
        self.lookup("get_user", json!({ "localId": [uid] })).await
    }

    async fn get_user_by_email(&self, email: &str) -> ProviderResult<Account> {
        self.lookup("get_user_by_email", json!({ "email": [email] }))
            .await
    }

    async fn list_users(
        &self,
        page_size: usize,
        page_token: Option<&str>,
    ) -> ProviderResult<AccountPage> {
        let url = format!("{}/accounts:batchGet", self.project_url);
        let mut query = vec![("maxResults", page_size.to_string())];
        if let Some(token) = page_token {
            query.push(("nextPageToken", token.to_string()));
        }

        let response: BatchGetResponse = self
            .http
            .authorized("list_users", self.http.client().get(url).query(&query))
            .await?;

        Ok(AccountPage {
            accounts: response.users.into_iter().map(Account::from).collect(),
            next_page_token: response.next_page_token.filter(|t| !t.is_empty()),
        })
    }

    async fn set_custom_user_claims(
        &self,
        uid: &str,
        claims: &CustomClaims,
    ) -> ProviderResult<()> {
        let body = json!({
            "localId": uid,
            "customAttributes": encode_claims(claims)?,
        });
        self.update("set_custom_user_claims", body).await
    }

    async fn update_user(&self, uid: &str, dto: &UpdateAccountDto) -> ProviderResult<Account> {
        let mut body = Map::new();
        body.insert("localId".into(), uid.into());
        match dto.display_name.as_deref() {
            Some("") => {
                body.insert("deleteAttribute".into(), json!(["DISPLAY_NAME"]));
            }
            Some(name) => {
                body.insert("displayName".into(), name.into());
            }
            None => {}
        }
        if let Some(disabled) = dto.disabled {
            body.insert("disableUser".into(), disabled.into());
        }
        if let Some(claims) = &dto.custom_claims {
            body.insert("customAttributes".into(), encode_claims(claims)?.into());
        }

        self.update("update_user", Value::Object(body)).await?;
        self.get_user(uid).await
    }

    async fn delete_user(&self, uid: &str) -> ProviderResult<()> {
        let url = format!("{}/accounts:delete", self.project_url);
        let _: IgnoredAny = self
            .http
            .authorized(
                "delete_user",
                self.http.client().post(url).json(&json!({ "localId": uid })),
            )
            .await?;
        Ok(())
    }

    async fn verify_id_token(&self, id_token: &str) -> ProviderResult<String> {
        let key = self.web_api_key.as_deref().ok_or_else(|| {
            ProviderError::NotConfigured("ID token verification requires a web API key".into())
        })?;

        let url = format!("{}/accounts:lookup", self.public_url);
        let response: LookupResponse = self
            .http
            .public(
                "verify_id_token",
                self.http
                    .client()
                    .post(url)
                    .query(&[("key", key)])
                    .json(&json!({ "idToken": id_token })),
            )
            .await?;

        let record = response
            .users
            .into_iter()
            .next()
            .ok_or(ProviderError::InvalidIdToken)?;
        if record.disabled {
            return Err(ProviderError::UserDisabled);
        }
        Ok(record.local_id)
    }
}

/// `accounts:signInWithPassword` with the project's web API key.
pub struct FirebasePasswordSignIn {
    http: Arc<FirebaseHttp>,
    url: String,
    web_api_key: String,
}

impl FirebasePasswordSignIn {
    pub fn new(http: Arc<FirebaseHttp>, endpoint: &str, web_api_key: String) -> Self {
        Self {
            http,
            url: format!(
                "{}/v1/accounts:signInWithPassword",
                endpoint.trim_end_matches('/')
            ),
            web_api_key,
        }
    }
}

#[async_trait]
impl CredentialExchange for FirebasePasswordSignIn {
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> ProviderResult<SignInResult> {
        let request = self
            .http
            .client()
            .post(self.url.as_str())
            .query(&[("key", self.web_api_key.as_str())])
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }));

        let response: SignInResponse = self.http.public("sign_in_with_password", request).await?;
        Ok(SignInResult {
            uid: response.local_id,
            id_token: response.id_token,
            expires_in: response.expires_in.parse().unwrap_or(3600),
        })
    }
}
