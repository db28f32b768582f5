//! Shared HTTP plumbing for the Firebase REST adapters

use std::sync::Arc;
use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::access_token::AccessTokenProvider;
use super::error::translate;
use crate::shared::{ProviderError, ProviderResult};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// HTTP client used for every provider call.
pub fn http_client() -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(90))
        .build()
        .map_err(|e| ProviderError::NotConfigured(format!("cannot build HTTP client: {}", e)))
}

pub struct FirebaseHttp {
    client: reqwest::Client,
    tokens: Arc<AccessTokenProvider>,
}

impl FirebaseHttp {
    pub fn new(client: reqwest::Client, tokens: Arc<AccessTokenProvider>) -> Self {
        Self { client, tokens }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Sends `request` with the service-account bearer token.
    pub async fn authorized<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ProviderResult<T> {
        let token = self.tokens.token().await?;
        let response = self.send(operation, request.bearer_auth(token)).await?;
        decode(response).await
    }

    /// Like [`authorized`](Self::authorized) but a missing resource is `None`.
    pub async fn authorized_optional<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ProviderResult<Option<T>> {
        match self.authorized(operation, request).await {
            Ok(value) => Ok(Some(value)),
            Err(ProviderError::DocumentNotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Sends `request` without a bearer token (API-key endpoints).
    pub async fn public<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ProviderResult<T> {
        let response = self.send(operation, request).await?;
        decode(response).await
    }

    async fn send(&self, operation: &'static str, request: RequestBuilder) -> ProviderResult<Response> {
        let result = request.send().await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                record(operation, "transport_error");
                return Err(e.into());
            }
        };

        let status = response.status();
        if status.is_success() {
            record(operation, "ok");
            return Ok(response);
        }

        record(operation, "error");
        let body = response.text().await.unwrap_or_default();
        let error = translate(status.as_u16(), &body);
        debug!(operation, status = status.as_u16(), error = %error, "Provider call failed");
        Err(error)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> ProviderResult<T> {
    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::Decode(e.to_string()))
}

fn record(operation: &'static str, outcome: &'static str) {
    metrics::counter!("provider_calls_total", "operation" => operation, "outcome" => outcome)
        .increment(1);
}
