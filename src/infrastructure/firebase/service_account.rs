use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::shared::{ProviderError, ProviderResult};

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The fields of a Google service-account JSON key this crate uses.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub project_id: String,
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> ProviderResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::NotConfigured(format!(
                "cannot read service account file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            ProviderError::NotConfigured(format!(
                "invalid service account file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Environment variables usually carry the PEM with literal `\n`.
    pub fn from_parts(project_id: &str, client_email: &str, private_key: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            client_email: client_email.to_string(),
            private_key: private_key.replace("\\n", "\n"),
            token_uri: default_token_uri(),
        }
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("token_uri", &self.token_uri)
            .finish()
    }
}
