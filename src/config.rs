//! Configuration module
//!
//! `AppConfig` is read from a TOML file, then environment variables are
//! applied on top (`PORT`, `CORS_ORIGIN`, `FIREBASE_*`, ...).
//!
//! Default location: `~/.config/ares-backend/config.toml`, overridable with
//! `ARES_CONFIG`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Path used when `ARES_CONFIG` is not set.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ares-backend")
        .join("config.toml")
}

/// `ARES_CONFIG` if set, otherwise [`default_config_path`].
pub fn config_path_from_env() -> PathBuf {
    std::env::var("ARES_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub provider: ProviderConfig,
    pub firebase: FirebaseConfig,
    pub admin_auth: AdminAuthConfig,
    pub seed_admin: Option<SeedAdminConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// `*` allows any origin.
    pub cors_origin: String,
    /// Public URL shown by `GET /`; derived from host and port when empty.
    pub base_url: Option<String>,
    /// Seconds to wait for in-flight requests on shutdown.
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origin: "*".to_string(),
            base_url: None,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn public_url(&self) -> String {
        match &self.base_url {
            Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("http://localhost:{}", self.port),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderBackend {
    #[default]
    Firebase,
    Memory,
}

impl FromStr for ProviderBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "firebase" => Ok(Self::Firebase),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Invalid(format!(
                "unknown provider backend '{}' (expected firebase or memory)",
                other
            ))),
        }
    }
}

impl fmt::Display for ProviderBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Firebase => f.write_str("firebase"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub backend: ProviderBackend,
    /// bcrypt work factor of the memory backend.
    pub memory_bcrypt_cost: u32,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            backend: ProviderBackend::Firebase,
            memory_bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirebaseConfig {
    pub project_id: Option<String>,
    pub client_email: Option<String>,
    pub private_key: Option<String>,
    /// Service-account JSON file; takes precedence over the inline fields.
    pub service_account_path: Option<PathBuf>,
    /// Enables password sign-in and ID-token verification.
    pub web_api_key: Option<String>,
    pub auth_endpoint: String,
    pub firestore_endpoint: String,
    /// Talk to the local emulators without OAuth.
    pub emulator: bool,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            client_email: None,
            private_key: None,
            service_account_path: None,
            web_api_key: None,
            auth_endpoint: "https://identitytoolkit.googleapis.com".to_string(),
            firestore_endpoint: "https://firestore.googleapis.com".to_string(),
            emulator: false,
        }
    }
}

impl fmt::Debug for FirebaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirebaseConfig")
            .field("project_id", &self.project_id)
            .field("client_email", &self.client_email)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("service_account_path", &self.service_account_path)
            .field("web_api_key", &self.web_api_key.as_ref().map(|_| "<redacted>"))
            .field("auth_endpoint", &self.auth_endpoint)
            .field("firestore_endpoint", &self.firestore_endpoint)
            .field("emulator", &self.emulator)
            .finish()
    }
}

/// How callers of `/api/admin/*` prove who they are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminAuthMode {
    /// `{email, password}` in the request body.
    #[default]
    Password,
    /// `Authorization: Bearer <idToken>`.
    Token,
    /// Bearer token when present, otherwise body credentials.
    Any,
}

impl FromStr for AdminAuthMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "password" => Ok(Self::Password),
            "token" => Ok(Self::Token),
            "any" => Ok(Self::Any),
            other => Err(ConfigError::Invalid(format!(
                "unknown admin auth mode '{}' (expected password, token or any)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminAuthConfig {
    pub mode: AdminAuthMode,
}

/// Admin account created at startup on the memory backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct SeedAdminConfig {
    pub email: String,
    pub password: String,
    pub username: String,
}

impl fmt::Debug for SeedAdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAdminConfig")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("username", &self.username)
            .finish()
    }
}

impl AppConfig {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(raw: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(raw)
    }

    /// [`load`](Self::load) followed by the process environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides from `lookup`; empty values are ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT '{}' is not a port", port)))?;
        }
        if let Some(host) = get("HOST") {
            self.server.host = host;
        }
        if let Some(origin) = get("CORS_ORIGIN") {
            self.server.cors_origin = origin;
        }
        if let Some(url) = get("BASE_URL") {
            self.server.base_url = Some(url);
        }
        if let Some(project_id) = get("FIREBASE_PROJECT_ID") {
            self.firebase.project_id = Some(project_id);
        }
        if let Some(email) = get("FIREBASE_CLIENT_EMAIL") {
            self.firebase.client_email = Some(email);
        }
        if let Some(key) = get("FIREBASE_PRIVATE_KEY") {
            self.firebase.private_key = Some(key.replace("\\n", "\n"));
        }
        if let Some(path) = get("FIREBASE_SERVICE_ACCOUNT_PATH") {
            self.firebase.service_account_path = Some(PathBuf::from(path));
        }
        if let Some(key) = get("FIREBASE_WEB_API_KEY") {
            self.firebase.web_api_key = Some(key);
        }
        if let Some(backend) = get("ARES_PROVIDER_BACKEND") {
            self.provider.backend = backend.parse()?;
        }
        if let Some(mode) = get("ARES_ADMIN_AUTH_MODE") {
            self.admin_auth.mode = mode.parse()?;
        }
        Ok(())
    }

    /// Problems that would stop the server from serving `/api`.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.server.port == 0 {
            problems.push("server.port must not be 0".to_string());
        }
        if !matches!(self.logging.format.to_lowercase().as_str(), "text" | "json") {
            problems.push(format!(
                "logging.format '{}' must be text or json",
                self.logging.format
            ));
        }
        if !(4..=31).contains(&self.provider.memory_bcrypt_cost) {
            problems.push("provider.memory_bcrypt_cost must be between 4 and 31".to_string());
        }

        if self.provider.backend == ProviderBackend::Firebase {
            let fb = &self.firebase;
            let has_file = fb.service_account_path.is_some();
            let has_inline = fb.client_email.is_some() && fb.private_key.is_some();
            if !fb.emulator && !has_file && !has_inline {
                problems.push(
                    "firebase credentials missing: set service_account_path or \
                     client_email + private_key"
                        .to_string(),
                );
            }
            if !has_file && fb.project_id.is_none() {
                problems.push("firebase.project_id is required".to_string());
            }
            if fb.web_api_key.is_none() {
                problems.push(
                    "firebase.web_api_key is not set: credential checks will fail".to_string(),
                );
            }
        } else if self.seed_admin.is_none() {
            problems.push("memory backend has no seed_admin: nobody can use the admin endpoints".into());
        }

        problems
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_file_missing() {
        let config = AppConfig::load(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.provider.backend, ProviderBackend::Firebase);
        assert_eq!(config.admin_auth.mode, AdminAuthMode::Password);
    }

    #[test]
    fn parses_partial_toml() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 8080

            [provider]
            backend = "memory"

            [admin_auth]
            mode = "any"

            [seed_admin]
            email = "root@example.com"
            password = "changeme"
            username = "root"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origin, "*");
        assert_eq!(config.provider.backend, ProviderBackend::Memory);
        assert_eq!(config.admin_auth.mode, AdminAuthMode::Any);
        assert_eq!(config.seed_admin.unwrap().username, "root");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config
            .apply_env_overrides(env(&[
                ("PORT", "4000"),
                ("CORS_ORIGIN", "https://game.example.com"),
                ("FIREBASE_PRIVATE_KEY", "line1\\nline2"),
                ("ARES_ADMIN_AUTH_MODE", "token"),
            ]))
            .unwrap();
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.cors_origin, "https://game.example.com");
        assert_eq!(config.firebase.private_key.as_deref(), Some("line1\nline2"));
        assert_eq!(config.admin_auth.mode, AdminAuthMode::Token);
    }

    #[test]
    fn invalid_env_values_are_rejected() {
        let mut config = AppConfig::default();
        assert!(config.apply_env_overrides(env(&[("PORT", "http")])).is_err());
        assert!(config
            .apply_env_overrides(env(&[("ARES_PROVIDER_BACKEND", "mongo")]))
            .is_err());
    }

    #[test]
    fn firebase_without_credentials_is_reported() {
        let problems = AppConfig::default().validate();
        assert!(problems.iter().any(|p| p.contains("credentials missing")));
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.firebase.private_key = Some("PEM-SECRET".into());
        assert!(!format!("{:?}", config).contains("PEM-SECRET"));
    }
}
