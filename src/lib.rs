//! # Ares Backend
//!
//! Accounts and player profiles on top of a managed identity provider
//! (Firebase Authentication) and document store (Cloud Firestore).
//!
//! ## Architecture
//!
//! - **domain**: accounts, profiles, handle mappings and the provider ports
//! - **application**: registration, credential-gated lookup, admin use-cases
//! - **infrastructure**: Firebase REST adapters, in-memory providers, repositories
//! - **interfaces**: HTTP API with Swagger documentation
//! - **server**: runtime shared by the binaries

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{config_path_from_env, default_config_path, AppConfig};
pub use infrastructure::{build_providers, Providers};
pub use interfaces::http::create_api_router;
