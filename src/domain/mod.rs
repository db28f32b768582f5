//! Domain layer
//!
//! Accounts (owned by the identity provider), profiles and handle mappings
//! (stored as documents), and the ports both providers implement.

pub mod account;
pub mod ports;
pub mod profile;

pub use account::{Account, AccountMetadata, CustomClaims};
pub use ports::{CredentialExchange, Document, DocumentStore, IdentityProvider};
pub use profile::{HandleMapping, Profile, ProfileUpdate};

pub use crate::shared::{DomainError, DomainResult, ProviderError, ProviderResult};
