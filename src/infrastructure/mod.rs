//! Infrastructure layer - external concerns

pub mod crypto;
pub mod firebase;
pub mod memory;
pub mod provider;
pub mod repositories;

pub use memory::{InMemoryDocumentStore, InMemoryIdentityProvider};
pub use provider::{build_providers, Providers};
pub use repositories::{HandleRepository, ProfileRepository};
