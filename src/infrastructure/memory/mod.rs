//! In-process providers for development and testing

pub mod documents;
pub mod identity;

pub use documents::InMemoryDocumentStore;
pub use identity::InMemoryIdentityProvider;
