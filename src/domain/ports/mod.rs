//! Domain ports (hexagonal architecture boundaries)
//!
//! Ports define the interfaces between the domain core and the outside world.
//! The Firebase and in-memory adapters in `infrastructure` implement them.

pub mod documents;
pub mod identity;

pub use documents::{Document, DocumentStore};
pub use identity::{CredentialExchange, IdentityProvider};
