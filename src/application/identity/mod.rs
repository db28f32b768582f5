//! Identity use-cases: who is calling, and what may they see.

pub mod admin_gate;
pub mod authorization;
pub mod credentials;

pub use admin_gate::{AdminAuthenticator, PresentedCredentials};
pub use authorization::{authorize_profile_access, require_admin};
pub use credentials::CredentialVerifier;
