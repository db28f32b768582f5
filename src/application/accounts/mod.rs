//! Registration, credential-gated lookup and deletion

pub mod lifecycle;
pub mod service;

pub use lifecycle::AccountLifecycle;
pub use service::{AccountService, RegisteredAccount, Registration};
