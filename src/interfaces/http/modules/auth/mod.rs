//! Registration, profile lookup and self-deletion

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;
