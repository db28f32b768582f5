//! Shared HTTP plumbing: the response envelope, error mapping and the
//! validating JSON extractor.

pub mod error;
pub mod response;
pub mod validated_json;

pub use response::{ApiErrorBody, ApiResponse};
pub use validated_json::ValidatedJson;
