//! HTTP REST API interfaces
//!
//! - `common`: response envelope, error mapping, validating extractor
//! - `middleware`: admin authentication
//! - `modules`: handlers and DTOs per resource
//! - `router`: API router with Swagger documentation

pub mod common;
pub mod middleware;
pub mod modules;
pub mod router;

pub use router::{create_api_router, ApiDoc, RouterContext};
