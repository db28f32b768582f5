//! Signing and hashing primitives used by the provider adapters

pub mod jwt;
pub mod password;
