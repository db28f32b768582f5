//! Account aggregate
//!
//! Accounts live in the identity provider; this module only describes them.

pub mod model;

mod dto;

pub use model::{
    find_reserved_claim, merge_claims, Account, AccountMetadata, CustomClaims, ADMIN_CLAIM,
    RESERVED_CLAIMS,
};

pub use dto::{AccountPage, CreateAccountDto, SignInResult, UpdateAccountDto};
