//! Profile aggregate
//!
//! Contains the stored profile, the allow-listed update, the handle mapping
//! and the repository interfaces.

pub mod model;
pub mod repository;

pub use model::{
    HandleMapping, Profile, ProfileUpdate, HANDLES_COLLECTION, PROFILES_COLLECTION,
    UPDATABLE_FIELDS,
};

pub use repository::{HandleRepositoryInterface, ProfileRepositoryInterface};
