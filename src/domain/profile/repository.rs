use async_trait::async_trait;

use super::{Profile, ProfileUpdate};
use crate::shared::DomainResult;

#[async_trait]
pub trait ProfileRepositoryInterface: Send + Sync {
    async fn find(&self, uid: &str) -> DomainResult<Option<Profile>>;
    async fn create(&self, uid: &str, profile: &Profile) -> DomainResult<()>;

    /// Fails with `ProfileNotFound` when no profile exists for `uid`.
    async fn update(&self, uid: &str, update: &ProfileUpdate, updated_at: &str)
        -> DomainResult<()>;
    async fn delete(&self, uid: &str) -> DomainResult<()>;
}

#[async_trait]
pub trait HandleRepositoryInterface: Send + Sync {
    async fn find_uid(&self, handle: &str) -> DomainResult<Option<String>>;

    /// Create-if-absent. Fails with `UsernameTaken` when the handle is
    /// already mapped.
    async fn claim(&self, handle: &str, uid: &str) -> DomainResult<()>;
    async fn release(&self, handle: &str) -> DomainResult<()>;
}
