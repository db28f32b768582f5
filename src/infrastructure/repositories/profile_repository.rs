use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::profile::{
    Profile, ProfileRepositoryInterface, ProfileUpdate, PROFILES_COLLECTION,
};
use crate::domain::{DocumentStore, DomainError, DomainResult, ProviderError};

pub struct ProfileRepository {
    documents: Arc<dyn DocumentStore>,
}

impl ProfileRepository {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }
}

fn decode_err(uid: &str, e: serde_json::Error) -> DomainError {
    warn!(uid, error = %e, "Stored profile document is malformed");
    DomainError::Internal(format!("malformed profile document {}: {}", uid, e))
}

#[async_trait]
impl ProfileRepositoryInterface for ProfileRepository {
    async fn find(&self, uid: &str) -> DomainResult<Option<Profile>> {
        match self.documents.get(PROFILES_COLLECTION, uid).await? {
            Some(doc) => Profile::from_document(doc)
                .map(Some)
                .map_err(|e| decode_err(uid, e)),
            None => Ok(None),
        }
    }

    async fn create(&self, uid: &str, profile: &Profile) -> DomainResult<()> {
        self.documents
            .set(PROFILES_COLLECTION, uid, profile.to_document())
            .await?;
        Ok(())
    }

    async fn update(
        &self,
        uid: &str,
        update: &ProfileUpdate,
        updated_at: &str,
    ) -> DomainResult<()> {
        match self
            .documents
            .update(PROFILES_COLLECTION, uid, update.to_document(updated_at))
            .await
        {
            Ok(()) => Ok(()),
            Err(ProviderError::DocumentNotFound) => Err(DomainError::ProfileNotFound {
                uid: uid.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, uid: &str) -> DomainResult<()> {
        self.documents.delete(PROFILES_COLLECTION, uid).await?;
        Ok(())
    }
}
