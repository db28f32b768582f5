use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::warn;

use crate::domain::profile::{HandleMapping, HandleRepositoryInterface, HANDLES_COLLECTION};
use crate::domain::{DocumentStore, DomainError, DomainResult, ProviderError};

pub struct HandleRepository {
    documents: Arc<dyn DocumentStore>,
}

impl HandleRepository {
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }
}

#[async_trait]
impl HandleRepositoryInterface for HandleRepository {
    async fn find_uid(&self, handle: &str) -> DomainResult<Option<String>> {
        let Some(doc) = self.documents.get(HANDLES_COLLECTION, handle).await? else {
            return Ok(None);
        };
        match HandleMapping::from_document(doc) {
            Ok(mapping) => Ok(Some(mapping.uid)),
            Err(e) => {
                warn!(handle, error = %e, "Stored handle mapping is malformed");
                Err(DomainError::Internal(format!(
                    "malformed handle mapping {}: {}",
                    handle, e
                )))
            }
        }
    }

    async fn claim(&self, handle: &str, uid: &str) -> DomainResult<()> {
        let mapping = HandleMapping {
            uid: uid.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        match self
            .documents
            .create(HANDLES_COLLECTION, handle, mapping.to_document())
            .await
        {
            Ok(()) => Ok(()),
            Err(ProviderError::AlreadyExists) => {
                Err(DomainError::UsernameTaken(handle.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn release(&self, handle: &str) -> DomainResult<()> {
        self.documents.delete(HANDLES_COLLECTION, handle).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::memory::InMemoryDocumentStore;

    #[tokio::test]
    async fn second_claim_loses() {
        let repo = HandleRepository::new(Arc::new(InMemoryDocumentStore::new()));
        repo.claim("ada", "u1").await.unwrap();
        let err = repo.claim("ada", "u2").await.unwrap_err();
        assert!(matches!(err, DomainError::UsernameTaken(ref h) if h == "ada"));
        assert_eq!(repo.find_uid("ada").await.unwrap().as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn release_frees_the_handle() {
        let repo = HandleRepository::new(Arc::new(InMemoryDocumentStore::new()));
        repo.claim("ada", "u1").await.unwrap();
        repo.release("ada").await.unwrap();
        assert!(repo.find_uid("ada").await.unwrap().is_none());
        repo.claim("ada", "u2").await.unwrap();
    }
}
