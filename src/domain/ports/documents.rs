use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::shared::ProviderResult;

/// A document body: JSON object with string keys.
pub type Document = Map<String, Value>;

/// `collection(name).doc(id)` access to the document database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> ProviderResult<Option<Document>>;

    /// Create-if-absent. Fails with `ProviderError::AlreadyExists`.
    async fn create(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()>;

    /// Create or overwrite the whole document.
    async fn set(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()>;

    /// Overwrite only the given top-level fields of an existing document.
    /// Fails with `ProviderError::DocumentNotFound`.
    async fn update(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()>;

    /// Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> ProviderResult<()>;
}
