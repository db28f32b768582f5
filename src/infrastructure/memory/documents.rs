//! In-memory document store

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::ports::{Document, DocumentStore};
use crate::shared::{ProviderError, ProviderResult};

/// Documents keyed by `(collection, id)`.
#[derive(Default)]
pub struct InMemoryDocumentStore {
    documents: DashMap<(String, String), Document>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .count()
    }
}

fn key(collection: &str, id: &str) -> (String, String) {
    (collection.to_string(), id.to_string())
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> ProviderResult<Option<Document>> {
        Ok(self
            .documents
            .get(&key(collection, id))
            .map(|doc| doc.value().clone()))
    }

    async fn create(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()> {
        match self.documents.entry(key(collection, id)) {
            Entry::Occupied(_) => Err(ProviderError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(fields);
                Ok(())
            }
        }
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()> {
        self.documents.insert(key(collection, id), fields);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()> {
        let mut doc = self
            .documents
            .get_mut(&key(collection, id))
            .ok_or(ProviderError::DocumentNotFound)?;
        for (field, value) in fields {
            doc.insert(field, value);
        }
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> ProviderResult<()> {
        self.documents.remove(&key(collection, id));
        Ok(())
    }
}
