//! Cloud Firestore REST adapter

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::IgnoredAny;
use serde::Deserialize;
use serde_json::json;

use super::client::FirebaseHttp;
use super::value::{decode_fields, encode_fields, Fields};
use crate::domain::ports::{Document, DocumentStore};
use crate::shared::{ProviderError, ProviderResult};

#[derive(Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    fields: Fields,
}

/// Field paths that are not plain identifiers must be backtick-quoted.
fn quote_field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

pub struct FirestoreDocuments {
    http: Arc<FirebaseHttp>,
    documents_url: Url,
}

impl FirestoreDocuments {
    pub fn new(http: Arc<FirebaseHttp>, endpoint: &str, project_id: &str) -> ProviderResult<Self> {
        let raw = format!(
            "{}/v1/projects/{}/databases/(default)/documents",
            endpoint.trim_end_matches('/'),
            project_id
        );
        let documents_url = Url::parse(&raw).map_err(|e| {
            ProviderError::NotConfigured(format!("invalid Firestore endpoint {}: {}", raw, e))
        })?;
        Ok(Self {
            http,
            documents_url,
        })
    }

    fn url(&self, segments: &[&str]) -> ProviderResult<Url> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProviderError::NotConfigured("Firestore endpoint has no path".into()))?
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl DocumentStore for FirestoreDocuments {
    async fn get(&self, collection: &str, id: &str) -> ProviderResult<Option<Document>> {
        let url = self.url(&[collection, id])?;
        let doc: Option<FirestoreDocument> = self
            .http
            .authorized_optional("get_document", self.http.client().get(url))
            .await?;
        Ok(doc.map(|d| decode_fields(d.fields)))
    }

    async fn create(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()> {
        let url = self.url(&[collection])?;
        let request = self
            .http
            .client()
            .post(url)
            .query(&[("documentId", id)])
            .json(&json!({ "fields": encode_fields(&fields) }));
        let _: IgnoredAny = self.http.authorized("create_document", request).await?;
        Ok(())
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()> {
        let url = self.url(&[collection, id])?;
        let request = self
            .http
            .client()
            .patch(url)
            .json(&json!({ "fields": encode_fields(&fields) }));
        let _: IgnoredAny = self.http.authorized("set_document", request).await?;
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Document) -> ProviderResult<()> {
        let url = self.url(&[collection, id])?;
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|field| ("updateMask.fieldPaths", quote_field_path(field)))
            .collect();
        query.push(("currentDocument.exists", "true".to_string()));

        let request = self
            .http
            .client()
            .patch(url)
            .query(&query)
            .json(&json!({ "fields": encode_fields(&fields) }));
        let _: IgnoredAny = self.http.authorized("update_document", request).await?;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> ProviderResult<()> {
        let url = self.url(&[collection, id])?;
        let _: IgnoredAny = self
            .http
            .authorized("delete_document", self.http.client().delete(url))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::firebase::access_token::AccessTokenProvider;

    fn store() -> FirestoreDocuments {
        let client = reqwest::Client::new();
        let tokens = Arc::new(AccessTokenProvider::emulator(client.clone()));
        let http = Arc::new(FirebaseHttp::new(client, tokens));
        FirestoreDocuments::new(http, "http://localhost:8080/", "demo").unwrap()
    }

    #[test]
    fn document_urls_escape_ids() {
        let url = store().url(&["usernames", "ada lovelace"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/v1/projects/demo/databases/(default)/documents/usernames/ada%20lovelace"
        );
    }

    #[test]
    fn field_paths_are_quoted_when_needed() {
        assert_eq!(quote_field_path("skinTag"), "skinTag");
        assert_eq!(quote_field_path("odd-name"), "`odd-name`");
        assert_eq!(quote_field_path("9lives"), "`9lives`");
    }
}
