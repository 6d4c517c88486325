//! In-memory record backend (for testing/development)

use crate::error::StoreResult;
use crate::record::{Namespace, SESSION_ID};
use crate::traits::RecordBackend;
use async_trait::async_trait;
use bson::Document;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

type Collection = Vec<Document>;

/// In-memory record backend (for testing/development)
///
/// Documents are matched on their `session_id` field, as a MongoDB collection
/// without a unique index would be. Clones share the same storage.
#[derive(Clone, Default)]
pub struct InMemoryBackend {
    collections: Arc<RwLock<HashMap<Namespace, Collection>>>,
}

impl InMemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of namespaces holding at least one record
    pub async fn namespace_count(&self) -> usize {
        self.collections
            .read()
            .await
            .values()
            .filter(|collection| !collection.is_empty())
            .count()
    }

    /// Append a document without replacing any existing one.
    ///
    /// Unlike [`RecordBackend::upsert_record`] this can leave several
    /// documents with the same `session_id`.
    pub async fn insert_record(&self, namespace: &Namespace, document: Document) {
        self.collections
            .write()
            .await
            .entry(namespace.clone())
            .or_default()
            .push(document);
    }
}

fn has_session_id(document: &Document, session_id: &str) -> bool {
    document.get_str(SESSION_ID).is_ok_and(|id| id == session_id)
}

fn document_count(collection: &Collection) -> u64 {
    u64::try_from(collection.len()).unwrap_or(u64::MAX)
}

#[async_trait]
impl RecordBackend for InMemoryBackend {
    async fn find_record(
        &self,
        namespace: &Namespace,
        session_id: &str,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .collections
            .read()
            .await
            .get(namespace)
            .and_then(|collection| {
                collection
                    .iter()
                    .find(|document| has_session_id(document, session_id))
            })
            .cloned())
    }

    async fn upsert_record(
        &self,
        namespace: &Namespace,
        session_id: &str,
        mut document: Document,
    ) -> StoreResult<()> {
        document.insert(SESSION_ID, session_id);

        let mut collections = self.collections.write().await;
        let collection = collections.entry(namespace.clone()).or_default();
        match collection
            .iter_mut()
            .find(|existing| has_session_id(existing, session_id))
        {
            Some(existing) => *existing = document,
            None => collection.push(document),
        }
        Ok(())
    }

    async fn delete_record(&self, namespace: &Namespace, session_id: &str) -> StoreResult<()> {
        if let Some(collection) = self.collections.write().await.get_mut(namespace) {
            collection.retain(|document| !has_session_id(document, session_id));
        }
        Ok(())
    }

    async fn count_records(&self, namespace: &Namespace) -> StoreResult<u64> {
        Ok(self
            .collections
            .read()
            .await
            .get(namespace)
            .map_or(0, document_count))
    }

    async fn clear_records(&self, namespace: &Namespace) -> StoreResult<u64> {
        Ok(self
            .collections
            .write()
            .await
            .remove(namespace)
            .map_or(0, |collection| document_count(&collection)))
    }
}
