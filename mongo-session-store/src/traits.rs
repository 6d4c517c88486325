//! Record backend trait definition.

use crate::error::StoreResult;
use crate::record::Namespace;
use async_trait::async_trait;
use bson::Document;

/// Document storage used by [`Store`](crate::Store).
///
/// A backend addresses documents by namespace and the `session_id` field.
/// It performs no expiry checks and no payload decoding; the store does both.
///
/// # Examples
///
/// ```
/// use mongo_session_store::{InMemoryBackend, Namespace, RecordBackend};
/// use bson::doc;
///
/// # async fn example() -> mongo_session_store::StoreResult<()> {
/// let backend = InMemoryBackend::new();
/// let namespace = Namespace::new("saml", "session");
///
/// backend
///     .upsert_record(&namespace, "abc", doc! { "session_id": "abc" })
///     .await?;
/// assert_eq!(backend.count_records(&namespace).await?, 1);
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RecordBackend: Send + Sync {
    /// Find a document whose `session_id` equals `session_id`.
    async fn find_record(&self, namespace: &Namespace, session_id: &str)
        -> StoreResult<Option<Document>>;

    /// Insert `document`, or fully replace a document with the same `session_id`.
    async fn upsert_record(
        &self,
        namespace: &Namespace,
        session_id: &str,
        document: Document,
    ) -> StoreResult<()>;

    /// Remove every document with this `session_id`. Missing documents are not an error.
    async fn delete_record(&self, namespace: &Namespace, session_id: &str) -> StoreResult<()>;

    /// Count the documents in a namespace.
    async fn count_records(&self, namespace: &Namespace) -> StoreResult<u64>;

    /// Remove every document in a namespace, returning how many were removed.
    ///
    /// **Warning:** This drops all records of the namespace's type.
    async fn clear_records(&self, namespace: &Namespace) -> StoreResult<u64>;
}
