//! Typed, TTL-aware key-value store over a record backend.

use crate::config::PayloadErrorPolicy;
use crate::error::{StoreError, StoreResult};
use crate::record::{Entry, Namespace, RawRecord, expire_at, payload_bytes, record_document};
use crate::traits::RecordBackend;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

#[cfg(feature = "mongodb")]
use crate::config::ConnectionConfig;
#[cfg(feature = "mongodb")]
use crate::mongodb_backend::MongoBackend;

/// Store backed by MongoDB.
#[cfg(feature = "mongodb")]
pub type MongoStore = Store<MongoBackend>;

/// Key-value store partitioned by record type.
///
/// Each type maps to the collection `<database>.<type>`. Records carry an
/// optional unix expiry which is checked on read only: an expired record is
/// deleted by the `get` that finds it, and nothing sweeps in the background.
///
/// # Examples
///
/// ```
/// use mongo_session_store::{InMemoryBackend, Store};
///
/// # #[tokio::main]
/// # async fn main() -> mongo_session_store::StoreResult<()> {
/// let store = Store::new(InMemoryBackend::new(), "saml");
///
/// store.set("session", "abc", &vec!["alice"], None).await?;
/// let users = store.get::<Vec<String>>("session", "abc").await?;
/// assert_eq!(users.and_then(|e| e.into_value()), Some(vec!["alice".to_string()]));
/// # Ok(())
/// # }
/// ```
pub struct Store<B> {
    backend: B,
    database: String,
    payload_policy: PayloadErrorPolicy,
}

#[cfg(feature = "mongodb")]
impl Store<MongoBackend> {
    /// Connect using `config` with `overrides` merged on top.
    ///
    /// Fails with [`StoreError::Config`] when the database name or a field
    /// required by the selected connection mode is missing, and with
    /// [`StoreError::Connection`] when the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use mongo_session_store::{ConnectionConfig, MongoStore};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let base = ConnectionConfig::from_env()?;
    /// let overrides = ConnectionConfig::default().with_database("saml_test");
    /// let store = MongoStore::connect(base, overrides).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(config: ConnectionConfig, overrides: ConnectionConfig) -> StoreResult<Self> {
        let config = config.merge(overrides);
        let database = config.database_name()?.to_string();
        let backend = MongoBackend::connect(&config).await?;

        Ok(Self::new(backend, database).with_payload_policy(config.payload_policy()))
    }

    /// The MongoDB client.
    pub fn connection(&self) -> &mongodb::Client {
        self.backend.client()
    }
}

impl<B: RecordBackend> Store<B> {
    /// Create a store over an existing backend.
    pub fn new(backend: B, database: impl Into<String>) -> Self {
        Self {
            backend,
            database: database.into(),
            payload_policy: PayloadErrorPolicy::default(),
        }
    }

    /// Set what `get` does with payloads that cannot be decoded.
    pub fn with_payload_policy(mut self, policy: PayloadErrorPolicy) -> Self {
        self.payload_policy = policy;
        self
    }

    /// The database name.
    pub fn database_name(&self) -> &str {
        &self.database
    }

    /// The record backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The namespace holding records of `record_type`.
    pub fn namespace(&self, record_type: &str) -> Namespace {
        Namespace::new(self.database.as_str(), record_type)
    }

    /// Retrieve a value.
    ///
    /// Returns `Ok(None)` if the key is missing or its record has expired.
    /// Expired records are deleted before returning. A record without a
    /// payload is returned as [`Entry::Raw`].
    pub async fn get<T: DeserializeOwned>(
        &self,
        record_type: &str,
        key: &str,
    ) -> StoreResult<Option<Entry<T>>> {
        let namespace = self.namespace(record_type);
        debug!(namespace = %namespace, key, "get");

        let Some(document) = self.backend.find_record(&namespace, key).await? else {
            return Ok(None);
        };

        if let Some(expires) = expire_at(&document)
            && expires <= chrono::Utc::now().timestamp()
        {
            debug!(namespace = %namespace, key, expire_at = expires, "Removing expired record");
            self.backend.delete_record(&namespace, key).await?;
            return Ok(None);
        }

        let Some(payload) = payload_bytes(&document) else {
            return Ok(Some(Entry::Raw(RawRecord::new(document))));
        };

        match serde_json::from_slice(payload) {
            Ok(value) => Ok(Some(Entry::Value(value))),
            Err(e) => match self.payload_policy {
                PayloadErrorPolicy::Error => Err(StoreError::Deserialization(e.to_string())),
                PayloadErrorPolicy::TreatAsMissing => {
                    warn!(namespace = %namespace, key, error = %e, "Ignoring undecodable payload");
                    Ok(None)
                }
                PayloadErrorPolicy::ReturnRaw => {
                    warn!(namespace = %namespace, key, error = %e, "Returning undecodable payload as raw record");
                    Ok(Some(Entry::Raw(RawRecord::new(document))))
                }
            },
        }
    }

    /// Save a value, fully replacing any record with the same key.
    ///
    /// `expire` is a unix timestamp in seconds; `None` never expires.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        record_type: &str,
        key: &str,
        value: &T,
        expire: Option<i64>,
    ) -> StoreResult<()> {
        let namespace = self.namespace(record_type);
        debug!(namespace = %namespace, key, expire_at = ?expire, "set");

        let payload =
            serde_json::to_vec(value).map_err(|e| StoreError::Serialization(e.to_string()))?;

        self.backend
            .upsert_record(&namespace, key, record_document(key, payload, expire))
            .await
    }

    /// Delete a value. Deleting a missing key is not an error.
    pub async fn delete(&self, record_type: &str, key: &str) -> StoreResult<()> {
        let namespace = self.namespace(record_type);
        debug!(namespace = %namespace, key, "delete");

        self.backend.delete_record(&namespace, key).await
    }

    /// Number of stored records of `record_type`, expired ones included.
    pub async fn count(&self, record_type: &str) -> StoreResult<u64> {
        self.backend.count_records(&self.namespace(record_type)).await
    }

    /// Remove every record of `record_type`.
    ///
    /// **Warning:** This invalidates all sessions of that type.
    pub async fn clear(&self, record_type: &str) -> StoreResult<u64> {
        let namespace = self.namespace(record_type);
        let removed = self.backend.clear_records(&namespace).await?;
        debug!(namespace = %namespace, removed, "clear");
        Ok(removed)
    }
}
