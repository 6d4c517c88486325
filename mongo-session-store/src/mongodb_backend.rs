//! MongoDB record backend.
//!
//! This module requires the `mongodb` feature flag (enabled by default).

use crate::config::ConnectionConfig;
use crate::error::{StoreError, StoreResult};
use crate::record::{Namespace, SESSION_ID};
use crate::traits::RecordBackend;
use crate::uri::build_connection_uri;
use async_trait::async_trait;
use bson::{Document, doc};
use mongodb::options::{ClientOptions, ReadPreference, SelectionCriteria};
use mongodb::{Client, Collection};
use tracing::info;

/// MongoDB-backed record storage.
///
/// Holds one [`Client`] for its whole lifetime. The client is cheap to clone
/// and pools connections internally.
///
/// # Examples
///
/// ```no_run
/// use mongo_session_store::{ConnectionConfig, MongoBackend};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = ConnectionConfig::replica_set(vec!["m1", "m2"], 27017, "rs0")
///     .with_read_preference("secondaryPreferred");
/// let backend = MongoBackend::connect(&config).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct MongoBackend {
    client: Client,
}

impl MongoBackend {
    /// Build a client from configuration.
    ///
    /// The URI comes from [`build_connection_uri`]. When a replica set is
    /// configured its name and read preference are passed as client options,
    /// in DSN mode as well. No round trip is made here; the driver
    /// connects on first use.
    pub async fn connect(config: &ConnectionConfig) -> StoreResult<Self> {
        let options = client_options(config).await?;
        let client =
            Client::with_options(options).map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(
            mode = %config.mode(),
            replica_set = config.replica_set_name().unwrap_or_default(),
            read_preference = config.read_preference_mode().unwrap_or_default(),
            "MongoDB client created"
        );

        Ok(Self { client })
    }

    /// Wrap an existing client, e.g. one shared with other components.
    ///
    /// ```no_run
    /// use mongo_session_store::{MongoBackend, Store};
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let client = mongodb::Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let store = Store::new(MongoBackend::from_client(client), "saml");
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn collection(&self, namespace: &Namespace) -> Collection<Document> {
        self.client
            .database(&namespace.database)
            .collection(&namespace.collection)
    }
}

/// Client options for `config`.
///
/// Parses the connection URI, then sets the replica set name and read
/// preference when a replica set is configured. This applies in DSN mode too,
/// where they take precedence over options embedded in the DSN.
pub(crate) async fn client_options(config: &ConnectionConfig) -> StoreResult<ClientOptions> {
    let uri = build_connection_uri(config)?;

    let mut options = ClientOptions::parse(uri.as_str())
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

    if let Some(replica_set) = config.replica_set_name() {
        options.repl_set_name = Some(replica_set.to_string());

        if let Some(mode) = config.read_preference_mode() {
            options.selection_criteria =
                Some(SelectionCriteria::ReadPreference(parse_read_preference(mode)?));
        }
    }

    Ok(options)
}

/// Parse a read preference mode name (case-insensitive).
pub(crate) fn parse_read_preference(mode: &str) -> StoreResult<ReadPreference> {
    match mode.to_ascii_lowercase().as_str() {
        "primary" => Ok(ReadPreference::Primary),
        "primarypreferred" => Ok(ReadPreference::PrimaryPreferred { options: None }),
        "secondary" => Ok(ReadPreference::Secondary { options: None }),
        "secondarypreferred" => Ok(ReadPreference::SecondaryPreferred { options: None }),
        "nearest" => Ok(ReadPreference::Nearest { options: None }),
        _ => Err(StoreError::Config(format!("unknown read preference: {}", mode))),
    }
}

#[async_trait]
impl RecordBackend for MongoBackend {
    async fn find_record(
        &self,
        namespace: &Namespace,
        session_id: &str,
    ) -> StoreResult<Option<Document>> {
        let found = self
            .collection(namespace)
            .find_one(doc! { SESSION_ID: session_id })
            .await?;
        Ok(found)
    }

    async fn upsert_record(
        &self,
        namespace: &Namespace,
        session_id: &str,
        document: Document,
    ) -> StoreResult<()> {
        self.collection(namespace)
            .replace_one(doc! { SESSION_ID: session_id }, document)
            .upsert(true)
            .await?;
        Ok(())
    }

    async fn delete_record(&self, namespace: &Namespace, session_id: &str) -> StoreResult<()> {
        self.collection(namespace)
            .delete_many(doc! { SESSION_ID: session_id })
            .await?;
        Ok(())
    }

    async fn count_records(&self, namespace: &Namespace) -> StoreResult<u64> {
        let count = self.collection(namespace).count_documents(doc! {}).await?;
        Ok(count)
    }

    async fn clear_records(&self, namespace: &Namespace) -> StoreResult<u64> {
        let result = self.collection(namespace).delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }
}
