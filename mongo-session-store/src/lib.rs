//! Session and key-value storage on MongoDB.
//!
//! Stores transient, typed records for an identity federation host (session
//! data, authentication state, discovery tokens) keyed by an opaque session
//! identifier. The record *type* selects the collection, so `get("session",
//! id)` reads from `<database>.session`.
//!
//! # Record Shape
//!
//! ```text
//! { session_id: "<key>", payload: <binary JSON>, expire_at: <unix seconds> | null }
//! ```
//!
//! Expiry is enforced lazily: `get` deletes a record whose `expire_at` has
//! passed and reports it as absent. Nothing sweeps expired records in the
//! background, so pair this with a MongoDB TTL index if unread records must
//! go away on their own.
//!
//! # Features
//!
//! - `mongodb` - MongoDB backend (enabled by default)
//!
//! Without `mongodb` the crate still provides the URI builder, the
//! configuration types and [`InMemoryBackend`].
//!
//! # Examples
//!
//! ## MongoDB Store
//!
//! ```no_run
//! use mongo_session_store::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StoreError> {
//!     let config = ConnectionConfig::single_host("localhost", 27017)
//!         .with_credentials("saml", "secret")
//!         .with_database("simplesaml");
//!
//!     let store = MongoStore::connect(config, ConnectionConfig::default()).await?;
//!
//!     let expire = chrono::Utc::now().timestamp() + 3600;
//!     store.set("session", "SESSION_ID", &vec!["alice"], Some(expire)).await?;
//!
//!     match store.get::<Vec<String>>("session", "SESSION_ID").await? {
//!         Some(Entry::Value(users)) => println!("users: {:?}", users),
//!         Some(Entry::Raw(record)) => println!("legacy record: {:?}", record.document()),
//!         None => println!("missing or expired"),
//!     }
//!
//!     store.delete("session", "SESSION_ID").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Replica Set from the Environment
//!
//! ```no_run
//! use mongo_session_store::*;
//!
//! # async fn example() -> Result<(), StoreError> {
//! // DB_DEFAULT_CONNECTION=mongodb_replica
//! // DB_MONGODB_HOST=m1,m2,m3  DB_MONGODB_PORT=27017
//! // DB_MONGODB_REPLICASET=rs0 DB_MONGODB_READ_PREFERENCE=secondaryPreferred
//! let store = MongoStore::connect(ConnectionConfig::from_env()?, ConnectionConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod memory;
pub mod record;
pub mod store;
pub mod traits;
pub mod uri;

#[cfg(feature = "mongodb")]
pub mod mongodb_backend;

pub use config::{ConnectionConfig, ConnectionMode, HostList, PayloadErrorPolicy};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryBackend;
pub use record::{Entry, Namespace, RawRecord};
pub use store::Store;
pub use traits::RecordBackend;
pub use uri::build_connection_uri;

#[cfg(feature = "mongodb")]
pub use mongodb_backend::MongoBackend;

#[cfg(feature = "mongodb")]
pub use store::MongoStore;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{ConnectionConfig, PayloadErrorPolicy};
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::memory::InMemoryBackend;
    pub use crate::record::{Entry, RawRecord};
    pub use crate::store::Store;
    pub use crate::traits::RecordBackend;
    pub use crate::uri::build_connection_uri;

    #[cfg(feature = "mongodb")]
    pub use crate::mongodb_backend::MongoBackend;

    #[cfg(feature = "mongodb")]
    pub use crate::store::MongoStore;
}
