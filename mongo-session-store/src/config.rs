//! Store configuration.

use crate::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Environment variables read by [`ConnectionConfig::from_env`].
pub mod env {
    /// Selects the connection shape (`mongodb`, `mongodb_replica`, `mongodb_replica_string`).
    pub const DEFAULT_CONNECTION: &str = "DB_DEFAULT_CONNECTION";
    pub const HOST: &str = "DB_MONGODB_HOST";
    pub const PORT: &str = "DB_MONGODB_PORT";
    pub const USERNAME: &str = "DB_MONGODB_USERNAME";
    pub const PASSWORD: &str = "DB_MONGODB_PASSWORD";
    pub const DATABASE: &str = "DB_MONGODB_DATABASE";
    pub const REPLICA_SET: &str = "DB_MONGODB_REPLICASET";
    pub const READ_PREFERENCE: &str = "DB_MONGODB_READ_PREFERENCE";
    pub const DSN: &str = "DB_MONGODB_DSN";
}

/// One host, a comma-separated host string, or an explicit host list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HostList {
    /// A single string, split on `,` when building the seed list
    Single(String),
    /// Hosts given as a list, used in order
    Many(Vec<String>),
}

impl HostList {
    /// Normalize into individual host names, preserving input order.
    ///
    /// Entries are not trimmed: `"a, b"` yields `"a"` and `" b"`.
    pub fn hosts(&self) -> Vec<&str> {
        match self {
            Self::Single(hosts) => hosts.split(',').collect(),
            Self::Many(hosts) => hosts.iter().map(String::as_str).collect(),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            Self::Single(hosts) => hosts.is_empty(),
            Self::Many(hosts) => hosts.is_empty(),
        }
    }
}

impl From<&str> for HostList {
    fn from(host: &str) -> Self {
        Self::Single(host.to_string())
    }
}

impl From<String> for HostList {
    fn from(host: String) -> Self {
        Self::Single(host)
    }
}

impl From<Vec<String>> for HostList {
    fn from(hosts: Vec<String>) -> Self {
        Self::Many(hosts)
    }
}

impl From<Vec<&str>> for HostList {
    fn from(hosts: Vec<&str>) -> Self {
        Self::Many(hosts.into_iter().map(str::to_string).collect())
    }
}

/// What `get` does when a stored payload cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadErrorPolicy {
    /// Return [`StoreError::Deserialization`]
    #[default]
    Error,
    /// Log a warning and report the key as absent
    TreatAsMissing,
    /// Log a warning and return the stored document fields
    ReturnRaw,
}

/// How the connection URI is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionMode {
    /// `mongodb://` seed list built from host(s) and port
    SeedList,
    /// Raw DSN used verbatim
    Dsn,
}

impl fmt::Display for ConnectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SeedList => write!(f, "seed-list"),
            Self::Dsn => write!(f, "dsn"),
        }
    }
}

/// Connection configuration.
///
/// Every field is optional so that an override configuration can be merged
/// onto a base one with [`ConnectionConfig::merge`]. Empty strings are
/// treated the same as missing values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionConfig {
    /// Host name(s)
    pub host: Option<HostList>,
    /// Port shared by every host in the seed list
    pub port: Option<u16>,
    /// Username (only used together with a password)
    pub username: Option<String>,
    /// Password (only used together with a username)
    pub password: Option<String>,
    /// Database holding one collection per record type
    pub database: Option<String>,
    /// Replica set name
    pub replica_set: Option<String>,
    /// Read preference, applied only with a replica set
    pub read_preference: Option<String>,
    /// Raw connection string for DSN mode
    pub dsn: Option<String>,
    /// Use `dsn` verbatim instead of host, port and credentials
    pub is_replica_connection_string: Option<bool>,
    /// Percent-encode username and password in the seed-list URI
    pub escape_credentials: Option<bool>,
    /// Behavior on undecodable payloads
    pub payload_errors: Option<PayloadErrorPolicy>,
}

impl ConnectionConfig {
    /// Create a single-host (or comma-separated hosts) configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use mongo_session_store::ConnectionConfig;
    ///
    /// let config = ConnectionConfig::single_host("localhost", 27017).with_database("saml");
    /// assert_eq!(config.database.as_deref(), Some("saml"));
    /// ```
    pub fn single_host(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: Some(HostList::Single(host.into())),
            port: Some(port),
            ..Default::default()
        }
    }

    /// Create a replica set configuration from a list of members.
    pub fn replica_set(hosts: impl Into<HostList>, port: u16, name: impl Into<String>) -> Self {
        Self {
            host: Some(hosts.into()),
            port: Some(port),
            replica_set: Some(name.into()),
            ..Default::default()
        }
    }

    /// Create a configuration that connects with a raw DSN.
    pub fn dsn(dsn: impl Into<String>) -> Self {
        Self {
            dsn: Some(dsn.into()),
            is_replica_connection_string: Some(true),
            ..Default::default()
        }
    }

    /// Set the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set authentication credentials.
    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the read preference.
    pub fn with_read_preference(mut self, read_preference: impl Into<String>) -> Self {
        self.read_preference = Some(read_preference.into());
        self
    }

    /// Enable or disable percent-encoding of credentials.
    pub fn with_escaped_credentials(mut self, enabled: bool) -> Self {
        self.escape_credentials = Some(enabled);
        self
    }

    /// Set the payload error policy.
    pub fn with_payload_policy(mut self, policy: PayloadErrorPolicy) -> Self {
        self.payload_errors = Some(policy);
        self
    }

    /// Merge `overrides` onto this configuration. Fields present in
    /// `overrides` win.
    pub fn merge(self, overrides: ConnectionConfig) -> Self {
        Self {
            host: overrides.host.or(self.host),
            port: overrides.port.or(self.port),
            username: overrides.username.or(self.username),
            password: overrides.password.or(self.password),
            database: overrides.database.or(self.database),
            replica_set: overrides.replica_set.or(self.replica_set),
            read_preference: overrides.read_preference.or(self.read_preference),
            dsn: overrides.dsn.or(self.dsn),
            is_replica_connection_string: overrides
                .is_replica_connection_string
                .or(self.is_replica_connection_string),
            escape_credentials: overrides.escape_credentials.or(self.escape_credentials),
            payload_errors: overrides.payload_errors.or(self.payload_errors),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// See [`ConnectionConfig::from_lookup`] for the variables consulted.
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// `DB_MONGODB_HOST`, `_PORT`, `_USERNAME`, `_PASSWORD` and `_DATABASE`
    /// are always read. When `DB_DEFAULT_CONNECTION` contains `_replica`,
    /// `DB_MONGODB_REPLICASET` and `DB_MONGODB_READ_PREFERENCE` are read too.
    /// When it is exactly `mongodb_replica_string`, `DB_MONGODB_DSN` is read
    /// and DSN mode is switched on.
    pub fn from_lookup<F>(lookup: F) -> StoreResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.is_empty());

        let port = match var(env::PORT) {
            Some(port) => Some(port.parse::<u16>().map_err(|e| {
                StoreError::Config(format!("{} must be a port number: {}", env::PORT, e))
            })?),
            None => None,
        };

        let mut config = Self {
            host: var(env::HOST).map(HostList::Single),
            port,
            username: var(env::USERNAME),
            password: var(env::PASSWORD),
            database: var(env::DATABASE),
            ..Default::default()
        };

        let connection = var(env::DEFAULT_CONNECTION).unwrap_or_default();

        if connection.contains("_replica") {
            config.replica_set = var(env::REPLICA_SET);
            config.read_preference = var(env::READ_PREFERENCE);
        }

        if connection == "mongodb_replica_string" {
            config.dsn = var(env::DSN);
            config.is_replica_connection_string = Some(true);
        }

        Ok(config)
    }

    /// The connection mode selected by `is_replica_connection_string`.
    pub fn mode(&self) -> ConnectionMode {
        if self.is_replica_connection_string == Some(true) {
            ConnectionMode::Dsn
        } else {
            ConnectionMode::SeedList
        }
    }

    /// The non-empty host list, if configured.
    pub fn hosts(&self) -> Option<Vec<&str>> {
        self.host
            .as_ref()
            .filter(|hosts| !hosts.is_empty())
            .map(HostList::hosts)
    }

    /// Username and password, only when both are non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (non_empty(&self.username), non_empty(&self.password)) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        }
    }

    /// The DSN, if set and non-empty.
    pub fn dsn_string(&self) -> Option<&str> {
        non_empty(&self.dsn)
    }

    /// The database name. Required in every mode.
    pub fn database_name(&self) -> StoreResult<&str> {
        non_empty(&self.database)
            .ok_or_else(|| StoreError::Config("database name is required".to_string()))
    }

    /// Replica set name, in either mode.
    pub fn replica_set_name(&self) -> Option<&str> {
        non_empty(&self.replica_set)
    }

    /// Read preference, only reported when a replica set is configured.
    pub fn read_preference_mode(&self) -> Option<&str> {
        self.replica_set_name()
            .and_then(|_| non_empty(&self.read_preference))
    }

    /// Whether credentials are percent-encoded in the seed-list URI.
    pub fn escapes_credentials(&self) -> bool {
        self.escape_credentials.unwrap_or(false)
    }

    /// The configured payload error policy.
    pub fn payload_policy(&self) -> PayloadErrorPolicy {
        self.payload_errors.unwrap_or_default()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_merge_overrides_win() {
        let base = ConnectionConfig::single_host("db1", 27017)
            .with_database("base")
            .with_credentials("user", "secret");
        let overrides = ConnectionConfig {
            host: Some("db2".into()),
            database: Some("override".to_string()),
            ..Default::default()
        };

        let merged = base.merge(overrides);
        assert_eq!(merged.hosts(), Some(vec!["db2"]));
        assert_eq!(merged.port, Some(27017));
        assert_eq!(merged.database.as_deref(), Some("override"));
        assert_eq!(merged.credentials(), Some(("user", "secret")));
    }

    #[test]
    fn test_host_string_is_split_on_commas() {
        let config = ConnectionConfig::single_host("a,b,c", 27017);
        assert_eq!(config.hosts(), Some(vec!["a", "b", "c"]));
    }

    #[test]
    fn test_host_list_preserves_order() {
        let config = ConnectionConfig::replica_set(vec!["c", "a", "b"], 27017, "rs0");
        assert_eq!(config.hosts(), Some(vec!["c", "a", "b"]));
    }

    #[test]
    fn test_credentials_require_both_parts() {
        let config = ConnectionConfig::single_host("h", 1).with_credentials("u", "");
        assert_eq!(config.credentials(), None);

        let config = ConnectionConfig {
            username: Some("u".to_string()),
            ..Default::default()
        };
        assert_eq!(config.credentials(), None);
    }

    #[test]
    fn test_read_preference_requires_replica_set() {
        let config = ConnectionConfig::single_host("h", 27017).with_read_preference("secondary");
        assert_eq!(config.read_preference_mode(), None);

        let config = ConnectionConfig::replica_set("h", 27017, "rs0").with_read_preference("secondary");
        assert_eq!(config.replica_set_name(), Some("rs0"));
        assert_eq!(config.read_preference_mode(), Some("secondary"));
    }

    #[test]
    fn test_dsn_mode_keeps_replica_set_options() {
        let mut config = ConnectionConfig::dsn("mongodb://custom").with_read_preference("nearest");
        config.replica_set = Some("rs0".to_string());
        assert_eq!(config.mode(), ConnectionMode::Dsn);
        assert_eq!(config.replica_set_name(), Some("rs0"));
        assert_eq!(config.read_preference_mode(), Some("nearest"));
    }

    #[test]
    fn test_database_name_required() {
        let config = ConnectionConfig::single_host("h", 27017);
        assert!(config.database_name().unwrap_err().is_configuration_error());

        let config = config.with_database("");
        assert!(config.database_name().is_err());
    }

    #[test]
    fn test_deserialize_camel_case_fields() {
        let config: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "host": ["db1", "db2"],
            "port": 27017,
            "database": "saml",
            "replicaSet": "rs0",
            "readPreference": "primaryPreferred",
            "isReplicaConnectionString": false,
            "payloadErrors": "treatAsMissing"
        }))
        .unwrap();

        assert_eq!(config.hosts(), Some(vec!["db1", "db2"]));
        assert_eq!(config.replica_set_name(), Some("rs0"));
        assert_eq!(config.read_preference_mode(), Some("primaryPreferred"));
        assert_eq!(config.mode(), ConnectionMode::SeedList);
        assert_eq!(config.payload_policy(), PayloadErrorPolicy::TreatAsMissing);
    }

    #[test]
    fn test_deserialize_single_host_string() {
        let config: ConnectionConfig =
            serde_json::from_str(r#"{"host": "db1,db2", "port": 27017}"#).unwrap();
        assert_eq!(config.host, Some(HostList::Single("db1,db2".to_string())));
        assert_eq!(config.payload_policy(), PayloadErrorPolicy::Error);
    }

    #[test]
    fn test_from_lookup_single_host() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            (env::DEFAULT_CONNECTION, "mongodb"),
            (env::HOST, "mongo"),
            (env::PORT, "27017"),
            (env::DATABASE, "saml"),
            (env::REPLICA_SET, "ignored"),
        ]))
        .unwrap();

        assert_eq!(config.hosts(), Some(vec!["mongo"]));
        assert_eq!(config.port, Some(27017));
        assert_eq!(config.database.as_deref(), Some("saml"));
        assert_eq!(config.replica_set, None);
        assert_eq!(config.mode(), ConnectionMode::SeedList);
    }

    #[test]
    fn test_from_lookup_replica() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            (env::DEFAULT_CONNECTION, "mongodb_replica"),
            (env::HOST, "m1,m2"),
            (env::PORT, "27017"),
            (env::REPLICA_SET, "rs0"),
            (env::READ_PREFERENCE, "nearest"),
        ]))
        .unwrap();

        assert_eq!(config.replica_set_name(), Some("rs0"));
        assert_eq!(config.read_preference_mode(), Some("nearest"));
        assert_eq!(config.dsn, None);
    }

    #[test]
    fn test_from_lookup_replica_string() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            (env::DEFAULT_CONNECTION, "mongodb_replica_string"),
            (env::DSN, "mongodb://a:1,b:2/?replicaSet=rs0"),
            (env::DATABASE, "saml"),
            (env::REPLICA_SET, "rs0"),
            (env::READ_PREFERENCE, "secondaryPreferred"),
        ]))
        .unwrap();

        assert_eq!(config.mode(), ConnectionMode::Dsn);
        assert_eq!(config.dsn_string(), Some("mongodb://a:1,b:2/?replicaSet=rs0"));
        assert_eq!(config.replica_set_name(), Some("rs0"));
        assert_eq!(config.read_preference_mode(), Some("secondaryPreferred"));
    }

    #[test]
    fn test_from_lookup_rejects_bad_port() {
        let result = ConnectionConfig::from_lookup(lookup(&[(env::PORT, "not-a-port")]));
        assert!(result.unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_from_lookup_treats_empty_as_missing() {
        let config = ConnectionConfig::from_lookup(lookup(&[
            (env::HOST, ""),
            (env::USERNAME, ""),
        ]))
        .unwrap();
        assert_eq!(config.host, None);
        assert_eq!(config.username, None);
    }
}
