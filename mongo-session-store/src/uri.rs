//! Connection URI construction.

use crate::config::{ConnectionConfig, ConnectionMode};
use crate::error::{StoreError, StoreResult};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// Characters left as-is in the userinfo part when escaping is enabled
/// (RFC 3986 unreserved set).
const USERINFO: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Build the connection URI for a configuration.
///
/// In DSN mode the configured DSN is returned verbatim. Otherwise the result
/// is `mongodb://[user:pass@]host1:port,host2:port,...` with hosts in input
/// order. Credentials are only added when both username and password are
/// non-empty, and are inserted unescaped unless `escape_credentials` is set.
///
/// # Examples
///
/// ```
/// use mongo_session_store::{ConnectionConfig, build_connection_uri};
///
/// let config = ConnectionConfig::single_host("h", 27017).with_credentials("u", "p");
/// assert_eq!(build_connection_uri(&config).unwrap(), "mongodb://u:p@h:27017");
/// ```
pub fn build_connection_uri(config: &ConnectionConfig) -> StoreResult<String> {
    if config.mode() == ConnectionMode::Dsn {
        return config.dsn_string().map(str::to_string).ok_or_else(|| {
            StoreError::Config("dsn is required when isReplicaConnectionString is set".to_string())
        });
    }

    let hosts = config
        .hosts()
        .ok_or_else(|| StoreError::Config("host is required".to_string()))?;
    let port = config
        .port
        .ok_or_else(|| StoreError::Config("port is required".to_string()))?;

    let seed_list = hosts
        .iter()
        .map(|host| format!("{}:{}", host, port))
        .collect::<Vec<_>>()
        .join(",");

    let auth = match config.credentials() {
        Some((username, password)) if config.escapes_credentials() => format!(
            "{}:{}@",
            utf8_percent_encode(username, USERINFO),
            utf8_percent_encode(password, USERINFO)
        ),
        Some((username, password)) => format!("{}:{}@", username, password),
        None => String::new(),
    };

    Ok(format!("mongodb://{}{}", auth, seed_list))
}
