//! On-disk schema of the dataverse configuration file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Public demo server used when nothing else is configured.
pub const DEMO_DVN: &str = "https://demo.dataverse.org";

/// Alias given to [`DEMO_DVN`] by a reset.
pub const DEMO_ALIAS: &str = "demo";

/// Endpoint registry keyed by server URL.
pub type Registry = BTreeMap<String, Entry>;

/// Key of the alias field in an entry.
pub(crate) const ALIAS_KEY: &str = "alias";

/// Key of the token field in an entry.
pub(crate) const TOKEN_KEY: &str = "token";

/// Settings stored for one dataverse server.
///
/// `alias` and `token` are only taken from string values; any other value
/// under those keys stays in `extra` and is written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Entry {
    /// Short name usable in place of the URL.
    pub alias: Option<String>,
    /// API token sent by the HTTP client.
    pub token: Option<String>,
    /// Fields written by other tools, kept as-is.
    pub extra: Map<String, Value>,
}

impl Entry {
    /// Creates an entry with only an alias.
    #[must_use]
    pub fn with_alias(alias: &str) -> Self {
        Self {
            alias: Some(String::from(alias)),
            ..Self::default()
        }
    }
}

/// Moves a string value out of `fields`, leaving other values in place.
fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key) {
        Some(Value::String(value)) => Some(value),
        Some(other) => {
            fields.insert(String::from(key), other);
            None
        }
        None => None,
    }
}

impl From<Map<String, Value>> for Entry {
    fn from(mut fields: Map<String, Value>) -> Self {
        Self {
            alias: take_string(&mut fields, ALIAS_KEY),
            token: take_string(&mut fields, TOKEN_KEY),
            extra: fields,
        }
    }
}

impl From<Entry> for Map<String, Value> {
    fn from(entry: Entry) -> Self {
        let mut fields = entry.extra;
        if let Some(alias) = entry.alias {
            fields.insert(String::from(ALIAS_KEY), Value::String(alias));
        }
        if let Some(token) = entry.token {
            fields.insert(String::from(TOKEN_KEY), Value::String(token));
        }
        fields
    }
}

/// Top-level document of `dvn.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ConfigFile {
    /// Known servers.
    pub dvns: Registry,
    /// Currently selected server.
    #[serde(default = "default_cur_dvn")]
    pub cur_dvn: String,
    /// Unknown top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_cur_dvn() -> String {
    String::from(DEMO_DVN)
}
