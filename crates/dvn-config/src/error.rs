//! Error type for configuration store operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`DvnConf`](crate::DvnConf).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The operator did not confirm resetting an unreadable configuration file.
    #[error(
        "cannot continue without reading the dataverse configuration file {}",
        path.display()
    )]
    ResetDeclined {
        /// Configuration file that could not be read.
        path: PathBuf,
    },

    /// No entry matches the requested URL or alias.
    #[error("cannot find entry with name/url '{0}'")]
    EntryNotFound(String),

    /// The registry holds no entries.
    #[error("configuration file {} contains no dataverse entries", path.display())]
    EmptyRegistry {
        /// Configuration file being validated.
        path: PathBuf,
    },

    /// Removing the entry would leave the registry empty.
    #[error("cannot remove '{0}': at least one dataverse entry must remain")]
    LastEntry(String),

    /// The URL given for a new entry is not a valid absolute URL.
    #[error("invalid dataverse url '{url}': {source}")]
    InvalidUrl {
        /// Rejected input.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },

    /// A filesystem operation on the configuration file failed.
    #[error("I/O error accessing config at {}: {source}", path.display())]
    Io {
        /// Path being accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON or lacks required keys.
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },

    /// The configuration could not be encoded as JSON.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The operator's answer could not be read.
    #[error("failed to read confirmation answer: {0}")]
    Prompt(#[source] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_declined_message() {
        // Arrange
        let err = ConfigError::ResetDeclined {
            path: PathBuf::from("/tmp/dvn.json"),
        };

        // Act
        let msg = err.to_string();

        // Assert
        assert_eq!(
            msg,
            "cannot continue without reading the dataverse configuration file /tmp/dvn.json"
        );
    }

    #[test]
    fn test_entry_not_found_carries_identifier() {
        // Arrange & Act
        let msg = ConfigError::EntryNotFound(String::from("nope")).to_string();

        // Assert
        assert_eq!(msg, "cannot find entry with name/url 'nope'");
    }
}
