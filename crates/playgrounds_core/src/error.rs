use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("unexpected status code: {status} while fetching {url}")]
    Fetch { status: u16, url: String },

    #[error("failed to fetch playground from {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to decode playground snapshot: {0}")]
    Decode(String),

    #[error("deployment connection unavailable: {0}")]
    ConnectionFatal(String),

    #[error("failed to parse playground documents: {0}")]
    Parse(String),

    #[error("failed to insert documents into {namespace}: {source}")]
    Insert {
        namespace: String,
        #[source]
        source: mongodb::error::Error,
    },

    #[error("failed to scaffold project: {0}")]
    ScaffoldFatal(String),

    #[error("playground name {name:?} does not yield a usable collection name")]
    InvalidCollectionName { name: String },
}

impl ImportError {
    /// Fatal errors mean local preconditions are broken and the whole run must stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConnectionFatal(_) | Self::ScaffoldFatal(_))
    }
}

pub type ImportResult<T> = std::result::Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::ImportError;

    #[test]
    fn only_connection_and_scaffold_errors_are_fatal() {
        assert!(ImportError::ConnectionFatal("exit 1".to_string()).is_fatal());
        assert!(ImportError::ScaffoldFatal("exists".to_string()).is_fatal());
        assert!(
            !ImportError::Fetch {
                status: 404,
                url: "https://example.test/x".to_string(),
            }
            .is_fatal()
        );
        assert!(!ImportError::Parse("bad".to_string()).is_fatal());
        assert!(!ImportError::Decode("bad".to_string()).is_fatal());
    }

    #[test]
    fn fetch_error_message_carries_status() {
        let err = ImportError::Fetch {
            status: 503,
            url: "https://example.test/abc".to_string(),
        };
        assert!(err.to_string().contains("503"));
    }
}
