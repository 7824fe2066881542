use std::borrow::Cow;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while talking to the lab hub or persisting what it returns.
///
/// Each variant carries the fields needed to diagnose the failure without
/// re-running the request: the HTTP status and raw body, the offending path,
/// or the missing configuration key.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Configuration error ({key}): {message}")]
    Config { key: String, message: String },

    /// `body` holds the response bytes exactly as received.
    #[error("Hub returned HTTP {status}: {}", String::from_utf8_lossy(body))]
    Http { status: u16, body: Vec<u8> },

    #[error("Transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("File system error during {operation} at {}: {source}", path.display())]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {message}")]
    Parse { message: String, body: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl HubError {
    /// Create a new Config error
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a new Http error, keeping the response body verbatim
    pub fn http(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a new Transport error from an underlying client failure
    pub fn transport<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new FileSystem error
    pub fn file_system(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create a new Parse error, keeping the raw body for diagnosis
    pub fn parse(message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            body: body.into(),
        }
    }

    /// Create a new Storage error for a failed host database lookup
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// HTTP status code, when the hub answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Body of an `Http` error as text, for logs and operator output.
    /// Invalid UTF-8 is replaced; the variant itself keeps the raw bytes.
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Http { body, .. } => Some(String::from_utf8_lossy(body)),
            _ => None,
        }
    }

    /// Whether an orchestrator may try the same call again.
    ///
    /// Only hub rejections and transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http { .. } | Self::Transport { .. })
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config { .. } => ErrorCategory::Configuration,
            Self::Http { .. } => ErrorCategory::Hub,
            Self::Transport { .. } => ErrorCategory::Network,
            Self::FileSystem { .. } => ErrorCategory::FileSystem,
            Self::Parse { .. } => ErrorCategory::Serialization,
            Self::Storage { .. } => ErrorCategory::Storage,
        }
    }
}

/// Error categories for log classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Hub,
    Network,
    FileSystem,
    Serialization,
    Storage,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Hub => write!(f, "hub"),
            Self::Network => write!(f, "network"),
            Self::FileSystem => write!(f, "file_system"),
            Self::Serialization => write!(f, "serialization"),
            Self::Storage => write!(f, "storage"),
        }
    }
}

/// Convenience result type for hub operations
pub type Result<T> = std::result::Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_keeps_body() {
        let err = HubError::http(502, "{\"error\":\"upstream\"}");
        assert_eq!(err.status(), Some(502));
        assert_eq!(
            err.to_string(),
            "Hub returned HTTP 502: {\"error\":\"upstream\"}"
        );
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Hub);
    }

    #[test]
    fn test_http_error_keeps_non_utf8_bytes() {
        let raw = b"err \xff\xfe latin1 \xe9".to_vec();
        let err = HubError::http(500, raw.clone());
        match &err {
            HubError::Http { body, .. } => assert_eq!(body, &raw),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.body_text().unwrap(), "err \u{fffd}\u{fffd} latin1 \u{fffd}");
        assert!(err.to_string().starts_with("Hub returned HTTP 500: err "));
    }

    #[test]
    fn test_config_error_is_not_retryable() {
        let err = HubError::config("hub.client_id", "client id is not configured");
        assert!(!err.is_retryable());
        assert_eq!(err.status(), None);
        assert!(err.to_string().contains("hub.client_id"));
    }

    #[test]
    fn test_file_system_error_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = HubError::file_system("create requisition directory", "/srv/labs", io);
        assert!(err.to_string().contains("/srv/labs"));
        assert_eq!(err.category(), ErrorCategory::FileSystem);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_storage_error_is_not_retryable() {
        let err = HubError::storage("pool timed out");
        assert!(!err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Storage);
        assert_eq!(err.category().to_string(), "storage");
    }

    #[test]
    fn test_transport_error_exposes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = HubError::transport("token request failed", io);
        assert!(err.is_retryable());
        assert!(std::error::Error::source(&err).is_some());
    }
}
