use std::path::PathBuf;

/// Errors raised while decrypting or inspecting result files.
#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("Encryption key '{name}' unavailable: {message}")]
    EncryptionKey { name: String, message: String },

    #[error("Unsupported encryption version: {0}")]
    UnsupportedVersion(String),

    #[error("Malformed encrypted payload: {0}")]
    MalformedEnvelope(String),

    #[error("Decryption failed: {0}")]
    Cipher(String),

    #[error("Decryption produced no content")]
    EmptyOutput,

    #[error("I/O error during {operation} at {}: {source}", path.display())]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl DecryptError {
    pub fn encryption_key(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EncryptionKey {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedEnvelope(message.into())
    }

    pub fn cipher(message: impl Into<String>) -> Self {
        Self::Cipher(message.into())
    }

    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, DecryptError>;
