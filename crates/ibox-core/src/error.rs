use thiserror::Error;

use crate::pricing::ServiceFlow;

/// Failure while decoding an encoded polyline. Offsets are byte positions
/// into the input string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("polyline ends inside a value at byte {offset}")]
    Truncated { offset: usize },

    #[error("byte {byte:#04x} at offset {offset} is outside the polyline alphabet")]
    InvalidByte { offset: usize, byte: u8 },

    #[error("value starting at byte {offset} does not fit in 32 bits")]
    Overflow { offset: usize },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed polyline: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("incomplete {flow} selection, missing: {}", .missing.join(", "))]
    IncompleteSelection {
        flow: ServiceFlow,
        missing: Vec<String>,
    },
}

impl CoreError {
    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read pricing catalog at {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse pricing catalog: {0}")]
    CatalogFileParse(#[from] serde_yaml::Error),

    #[error("pricing catalog validation error: {0}")]
    Validation(String),
}
