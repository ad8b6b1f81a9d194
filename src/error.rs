//! Error taxonomy shared by the composer, the lifecycle manager and the stores.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification a request-handling layer can map onto responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum ErrorKind {
    Configuration,
    Validation,
    NotFound,
    Conflict,
    Exhaustion,
    Storage,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Composer or operator preconditions were not met.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown modifier `{name}`; valid modifiers are: {}", .valid.join(", "))]
    UnknownModifier { name: String, valid: Vec<String> },

    #[error("unknown merger `{name}`; valid mergers are: {}", .valid.join(", "))]
    UnknownMerger { name: String, valid: Vec<String> },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Results were submitted to a test that is already completed.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("word pools exhausted after {produced} of {requested} words")]
    Exhaustion { requested: usize, produced: usize },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn configuration(message: impl ToString) -> Self {
        Self::Configuration(message.to_string())
    }

    pub fn validation(message: impl ToString) -> Self {
        Self::Validation(message.to_string())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::UnknownModifier { .. } | Self::UnknownMerger { .. } | Self::Validation(_) => {
                ErrorKind::Validation
            }
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Exhaustion { .. } => ErrorKind::Exhaustion,
            Self::Storage(_) | Self::Serialization(_) | Self::Io(_) => ErrorKind::Storage,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
