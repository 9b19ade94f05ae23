use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShapeCheckError {
    #[error("Schema provider failed for type {type_name}: {message}")]
    SchemaProvider { type_name: String, message: String },

    #[error("Invalid schema for type {type_name}: {message}")]
    InvalidSchema { type_name: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Validation cancelled")]
    Cancelled,

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ShapeCheckError>;

impl ShapeCheckError {
    pub fn schema_provider<S: Into<String>>(type_name: S, message: S) -> Self {
        Self::SchemaProvider {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn invalid_schema<S: Into<String>>(type_name: S, message: S) -> Self {
        Self::InvalidSchema {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Cancellation is a soft stop, not a failure of the run.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
