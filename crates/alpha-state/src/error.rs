//! Error types for alpha-state

use thiserror::Error;

/// Errors that can occur in the decision queue layer
#[derive(Error, Debug)]
pub enum QueueError {
    /// Database connection error
    #[error("Database connection failed: {0}")]
    Connection(String),

    /// Backend query or write failure
    #[error("Queue backend error: {0}")]
    Backend(String),

    /// Serialization error
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),

    /// A stored row carried a status outside the known set
    #[error("Unknown queue status: {status}")]
    UnknownStatus { status: String },
}

impl From<surrealdb::Error> for QueueError {
    fn from(err: surrealdb::Error) -> Self {
        QueueError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Serialization(err.to_string())
    }
}
