//! Error types for unirank.
//!
//! This module defines all error types used throughout the unirank crate.
//! Most user-facing operations are fail-soft by construction; these errors
//! cover the places where the platform itself can fail (files, databases,
//! configuration).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for unirank operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Data Errors ===
    /// Failed to read the ranking data file.
    #[error("failed to read ranking data from {path}: {source}")]
    DataRead {
        /// Path to the data file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The ranking data is not valid JSON.
    #[error("failed to parse ranking data: {0}")]
    DataParse(#[source] serde_json::Error),

    /// The ranking data is valid JSON but not in the expected shape.
    #[error("unexpected ranking data format: {message}")]
    DataFormat {
        /// Description of what was expected.
        message: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Remote Log Errors ===
    /// The remote note log rejected or failed an operation.
    #[error("remote log '{collection}' error: {message}")]
    Remote {
        /// Collection the operation addressed.
        collection: String,
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for unirank operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new remote log error.
    #[must_use]
    pub fn remote(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create a data format error.
    #[must_use]
    pub fn data_format(message: impl Into<String>) -> Self {
        Self::DataFormat {
            message: message.into(),
        }
    }

    /// Check if this error came from loading the ranking data.
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            Self::DataRead { .. } | Self::DataParse(_) | Self::DataFormat { .. }
        )
    }

    /// Check if this error came from the remote log.
    #[must_use]
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}
