//! Error types for medsense.
//!
//! This module defines the error types used throughout the medsense crate.
//! The reminder path itself never surfaces these to the user: persistence,
//! notification, and audio failures are logged and recovered from where they
//! occur. They reach the user only through CLI commands.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for medsense operations.
#[derive(Error, Debug)]
pub enum Error {
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

    // === Record Errors ===
    /// A schedule time was not a zero-padded 24-hour `HH:MM` string.
    #[error("invalid schedule time '{value}': expected HH:MM (24-hour, zero-padded)")]
    InvalidTime {
        /// The rejected input.
        value: String,
    },

    /// A new medication record was rejected.
    #[error("invalid medication: {message}")]
    InvalidMedication {
        /// Description of the validation failure.
        message: String,
    },

    /// Two records in one payload share an id.
    #[error("duplicate medication id '{id}'")]
    DuplicateId {
        /// The repeated id.
        id: String,
    },

    /// No medication with the given id exists.
    #[error("no medication with id '{id}'")]
    MedicationNotFound {
        /// The requested id.
        id: String,
    },

    // === Alert Errors ===
    /// An alert channel failed to deliver.
    #[error("alert channel '{channel}' failed: {message}")]
    AlertChannel {
        /// Name of the channel.
        channel: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    /// The reminder tone could not be played.
    #[error("audio unavailable: {0}")]
    Audio(String),

    // === Platform Errors ===
    /// Platform-specific operation failed.
    #[error("platform error: {0}")]
    Platform(String),

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

/// A specialized Result type for medsense operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new platform error.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    /// Create a new audio error.
    #[must_use]
    pub fn audio(message: impl Into<String>) -> Self {
        Self::Audio(message.into())
    }

    /// Create an alert channel error.
    #[must_use]
    pub fn alert_channel(channel: &'static str, message: impl Into<String>) -> Self {
        Self::AlertChannel {
            channel,
            message: message.into(),
        }
    }

    /// Create a not-found error for the given medication id.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::MedicationNotFound { id: id.into() }
    }

    /// Check if this error means the medication does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::MedicationNotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::not_found("a1");
        assert_eq!(err.to_string(), "no medication with id 'a1'");

        let err = Error::platform("test error");
        assert_eq!(err.to_string(), "platform error: test error");
    }

    #[test]
    fn test_error_is_not_found() {
        assert!(Error::not_found("x").is_not_found());
        assert!(!Error::platform("test").is_not_found());
    }

    #[test]
    fn test_invalid_time_display() {
        let err = Error::InvalidTime {
            value: "8:00".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("8:00"));
        assert!(msg.contains("HH:MM"));
    }

    #[test]
    fn test_alert_channel_error() {
        let err = Error::alert_channel("native-notification", "notify-send is not installed");
        let msg = err.to_string();
        assert!(msg.contains("native-notification"));
        assert!(msg.contains("notify-send"));
    }

    #[test]
    fn test_audio_error() {
        let err = Error::audio("no output device");
        assert_eq!(err.to_string(), "audio unavailable: no output device");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("{not json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "poll_interval_secs must be between 1 and 60".to_string(),
        };
        assert!(err.to_string().contains("poll_interval_secs"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_database_open_error_display() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err = Error::DatabaseOpen {
                path: PathBuf::from("/nonexistent/path/db.sqlite"),
                source: sqlite_err,
            };
            assert!(err.to_string().contains("/nonexistent/path/db.sqlite"));
        }
    }
}
