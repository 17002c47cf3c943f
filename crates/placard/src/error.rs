//! Error types for placard.
//!
//! Only infrastructure failures travel through [`Error`]. Recoverable
//! conditions (blank content, unreachable time source, corrupt history,
//! unknown ids) are handled where they occur and never abort a session.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for placard operations.
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

    // === Announcement Errors ===
    /// The announcement content was blank once whitespace-like markup was trimmed.
    #[error("announcement content is empty")]
    EmptyContent,

    // === Time Source Errors ===
    /// The public time source could not be reached or answered with an error status.
    #[error("time source request to {endpoint} failed: {message}")]
    TimeSourceRequest {
        /// The endpoint that was queried.
        endpoint: String,
        /// Description of what went wrong.
        message: String,
    },

    /// The public time source answered with a payload we cannot read a time from.
    #[error("time source payload rejected: {reason}")]
    TimeSourcePayload {
        /// Why the payload was rejected.
        reason: String,
    },

    // === Display Errors ===
    /// Drawing to the terminal failed.
    #[error("display error: {0}")]
    Display(String),

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

/// A specialized Result type for placard operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a time source request error.
    #[must_use]
    pub fn time_source_request(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TimeSourceRequest {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a time source payload error.
    #[must_use]
    pub fn time_source_payload(reason: impl Into<String>) -> Self {
        Self::TimeSourcePayload {
            reason: reason.into(),
        }
    }

    /// Create a display error.
    #[must_use]
    pub fn display(message: impl Into<String>) -> Self {
        Self::Display(message.into())
    }

    /// Check if this error came from the public time source.
    #[must_use]
    pub fn is_time_source_error(&self) -> bool {
        matches!(
            self,
            Self::TimeSourceRequest { .. } | Self::TimeSourcePayload { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            Error::EmptyContent.to_string(),
            "announcement content is empty"
        );

        let err = Error::display("terminal gone");
        assert_eq!(err.to_string(), "display error: terminal gone");
    }

    #[test]
    fn test_time_source_request_display() {
        let err = Error::time_source_request("https://time.example", "HTTP 500");
        let msg = err.to_string();
        assert!(msg.contains("https://time.example"));
        assert!(msg.contains("HTTP 500"));
    }

    #[test]
    fn test_is_time_source_error() {
        assert!(Error::time_source_payload("no datetime").is_time_source_error());
        assert!(Error::time_source_request("x", "y").is_time_source_error());
        assert!(!Error::EmptyContent.is_time_source_error());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
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
            message: "tick_interval_ms must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("tick_interval_ms"));
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
}
