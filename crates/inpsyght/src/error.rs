//! Error types for inpsyght.
//!
//! This module defines all error types used throughout the inpsyght crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for inpsyght operations.
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

    // === CMS Errors ===
    /// HTTP transport error while talking to the CMS.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The CMS returned a non-success status code.
    #[error("CMS API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the CMS.
        status: u16,
        /// Error message or response body.
        message: String,
    },

    /// The requested form does not exist.
    #[error("form not found: {document_id}")]
    FormNotFound {
        /// Document id that was requested.
        document_id: String,
    },

    /// A CMS payload could not be interpreted.
    #[error("parse error: {0}")]
    Parse(String),

    // === Questionnaire Errors ===
    /// An answer value outside the 1-5 scale.
    #[error("invalid answer value {value}: expected 1 to 5")]
    InvalidAnswer {
        /// The rejected value.
        value: i64,
    },

    /// The form has no questions to answer.
    #[error("form '{document_id}' has no questions")]
    NoQuestions {
        /// Document id of the empty form.
        document_id: String,
    },

    /// The question id is not part of the form.
    #[error("question '{question_id}' is not part of form '{document_id}'")]
    UnknownQuestion {
        /// Document id of the form.
        document_id: String,
        /// The question id that was not found.
        question_id: String,
    },

    /// No cached answers exist for the form.
    #[error("no answers recorded for form '{document_id}'")]
    NoAnswers {
        /// Document id of the form.
        document_id: String,
    },

    /// Every question has already been answered.
    #[error("questionnaire already complete")]
    QuestionnaireComplete,

    /// A history entry could not be found.
    #[error("history entry {id} not found")]
    HistoryNotFound {
        /// The missing entry id.
        id: i64,
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

/// A specialized Result type for inpsyght operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new parse error.
    #[must_use]
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a form not found error.
    #[must_use]
    pub fn form_not_found(document_id: impl Into<String>) -> Self {
        Self::FormNotFound {
            document_id: document_id.into(),
        }
    }

    /// Create a no answers error.
    #[must_use]
    pub fn no_answers(document_id: impl Into<String>) -> Self {
        Self::NoAnswers {
            document_id: document_id.into(),
        }
    }

    /// Check if this error means the user has not answered anything yet.
    #[must_use]
    pub fn is_no_answers(&self) -> bool {
        matches!(self, Self::NoAnswers { .. })
    }

    /// Check if this error came from reaching the CMS.
    #[must_use]
    pub fn is_cms_error(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Api { .. } | Self::FormNotFound { .. } | Self::Parse(_)
        )
    }
}
