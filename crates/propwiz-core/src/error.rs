//! Error types for the wizard library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::{models::SectionKind, validation::FieldErrors};

/// Comprehensive error type for all wizard operations.
#[derive(Error, Debug)]
pub enum WizardError {
    /// Session database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// The remote aggregate does not exist
    #[error("Property draft {id} not found")]
    DraftNotFound { id: String },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// A field path that cannot be parsed or applied to a working copy
    #[error("Invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
    /// The request never produced a usable response
    #[error("Network error: {message}")]
    Transport {
        message: String,
        #[source]
        source: reqwest::Error,
    },
    /// Banner-level failure reported by the remote API
    #[error("{message}")]
    Api { status: Option<u16>, message: String },
    /// Field-level failures, keyed by dot path, plus any path-less messages
    /// that arrived in the same error list
    #[error("Validation failed: {errors}")]
    Validation {
        errors: FieldErrors,
        general: Option<String>,
    },
    /// A structural requirement was not met; no request was sent
    #[error("Cannot save {section}: {reason}")]
    Precondition { section: SectionKind, reason: String },
    /// The section matches its last-persisted snapshot
    #[error("No changes to save in {section}")]
    NoChanges { section: SectionKind },
    /// A save for the section is already pending
    #[error("A save for {section} is already in progress")]
    SaveInFlight { section: SectionKind },
    /// The wizard has been finalized and accepts no further actions
    #[error("The listing wizard for draft {draft_id} is already finalized")]
    Finalized { draft_id: String },
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> WizardError {
        WizardError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> WizardError {
        WizardError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl WizardError {
    /// Creates a field-level validation error.
    pub fn validation(errors: FieldErrors) -> Self {
        Self::Validation {
            errors,
            general: None,
        }
    }

    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Creates a precondition error for a section.
    pub fn precondition(section: SectionKind, reason: impl Into<String>) -> Self {
        Self::Precondition {
            section,
            reason: reason.into(),
        }
    }

    /// Creates a field path error.
    pub fn field_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFieldPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for path-addressable validation failures.
    pub fn is_field_level(&self) -> bool {
        matches!(self, WizardError::Validation { .. })
    }

    /// The single banner message for this failure.
    ///
    /// Field-level failures are shown inline against the offending fields
    /// instead; they only carry a banner when the error list also held
    /// general messages.
    pub fn banner(&self) -> Option<String> {
        match self {
            WizardError::Validation { general, .. } => general.clone(),
            other => Some(other.to_string()),
        }
    }
}

/// Extension trait for Result to provide concise error mapping with
/// anyhow-style context.
pub trait ResultExt<T, E> {
    /// Add context to any error type, converting to WizardError.
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static;
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn with_context<C>(self, context: C) -> Result<T>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| WizardError::Configuration {
            message: format!("{}: {}", context, e),
        })
    }
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| WizardError::database(message).with_source(e))
    }
}

/// Result type alias for wizard operations
pub type Result<T> = std::result::Result<T, WizardError>;
