//! Unified error types for the waitlist core.
//!
//! Validation and conflict errors carry the human-readable message shown to
//! the user. Notification delivery has its own error type in [`crate::notify`]
//! and never surfaces here.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad configuration (missing or unparseable settings)
    #[error("Configuration error: {message}")]
    Config {
        /// What went wrong
        message: String,
    },

    /// Well-formed request that failed input validation
    #[error("{message}")]
    Validation {
        /// Message suitable for display next to the form
        message: String,
    },

    /// Input was valid but the current state forbids the operation
    #[error("{message}")]
    Conflict {
        /// Message suitable for display
        message: String,
    },

    /// No item with this ID in the active profile
    #[error("Item not found: {id}")]
    ItemNotFound {
        /// The requested item ID
        id: i64,
    },

    /// No profile with this name
    #[error("Profile not found: {name}")]
    ProfileNotFound {
        /// The requested profile name
        name: String,
    },

    /// Store failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem failure (database directory creation, config file)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for a [`Error::Conflict`].
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
