//! Error types for pfcontent.
//!
//! Library crates use [`PfContentError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The first group of variants mirrors the status codes returned by the
//! content host; [`PfContentError::status_code`] recovers that code so callers
//! can tell a precondition violation from a plain failure.

use std::path::PathBuf;

/// Status code reported by a failed host call or algorithm run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Failure,
    NotAllowed,
    NotFound,
    NotInitialized,
    AlreadyPresent,
    InvalidParameter,
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Failure => "STATUS_CODE_FAILURE",
            Self::NotAllowed => "STATUS_CODE_NOT_ALLOWED",
            Self::NotFound => "STATUS_CODE_NOT_FOUND",
            Self::NotInitialized => "STATUS_CODE_NOT_INITIALIZED",
            Self::AlreadyPresent => "STATUS_CODE_ALREADY_PRESENT",
            Self::InvalidParameter => "STATUS_CODE_INVALID_PARAMETER",
        };
        f.write_str(s)
    }
}

/// Top-level error type for all pfcontent operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum PfContentError {
    /// Generic host or algorithm failure.
    #[error("failure: {message}")]
    Failure { message: String },

    /// A structural precondition was violated (e.g. populated cluster list).
    #[error("not allowed: {message}")]
    NotAllowed { message: String },

    /// A named list, object, setting or algorithm type does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// No current list has been set for an object kind.
    #[error("not initialized: {what}")]
    NotInitialized { what: String },

    /// An object or list name is already registered.
    #[error("already present: {what}")]
    AlreadyPresent { what: String },

    /// A parameter or setting has an unusable value.
    #[error("invalid parameter: {message}")]
    InvalidParameter { message: String },

    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Event input parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {message}")]
    Io { path: PathBuf, message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PfContentError>;

impl PfContentError {
    pub fn failure(msg: impl Into<String>) -> Self {
        Self::Failure {
            message: msg.into(),
        }
    }

    pub fn not_allowed(msg: impl Into<String>) -> Self {
        Self::NotAllowed {
            message: msg.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    pub fn not_initialized(what: impl Into<String>) -> Self {
        Self::NotInitialized { what: what.into() }
    }

    pub fn already_present(what: impl Into<String>) -> Self {
        Self::AlreadyPresent { what: what.into() }
    }

    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Host status code carried by this error.
    ///
    /// Config, parse and I/O errors all report [`StatusCode::Failure`].
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotAllowed { .. } => StatusCode::NotAllowed,
            Self::NotFound { .. } => StatusCode::NotFound,
            Self::NotInitialized { .. } => StatusCode::NotInitialized,
            Self::AlreadyPresent { .. } => StatusCode::AlreadyPresent,
            Self::InvalidParameter { .. } => StatusCode::InvalidParameter,
            Self::Failure { .. } | Self::Config { .. } | Self::Parse { .. } | Self::Io { .. } => {
                StatusCode::Failure
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == StatusCode::NotFound
    }
}
