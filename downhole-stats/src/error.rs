//! Error types for the downhole statistics engine.
//!
//! All fallible operations in this crate return [`DownholeError`]. The
//! variants follow the failure taxonomy of the engine: lookups that name
//! something absent are [`DownholeError::NotFound`], filters that leave
//! nothing to analyse are [`DownholeError::EmptyResult`], and group caps are
//! [`DownholeError::CapExceeded`]. Attribute resolution failures and
//! per-column batch failures are recovered locally and never surface here.

use thiserror::Error;

/// The main error type for the downhole statistics engine.
#[derive(Error, Debug)]
pub enum DownholeError {
    /// A requested collection, attribute or column does not exist.
    #[error("{kind} '{name}' not found. Available: [{}]", .available.join(", "))]
    NotFound {
        /// What was being looked up (e.g. "Collection", "Column")
        kind: String,
        /// The requested name
        name: String,
        /// Names that do exist
        available: Vec<String>,
    },

    /// No valid rows remain after applying the validity mask.
    #[error("{0}")]
    EmptyResult(String),

    /// A grouping produced more groups than allowed.
    #[error(
        "Too many groups ({actual}). Maximum allowed: {limit}. Consider filtering data or choosing a different grouping column."
    )]
    CapExceeded { limit: usize, actual: usize },

    /// The object's schema is neither a downhole collection nor downhole intervals.
    #[error("Unsupported object type: schema '{schema}'")]
    UnsupportedObjectType { schema: String },

    /// The object definition is structurally inconsistent.
    #[error("Invalid object: {0}")]
    InvalidObject(String),

    /// A caller supplied an argument outside the accepted domain.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The object source failed to deliver data at a path.
    #[error("Retrieval failed for '{path}': {message}")]
    Retrieval {
        /// Path expression that was requested
        path: String,
        /// Detailed error message
        message: String,
    },

    /// Error from DataFusion operations.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Error from Arrow operations.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, DownholeError>`.
pub type Result<T> = std::result::Result<T, DownholeError>;

impl DownholeError {
    /// Creates a not-found error listing the names that are available.
    pub fn not_found<I, S>(kind: impl Into<String>, name: impl Into<String>, available: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
            available: available.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an empty-result error.
    pub fn empty_result(message: impl Into<String>) -> Self {
        Self::EmptyResult(message.into())
    }

    /// Creates a retrieval error for the given path.
    pub fn retrieval(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Retrieval {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-object error.
    pub fn invalid_object(message: impl Into<String>) -> Self {
        Self::InvalidObject(message.into())
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::EmptyResult(_) => "empty_result",
            Self::CapExceeded { .. } => "cap_exceeded",
            Self::UnsupportedObjectType { .. } => "unsupported_object_type",
            Self::InvalidObject(_) => "invalid_object",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Retrieval { .. } => "retrieval",
            Self::DataFusion(_) | Self::Arrow(_) | Self::Serialization(_) | Self::Internal(_) => {
                "internal"
            }
        }
    }

    /// Returns true for conditions caused by the request rather than the data source.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::EmptyResult(_)
                | Self::CapExceeded { .. }
                | Self::InvalidArgument(_)
        )
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<DownholeError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            DownholeError::Retrieval { path, message } => DownholeError::Retrieval {
                path,
                message: format!("{}: {message}", f()),
            },
            DownholeError::Internal(inner) => DownholeError::Internal(format!("{}: {inner}", f())),
            other => DownholeError::Internal(format!("{}: {other}", f())),
        })
    }
}
