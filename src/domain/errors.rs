//! Domain error types
//!
//! This module defines the error hierarchy for sheetfill. Coordinate and
//! template errors are recoverable where a default exists; store and
//! materializer errors carry enough context to report which stage failed.
//! Errors never expose third-party client types.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main sheetfill error type
#[derive(Debug, Error)]
pub enum SheetfillError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed range, column or cell reference text
    #[error("Format error: {0}")]
    Format(String),

    /// Unknown field key, missing document or missing sheet
    #[error("Not found: {0}")]
    NotFound(String),

    /// The grid document store rejected the call because of its rate limit
    #[error("Quota exceeded, retry after: {0}")]
    QuotaExceeded(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Grid document store errors
    #[error("Grid store error: {0}")]
    Store(#[from] GridStoreError),

    /// The first materializer stage failed; nothing was committed remotely
    #[error("Materialization failed during {step}: {source}")]
    Materialization {
        step: MaterializationStep,
        #[source]
        source: Box<SheetfillError>,
    },

    /// A materializer stage failed after earlier stages committed remote changes
    #[error("Partial failure: stage {reached} committed, {step} failed: {source}")]
    PartialFailure {
        reached: MaterializationStage,
        step: MaterializationStep,
        #[source]
        source: Box<SheetfillError>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl SheetfillError {
    /// Whether the operation that produced this error may be retried as-is
    pub fn is_retryable(&self) -> bool {
        matches!(self, SheetfillError::QuotaExceeded(_))
    }

    /// Returns the materializer stage reached before the failure, if any
    pub fn stage_reached(&self) -> Option<MaterializationStage> {
        match self {
            SheetfillError::Materialization { .. } => Some(MaterializationStage::Idle),
            SheetfillError::PartialFailure { reached, .. } => Some(*reached),
            _ => None,
        }
    }
}

/// Grid document store errors
///
/// Errors that occur while talking to the remote grid document store.
/// Rate limiting and missing documents map to [`SheetfillError::QuotaExceeded`]
/// and [`SheetfillError::NotFound`] instead.
#[derive(Debug, Error)]
pub enum GridStoreError {
    /// Failed to connect to the store
    #[error("Failed to connect to grid store: {0}")]
    ConnectionFailed(String),

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The store refused the request as invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The store answered with something we could not understand
    #[error("Invalid response from store: {0}")]
    InvalidResponse(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// Linear states of a row materialization run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializationStage {
    Idle,
    RowsInserted,
    StylesCopied,
    DataWritten,
    Done,
}

impl MaterializationStage {
    /// The following stage; `Done` is terminal
    pub fn next(self) -> Self {
        match self {
            Self::Idle => Self::RowsInserted,
            Self::RowsInserted => Self::StylesCopied,
            Self::StylesCopied => Self::DataWritten,
            Self::DataWritten => Self::Done,
            Self::Done => Self::Done,
        }
    }

    /// Whether remote changes have been committed once this stage is reached
    pub fn has_committed(self) -> bool {
        self != Self::Idle
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::RowsInserted => "rows_inserted",
            Self::StylesCopied => "styles_copied",
            Self::DataWritten => "data_written",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for MaterializationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The materializer operation that was running when a run failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterializationStep {
    InsertRows,
    CopyStyles,
    WriteData,
}

impl MaterializationStep {
    /// Retrying this step alone is safe only if it is idempotent
    pub fn is_safe_to_retry(self) -> bool {
        !matches!(self, Self::InsertRows)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsertRows => "insert_rows",
            Self::CopyStyles => "copy_styles",
            Self::WriteData => "write_data",
        }
    }
}

impl fmt::Display for MaterializationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<std::io::Error> for SheetfillError {
    fn from(err: std::io::Error) -> Self {
        SheetfillError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SheetfillError {
    fn from(err: serde_json::Error) -> Self {
        SheetfillError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SheetfillError {
    fn from(err: toml::de::Error) -> Self {
        SheetfillError::Configuration(format!("TOML parse error: {err}"))
    }
}
