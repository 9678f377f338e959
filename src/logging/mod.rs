//! Logging and observability
//!
//! Structured logging through `tracing`: a console layer plus an optional
//! rotating JSON file layer, and a few macros that keep field names
//! consistent across the materializer, the store adapters and the CLI.
//!
//! # Example
//!
//! ```no_run
//! use sheetfill::logging::init_logging;
//! use sheetfill::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(document_id = "1AbC", "Generating report");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of a materialization stage
///
/// # Example
///
/// ```no_run
/// use sheetfill::log_stage_start;
///
/// log_stage_start!("1AbC", "insert_rows", 3);
/// ```
#[macro_export]
macro_rules! log_stage_start {
    ($document:expr, $step:expr, $rows:expr) => {
        tracing::info!(
            document_id = %$document,
            step = %$step,
            rows = $rows,
            "Starting stage"
        );
    };
}

/// Log the completion of a materialization stage
///
/// # Example
///
/// ```no_run
/// use sheetfill::log_stage_complete;
/// use std::time::Duration;
///
/// log_stage_complete!("1AbC", "rows_inserted", Duration::from_millis(120));
/// ```
#[macro_export]
macro_rules! log_stage_complete {
    ($document:expr, $stage:expr, $duration:expr) => {
        tracing::info!(
            document_id = %$document,
            stage = %$stage,
            duration_ms = $duration.as_millis() as u64,
            "Stage completed"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use sheetfill::log_error_with_context;
/// use sheetfill::domain::SheetfillError;
///
/// let error = SheetfillError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use sheetfill::log_retry_attempt;
///
/// log_retry_attempt!(2, 5, 400u64, "rate limited");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $delay_ms:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay_ms,
            reason = %$reason,
            "Retrying operation"
        );
    };
}
