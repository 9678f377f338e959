//! Result type alias for sheetfill

use super::errors::SheetfillError;

/// Result type alias for sheetfill operations
///
/// # Examples
///
/// ```
/// use sheetfill::domain::result::Result;
/// use sheetfill::domain::errors::SheetfillError;
///
/// fn example_function() -> Result<String> {
///     Ok("E45".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(SheetfillError::Format("E45:".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SheetfillError>;
