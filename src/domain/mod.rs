//! Domain models and types for sheetfill.
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`DocumentId`], [`SheetName`], [`DocumentType`])
//! - **Input records** ([`Record`], [`RecordValue`])
//! - **Error types** ([`SheetfillError`], [`GridStoreError`]) and the materializer
//!   stage markers they report
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, SheetfillError>`]:
//!
//! ```rust
//! use sheetfill::core::coordinates::parse_range;
//! use sheetfill::domain::Result;
//!
//! fn example() -> Result<()> {
//!     let range = parse_range("E45:AB45")?;
//!     assert_eq!(range.start_row(), 45);
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod record;
pub mod result;

pub use errors::{GridStoreError, MaterializationStage, MaterializationStep, SheetfillError};
pub use ids::{DocumentId, DocumentType, SheetName};
pub use record::{normalize_key, Record, RecordValue};
pub use result::Result;
