//! External system integrations for sheetfill.
//!
//! - [`grid`] - grid (spreadsheet) document stores
//! - [`flowed`] - flowed-text document stores
//!
//! # Design Pattern
//!
//! Adapters isolate the remote stores behind async traits so the materializer
//! and the placeholder engine can run against the REST client in production
//! and the in-memory stores in tests and dry runs.
//!
//! ```rust,no_run
//! use sheetfill::adapters::grid::{GridStore, HttpGridStore, RetryPolicy, RetryingGridStore};
//! use sheetfill::config::StoreConfig;
//! use sheetfill::domain::DocumentId;
//!
//! # async fn example() -> sheetfill::domain::Result<()> {
//! let config = StoreConfig::default();
//! let store = RetryingGridStore::new(HttpGridStore::new(&config)?, RetryPolicy::from(&config.retry));
//!
//! let metadata = store.sheet_metadata(&DocumentId::new("1AbC").unwrap(), None).await?;
//! println!("{} merges", metadata.merges.len());
//! # Ok(())
//! # }
//! ```

pub mod flowed;
pub mod grid;
