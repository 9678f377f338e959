//! Grid document store adapters
//!
//! - [`traits`] - the [`GridStore`] trait and request types
//! - [`http`] - REST client
//! - [`memory`] - in-process store for tests and dry runs
//! - [`retry`] - quota retry decorator

pub mod http;
pub mod memory;
pub mod retry;
pub mod traits;

pub use http::HttpGridStore;
pub use memory::{CallCounters, CellFormat, InMemoryGridStore, InjectedFault, MemorySheet, StoreOperation};
pub use retry::{retry_on_quota, RetryPolicy, RetryingGridStore};
pub use traits::{GridRequest, GridStore, SheetMetadata, ValueInputMode, ValueRange};
