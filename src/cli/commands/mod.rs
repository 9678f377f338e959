//! CLI command implementations
//!
//! Exit codes shared by every command: 0 success, 2 configuration or
//! argument error, 3 partial failure (remote changes committed), 5 fatal.

pub mod generate;
pub mod init;
pub mod show_template;
pub mod substitute;
pub mod validate;

use crate::adapters::grid::{GridStore, HttpGridStore, RetryPolicy, RetryingGridStore};
use crate::config::SheetfillConfig;
use crate::domain::Result;
use std::sync::Arc;

/// HTTP store wrapped with quota retries, as configured
pub(crate) fn connect_store(config: &SheetfillConfig) -> Result<Arc<dyn GridStore>> {
    let store = HttpGridStore::new(&config.store)?;
    let policy = RetryPolicy::from(&config.store.retry);
    tracing::debug!(
        base_url = %config.store.base_url,
        max_retries = policy.max_retries,
        "Grid store client ready"
    );
    Ok(Arc::new(RetryingGridStore::new(store, policy)))
}
