//! Dynamic row materialization
//!
//! - [`plan`] - the [`InsertionPlan`] derived from records and the anchor row
//! - [`materializer`] - the staged [`RowMaterializer`] and the template anchor check
//! - [`summary`] - per-run [`MaterializationSummary`]

#[allow(clippy::module_inception)]
pub mod materializer;
pub mod plan;
pub mod summary;

pub use materializer::{
    record_updates, validate_template_anchor, RowMaterializer, TemplateAnchorReport,
};
pub use plan::{plan, InsertionPlan};
pub use summary::MaterializationSummary;
