//! Template configuration
//!
//! - [`schema`] - [`TemplateConfig`] and field resolution
//! - [`defaults`] - built-in configurations per document type
//! - [`registry`] - resource loading, fallback and caching

pub mod defaults;
pub mod registry;
pub mod schema;

pub use defaults::default_config;
pub use registry::{load_template, TemplateRegistry, TemplateSource};
pub use schema::{ColumnSpec, ResolvedAttribute, ResourceFormat, TemplateConfig};
