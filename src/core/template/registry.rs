//! Template resource loading with fallback defaults and caching
//!
//! Resources live in a directory as `<resource_id>.json` or
//! `<resource_id>.toml`. A missing or corrupt resource never fails report
//! generation: the built-in default for the document type is used and a
//! warning is logged.

use super::defaults::default_config;
use super::schema::{ResourceFormat, TemplateConfig};
use crate::config::TemplatesConfig;
use crate::core::cache::{CacheOutcome, Clock, SystemClock, TtlCache};
use crate::domain::{DocumentType, Result, SheetfillError};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Where a loaded configuration came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSource {
    Resource,
    BuiltInDefault,
}

/// Loads a template resource from `directory`, falling back to defaults
///
/// # Example
///
/// ```no_run
/// use sheetfill::core::template::load_template;
/// use sheetfill::domain::DocumentType;
///
/// let (config, _source) = load_template("templates", DocumentType::TravelExpenses, "travel_expenses");
/// assert_eq!(config.insert_anchor_row, 45);
/// ```
pub fn load_template(
    directory: impl AsRef<Path>,
    document_type: DocumentType,
    resource_id: &str,
) -> (TemplateConfig, TemplateSource) {
    match read_resource(directory.as_ref(), document_type, resource_id) {
        Ok(config) => (config, TemplateSource::Resource),
        Err(e) => {
            tracing::warn!(
                document_type = %document_type,
                resource_id = %resource_id,
                error = %e,
                "Template resource unavailable, using built-in default"
            );
            (default_config(document_type), TemplateSource::BuiltInDefault)
        }
    }
}

/// Reads and parses a resource without any fallback
pub fn read_resource(
    directory: &Path,
    document_type: DocumentType,
    resource_id: &str,
) -> Result<TemplateConfig> {
    let (path, format) = locate_resource(directory, resource_id).ok_or_else(|| {
        SheetfillError::NotFound(format!(
            "no template resource '{resource_id}' in {}",
            directory.display()
        ))
    })?;

    let text = fs::read_to_string(&path).map_err(|e| {
        SheetfillError::Io(format!("failed to read {}: {e}", path.display()))
    })?;

    TemplateConfig::from_resource(document_type, &text, format)
}

fn locate_resource(directory: &Path, resource_id: &str) -> Option<(PathBuf, ResourceFormat)> {
    [ResourceFormat::Json, ResourceFormat::Toml]
        .into_iter()
        .map(|format| {
            (
                directory.join(format!("{resource_id}.{}", format.extension())),
                format,
            )
        })
        .find(|(path, _)| path.is_file())
}

/// Process-wide template registry
///
/// Built once at startup and shared by reference (`Arc`). Configurations are
/// cached with a TTL; a failed refresh keeps serving the previous value.
pub struct TemplateRegistry {
    directory: PathBuf,
    resources: HashMap<DocumentType, String>,
    cache: TtlCache<DocumentType, Arc<TemplateConfig>>,
}

impl TemplateRegistry {
    pub fn new(config: &TemplatesConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &TemplatesConfig, clock: Arc<dyn Clock>) -> Self {
        let resources = config
            .resources
            .iter()
            .filter_map(|(doc_type, resource_id)| match DocumentType::from_str(doc_type) {
                Ok(doc_type) => Some((doc_type, resource_id.clone())),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring template resource override");
                    None
                }
            })
            .collect();

        Self {
            directory: PathBuf::from(&config.directory),
            resources,
            cache: TtlCache::new(
                Duration::from_secs(config.cache_ttl_seconds),
                config.cache_capacity,
                clock,
            ),
        }
    }

    /// Resource id used for a document type
    pub fn resource_id(&self, document_type: DocumentType) -> &str {
        self.resources
            .get(&document_type)
            .map(String::as_str)
            .unwrap_or_else(|| document_type.resource_id())
    }

    /// Returns the configuration for a document type; never fails
    pub fn load(&self, document_type: DocumentType) -> Arc<TemplateConfig> {
        let resource_id = self.resource_id(document_type).to_string();
        let loaded = self.cache.get_or_load(&document_type, || {
            read_resource(&self.directory, document_type, &resource_id).map(Arc::new)
        });

        match loaded {
            Ok((config, CacheOutcome::Stale)) => {
                tracing::warn!(
                    document_type = %document_type,
                    "Template refresh failed, serving cached configuration"
                );
                config
            }
            Ok((config, outcome)) => {
                tracing::debug!(document_type = %document_type, ?outcome, "Template configuration ready");
                config
            }
            Err(e) => {
                tracing::warn!(
                    document_type = %document_type,
                    resource_id = %resource_id,
                    error = %e,
                    "Template resource unavailable, using built-in default"
                );
                let config = Arc::new(default_config(document_type));
                self.cache.insert(document_type, config.clone());
                config
            }
        }
    }

    pub fn invalidate(&self, document_type: DocumentType) {
        self.cache.invalidate(&document_type);
    }
}
