//! `{{key}}` token substitution
//!
//! Grid documents: the occupied cell window is read once, every changed cell
//! is computed locally, and all changed cells go out in a single batched
//! write after the scan. Untouched cells are never written.
//!
//! Flowed documents: the body is read once to find the distinct tokens, then
//! one batch of global replacements is issued.
//!
//! Any store failure degrades to "no substitution performed" with a warning.

use super::target::DocumentTarget;
use crate::adapters::flowed::{FlowedDocumentStore, TextReplacement};
use crate::adapters::grid::{GridStore, ValueInputMode, ValueRange};
use crate::core::coordinates::{cell_a1, index_to_column};
use crate::domain::{normalize_key, DocumentId, Record, Result, SheetName};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{([^{}]+)\}\}").expect("token pattern is valid"))
}

/// Values keyed by normalized placeholder key
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderValues {
    values: BTreeMap<String, String>,
}

impl PlaceholderValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Looks up a key; `"1,1"` and `"1.1"` are the same key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&normalize_key(key)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values taken from a record, preferring pre-formatted companions
    pub fn from_record(record: &Record) -> Self {
        let mut values = Self::new();
        for (name, value) in record.iter() {
            let text = record
                .formatted(name)
                .map(str::to_string)
                .unwrap_or_else(|| value.render());
            values.insert(name, text);
        }
        values
    }
}

impl From<Map<String, Value>> for PlaceholderValues {
    fn from(map: Map<String, Value>) -> Self {
        Self::from_record(&Record::from(map))
    }
}

/// Result of rendering one piece of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedText {
    pub text: String,
    pub tokens_replaced: usize,
    pub unresolved: Vec<String>,
}

/// Replaces every `{{key}}` token in `text`; unknown keys become empty strings
///
/// # Example
///
/// ```
/// use sheetfill::core::placeholder::{render_text, PlaceholderValues};
///
/// let values = PlaceholderValues::new().with("nombre", "Ana");
/// let rendered = render_text("Hola {{nombre}}, id {{id}}", &values);
/// assert_eq!(rendered.text, "Hola Ana, id ");
/// assert_eq!(rendered.unresolved, vec!["id".to_string()]);
/// ```
pub fn render_text(text: &str, values: &PlaceholderValues) -> RenderedText {
    let mut tokens_replaced = 0;
    let mut unresolved = Vec::new();

    let rendered = token_pattern().replace_all(text, |caps: &regex::Captures| {
        tokens_replaced += 1;
        let key = normalize_key(&caps[1]);
        match values.get(&key) {
            Some(value) => value.to_string(),
            None => {
                unresolved.push(key);
                String::new()
            }
        }
    });

    RenderedText {
        text: rendered.into_owned(),
        tokens_replaced,
        unresolved,
    }
}

/// Distinct token literals in `text`, each mapped to its normalized key
///
/// Spacing variants such as `{{ nombre }}` and `{{nombre}}` are separate
/// literals sharing one key.
pub fn find_tokens(text: &str) -> BTreeMap<String, String> {
    token_pattern()
        .captures_iter(text)
        .map(|caps| (caps[0].to_string(), normalize_key(&caps[1])))
        .collect()
}

/// What a substitution pass did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionOutcome {
    /// Grid cells rewritten (always 0 for flowed documents)
    pub cells_updated: usize,
    /// Token occurrences replaced
    pub tokens_replaced: usize,
    /// Keys found in the document with no value
    pub unresolved: BTreeSet<String>,
    /// Set when the pass was abandoned and nothing was written
    pub degraded: Option<String>,
}

impl SubstitutionOutcome {
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            degraded: Some(reason.into()),
            ..Default::default()
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// Placeholder substitution over grid and flowed documents
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderEngine;

impl PlaceholderEngine {
    pub fn new() -> Self {
        Self
    }

    /// Substitutes every token in the target document; never fails
    ///
    /// Grid targets get one window read and one batched write of the changed
    /// cells. Flowed targets get a single replace call covering each distinct
    /// token literal. Tokens with no value are replaced by an empty string and
    /// listed in [`SubstitutionOutcome::unresolved`].
    ///
    /// # Arguments
    ///
    /// * `target` - Document to rewrite, grid or flowed
    /// * `values` - Placeholder values keyed by normalized name
    ///
    /// # Returns
    ///
    /// The outcome of the pass. When a store call fails nothing is written
    /// and the outcome is degraded with the error text.
    pub async fn substitute(
        &self,
        target: &DocumentTarget,
        values: &PlaceholderValues,
    ) -> SubstitutionOutcome {
        match self.try_substitute(target, values).await {
            Ok(outcome) => {
                tracing::info!(
                    document_id = %target.document(),
                    kind = target.kind(),
                    cells_updated = outcome.cells_updated,
                    tokens_replaced = outcome.tokens_replaced,
                    unresolved = outcome.unresolved.len(),
                    "Placeholder substitution complete"
                );
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    document_id = %target.document(),
                    kind = target.kind(),
                    error = %e,
                    "Placeholder substitution skipped"
                );
                SubstitutionOutcome::skipped(e.to_string())
            }
        }
    }

    /// Same as [`Self::substitute`] but surfaces store errors
    ///
    /// # Errors
    ///
    /// Returns the first store error from the read or the write.
    pub async fn try_substitute(
        &self,
        target: &DocumentTarget,
        values: &PlaceholderValues,
    ) -> Result<SubstitutionOutcome> {
        match target {
            DocumentTarget::Grid {
                store,
                document,
                sheet,
                value_input_mode,
            } => {
                substitute_grid(
                    store.as_ref(),
                    document,
                    sheet.as_ref(),
                    *value_input_mode,
                    values,
                )
                .await
            }
            DocumentTarget::Flowed { store, document } => {
                substitute_flowed(store.as_ref(), document, values).await
            }
        }
    }
}

async fn substitute_grid(
    store: &dyn GridStore,
    document: &DocumentId,
    sheet: Option<&SheetName>,
    mode: ValueInputMode,
    values: &PlaceholderValues,
) -> Result<SubstitutionOutcome> {
    let metadata = store.sheet_metadata(document, sheet).await?;
    if metadata.row_count == 0 || metadata.column_count == 0 {
        return Ok(SubstitutionOutcome::default());
    }

    let prefix = metadata.title.a1_prefix();
    let window = format!(
        "{prefix}A1:{}{}",
        index_to_column(metadata.column_count - 1),
        metadata.row_count
    );
    let cells = store.get_values(document, &window).await?;

    let mut outcome = SubstitutionOutcome::default();
    let mut updates = Vec::new();
    for (row_index, row) in cells.iter().enumerate() {
        for (column_index, text) in row.iter().enumerate() {
            if !text.contains("{{") {
                continue;
            }
            let rendered = render_text(text, values);
            if rendered.tokens_replaced == 0 {
                continue;
            }
            outcome.tokens_replaced += rendered.tokens_replaced;
            outcome.unresolved.extend(rendered.unresolved);
            if rendered.text != *text {
                updates.push(ValueRange::cell(
                    format!("{prefix}{}", cell_a1(column_index as u32, row_index as u32 + 1)),
                    rendered.text,
                ));
            }
        }
    }

    if updates.is_empty() {
        return Ok(outcome);
    }

    store.batch_update_values(document, &updates, mode).await?;
    outcome.cells_updated = updates.len();
    Ok(outcome)
}

async fn substitute_flowed(
    store: &dyn FlowedDocumentStore,
    document: &DocumentId,
    values: &PlaceholderValues,
) -> Result<SubstitutionOutcome> {
    let text = store.read_text(document).await?;

    // Replacements target the literal token text so spacing variants are
    // covered too
    let mut unresolved = BTreeSet::new();
    let replacements: Vec<TextReplacement> = find_tokens(&text)
        .into_iter()
        .map(|(literal, key)| {
            let value = match values.get(&key) {
                Some(value) => value.to_string(),
                None => {
                    unresolved.insert(key);
                    String::new()
                }
            };
            TextReplacement::new(literal, value)
        })
        .collect();

    if replacements.is_empty() {
        return Ok(SubstitutionOutcome::default());
    }

    let tokens_replaced = store.replace_all(document, &replacements).await?;

    Ok(SubstitutionOutcome {
        cells_updated: 0,
        tokens_replaced,
        unresolved,
        degraded: None,
    })
}
