use crate::domain::{DocumentId, Result};
use async_trait::async_trait;
use serde::Serialize;

/// One global find-and-replace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextReplacement {
    pub find: String,
    pub replace: String,
    pub match_case: bool,
}

impl TextReplacement {
    pub fn new(find: impl Into<String>, replace: impl Into<String>) -> Self {
        Self {
            find: find.into(),
            replace: replace.into(),
            match_case: true,
        }
    }
}

/// Operations on a flowed-text document
#[async_trait]
pub trait FlowedDocumentStore: Send + Sync {
    /// Full plain text of the document body
    async fn read_text(&self, document: &DocumentId) -> Result<String>;

    /// Applies all replacements in one call; returns the number of occurrences changed
    async fn replace_all(
        &self,
        document: &DocumentId,
        replacements: &[TextReplacement],
    ) -> Result<usize>;
}
