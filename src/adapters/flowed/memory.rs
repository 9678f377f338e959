//! In-process flowed-text store

use super::traits::{FlowedDocumentStore, TextReplacement};
use crate::domain::{DocumentId, GridStoreError, Result, SheetfillError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct FlowedState {
    documents: HashMap<DocumentId, String>,
    fail_next_read: bool,
    replace_calls: usize,
}

/// Flowed documents held as plain strings
#[derive(Default)]
pub struct InMemoryFlowedStore {
    state: Mutex<FlowedState>,
}

impl InMemoryFlowedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_document(&self, document: DocumentId, text: impl Into<String>) {
        self.state().documents.insert(document, text.into());
    }

    pub fn text(&self, document: &DocumentId) -> Option<String> {
        self.state().documents.get(document).cloned()
    }

    /// The next `read_text` call fails with a server error
    pub fn fail_next_read(&self) {
        self.state().fail_next_read = true;
    }

    pub fn replace_calls(&self) -> usize {
        self.state().replace_calls
    }

    fn state(&self) -> MutexGuard<'_, FlowedState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl FlowedDocumentStore for InMemoryFlowedStore {
    async fn read_text(&self, document: &DocumentId) -> Result<String> {
        let mut state = self.state();
        if std::mem::take(&mut state.fail_next_read) {
            return Err(GridStoreError::ServerError {
                status: 503,
                message: "injected read failure".to_string(),
            }
            .into());
        }
        state
            .documents
            .get(document)
            .cloned()
            .ok_or_else(|| SheetfillError::NotFound(format!("document '{document}'")))
    }

    async fn replace_all(
        &self,
        document: &DocumentId,
        replacements: &[TextReplacement],
    ) -> Result<usize> {
        let mut state = self.state();
        state.replace_calls += 1;
        let text = state
            .documents
            .get_mut(document)
            .ok_or_else(|| SheetfillError::NotFound(format!("document '{document}'")))?;

        let mut occurrences = 0;
        for replacement in replacements {
            if replacement.find.is_empty() {
                continue;
            }
            if replacement.match_case {
                occurrences += text.matches(replacement.find.as_str()).count();
                *text = text.replace(&replacement.find, &replacement.replace);
            } else {
                let (replaced, count) =
                    replace_ignore_case(text, &replacement.find, &replacement.replace);
                occurrences += count;
                *text = replaced;
            }
        }
        Ok(occurrences)
    }
}

fn replace_ignore_case(text: &str, find: &str, replace: &str) -> (String, usize) {
    let pattern = regex::RegexBuilder::new(&regex::escape(find))
        .case_insensitive(true)
        .build();
    match pattern {
        Ok(pattern) => {
            let count = pattern.find_iter(text).count();
            (
                pattern
                    .replace_all(text, regex::NoExpand(replace))
                    .into_owned(),
                count,
            )
        }
        Err(_) => (text.to_string(), 0),
    }
}
