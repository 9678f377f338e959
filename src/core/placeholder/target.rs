//! Documents a placeholder pass can run against

use crate::adapters::flowed::FlowedDocumentStore;
use crate::adapters::grid::{GridStore, ValueInputMode};
use crate::domain::{DocumentId, SheetName};
use std::fmt;
use std::sync::Arc;

/// A document plus the store that serves it
///
/// Grid documents are scanned cell by cell; flowed documents get one global
/// find-and-replace per token.
#[derive(Clone)]
pub enum DocumentTarget {
    Grid {
        store: Arc<dyn GridStore>,
        document: DocumentId,
        /// Sheet to scan; the first sheet when `None`
        sheet: Option<SheetName>,
        value_input_mode: ValueInputMode,
    },
    Flowed {
        store: Arc<dyn FlowedDocumentStore>,
        document: DocumentId,
    },
}

impl DocumentTarget {
    pub fn grid(store: Arc<dyn GridStore>, document: DocumentId, sheet: Option<SheetName>) -> Self {
        DocumentTarget::Grid {
            store,
            document,
            sheet,
            value_input_mode: ValueInputMode::default(),
        }
    }

    pub fn flowed(store: Arc<dyn FlowedDocumentStore>, document: DocumentId) -> Self {
        DocumentTarget::Flowed { store, document }
    }

    pub fn document(&self) -> &DocumentId {
        match self {
            DocumentTarget::Grid { document, .. } | DocumentTarget::Flowed { document, .. } => {
                document
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DocumentTarget::Grid { .. } => "grid",
            DocumentTarget::Flowed { .. } => "flowed",
        }
    }
}

impl fmt::Debug for DocumentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentTarget::Grid {
                document,
                sheet,
                value_input_mode,
                ..
            } => f
                .debug_struct("Grid")
                .field("document", document)
                .field("sheet", sheet)
                .field("value_input_mode", value_input_mode)
                .finish_non_exhaustive(),
            DocumentTarget::Flowed { document, .. } => f
                .debug_struct("Flowed")
                .field("document", document)
                .finish_non_exhaustive(),
        }
    }
}
