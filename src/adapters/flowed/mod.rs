//! Flowed-text document store adapters
//!
//! Flowed documents have no cells; placeholders are replaced with a global
//! find-and-replace per token.

pub mod memory;
pub mod traits;

pub use memory::InMemoryFlowedStore;
pub use traits::{FlowedDocumentStore, TextReplacement};
