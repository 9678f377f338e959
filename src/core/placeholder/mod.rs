//! Placeholder substitution
//!
//! - [`engine`] - token rendering and the [`PlaceholderEngine`]
//! - [`target`] - the [`DocumentTarget`] variant over grid and flowed documents

pub mod engine;
pub mod target;

pub use engine::{
    find_tokens, render_text, PlaceholderEngine, PlaceholderValues, RenderedText,
    SubstitutionOutcome,
};
pub use target::DocumentTarget;
