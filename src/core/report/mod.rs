//! Report orchestration

pub mod orchestrator;

pub use orchestrator::{ReportInput, ReportOrchestrator, ReportOutcome, ReportRequest};
