//! Materialization summary and reporting

use super::plan::InsertionPlan;
use crate::domain::{DocumentId, MaterializationStage};
use serde::Serialize;
use std::time::Duration;

/// Summary of one materialization run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterializationSummary {
    /// Document the rows were materialized into
    pub document: DocumentId,

    pub plan: InsertionPlan,

    /// Rows added by the bulk insert
    pub rows_inserted: usize,

    /// Merge regions recreated on the new rows
    pub merges_created: usize,

    /// Lead cells written with record data
    pub cells_written: usize,

    /// Last stage reached
    pub stage: MaterializationStage,

    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

impl MaterializationSummary {
    pub fn new(document: DocumentId, plan: InsertionPlan) -> Self {
        Self {
            document,
            plan,
            rows_inserted: 0,
            merges_created: 0,
            cells_written: 0,
            stage: MaterializationStage::Idle,
            duration: Duration::from_secs(0),
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.stage == MaterializationStage::Done
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            document_id = %self.document,
            anchor_row = self.plan.anchor_row,
            rows_inserted = self.rows_inserted,
            merges_created = self.merges_created,
            cells_written = self.cells_written,
            stage = %self.stage,
            duration_ms = self.duration.as_millis() as u64,
            "Materialization completed"
        );
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }
}
