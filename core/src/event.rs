//! The run event log — what each pipeline stage did, in order.
//!
//! RULE: one run, one log. Events carry counts only, never row data.

use crate::types::{RunId, SourceKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    RunStarted {
        run_id: RunId,
    },
    SourceLoaded {
        source: SourceKind,
        name: String,
        columns: usize,
        rows: usize,
    },
    SourceRejected {
        source: SourceKind,
        missing: Vec<String>,
    },
    WagersAggregated {
        users: usize,
    },
    DepositsFiltered {
        rows_read: usize,
        dropped_unconfirmed: usize,
        dropped_bonus: usize,
        dropped_no_payee: usize,
        kept: usize,
    },
    DepositsAggregated {
        users: usize,
        needs_review: usize,
    },
    EligibilityEvaluated {
        joined: usize,
        eligible: usize,
        total_bonus: f64,
    },
    RunCompleted {
        run_id: RunId,
        produced_result: bool,
    },
}

impl PipelineEvent {
    /// Stable name, matching the serialized `type` tag.
    pub fn event_type(&self) -> &'static str {
        match self {
            PipelineEvent::RunStarted { .. }           => "run_started",
            PipelineEvent::SourceLoaded { .. }         => "source_loaded",
            PipelineEvent::SourceRejected { .. }       => "source_rejected",
            PipelineEvent::WagersAggregated { .. }     => "wagers_aggregated",
            PipelineEvent::DepositsFiltered { .. }     => "deposits_filtered",
            PipelineEvent::DepositsAggregated { .. }   => "deposits_aggregated",
            PipelineEvent::EligibilityEvaluated { .. } => "eligibility_evaluated",
            PipelineEvent::RunCompleted { .. }         => "run_completed",
        }
    }
}
