//! The pipeline — one request, one run, start to finish.
//!
//! EXECUTION ORDER (fixed):
//!   1. Decode wager report     → aggregate wagers
//!   2. Decode deposit report   → aggregate deposits
//!   3. Eligibility (only if both aggregates exist)
//!
//! RULES:
//!   - Both aggregators always run, so a request reports every missing
//!     column at once.
//!   - A missing column is a warning, not an error: the run completes
//!     with `rows == None`.
//!   - Unreadable files and unsupported formats are errors.
//!   - Nothing is shared between runs. A `Pipeline` can be reused, but
//!     every `run()` builds its state from scratch.

use crate::{
    config::PromotionConfig,
    deposit::{self, DepositAggregate},
    eligibility::{self, EligibilitySummary, ResultRow},
    error::{PromoError, PromoResult},
    event::PipelineEvent,
    source::{RawTable, SourceFile},
    types::{RunId, SourceKind},
    wager::{self, WagerSummary},
};

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id:   RunId,
    /// `None` when either report was rejected.
    pub rows:     Option<Vec<ResultRow>>,
    /// User-facing messages, one per rejected report.
    pub warnings: Vec<String>,
    pub events:   Vec<PipelineEvent>,
}

impl PipelineOutcome {
    pub fn summary(&self) -> Option<EligibilitySummary> {
        self.rows.as_deref().map(EligibilitySummary::from_rows)
    }
}

pub struct Pipeline {
    config: PromotionConfig,
}

impl Pipeline {
    pub fn new(config: PromotionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PromotionConfig {
        &self.config
    }

    /// Run the full pipeline on two uploaded files.
    pub fn run(&self, wagers: &SourceFile, deposits: &SourceFile) -> PromoResult<PipelineOutcome> {
        let wager_table = RawTable::from_source(wagers)?;
        let deposit_table = RawTable::from_source(deposits)?;
        let mut run = Run::new();
        run.record_loaded(SourceKind::Wagers, &wagers.name, &wager_table);
        run.record_loaded(SourceKind::Deposits, &deposits.name, &deposit_table);
        self.evaluate_tables(run, &wager_table, &deposit_table)
    }

    /// Run on already-decoded tables. Used when the caller owns decoding.
    pub fn run_tables(&self, wagers: &RawTable, deposits: &RawTable) -> PromoResult<PipelineOutcome> {
        self.evaluate_tables(Run::new(), wagers, deposits)
    }

    fn evaluate_tables(
        &self,
        mut run: Run,
        wager_table: &RawTable,
        deposit_table: &RawTable,
    ) -> PromoResult<PipelineOutcome> {
        let wagers = run.absorb(SourceKind::Wagers, wager::aggregate_wagers(wager_table))?;
        if let Some(w) = &wagers {
            run.push(PipelineEvent::WagersAggregated { users: w.len() });
            log::info!("run={} wagers: {} user(s) with wagered > 0", run.run_id, w.len());
        }

        let deposits = run.absorb(SourceKind::Deposits, deposit::aggregate_deposits(deposit_table))?;
        if let Some(d) = &deposits {
            run.record_deposits(d);
        }

        let rows = match (wagers, deposits) {
            (Some(w), Some(d)) => Some(self.evaluate(&mut run, &w, &d)),
            _ => None,
        };

        Ok(run.finish(rows))
    }

    fn evaluate(&self, run: &mut Run, wagers: &[WagerSummary], deposits: &DepositAggregate) -> Vec<ResultRow> {
        let rows = eligibility::evaluate(wagers, &deposits.summaries, &self.config);
        let summary = EligibilitySummary::from_rows(&rows);
        log::info!(
            "run={} eligibility: joined={} eligible={} total_bonus={}",
            run.run_id,
            summary.joined,
            summary.eligible,
            summary.total_bonus
        );
        run.push(PipelineEvent::EligibilityEvaluated {
            joined:      summary.joined,
            eligible:    summary.eligible,
            total_bonus: summary.total_bonus,
        });
        rows
    }
}

/// Per-request state. Dropped at the end of `run()`.
struct Run {
    run_id:   RunId,
    warnings: Vec<String>,
    events:   Vec<PipelineEvent>,
}

impl Run {
    fn new() -> Self {
        let run_id = format!("run-{}", uuid::Uuid::new_v4());
        log::debug!("run={run_id} started");
        Self {
            events: vec![PipelineEvent::RunStarted { run_id: run_id.clone() }],
            warnings: Vec::new(),
            run_id,
        }
    }

    fn push(&mut self, event: PipelineEvent) {
        self.events.push(event);
    }

    fn record_loaded(&mut self, source: SourceKind, name: &str, table: &RawTable) {
        log::debug!(
            "run={} loaded {source} file '{name}': {} column(s), {} row(s)",
            self.run_id,
            table.headers.len(),
            table.len()
        );
        self.push(PipelineEvent::SourceLoaded {
            source,
            name:    name.to_string(),
            columns: table.headers.len(),
            rows:    table.len(),
        });
    }

    fn record_deposits(&mut self, d: &DepositAggregate) {
        self.push(PipelineEvent::DepositsFiltered {
            rows_read:           d.filter.rows_read,
            dropped_unconfirmed: d.filter.dropped_unconfirmed,
            dropped_bonus:       d.filter.dropped_bonus,
            dropped_no_payee:    d.filter.dropped_no_payee,
            kept:                d.filter.kept,
        });
        let needs_review = d.needs_review_count();
        self.push(PipelineEvent::DepositsAggregated {
            users: d.summaries.len(),
            needs_review,
        });
        log::info!(
            "run={} deposits: {} user(s), {needs_review} flagged for id review",
            self.run_id,
            d.summaries.len()
        );
    }

    /// Turn a missing-column failure into a warning; pass other errors up.
    fn absorb<T>(&mut self, source: SourceKind, result: PromoResult<T>) -> PromoResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(PromoError::MissingColumn { kind, missing }) => {
                let message = format!(
                    "Faltan columnas necesarias en el archivo de {kind}: {}",
                    missing.join(", ")
                );
                log::warn!("run={} {message}", self.run_id);
                self.warnings.push(message);
                self.push(PipelineEvent::SourceRejected { source, missing });
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn finish(mut self, rows: Option<Vec<ResultRow>>) -> PipelineOutcome {
        self.push(PipelineEvent::RunCompleted {
            run_id:          self.run_id.clone(),
            produced_result: rows.is_some(),
        });
        PipelineOutcome {
            run_id:   self.run_id,
            rows,
            warnings: self.warnings,
            events:   self.events,
        }
    }
}
