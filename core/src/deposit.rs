//! Deposit aggregator — per-user deposit statistics and resolved account id.
//!
//! Steps:
//!   1. Resolve required columns (all-or-nothing)
//!   2. Keep confirmed payments (`ESTADO DEL PAGO` == "true")
//!   3. Drop bonus-funded payments when `FORMAS DE PAGO` exists
//!   4. Coerce `CANTIDAD` to |value| and `FECHA` to a timestamp
//!   5. Identity reconciliation (see identity.rs)
//!   6. Per user: total / max / min amount, max amount between 17:00 and 23:59
//!   7. Left-join resolved ids onto the statistics

use crate::{
    error::PromoResult,
    identity::{self, UserId},
    schema::DepositSchema,
    source::RawTable,
    types::UserKey,
};
use chrono::Timelike;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Payment methods funded by a previous promotion; never count as deposits.
pub const BONUS_METHODS: &[&str] = &["bonus csv", "bonus card"];

/// Hours of day (inclusive) for `deposito_max_17_23`.
pub const EVENING_HOURS: RangeInclusive<u32> = 17..=23;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepositSummary {
    pub usuario:            UserKey,
    pub deposito_total:     f64,
    pub deposito_maximo:    Option<f64>,
    pub deposito_minimo:    Option<f64>,
    pub user_id:            Option<UserId>,
    pub deposito_max_17_23: Option<f64>,
}

/// A confirmed, non-bonus deposit row after coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct DepositRow {
    pub usuario:   UserKey,
    pub amount:    Option<f64>,
    pub hour:      Option<u32>,
    pub candidate: Option<UserId>,
}

/// Row counts from the filtering step, reported in the event log.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DepositFilterStats {
    pub rows_read:           usize,
    pub dropped_unconfirmed: usize,
    pub dropped_bonus:       usize,
    /// Confirmed rows with a blank `beneficiario`; they cannot be grouped.
    pub dropped_no_payee:    usize,
    pub kept:                usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepositAggregate {
    pub summaries: Vec<DepositSummary>,
    pub filter:    DepositFilterStats,
}

impl DepositAggregate {
    pub fn needs_review_count(&self) -> usize {
        self.summaries
            .iter()
            .filter(|s| s.user_id.map_or(false, |id| id.is_review()))
            .count()
    }
}

fn is_confirmed(status: Option<String>) -> bool {
    status.map_or(false, |s| s.trim().to_lowercase() == "true")
}

fn is_bonus_method(method: Option<String>) -> bool {
    method.map_or(false, |m| BONUS_METHODS.contains(&m.to_lowercase().as_str()))
}

/// Apply the status / method filters and coerce the surviving rows.
/// Rows with an empty payee cannot be grouped and are skipped.
/// Every row read lands in exactly one counter of the returned stats.
pub fn filter_rows(table: &RawTable, schema: &DepositSchema) -> (Vec<DepositRow>, DepositFilterStats) {
    let mut stats = DepositFilterStats {
        rows_read: table.len(),
        ..DepositFilterStats::default()
    };
    let mut rows = Vec::new();

    for row in &table.rows {
        if !is_confirmed(row[schema.status].as_text()) {
            stats.dropped_unconfirmed += 1;
            continue;
        }
        if let Some(method) = schema.method {
            if is_bonus_method(row[method].as_text()) {
                stats.dropped_bonus += 1;
                continue;
            }
        }
        let Some(usuario) = row[schema.payee].as_text() else {
            stats.dropped_no_payee += 1;
            continue;
        };
        stats.kept += 1;

        let payer = row[schema.payer].as_text().unwrap_or_default();
        let candidate = identity::candidate_id(&payer, &usuario, row[schema.payer_id].as_number());

        rows.push(DepositRow {
            amount: row[schema.amount].as_number().map(f64::abs),
            hour: row[schema.timestamp].as_datetime().map(|dt| dt.hour()),
            candidate,
            usuario,
        });
    }

    (rows, stats)
}

#[derive(Default)]
struct Stats {
    total:   f64,
    max:     Option<f64>,
    min:     Option<f64>,
    evening: Option<f64>,
}

impl Stats {
    fn add(&mut self, amount: Option<f64>, hour: Option<u32>) {
        let Some(amount) = amount else { return };
        self.total += amount;
        self.max = Some(self.max.map_or(amount, |m| m.max(amount)));
        self.min = Some(self.min.map_or(amount, |m| m.min(amount)));
        if hour.map_or(false, |h| EVENING_HOURS.contains(&h)) {
            self.evening = Some(self.evening.map_or(amount, |m| m.max(amount)));
        }
    }
}

/// Aggregate the deposit report. Fails only when a required column is
/// missing. Output is ordered by user key.
pub fn aggregate_deposits(table: &RawTable) -> PromoResult<DepositAggregate> {
    let schema = DepositSchema::resolve(&table.headers)?;
    let (rows, filter) = filter_rows(table, &schema);
    log::debug!(
        "deposits: read={} unconfirmed={} bonus={} no_payee={} kept={}",
        filter.rows_read,
        filter.dropped_unconfirmed,
        filter.dropped_bonus,
        filter.dropped_no_payee,
        filter.kept
    );

    let ids = identity::resolve_ids(rows.iter().map(|r| (r.usuario.clone(), r.candidate)));

    let mut per_user: BTreeMap<&str, Stats> = BTreeMap::new();
    for row in &rows {
        per_user
            .entry(row.usuario.as_str())
            .or_default()
            .add(row.amount, row.hour);
    }

    let summaries = per_user
        .into_iter()
        .map(|(usuario, stats)| DepositSummary {
            usuario:            usuario.to_string(),
            deposito_total:     stats.total,
            deposito_maximo:    stats.max,
            deposito_minimo:    stats.min,
            user_id:            ids.get(usuario).copied(),
            deposito_max_17_23: stats.evening,
        })
        .collect();

    Ok(DepositAggregate { summaries, filter })
}
