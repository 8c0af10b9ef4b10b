//! Wager aggregator — total wagered per user from the activity report.
//!
//! Steps:
//!   1. Resolve the `usuario` column and the jugado/ganado/neto columns
//!   2. Normalize every monetary cell to |value| (unparsable → missing)
//!   3. Row total = sum of the jugado columns only
//!   4. Group by user, sum row totals, keep users with total > 0

use crate::{
    error::PromoResult,
    schema::WagerSchema,
    source::RawTable,
    types::UserKey,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WagerSummary {
    pub usuario:      UserKey,
    pub total_jugado: f64,
}

/// A wager row after monetary normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedWagerRow {
    pub usuario: Option<UserKey>,
    /// One entry per monetary column, in schema order. `None` = missing.
    pub amounts: Vec<Option<f64>>,
    pub suma_total_jugado: f64,
}

/// Absolute value of a parsable amount. Sign is meaningless in the
/// reports (losses are sometimes exported negative).
pub fn normalize_amount(value: Option<f64>) -> Option<f64> {
    value.map(f64::abs)
}

pub fn normalize_rows(table: &RawTable, schema: &WagerSchema) -> Vec<NormalizedWagerRow> {
    table
        .rows
        .iter()
        .map(|row| {
            let amounts: Vec<Option<f64>> = schema
                .money
                .iter()
                .map(|i| normalize_amount(row[*i].as_number()))
                .collect();

            let suma_total_jugado = schema
                .money
                .iter()
                .zip(&amounts)
                .filter(|(col, _)| schema.wagered.contains(*col))
                .filter_map(|(_, amount)| *amount)
                .sum();

            NormalizedWagerRow {
                usuario: row[schema.user].as_text(),
                amounts,
                suma_total_jugado,
            }
        })
        .collect()
}

/// Aggregate the wager report. Fails only on a missing `usuario` column.
/// Output is ordered by user key.
pub fn aggregate_wagers(table: &RawTable) -> PromoResult<Vec<WagerSummary>> {
    let schema = WagerSchema::resolve(&table.headers)?;
    log::debug!(
        "wagers: user column {:?}, {} monetary column(s), {} summed",
        table.headers[schema.user],
        schema.money.len(),
        schema.wagered.len()
    );

    let mut totals: BTreeMap<UserKey, f64> = BTreeMap::new();
    for row in normalize_rows(table, &schema) {
        // Rows without a user cannot be grouped.
        let Some(user) = row.usuario else { continue };
        *totals.entry(user).or_insert(0.0) += row.suma_total_jugado;
    }

    Ok(totals
        .into_iter()
        .filter(|(_, total)| *total > 0.0)
        .map(|(usuario, total_jugado)| WagerSummary { usuario, total_jugado })
        .collect())
}
