//! Eligibility engine — joins the two aggregates and applies the promotion.
//!
//! Join is INNER on `usuario`: a user missing from either report is not
//! in the result. Output keeps the wager aggregate order.
//!
//! Formulas (basis = deposit statistic picked by `deposit_basis`):
//!   bonificable = basis >= min_deposit AND total_jugado >= min_wagered
//!   bono        = bonificable ? round_half_even(min(basis * pct / 100, cap)) : 0
//!   rollover    = rollover enabled ? basis * multiplier : 0

use crate::{
    config::{DepositBasis, PromotionConfig},
    deposit::DepositSummary,
    identity::UserId,
    types::UserKey,
    wager::WagerSummary,
};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub usuario:            UserKey,
    pub total_jugado:       f64,
    pub deposito_total:     f64,
    pub deposito_maximo:    Option<f64>,
    pub deposito_minimo:    Option<f64>,
    pub user_id:            Option<UserId>,
    pub deposito_max_17_23: Option<f64>,
    pub bonificable:        bool,
    pub bono:               f64,
    /// `None` only when rollover applies but the basis amount is missing.
    pub rollover:           Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct EligibilitySummary {
    pub joined:      usize,
    pub eligible:    usize,
    pub total_bonus: f64,
}

impl EligibilitySummary {
    pub fn from_rows(rows: &[ResultRow]) -> Self {
        Self {
            joined:      rows.len(),
            eligible:    rows.iter().filter(|r| r.bonificable).count(),
            total_bonus: rows.iter().map(|r| r.bono).sum(),
        }
    }
}

/// The deposit statistic the promotion is computed on.
pub fn basis_amount(deposit: &DepositSummary, basis: DepositBasis) -> Option<f64> {
    match basis {
        DepositBasis::Sum => Some(deposit.deposito_total),
        DepositBasis::Max => deposit.deposito_maximo,
        DepositBasis::Min => deposit.deposito_minimo,
    }
}

/// Nearest integer, ties to even (2.5 → 2, 3.5 → 4).
pub fn round_bonus(amount: f64) -> f64 {
    amount.round_ties_even()
}

pub fn is_bonificable(basis: Option<f64>, total_jugado: f64, config: &PromotionConfig) -> bool {
    basis.map_or(false, |b| b >= config.min_deposit) && total_jugado >= config.min_wagered
}

pub fn compute_bonus(basis: Option<f64>, bonificable: bool, config: &PromotionConfig) -> f64 {
    match basis {
        Some(b) if bonificable => round_bonus((b * config.bonus_percent / 100.0).min(config.bonus_cap)),
        _ => 0.0,
    }
}

pub fn compute_rollover(basis: Option<f64>, config: &PromotionConfig) -> Option<f64> {
    match config.effective_rollover() {
        Some(multiplier) => basis.map(|b| b * f64::from(multiplier)),
        None => Some(0.0),
    }
}

pub fn evaluate(
    wagers: &[WagerSummary],
    deposits: &[DepositSummary],
    config: &PromotionConfig,
) -> Vec<ResultRow> {
    let by_user: HashMap<&str, &DepositSummary> = deposits
        .iter()
        .map(|d| (d.usuario.as_str(), d))
        .collect();

    wagers
        .iter()
        .filter_map(|w| {
            let deposit = by_user.get(w.usuario.as_str())?;
            let basis = basis_amount(deposit, config.deposit_basis);
            let bonificable = is_bonificable(basis, w.total_jugado, config);

            Some(ResultRow {
                usuario:            w.usuario.clone(),
                total_jugado:       w.total_jugado,
                deposito_total:     deposit.deposito_total,
                deposito_maximo:    deposit.deposito_maximo,
                deposito_minimo:    deposit.deposito_minimo,
                user_id:            deposit.user_id,
                deposito_max_17_23: deposit.deposito_max_17_23,
                bonificable,
                bono:               compute_bonus(basis, bonificable, config),
                rollover:           compute_rollover(basis, config),
            })
        })
        .collect()
}
