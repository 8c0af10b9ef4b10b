//! Integration tests for the eligibility engine on hand-built aggregates.

use promo_core::{
    config::{DepositBasis, PromotionConfig},
    deposit::DepositSummary,
    eligibility::{evaluate, EligibilitySummary},
    identity::UserId,
    wager::WagerSummary,
};

// ── Test helpers ────────────────────────────────────────────────────────────

fn wager(user: &str, total: f64) -> WagerSummary {
    WagerSummary { usuario: user.into(), total_jugado: total }
}

fn deposit(user: &str, amounts: &[f64]) -> DepositSummary {
    let max = amounts.iter().copied().fold(None, |m: Option<f64>, a| Some(m.map_or(a, |m| m.max(a))));
    let min = amounts.iter().copied().fold(None, |m: Option<f64>, a| Some(m.map_or(a, |m| m.min(a))));
    DepositSummary {
        usuario:            user.into(),
        deposito_total:     amounts.iter().sum(),
        deposito_maximo:    max,
        deposito_minimo:    min,
        user_id:            Some(UserId::Resolved(1.0)),
        deposito_max_17_23: None,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Users present on one side only never appear in the result.
#[test]
fn join_is_inner_and_keeps_wager_order() {
    let wagers = vec![wager("ana", 500.0), wager("dario", 900.0), wager("eva", 50.0)];
    let deposits = vec![deposit("eva", &[10.0]), deposit("ana", &[1000.0]), deposit("beto", &[300.0])];

    let rows = evaluate(&wagers, &deposits, &PromotionConfig::default());

    let users: Vec<&str> = rows.iter().map(|r| r.usuario.as_str()).collect();
    assert_eq!(users, vec!["ana", "eva"]);
}

/// With every threshold at zero, everyone joined is bonificable.
#[test]
fn zero_thresholds_mark_everyone_eligible() {
    let wagers = vec![wager("ana", 1.0), wager("beto", 2.0)];
    let deposits = vec![deposit("ana", &[0.0]), deposit("beto", &[5.0])];

    let rows = evaluate(&wagers, &deposits, &PromotionConfig::default());
    assert!(rows.iter().all(|r| r.bonificable));
    // Zero percent: eligible, but nothing to pay.
    assert!(rows.iter().all(|r| r.bono == 0.0));
}

/// The basis selects which deposit statistic the rules see.
#[test]
fn deposit_basis_selects_statistic() {
    let wagers = vec![wager("ana", 1000.0)];
    let deposits = vec![deposit("ana", &[100.0, 400.0])];
    let base = PromotionConfig {
        bonus_percent: 100.0,
        min_deposit:   300.0,
        bonus_cap:     10_000.0,
        ..PromotionConfig::default()
    };

    let sum = evaluate(&wagers, &deposits, &base);
    assert_eq!(sum[0].bono, 500.0);

    let max = evaluate(&wagers, &deposits, &PromotionConfig { deposit_basis: DepositBasis::Max, ..base.clone() });
    assert_eq!(max[0].bono, 400.0);

    let min = evaluate(&wagers, &deposits, &PromotionConfig { deposit_basis: DepositBasis::Min, ..base });
    assert!(!min[0].bonificable, "min deposit 100 is below the 300 threshold");
    assert_eq!(min[0].bono, 0.0);
}

/// Bonus never exceeds the cap and is zero whenever not bonificable.
#[test]
fn bonus_respects_cap_and_eligibility() {
    let wagers: Vec<WagerSummary> = (1..=20).map(|i| wager(&format!("u{i:02}"), i as f64 * 50.0)).collect();
    let deposits: Vec<DepositSummary> = (1..=20)
        .map(|i| deposit(&format!("u{i:02}"), &[i as f64 * 137.0]))
        .collect();
    let config = PromotionConfig {
        bonus_percent: 25.0,
        min_deposit:   500.0,
        min_wagered:   300.0,
        bonus_cap:     400.0,
        ..PromotionConfig::default()
    };

    let rows = evaluate(&wagers, &deposits, &config);
    assert_eq!(rows.len(), 20);
    for row in &rows {
        assert!(row.bono <= config.bonus_cap, "{} bono {} over cap", row.usuario, row.bono);
        if !row.bonificable {
            assert_eq!(row.bono, 0.0, "{} not bonificable but bono {}", row.usuario, row.bono);
        }
    }

    let summary = EligibilitySummary::from_rows(&rows);
    assert_eq!(summary.joined, 20);
    assert!(summary.eligible > 0 && summary.eligible < 20);
}

/// Bonus ties round to the even integer.
#[test]
fn bonus_rounds_half_to_even() {
    let wagers = vec![wager("ana", 10.0), wager("beto", 10.0)];
    let deposits = vec![deposit("ana", &[25.0]), deposit("beto", &[35.0])];
    let config = PromotionConfig {
        bonus_percent: 10.0,
        bonus_cap:     100.0,
        ..PromotionConfig::default()
    };

    let rows = evaluate(&wagers, &deposits, &config);
    assert_eq!(rows[0].bono, 2.0); // 2.5
    assert_eq!(rows[1].bono, 4.0); // 3.5
}

/// Rollover is basis × multiplier when enabled, 0 otherwise, even for
/// users who are not bonificable.
#[test]
fn rollover_follows_basis() {
    let wagers = vec![wager("ana", 10.0)];
    let deposits = vec![deposit("ana", &[100.0, 300.0])];

    let off = evaluate(&wagers, &deposits, &PromotionConfig::default());
    assert_eq!(off[0].rollover, Some(0.0));

    let on = PromotionConfig {
        rollover_enabled:    true,
        rollover_multiplier: Some(5),
        min_wagered:         1_000.0,
        deposit_basis:       DepositBasis::Max,
        ..PromotionConfig::default()
    };
    let rows = evaluate(&wagers, &deposits, &on);
    assert!(!rows[0].bonificable);
    assert_eq!(rows[0].rollover, Some(1500.0));
}
