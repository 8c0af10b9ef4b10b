//! promo-runner: headless bonus computation for a promotion.
//!
//! Usage:
//!   promo-runner --wagers jugado.csv --deposits depositos.xlsx \
//!                --bonus-percent 10 --min-deposit 500 --min-wagered 100 \
//!                --bonus-cap 200 --basis sum [--rollover 5] \
//!                [--config promo.json] [--out usuarios_bonificables.xlsx] \
//!                [--csv resultado.csv] [--events]

use anyhow::{bail, Context, Result};
use promo_core::{
    config::{DepositBasis, PromotionConfig},
    pipeline::{Pipeline, PipelineOutcome},
    report::{self, EXPORT_FILENAME},
    source::SourceFile,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let wagers_path = arg_value(&args, "--wagers").context("missing --wagers <file>")?;
    let deposits_path = arg_value(&args, "--deposits").context("missing --deposits <file>")?;
    let out_path = arg_value(&args, "--out").unwrap_or(EXPORT_FILENAME);
    let csv_path = arg_value(&args, "--csv");
    let print_events = args.iter().any(|a| a == "--events");

    let config = build_config(&args)?;

    println!("Promociones — promo-runner");
    println!("  wagers:     {wagers_path}");
    println!("  deposits:   {deposits_path}");
    println!("  basis:      {:?}", config.deposit_basis);
    println!("  bonus:      {}% (cap {})", config.bonus_percent, config.bonus_cap);
    println!("  thresholds: deposit >= {}, wagered >= {}", config.min_deposit, config.min_wagered);
    match config.effective_rollover() {
        Some(m) => println!("  rollover:   x{m}"),
        None => println!("  rollover:   off"),
    }
    println!();

    let wagers = SourceFile::from_path(wagers_path)
        .with_context(|| format!("Cannot read {wagers_path}"))?;
    let deposits = SourceFile::from_path(deposits_path)
        .with_context(|| format!("Cannot read {deposits_path}"))?;

    let outcome = Pipeline::new(config).run(&wagers, &deposits)?;

    if print_events {
        for event in &outcome.events {
            println!("{}", serde_json::to_string(event)?);
        }
    }
    for warning in &outcome.warnings {
        eprintln!("⚠️  {warning}");
    }

    let Some(rows) = &outcome.rows else {
        bail!("no result produced (run {})", outcome.run_id);
    };

    std::fs::write(out_path, report::write_xlsx(rows)?)
        .with_context(|| format!("Cannot write {out_path}"))?;
    if let Some(csv_path) = csv_path {
        std::fs::write(csv_path, report::write_csv(rows)?)
            .with_context(|| format!("Cannot write {csv_path}"))?;
    }

    print_summary(&outcome, out_path);
    Ok(())
}

/// Start from `--config` (or defaults) and apply per-field flag overrides.
fn build_config(args: &[String]) -> Result<PromotionConfig> {
    let mut config = match arg_value(args, "--config") {
        Some(path) => PromotionConfig::load(path)?,
        None => PromotionConfig::default(),
    };

    config.bonus_percent = parse_arg(args, "--bonus-percent", config.bonus_percent)?;
    config.min_deposit = parse_arg(args, "--min-deposit", config.min_deposit)?;
    config.min_wagered = parse_arg(args, "--min-wagered", config.min_wagered)?;
    config.bonus_cap = parse_arg(args, "--bonus-cap", config.bonus_cap)?;

    if let Some(multiplier) = arg_value(args, "--rollover") {
        config.rollover_enabled = true;
        config.rollover_multiplier = Some(
            multiplier
                .parse()
                .with_context(|| format!("invalid --rollover value '{multiplier}'"))?,
        );
    }
    if let Some(basis) = arg_value(args, "--basis") {
        config.deposit_basis = basis.parse::<DepositBasis>()?;
    }

    config.validate()?;
    Ok(config)
}

fn print_summary(outcome: &PipelineOutcome, out_path: &str) {
    let Some(summary) = outcome.summary() else { return };
    println!("=== RUN SUMMARY ===");
    println!("  run_id:       {}", outcome.run_id);
    println!("  joined users: {}", summary.joined);
    println!("  bonificables: {}", summary.eligible);
    println!("  total bono:   {:.0}", summary.total_bonus);
    println!("  written:      {out_path}");
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str, default: T) -> Result<T> {
    match arg_value(args, flag) {
        Some(raw) => raw
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid {flag} value '{raw}'")),
        None => Ok(default),
    }
}
