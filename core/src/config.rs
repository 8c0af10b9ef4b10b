//! Promotion parameters — the immutable rule set a run is evaluated against.
//!
//! Loaded from a JSON file (`PromotionConfig::load`) or built in code.
//! Every field defaults to the neutral value, so `{}` is a valid config
//! that marks everyone bonificable with a zero bonus.

use crate::error::{PromoError, PromoResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which deposit statistic the thresholds and the bonus are computed on.
/// Read case-insensitively through `FromStr`; written lower-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum DepositBasis {
    /// Sum of all confirmed deposits ("Suma de depósitos").
    #[default]
    Sum,
    /// Largest single deposit ("Depósito máximo").
    Max,
    /// Smallest single deposit ("Depósito mínimo").
    Min,
}

impl TryFrom<String> for DepositBasis {
    type Error = PromoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for DepositBasis {
    type Err = PromoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(DepositBasis::Sum),
            "max" => Ok(DepositBasis::Max),
            "min" => Ok(DepositBasis::Min),
            other => Err(PromoError::InvalidConfig {
                reason: format!("unknown deposit basis '{other}' (expected sum, max or min)"),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionConfig {
    /// Bonus as a percentage of the basis amount.
    pub bonus_percent: f64,
    /// Minimum basis amount required.
    pub min_deposit: f64,
    /// Minimum total wagered required.
    pub min_wagered: f64,
    /// Maximum bonus per user.
    pub bonus_cap: f64,
    pub rollover_enabled: bool,
    /// Only read when `rollover_enabled` is set.
    pub rollover_multiplier: Option<u32>,
    pub deposit_basis: DepositBasis,
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            bonus_percent:       0.0,
            min_deposit:         0.0,
            min_wagered:         0.0,
            bonus_cap:           0.0,
            rollover_enabled:    false,
            rollover_multiplier: None,
            deposit_basis:       DepositBasis::Sum,
        }
    }
}

impl PromotionConfig {
    /// Load from a JSON file and validate it.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PromotionConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("{path}: {e}"))?;
        Ok(config)
    }

    /// Reject values the input form would never have allowed.
    pub fn validate(&self) -> PromoResult<()> {
        let fields = [
            ("bonus_percent", self.bonus_percent),
            ("min_deposit",   self.min_deposit),
            ("min_wagered",   self.min_wagered),
            ("bonus_cap",     self.bonus_cap),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(PromoError::InvalidConfig {
                    reason: format!("{name} must be a finite number >= 0 (got {value})"),
                });
            }
        }

        if self.rollover_enabled && self.rollover_multiplier.map_or(true, |m| m < 1) {
            return Err(PromoError::InvalidConfig {
                reason: "rollover_multiplier must be >= 1 when rollover is enabled".into(),
            });
        }

        Ok(())
    }

    /// The multiplier that actually applies: `None` unless rollover is
    /// enabled with a non-zero multiplier.
    pub fn effective_rollover(&self) -> Option<u32> {
        if self.rollover_enabled {
            self.rollover_multiplier.filter(|m| *m > 0)
        } else {
            None
        }
    }

    /// Config used by the worked scenarios in tests:
    /// 10% bonus capped at 200, min deposit 500, min wagered 100, on the sum.
    pub fn default_test() -> Self {
        Self {
            bonus_percent:       10.0,
            min_deposit:         500.0,
            min_wagered:         100.0,
            bonus_cap:           200.0,
            rollover_enabled:    false,
            rollover_multiplier: None,
            deposit_basis:       DepositBasis::Sum,
        }
    }
}
