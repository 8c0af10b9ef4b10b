//! Column resolution for the two uploaded reports.
//!
//! Headers are matched once, up front. Aggregation only ever sees a
//! resolved mapping of column indices, so a missing column surfaces as a
//! single `MissingColumn` before any row is read.

use crate::{
    error::{PromoError, PromoResult},
    types::SourceKind,
};

/// Header substrings that mark a monetary column in the wager report.
pub const MONEY_MARKERS: &[&str] = &["jugado", "ganado", "neto"];
/// Of the monetary columns, only these are summed into the wagered total.
pub const WAGERED_MARKER: &str = "jugado";

pub const USER_COLUMN:      &str = "usuario";
pub const PAYEE_COLUMN:     &str = "beneficiario";
pub const PAYER_COLUMN:     &str = "pagador";
pub const PAYER_ID_COLUMN:  &str = "id pagador";
pub const AMOUNT_COLUMN:    &str = "CANTIDAD";
pub const TIMESTAMP_COLUMN: &str = "FECHA";
pub const STATUS_COLUMN:    &str = "ESTADO DEL PAGO";
pub const METHOD_COLUMN:    &str = "FORMAS DE PAGO";

/// First header whose trimmed, lower-cased form equals `name`.
pub fn find_normalized(headers: &[String], name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().to_lowercase() == name)
}

/// First header equal to `name` exactly, as written.
pub fn find_literal(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

/// Every header containing one of `markers` (case-insensitive).
pub fn find_containing(headers: &[String], markers: &[&str]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| {
            let lower = h.to_lowercase();
            markers.iter().any(|m| lower.contains(m))
        })
        .map(|(i, _)| i)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WagerSchema {
    pub user: usize,
    /// All jugado/ganado/neto columns. Normalized, not necessarily summed.
    pub money: Vec<usize>,
    /// The subset of `money` summed into `suma_total_jugado`.
    pub wagered: Vec<usize>,
}

impl WagerSchema {
    pub fn resolve(headers: &[String]) -> PromoResult<Self> {
        let user = find_normalized(headers, USER_COLUMN).ok_or_else(|| PromoError::MissingColumn {
            kind: SourceKind::Wagers,
            missing: vec![USER_COLUMN.to_string()],
        })?;

        let money = find_containing(headers, MONEY_MARKERS);
        let wagered = money
            .iter()
            .copied()
            .filter(|i| headers[*i].to_lowercase().contains(WAGERED_MARKER))
            .collect();

        Ok(Self { user, money, wagered })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositSchema {
    pub payee:     usize,
    pub payer:     usize,
    pub payer_id:  usize,
    pub amount:    usize,
    pub timestamp: usize,
    pub status:    usize,
    pub method:    Option<usize>,
}

impl DepositSchema {
    pub fn resolve(headers: &[String]) -> PromoResult<Self> {
        let mut missing = Vec::new();
        let mut require = |found: Option<usize>, name: &str| {
            if found.is_none() {
                missing.push(name.to_string());
            }
            found.unwrap_or_default()
        };

        let payee     = require(find_normalized(headers, PAYEE_COLUMN), PAYEE_COLUMN);
        let payer     = require(find_normalized(headers, PAYER_COLUMN), PAYER_COLUMN);
        let payer_id  = require(find_normalized(headers, PAYER_ID_COLUMN), PAYER_ID_COLUMN);
        let amount    = require(find_literal(headers, AMOUNT_COLUMN), AMOUNT_COLUMN);
        let timestamp = require(find_literal(headers, TIMESTAMP_COLUMN), TIMESTAMP_COLUMN);
        let status    = require(find_literal(headers, STATUS_COLUMN), STATUS_COLUMN);

        if !missing.is_empty() {
            return Err(PromoError::MissingColumn {
                kind: SourceKind::Deposits,
                missing,
            });
        }

        Ok(Self {
            payee,
            payer,
            payer_id,
            amount,
            timestamp,
            status,
            method: find_literal(headers, METHOD_COLUMN),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn wager_schema_matches_markers_case_insensitively() {
        let h = headers(&[" Usuario ", "Jugado Slots", "GANADO", "neto casino", "jugado_vivo", "fecha"]);
        let schema = WagerSchema::resolve(&h).unwrap();
        assert_eq!(schema.user, 0);
        assert_eq!(schema.money, vec![1, 2, 3, 4]);
        assert_eq!(schema.wagered, vec![1, 4]);
    }

    #[test]
    fn wager_schema_requires_user() {
        let err = WagerSchema::resolve(&headers(&["user", "jugado"])).unwrap_err();
        assert!(err.is_missing_column());
    }

    #[test]
    fn deposit_schema_reports_every_missing_column() {
        let h = headers(&["Beneficiario", "cantidad", "FECHA"]);
        match DepositSchema::resolve(&h).unwrap_err() {
            PromoError::MissingColumn { kind, missing } => {
                assert_eq!(kind, SourceKind::Deposits);
                assert_eq!(missing, vec!["pagador", "id pagador", "CANTIDAD", "ESTADO DEL PAGO"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn deposit_schema_method_is_optional() {
        let h = headers(&["BENEFICIARIO", "Pagador", "ID Pagador", "CANTIDAD", "FECHA", "ESTADO DEL PAGO"]);
        let schema = DepositSchema::resolve(&h).unwrap();
        assert_eq!(schema.payer_id, 2);
        assert_eq!(schema.method, None);
    }
}
