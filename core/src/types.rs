//! Shared primitive types used across the entire pipeline.

/// A user key as it appears in the uploaded reports
/// (`usuario` in the wager report, `beneficiario` in the deposit report).
pub type UserKey = String;

/// The canonical run identifier. One per processing request.
pub type RunId = String;

/// Which uploaded report a value, column or warning belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Wagers,
    Deposits,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Wagers   => f.write_str("jugado"),
            SourceKind::Deposits => f.write_str("depósitos"),
        }
    }
}
