use crate::types::SourceKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromoError {
    #[error("Missing required column(s) in {kind} file: {}", .missing.join(", "))]
    MissingColumn {
        kind: SourceKind,
        missing: Vec<String>,
    },

    #[error("Unsupported file format for '{name}' (expected csv or xlsx)")]
    UnsupportedFormat { name: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Spreadsheet '{name}' has no worksheets")]
    EmptyWorkbook { name: String },

    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid promotion config: {reason}")]
    InvalidConfig { reason: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PromoError {
    /// True for the structural "column not found" class, which the
    /// pipeline reports as a warning instead of failing the request.
    pub fn is_missing_column(&self) -> bool {
        matches!(self, PromoError::MissingColumn { .. })
    }
}

pub type PromoResult<T> = Result<T, PromoError>;
