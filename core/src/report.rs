//! Result export — the output side of the report boundary.
//!
//! The spreadsheet is what operators download. The CSV carries the same
//! columns for consumers that cannot open a workbook.

use crate::{
    eligibility::ResultRow,
    error::{PromoError, PromoResult},
    identity::UserId,
};
use rust_xlsxwriter::{Format, Workbook, Worksheet};

pub const EXPORT_FILENAME:     &str = "usuarios_bonificables.xlsx";
pub const EXPORT_SHEET:        &str = "Bonificables";
pub const EXPORT_CONTENT_TYPE: &str = "application/octet-stream";

pub const RESULT_COLUMNS: [&str; 10] = [
    "usuario",
    "total_jugado",
    "deposito_total",
    "deposito_maximo",
    "deposito_minimo",
    "user_id",
    "deposito_max_17_23",
    "bonificable",
    "bono",
    "rollover",
];

/// A result value as it lands in an output cell.
#[derive(Debug, Clone, PartialEq)]
enum OutCell {
    Text(String),
    Number(f64),
    Bool(bool),
    Blank,
}

impl From<Option<f64>> for OutCell {
    fn from(value: Option<f64>) -> Self {
        value.map_or(OutCell::Blank, OutCell::Number)
    }
}

impl From<Option<UserId>> for OutCell {
    fn from(value: Option<UserId>) -> Self {
        match value {
            Some(UserId::Resolved(id)) => OutCell::Number(id),
            Some(UserId::NeedsReview)  => OutCell::Text(UserId::NeedsReview.to_string()),
            None                       => OutCell::Blank,
        }
    }
}

fn row_cells(row: &ResultRow) -> [OutCell; 10] {
    [
        OutCell::Text(row.usuario.clone()),
        OutCell::Number(row.total_jugado),
        OutCell::Number(row.deposito_total),
        row.deposito_maximo.into(),
        row.deposito_minimo.into(),
        row.user_id.into(),
        row.deposito_max_17_23.into(),
        OutCell::Bool(row.bonificable),
        OutCell::Number(row.bono),
        row.rollover.into(),
    ]
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &OutCell) -> PromoResult<()> {
    match cell {
        OutCell::Text(s)   => { sheet.write_string(row, col, s.as_str())?; }
        OutCell::Number(n) => { sheet.write_number(row, col, *n)?; }
        OutCell::Bool(b)   => { sheet.write_boolean(row, col, *b)?; }
        OutCell::Blank     => {}
    }
    Ok(())
}

/// Build the downloadable workbook: one sheet, header row, one row per user.
pub fn write_xlsx(rows: &[ResultRow]) -> PromoResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(EXPORT_SHEET)?;

    for (col, name) in RESULT_COLUMNS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *name, &header_format)?;
    }
    for (i, row) in rows.iter().enumerate() {
        let excel_row = (i + 1) as u32;
        for (col, cell) in row_cells(row).iter().enumerate() {
            write_cell(sheet, excel_row, col as u16, cell)?;
        }
    }

    let bytes = workbook.save_to_buffer()?;
    log::debug!("export: {} row(s), {} bytes", rows.len(), bytes.len());
    Ok(bytes)
}

/// Same columns as the workbook, comma delimited, blanks for missing values.
pub fn write_csv(rows: &[ResultRow]) -> PromoResult<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(RESULT_COLUMNS)?;

    for row in rows {
        let fields: Vec<String> = row_cells(row)
            .into_iter()
            .map(|cell| match cell {
                OutCell::Text(s)   => s,
                OutCell::Number(n) => n.to_string(),
                OutCell::Bool(b)   => b.to_string(),
                OutCell::Blank     => String::new(),
            })
            .collect();
        wtr.write_record(&fields)?;
    }

    wtr.into_inner().map_err(|e| PromoError::Io(e.into_error()))
}
