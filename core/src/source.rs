//! Uploaded report ingestion — turns a named byte stream into a `RawTable`.
//!
//! Two encodings are accepted, picked from the filename extension:
//!   - delimited text (`.csv`, `.txt`), delimiter sniffed from the header line
//!   - spreadsheet (`.xlsx`, `.xlsm`, `.xls`, `.ods`), first worksheet only
//!
//! RULE: cell coercion never fails. A value that cannot be read as the
//! requested type is `None` ("missing") and is skipped by the aggregators.

use crate::error::{PromoError, PromoResult};
use calamine::{Data, Reader};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::io::Cursor;

/// One uploaded file as handed over by the report boundary.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name:  String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }

    /// Read a file from disk, keeping its file name for format detection.
    pub fn from_path(path: &str) -> PromoResult<Self> {
        let bytes = std::fs::read(path)?;
        let name = std::path::Path::new(path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string());
        Ok(Self { name, bytes })
    }

    pub fn format(&self) -> PromoResult<SourceFormat> {
        SourceFormat::from_name(&self.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
}

impl SourceFormat {
    pub fn from_name(name: &str) -> PromoResult<Self> {
        let ext = name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" | "txt"                  => Ok(SourceFormat::Delimited),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(SourceFormat::Spreadsheet),
            _ => Err(PromoError::UnsupportedFormat { name: name.to_string() }),
        }
    }
}

/// A single cell after decoding, before any column-specific coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Bool(bool),
    Text(String),
    DateTime(NaiveDateTime),
}

/// Markers a delimited export uses for "no value".
const NA_MARKERS: &[&str] = &["", "nan", "na", "n/a", "null", "none", "#n/a"];

impl Cell {
    /// Classify a raw delimited-text field.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim();
        if NA_MARKERS.contains(&trimmed.to_lowercase().as_str()) {
            return Cell::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Cell::Number(n);
            }
        }
        if trimmed.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        Cell::Text(raw.to_string())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Numeric coercion: numbers pass through, text is parsed, everything
    /// else is missing.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        }
    }

    /// Timestamp coercion: date-time cells pass through, text is parsed
    /// against the common export formats, everything else is missing.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    /// Textual rendering used for key grouping and string comparisons.
    /// `None` only for empty cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(render_number(*n)),
            Cell::Bool(b) => Some(b.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

/// Integral values render without a fractional part so that ids and
/// user names typed as numbers compare the same across encodings.
pub fn render_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%d-%m-%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%m/%d/%Y", "%d-%m-%Y"];

/// Parse a timestamp as written by the usual back-office exports.
/// Bare dates resolve to midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Decoded report: header names as written, rows padded to header width.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows:    Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Empty);
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Decode an uploaded file according to its extension.
    pub fn from_source(file: &SourceFile) -> PromoResult<Self> {
        match file.format()? {
            SourceFormat::Delimited   => Self::from_delimited(&file.bytes),
            SourceFormat::Spreadsheet => Self::from_spreadsheet(&file.name, &file.bytes),
        }
    }

    pub fn from_delimited(bytes: &[u8]) -> PromoResult<Self> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let header_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
        let delimiter = sniff_delimiter(header_line);

        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .trim(csv::Trim::None)
            .from_reader(bytes);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }
            rows.push(record.iter().map(Cell::from_text).collect());
        }

        log::debug!(
            "delimited source: delimiter={:?} columns={} rows={}",
            delimiter as char,
            headers.len(),
            rows.len()
        );
        Ok(Self::new(headers, rows))
    }

    pub fn from_spreadsheet(name: &str, bytes: &[u8]) -> PromoResult<Self> {
        let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| PromoError::EmptyWorkbook { name: name.to_string() })?;
        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows_iter = range.rows();
        let headers: Vec<String> = match rows_iter.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| match cell {
                    Data::String(s) => s.clone(),
                    Data::Empty => String::new(),
                    other => other.to_string(),
                })
                .collect(),
            None => Vec::new(),
        };

        let rows: Vec<Vec<Cell>> = rows_iter
            .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>())
            .filter(|row: &Vec<Cell>| !row.iter().all(Cell::is_empty))
            .collect();

        log::debug!(
            "spreadsheet source '{name}': sheet={sheet_name:?} columns={} rows={}",
            headers.len(),
            rows.len()
        );
        Ok(Self::new(headers, rows))
    }
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::DateTime(dt) => dt.as_datetime().map_or(Cell::Empty, Cell::DateTime),
        Data::DateTimeIso(s) => parse_timestamp(s).map_or_else(|| Cell::Text(s.clone()), Cell::DateTime),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

const DELIMITER_CANDIDATES: &[u8] = b",;\t|";

/// Pick the candidate delimiter that occurs most often in the header
/// line outside quotes. Ties go to the earlier candidate; no candidate
/// at all falls back to a comma.
pub fn sniff_delimiter(header_line: &[u8]) -> u8 {
    let mut counts = [0usize; 4];
    let mut in_quotes = false;
    for b in header_line {
        if *b == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = DELIMITER_CANDIDATES.iter().position(|c| c == b) {
            counts[i] += 1;
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    DELIMITER_CANDIDATES[best]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn sniffs_semicolon_and_tab() {
        assert_eq!(sniff_delimiter(b"usuario;jugado;ganado"), b';');
        assert_eq!(sniff_delimiter(b"usuario\tjugado"), b'\t');
        assert_eq!(sniff_delimiter(b"\"a;b\",c,d"), b',');
        assert_eq!(sniff_delimiter(b"usuario"), b',');
    }

    #[test]
    fn text_cells_are_classified() {
        assert_eq!(Cell::from_text("150.5"), Cell::Number(150.5));
        assert_eq!(Cell::from_text(" -20 "), Cell::Number(-20.0));
        assert_eq!(Cell::from_text("TRUE"), Cell::Bool(true));
        assert_eq!(Cell::from_text("NaN"), Cell::Empty);
        assert_eq!(Cell::from_text(""), Cell::Empty);
        assert_eq!(Cell::from_text("ana"), Cell::Text("ana".into()));
    }

    #[test]
    fn unparsable_number_is_missing() {
        assert_eq!(Cell::Text("abc".into()).as_number(), None);
        assert_eq!(Cell::Bool(true).as_number(), None);
        assert_eq!(Cell::Text(" 42 ".into()).as_number(), Some(42.0));
    }

    #[test]
    fn timestamps_in_common_formats() {
        let hour = |s: &str| parse_timestamp(s).map(|dt| dt.hour());
        assert_eq!(hour("2024-03-05 18:30:00"), Some(18));
        assert_eq!(hour("2024-03-05T23:59:59.250"), Some(23));
        assert_eq!(hour("25/03/2024 17:05"), Some(17));
        assert_eq!(hour("2024-03-05T20:00:00-03:00"), Some(20));
        assert_eq!(hour("2024-03-05"), Some(0));
        assert_eq!(hour("ayer"), None);
    }

    #[test]
    fn integral_numbers_render_without_fraction() {
        assert_eq!(render_number(7.0), "7");
        assert_eq!(render_number(7.5), "7.5");
        assert_eq!(Cell::Bool(true).as_text().as_deref(), Some("true"));
    }

    #[test]
    fn extension_picks_format() {
        assert_eq!(SourceFormat::from_name("jugado.CSV").unwrap(), SourceFormat::Delimited);
        assert_eq!(SourceFormat::from_name("dep.xlsx").unwrap(), SourceFormat::Spreadsheet);
        assert!(SourceFormat::from_name("dep.pdf").is_err());
        assert!(SourceFormat::from_name("noext").is_err());
    }

    #[test]
    fn short_rows_are_padded() {
        let table = RawTable::from_delimited(b"usuario,jugado,ganado\nana,10\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].len(), 3);
        assert!(table.rows[0][2].is_empty());
    }

    #[test]
    fn corrupt_workbook_is_a_spreadsheet_error() {
        let err = RawTable::from_spreadsheet("dep.xlsx", b"not a zip archive").unwrap_err();
        assert!(matches!(err, PromoError::Spreadsheet(_)), "{err:?}");
    }
}
