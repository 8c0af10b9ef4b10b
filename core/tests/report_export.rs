//! Export tests: the downloadable workbook, read back with calamine.

use calamine::{open_workbook_from_rs, Reader, Xlsx};
use promo_core::{
    eligibility::ResultRow,
    identity::UserId,
    report::{self, EXPORT_FILENAME, EXPORT_SHEET, RESULT_COLUMNS},
    source::{Cell, RawTable},
};
use std::io::Cursor;

fn rows() -> Vec<ResultRow> {
    vec![
        ResultRow {
            usuario:            "ana".into(),
            total_jugado:       500.0,
            deposito_total:     1200.0,
            deposito_maximo:    Some(1000.0),
            deposito_minimo:    Some(200.0),
            user_id:            Some(UserId::Resolved(7.0)),
            deposito_max_17_23: Some(1000.0),
            bonificable:        true,
            bono:               120.0,
            rollover:           Some(0.0),
        },
        ResultRow {
            usuario:            "beto".into(),
            total_jugado:       80.0,
            deposito_total:     300.0,
            deposito_maximo:    Some(300.0),
            deposito_minimo:    Some(300.0),
            user_id:            Some(UserId::NeedsReview),
            deposito_max_17_23: None,
            bonificable:        false,
            bono:               0.0,
            rollover:           Some(0.0),
        },
    ]
}

#[test]
fn workbook_has_single_bonificables_sheet() {
    let bytes = report::write_xlsx(&rows()).unwrap();

    let workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).expect("valid xlsx");
    assert_eq!(workbook.sheet_names(), vec![EXPORT_SHEET.to_string()]);
    assert_eq!(EXPORT_FILENAME, "usuarios_bonificables.xlsx");
}

#[test]
fn workbook_reads_back_through_the_source_decoder() {
    let bytes = report::write_xlsx(&rows()).unwrap();
    let table = RawTable::from_spreadsheet(EXPORT_FILENAME, &bytes).unwrap();

    assert_eq!(table.headers, RESULT_COLUMNS.to_vec());
    assert_eq!(table.len(), 2);

    let ana = &table.rows[0];
    assert_eq!(ana[0], Cell::Text("ana".into()));
    assert_eq!(ana[5], Cell::Number(7.0));
    assert_eq!(ana[7], Cell::Bool(true));
    assert_eq!(ana[8], Cell::Number(120.0));

    let beto = &table.rows[1];
    assert_eq!(beto[5], Cell::Text("revisar ID".into()));
    assert!(beto[6].is_empty(), "missing evening max must export as a blank cell");
    assert_eq!(beto[7], Cell::Bool(false));
}

#[test]
fn empty_result_still_has_header_row() {
    let bytes = report::write_xlsx(&[]).unwrap();
    let table = RawTable::from_spreadsheet(EXPORT_FILENAME, &bytes).unwrap();
    assert_eq!(table.headers.len(), RESULT_COLUMNS.len());
    assert!(table.is_empty());
}
