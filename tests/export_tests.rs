//! Export layout and export → re-ingest round trips.
//!
//! ## Test Organization
//!
//! 1. **Column order** - declared order wins over storage order
//! 2. **Round trip** - raw workbook → pipeline → export → read back
//! 3. **Failures** - mismatched declared order

use rust_xlsxwriter::Workbook;

use cte_despike::config::IngestConfig;
use cte_despike::data::export::{ExportFormat, WideTableExporter};
use cte_despike::data::loader::{load_bytes, reingest_exported};
use cte_despike::data::pipeline::TablePipeline;
use cte_despike::{ExportError, TableError, WideTable};

const SHEET: &str = "Processed Data";

fn block(n: usize, offset: f64) -> (Vec<f64>, Vec<f64>) {
    let x = (0..n).map(|i| 25.0 + 10.0 * i as f64).collect();
    let y = (0..n).map(|i| offset + 0.1 * i as f64).collect();
    (x, y)
}

/// Raw upload layout: directive row, header row, data from row 3.
fn raw_workbook(directive: Option<&str>, blocks: &[(Vec<f64>, Vec<f64>)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Rawdata").unwrap();
    if let Some(text) = directive {
        sheet.write_string(0, 0, text).unwrap();
    }
    for (b, (x, y)) in blocks.iter().enumerate() {
        let col = (2 * b) as u16;
        sheet.write_string(1, col, "T[°C]").unwrap();
        sheet.write_string(1, col + 1, "CTE").unwrap();
        for (r, (xi, yi)) in x.iter().zip(y).enumerate() {
            let row = 2 + r as u32;
            if xi.is_finite() {
                sheet.write_number(row, col, *xi).unwrap();
            }
            if yi.is_finite() {
                sheet.write_number(row, col + 1, *yi).unwrap();
            }
        }
    }
    workbook.save_to_buffer().unwrap()
}

// ============================================================================
// Column Order
// ============================================================================

/// Storage order 3K, 1K exported with declared order 1K, 3K puts the 1K pair
/// in columns 1–2 and the 3K pair in columns 3–4.
#[test]
fn test_declared_order_wins() {
    let (x1, y1) = block(12, 1.0);
    let (x3, y3) = block(12, 3.0);
    let table = WideTable::from_named(vec![
        ("3K_Temperature", x3.clone()),
        ("3K_CTE", y3.clone()),
        ("1K_Temperature", x1.clone()),
        ("1K_CTE", y1.clone()),
    ]);
    let declared = ["1K_Temperature", "1K_CTE", "3K_Temperature", "3K_CTE"];

    let bytes = WideTableExporter::default().export(&table, &declared).unwrap();
    let back = reingest_exported("processed_data.xlsx", &bytes, SHEET).unwrap();

    assert_eq!(back.column_names(), declared);
    assert_eq!(back.columns()[0].values, x1);
    assert_eq!(back.columns()[1].values, y1);
    assert_eq!(back.columns()[2].values, x3);
    assert_eq!(back.columns()[3].values, y3);
}

// ============================================================================
// Round Trip
// ============================================================================

/// Raw workbook with a blank directive row and ragged blocks survives the
/// whole trip with names and row count intact.
#[test]
fn test_xlsx_round_trip_preserves_columns_and_rows() {
    let mut blocks = vec![block(20, 1.0), block(18, 2.0), block(15, 3.0), block(12, 4.0)];
    blocks[0].1[7] = 55.0;

    let raw = raw_workbook(None, &blocks);
    let upload = load_bytes("raw.xlsx", &raw, &IngestConfig::default()).unwrap();
    assert_eq!(upload.table.row_count(), 20);
    assert_eq!(upload.table.column(&upload.column_order()[1]).unwrap().values[7], 55.0);

    let processed = TablePipeline::default().process(&upload.table).unwrap();
    let bytes = WideTableExporter::default()
        .export(&processed, &upload.column_order())
        .unwrap();
    let back = reingest_exported("processed_data.xlsx", &bytes, SHEET).unwrap();

    assert_eq!(back.column_names(), upload.column_order());
    assert_eq!(back.row_count(), upload.table.row_count());

    // The spike is gone and padding rows are still blank.
    let cte = &back.column("1K/min_CTE").unwrap().values;
    assert!((cte[7] - 1.7).abs() < 1e-9);
    let short_temps = &back.column("10K/min_Temperature").unwrap().values;
    assert!(short_temps[12..].iter().all(|v| v.is_nan()));
}

#[test]
fn test_csv_round_trip_preserves_columns_and_rows() {
    let (x, y) = block(14, 5.0);
    let table = WideTable::from_named(vec![
        ("1K/min_Temperature", x.clone()),
        ("1K/min_CTE", y),
        ("3K/min_Temperature", x),
        ("3K/min_CTE", vec![f64::NAN; 14]),
    ]);
    let order = table.column_names();

    let bytes = WideTableExporter::default()
        .with_format(ExportFormat::Csv)
        .export(&table, &order)
        .unwrap();
    let back = reingest_exported("processed_data.csv", &bytes, SHEET).unwrap();

    assert_eq!(back.column_names(), order);
    assert_eq!(back.row_count(), 14);
    assert!(back.column("3K/min_CTE").unwrap().values.iter().all(|v| v.is_nan()));
}

/// Pairs past the configured heating rates are labelled from their header
/// and still come back under their upload names.
#[test]
fn test_round_trip_with_more_pairs_than_rate_labels() {
    let blocks: Vec<_> = (0..6).map(|b| block(12, b as f64)).collect();
    let raw = raw_workbook(Some("six runs"), &blocks);
    let upload = load_bytes("raw.xlsx", &raw, &IngestConfig::default()).unwrap();

    let order = upload.column_order();
    assert_eq!(order.len(), 12);
    assert_eq!(
        order[8..],
        [
            "T[°C].4_Temperature",
            "T[°C].4_CTE",
            "T[°C].5_Temperature",
            "T[°C].5_CTE",
        ]
    );

    let processed = TablePipeline::default().process(&upload.table).unwrap();
    for format in [ExportFormat::Xlsx, ExportFormat::Csv] {
        let bytes = WideTableExporter::default()
            .with_format(format)
            .export(&processed, &order)
            .unwrap();
        let file_name = format!("processed_data.{}", format.extension());
        let back = reingest_exported(&file_name, &bytes, SHEET).unwrap();
        assert_eq!(back.column_names(), order);
        assert_eq!(back.row_count(), 12);
    }
}

/// The directive row may carry text; it is skipped either way.
#[test]
fn test_directive_row_with_text() {
    let raw = raw_workbook(Some("Exported by dilatometer"), &[block(11, 1.0)]);
    let upload = load_bytes("raw.xlsx", &raw, &IngestConfig::default()).unwrap();
    assert_eq!(
        upload.column_order(),
        vec!["1K/min_Temperature", "1K/min_CTE"]
    );
    assert_eq!(upload.source_headers, vec!["T[°C]", "CTE"]);
    assert_eq!(upload.table.row_count(), 11);
}

#[test]
fn test_wrong_sheet_name_is_a_decode_error() {
    let raw = raw_workbook(None, &[block(11, 1.0)]);
    let config = IngestConfig {
        sheet_name: "Measurements".to_string(),
        ..IngestConfig::default()
    };
    let err = load_bytes("raw.xlsx", &raw, &config).unwrap_err();
    assert!(format!("{err:#}").contains("Measurements"));
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_declared_order_must_match_columns() {
    let (x, y) = block(12, 1.0);
    let table = WideTable::from_named(vec![("1K_Temperature", x), ("1K_CTE", y)]);

    let err = WideTableExporter::default()
        .export(&table, &["1K_Temperature", "3K_CTE"])
        .unwrap_err();
    match err {
        ExportError::Table(TableError::ColumnMismatch {
            missing,
            unexpected,
            ..
        }) => {
            assert_eq!(missing, vec!["3K_CTE"]);
            assert_eq!(unexpected, vec!["1K_CTE"]);
        }
        other => panic!("expected ColumnMismatch, got {other:?}"),
    }
}
