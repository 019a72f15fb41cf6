//! End-to-end sessions: upload → smooth → figures → export.

use base64::Engine;
use rust_xlsxwriter::Workbook;

use cte_despike::config::{DespikeConfig, SmoothingConfig};
use cte_despike::data::export::ExportFormat;
use cte_despike::data::loader::reingest_exported;
use cte_despike::Session;

const RATES: [&str; 4] = ["1K/min", "3K/min", "6K/min", "10K/min"];

/// Four runs of `rows` points each; run `b` has a spike at row `3 + b`.
fn raw_workbook(rows: usize) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Rawdata").unwrap();
    sheet.write_string(0, 0, "directive").unwrap();
    for b in 0..4u16 {
        sheet.write_string(1, 2 * b, "T[°C]").unwrap();
        sheet.write_string(1, 2 * b + 1, "CTE").unwrap();
        for r in 0..rows {
            let row = 2 + r as u32;
            let y = if r == 3 + b as usize { 999.0 } else { r as f64 };
            sheet.write_number(row, 2 * b, r as f64 * 10.0).unwrap();
            sheet.write_number(row, 2 * b + 1, y).unwrap();
        }
    }
    workbook.save_to_buffer().unwrap()
}

#[test]
fn test_xlsx_session_end_to_end() {
    let mut session = Session::default();
    assert!(session.upload_bytes("raw.xlsx", &raw_workbook(16)));

    let report = session.smooth().unwrap().report.clone();
    assert_eq!(report.pairs.len(), 4);
    assert_eq!(report.smoothed_pairs(), 4);
    assert_eq!(report.spikes_removed(), 4);

    let processed = session.processed().unwrap();
    for (b, rate) in RATES.iter().enumerate() {
        let cte = &processed.table.column(&format!("{rate}_CTE")).unwrap().values;
        assert_eq!(cte[3 + b], (3 + b) as f64, "spike left in {rate}");
    }

    let figures = session.figures();
    assert_eq!(figures.len(), 4);
    assert_eq!(figures[2].title, "Despiking Analysis at 6K/min Heating Rate");
    assert_eq!(figures[2].raw.len(), 16);

    let file = session.export().unwrap();
    assert_eq!(file.file_name, "processed_data.xlsx");
    let back = reingest_exported(&file.file_name, &file.bytes, "Processed Data").unwrap();
    assert_eq!(back.column_names(), session.upload().unwrap().column_order());
    assert_eq!(back.row_count(), 16);
}

#[test]
fn test_data_url_upload() {
    let payload = base64::engine::general_purpose::STANDARD.encode(raw_workbook(12));
    let url = format!(
        "data:application/vnd.openxmlformats-officedocument.spreadsheetml.sheet;base64,{payload}"
    );

    let mut session = Session::default();
    assert!(session.upload_data_url("raw.xlsx", &url));
    let upload = session.upload().unwrap();
    assert_eq!(upload.file_name, "raw.xlsx");
    assert_eq!(upload.table.column_count(), 8);
    assert_eq!(upload.table.row_count(), 12);
}

#[test]
fn test_data_url_without_base64_marker_is_rejected() {
    let mut session = Session::default();
    assert!(!session.upload_data_url("raw.csv", "data:text/csv,a,b"));
    assert!(!session.is_uploaded());
    assert!(session
        .status_message()
        .unwrap()
        .starts_with("Error processing file:"));
}

/// A new upload discards the previous smoothed table.
#[test]
fn test_reupload_resets_processing() {
    let mut session = Session::default();
    assert!(session.upload_bytes("a.xlsx", &raw_workbook(16)));
    session.smooth().unwrap();
    assert!(session.is_processed());

    assert!(session.upload_bytes("b.xlsx", &raw_workbook(12)));
    assert!(!session.is_processed());
    assert!(session.figures().is_empty());
    assert_eq!(session.upload().unwrap().file_name, "b.xlsx");
}

/// With smoothing effectively disabled the export reproduces the upload.
#[test]
fn test_config_threshold_applies_to_session() {
    let config = DespikeConfig {
        smoothing: SmoothingConfig {
            min_points: 100,
            ..SmoothingConfig::default()
        },
        ..DespikeConfig::default()
    };
    let mut session = Session::new(config);
    assert!(session.upload_bytes("raw.xlsx", &raw_workbook(16)));

    let report = session.smooth().unwrap().report.clone();
    assert_eq!(report.smoothed_pairs(), 0);

    let file = session.export_as(ExportFormat::Csv).unwrap();
    let back = reingest_exported(&file.file_name, &file.bytes, "Processed Data").unwrap();
    assert_eq!(back.column("1K/min_CTE").unwrap().values[3], 999.0);
}
