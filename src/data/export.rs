use rust_xlsxwriter::Workbook;
use serde::{Deserialize, Serialize};

use crate::config::ExportConfig;

use super::error::{ExportError, TableError};
use super::model::{Field, WideTable};
use super::pairing::pair_columns;

/// Rows taken by the grouped header; data starts right after.
pub const HEADER_ROWS: usize = 2;

/// Largest worksheet an `.xlsx` file can hold.
const XLSX_MAX_ROWS: usize = 1_048_576;
const XLSX_MAX_COLUMNS: usize = 16_384;

// ---------------------------------------------------------------------------
// ExportFormat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Csv => "text/csv",
        }
    }
}

// ---------------------------------------------------------------------------
// ExportHeader
// ---------------------------------------------------------------------------

/// Two-row grouped header: heating rate over each pair, field per column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportHeader {
    pub groups: Vec<String>,
    pub fields: Vec<String>,
}

impl ExportHeader {
    /// Group and field rows for `table`. Re-reading the header joins them
    /// back as `<group>_<field>`, so every pair must be named
    /// `<rate>_Temperature`, `<rate>_CTE` with one shared rate.
    pub fn for_table(table: &WideTable) -> Result<Self, TableError> {
        let pairs = pair_columns(&table.column_names())?;

        let mut groups = Vec::with_capacity(pairs.len() * 2);
        let mut fields = Vec::with_capacity(pairs.len() * 2);
        for pair in &pairs {
            let group = pair_group(&pair.x_name, &pair.y_name).ok_or_else(|| {
                TableError::malformed(format!(
                    "columns '{}' and '{}' are not named <rate>_{} and <rate>_{}",
                    pair.x_name,
                    pair.y_name,
                    Field::Temperature,
                    Field::Cte
                ))
            })?;
            groups.push(group.to_string());
            groups.push(group.to_string());
            fields.push(Field::Temperature.label().to_string());
            fields.push(Field::Cte.label().to_string());
        }

        Ok(ExportHeader { groups, fields })
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Shared rate of a canonically named pair.
fn pair_group<'a>(x_name: &'a str, y_name: &str) -> Option<&'a str> {
    let rate = x_name
        .strip_suffix(Field::Temperature.label())?
        .strip_suffix('_')?;
    let y_rate = y_name.strip_suffix(Field::Cte.label())?.strip_suffix('_')?;
    (!rate.is_empty() && rate == y_rate).then_some(rate)
}

// ---------------------------------------------------------------------------
// WideTableExporter
// ---------------------------------------------------------------------------

/// Writes a processed table back out in its declared column order.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTableExporter {
    sheet_name: String,
    format: ExportFormat,
}

impl Default for WideTableExporter {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

impl WideTableExporter {
    pub fn new(sheet_name: impl Into<String>, format: ExportFormat) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            format,
        }
    }

    pub fn from_config(config: &ExportConfig) -> Self {
        Self::new(config.sheet_name.clone(), config.format)
    }

    pub fn with_format(mut self, format: ExportFormat) -> Self {
        self.format = format;
        self
    }

    pub fn format(&self) -> ExportFormat {
        self.format
    }

    /// Reorder `table` to `declared_order` and serialize it with the grouped
    /// header. Missing and non-finite values become empty cells.
    pub fn export<S: AsRef<str>>(
        &self,
        table: &WideTable,
        declared_order: &[S],
    ) -> Result<Vec<u8>, ExportError> {
        let ordered = table.reordered(declared_order)?;
        let header = ExportHeader::for_table(&ordered)?;

        let bytes = match self.format {
            ExportFormat::Xlsx => self.write_xlsx(&ordered, &header)?,
            ExportFormat::Csv => write_csv(&ordered, &header)?,
        };
        log::info!(
            "Exported {} rows x {} columns as {} ({} bytes)",
            ordered.row_count(),
            ordered.column_count(),
            self.format.extension(),
            bytes.len()
        );
        Ok(bytes)
    }

    fn write_xlsx(&self, table: &WideTable, header: &ExportHeader) -> Result<Vec<u8>, ExportError> {
        let rows = table.row_count() + HEADER_ROWS;
        let columns = table.column_count();
        if rows > XLSX_MAX_ROWS || columns > XLSX_MAX_COLUMNS {
            return Err(ExportError::TooLarge { rows, columns });
        }

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(self.sheet_name.as_str())?;

        // Both limits were checked above, so the casts cannot truncate.
        for (col, (group, field)) in header.groups.iter().zip(&header.fields).enumerate() {
            worksheet.write_string(0, col as u16, group.as_str())?;
            worksheet.write_string(1, col as u16, field.as_str())?;
        }
        for (col, column) in table.columns().iter().enumerate() {
            for (row, &value) in column.values.iter().enumerate() {
                if !value.is_finite() {
                    continue;
                }
                worksheet.write_number((row + HEADER_ROWS) as u32, col as u16, value)?;
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

fn write_csv(table: &WideTable, header: &ExportHeader) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&header.groups)?;
    writer.write_record(&header.fields)?;

    let columns = table.columns();
    for row in 0..table.row_count() {
        let record = columns.iter().map(|c| {
            let value = c.values[row];
            if !value.is_finite() {
                String::new()
            } else {
                value.to_string()
            }
        });
        writer.write_record(record)?;
    }

    writer.flush()?;
    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> WideTable {
        WideTable::from_named(vec![
            ("3K_Temperature", vec![30.0, 31.0]),
            ("3K_CTE", vec![3.0, f64::NAN]),
            ("1K_Temperature", vec![10.0, 11.0]),
            ("1K_CTE", vec![1.0, 1.5]),
        ])
    }

    #[test]
    fn header_groups_repeat_per_pair() {
        let header = ExportHeader::for_table(&sample()).unwrap();
        assert_eq!(header.groups, vec!["3K", "3K", "1K", "1K"]);
        assert_eq!(header.fields, vec!["Temperature", "CTE", "Temperature", "CTE"]);
        assert_eq!(header.len(), 4);
    }

    #[test]
    fn csv_export_follows_declared_order() {
        let exporter = WideTableExporter::default().with_format(ExportFormat::Csv);
        let bytes = exporter
            .export(
                &sample(),
                &["1K_Temperature", "1K_CTE", "3K_Temperature", "3K_CTE"],
            )
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "1K,1K,3K,3K");
        assert_eq!(lines[1], "Temperature,CTE,Temperature,CTE");
        assert_eq!(lines[2], "10,1,30,3");
        assert_eq!(lines[3], "11,1.5,31,");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn mismatched_order_is_rejected() {
        let exporter = WideTableExporter::default();
        let err = exporter
            .export(&sample(), &["1K_Temperature", "1K_CTE", "3K_Temperature"])
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::Table(TableError::ColumnMismatch { .. })
        ));
    }

    #[test]
    fn pairs_must_carry_canonical_names() {
        let table = WideTable::from_named(vec![("a", vec![1.0]), ("b", vec![2.0])]);
        let err = WideTableExporter::default()
            .export(&table, &["a", "b"])
            .unwrap_err();
        assert!(matches!(
            err,
            ExportError::Table(TableError::MalformedTable { .. })
        ));

        let split = WideTable::from_named(vec![
            ("1K_Temperature", vec![1.0]),
            ("3K_CTE", vec![2.0]),
        ]);
        assert!(ExportHeader::for_table(&split).is_err());
    }

    #[test]
    fn non_finite_values_are_blank_in_csv() {
        let table = WideTable::from_named(vec![
            ("1K_Temperature", vec![10.0, 11.0, f64::NEG_INFINITY]),
            ("1K_CTE", vec![f64::INFINITY, 1.5, 2.0]),
        ]);
        let bytes = WideTableExporter::default()
            .with_format(ExportFormat::Csv)
            .export(&table, &table.column_names())
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[2..], ["10,", "11,1.5", ",2"]);
    }

    #[test]
    fn xlsx_export_produces_a_workbook() {
        let bytes = WideTableExporter::default()
            .export(&sample(), &sample().column_names())
            .unwrap();
        // .xlsx files are zip archives.
        assert_eq!(&bytes[..2], b"PK");
    }
}
