use thiserror::Error;

/// Structural problems with a [`WideTable`](super::model::WideTable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Column count is zero or odd, so no (Temperature, CTE) pairing exists.
    #[error("malformed table: {reason}")]
    MalformedTable { reason: String },

    /// A declared column order does not name exactly the table's columns.
    #[error(
        "column mismatch: missing {missing:?}, unexpected {unexpected:?}, duplicated {duplicated:?}"
    )]
    ColumnMismatch {
        /// Declared but not present in the table.
        missing: Vec<String>,
        /// Present in the table but not declared.
        unexpected: Vec<String>,
        /// Declared more than once.
        duplicated: Vec<String>,
    },

    /// A transform produced a column with a different number of rows.
    #[error("column '{column}' has {actual} rows after processing, expected {expected}")]
    RowCountChanged {
        column: String,
        expected: usize,
        actual: usize,
    },
}

impl TableError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        TableError::MalformedTable {
            reason: reason.into(),
        }
    }
}

/// Failures while serializing a processed table.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Table(#[from] TableError),

    #[error("spreadsheet write failed: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The table does not fit in a single worksheet.
    #[error("table of {rows} rows x {columns} columns exceeds the worksheet limits")]
    TooLarge { rows: usize, columns: usize },
}
