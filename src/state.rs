use std::path::Path;

use thiserror::Error;

use crate::config::DespikeConfig;
use crate::data::error::{ExportError, TableError};
use crate::data::export::{ExportFormat, WideTableExporter};
use crate::data::figure::{comparison_figures, ComparisonFigure};
use crate::data::loader::{self, Upload};
use crate::data::model::WideTable;
use crate::data::pipeline::{PipelineReport, TablePipeline};

// ---------------------------------------------------------------------------
// Errors surfaced by a session
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no file has been uploaded")]
    NoUpload,

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Result of the last smoothing pass.
#[derive(Debug, Clone)]
pub struct Processed {
    pub table: WideTable,
    pub report: PipelineReport,
}

/// A processed file ready to be saved or downloaded.
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Everything one user works on: at most one uploaded table and its smoothed
/// counterpart. Uploading a new file discards both.
///
/// Errors are returned to the caller and also kept as a user-facing
/// [`status_message`](Session::status_message).
#[derive(Debug, Clone)]
pub struct Session {
    config: DespikeConfig,
    pipeline: TablePipeline,
    upload: Option<Upload>,
    processed: Option<Processed>,
    status_message: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DespikeConfig::default())
    }
}

impl Session {
    pub fn new(config: DespikeConfig) -> Self {
        Self {
            pipeline: TablePipeline::from_config(&config.smoothing),
            config,
            upload: None,
            processed: None,
            status_message: None,
        }
    }

    pub fn config(&self) -> &DespikeConfig {
        &self.config
    }

    pub fn upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    pub fn processed(&self) -> Option<&Processed> {
        self.processed.as_ref()
    }

    pub fn is_uploaded(&self) -> bool {
        self.upload.is_some()
    }

    pub fn is_processed(&self) -> bool {
        self.processed.is_some()
    }

    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Report a failure that happened outside the session, e.g. while the
    /// front-end wrote an exported file to disk.
    pub fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn clear_status(&mut self) {
        self.status_message = None;
    }

    // -- Upload --

    pub fn open_path(&mut self, path: &Path) -> bool {
        let result = loader::load_file(path, &self.config.ingest);
        self.accept_upload(result)
    }

    pub fn upload_bytes(&mut self, file_name: &str, bytes: &[u8]) -> bool {
        let result = loader::load_bytes(file_name, bytes, &self.config.ingest);
        self.accept_upload(result)
    }

    /// Upload from a `data:<mime>;base64,<payload>` string.
    pub fn upload_data_url(&mut self, file_name: &str, contents: &str) -> bool {
        let result = loader::decode_data_url(contents)
            .and_then(|bytes| loader::load_bytes(file_name, &bytes, &self.config.ingest));
        self.accept_upload(result)
    }

    /// A failed upload leaves the session empty; a partial table is never kept.
    fn accept_upload(&mut self, result: anyhow::Result<Upload>) -> bool {
        self.processed = None;
        match result {
            Ok(upload) => {
                log::info!(
                    "Uploaded '{}' with columns {:?}",
                    upload.file_name,
                    upload.column_order()
                );
                self.status_message = None;
                self.upload = Some(upload);
                true
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error processing file: {e:#}"));
                self.upload = None;
                false
            }
        }
    }

    // -- Smoothing --

    /// Smooth the uploaded table. On failure the session keeps its upload but
    /// has no processed table.
    pub fn smooth(&mut self) -> Result<&Processed, SessionError> {
        self.processed = None;
        let result = self
            .upload
            .as_ref()
            .ok_or(SessionError::NoUpload)
            .and_then(|upload| Ok(self.pipeline.process_with_report(&upload.table)?));

        match result {
            Ok((table, report)) => {
                self.status_message = None;
                Ok(self.processed.insert(Processed { table, report }))
            }
            Err(e) => {
                log::error!("Smoothing failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
                Err(e)
            }
        }
    }

    /// Raw vs smoothed series per heating rate; empty until smoothed.
    pub fn figures(&self) -> Vec<ComparisonFigure> {
        let (Some(upload), Some(processed)) = (&self.upload, &self.processed) else {
            return Vec::new();
        };
        comparison_figures(&upload.table, &processed.table).unwrap_or_else(|e| {
            log::error!("Building figures failed: {e}");
            Vec::new()
        })
    }

    // -- Export --

    /// Export in the configured format.
    pub fn export(&mut self) -> Result<ExportedFile, SessionError> {
        let format = self.config.export.format;
        self.export_as(format)
    }

    /// Export the smoothed table in the column order captured at upload.
    /// Smooths first when that has not happened yet.
    pub fn export_as(&mut self, format: ExportFormat) -> Result<ExportedFile, SessionError> {
        let result = self.build_export(format);
        if let Err(e) = &result {
            log::error!("Export failed: {e}");
            self.status_message = Some(format!("Error: {e}"));
        }
        result
    }

    fn build_export(&self, format: ExportFormat) -> Result<ExportedFile, SessionError> {
        let upload = self.upload.as_ref().ok_or(SessionError::NoUpload)?;
        let smoothed;
        let table = match &self.processed {
            Some(processed) => &processed.table,
            None => {
                smoothed = self.pipeline.process(&upload.table)?;
                &smoothed
            }
        };

        let exporter = WideTableExporter::from_config(&self.config.export).with_format(format);
        let bytes = exporter.export(table, &upload.column_order())?;
        Ok(ExportedFile {
            file_name: self.config.export.file_name(format),
            mime_type: format.mime_type(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_upload(pairs: usize, rows: usize) -> String {
        let mut text = String::from("directive\n");
        let header: Vec<&str> = (0..pairs).flat_map(|_| ["T[°C]", "CTE"]).collect();
        text.push_str(&header.join(","));
        text.push('\n');
        for r in 0..rows {
            let row: Vec<String> = (0..pairs)
                .flat_map(|_| [format!("{}", r * 10), format!("{}", r + 1)])
                .collect();
            text.push_str(&row.join(","));
            text.push('\n');
        }
        text
    }

    #[test]
    fn fresh_session_has_nothing_to_do() {
        let mut session = Session::default();
        assert!(!session.is_uploaded());
        assert!(matches!(session.smooth(), Err(SessionError::NoUpload)));
        assert!(matches!(session.export(), Err(SessionError::NoUpload)));
        assert!(session.figures().is_empty());
        assert!(session.status_message().is_some());
    }

    #[test]
    fn failed_upload_clears_previous_state() {
        let mut session = Session::default();
        assert!(session.upload_bytes("a.csv", csv_upload(2, 12).as_bytes()));
        session.smooth().unwrap();
        assert!(session.is_processed());

        assert!(!session.upload_bytes("b.csv", b"directive only\n"));
        assert!(!session.is_uploaded());
        assert!(!session.is_processed());
        assert!(session
            .status_message()
            .unwrap()
            .starts_with("Error processing file:"));
    }

    #[test]
    fn odd_column_upload_is_a_recoverable_smoothing_error() {
        let mut session = Session::default();
        assert!(session.upload_bytes("odd.csv", b"d\nT,CTE,T\n1,2,3\n"));
        assert!(matches!(
            session.smooth(),
            Err(SessionError::Table(TableError::MalformedTable { .. }))
        ));
        assert!(session.is_uploaded());
        assert!(!session.is_processed());
    }

    #[test]
    fn export_without_explicit_smoothing_still_smooths() {
        let mut session = Session::default();
        assert!(session.upload_bytes("a.csv", csv_upload(4, 12).as_bytes()));
        let file = session.export_as(ExportFormat::Csv).unwrap();
        assert_eq!(file.file_name, "processed_data.csv");
        let text = String::from_utf8(file.bytes).unwrap();
        assert!(text.starts_with(
            "1K/min,1K/min,3K/min,3K/min,6K/min,6K/min,10K/min,10K/min\n\
             Temperature,CTE,Temperature,CTE,Temperature,CTE,Temperature,CTE\n"
        ));
        assert_eq!(text.lines().count(), 2 + 12);
    }
}
