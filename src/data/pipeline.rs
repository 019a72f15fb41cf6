use crate::config::SmoothingConfig;

use super::error::TableError;
use super::model::{HeatingRate, WideTable};
use super::pairing::pair_columns;
use super::smoother::SeriesSmoother;

/// What happened to one (Temperature, CTE) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairReport {
    pub rate: HeatingRate,
    pub x_name: String,
    pub y_name: String,
    /// `false` when the pair had too few points to smooth.
    pub smoothed: bool,
    pub spikes_removed: usize,
}

/// Per-pair outcome of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub pairs: Vec<PairReport>,
}

impl PipelineReport {
    pub fn spikes_removed(&self) -> usize {
        self.pairs.iter().map(|p| p.spikes_removed).sum()
    }

    pub fn smoothed_pairs(&self) -> usize {
        self.pairs.iter().filter(|p| p.smoothed).count()
    }
}

/// Applies a [`SeriesSmoother`] to every CTE column of a table.
///
/// Temperature columns pass through untouched; names, order and row count of
/// the output always match the input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TablePipeline {
    smoother: SeriesSmoother,
}

impl TablePipeline {
    pub fn new(smoother: SeriesSmoother) -> Self {
        Self { smoother }
    }

    pub fn from_config(config: &SmoothingConfig) -> Self {
        Self::new(SeriesSmoother::from_config(config))
    }

    pub fn smoother(&self) -> &SeriesSmoother {
        &self.smoother
    }

    pub fn process(&self, table: &WideTable) -> Result<WideTable, TableError> {
        self.process_with_report(table).map(|(table, _)| table)
    }

    pub fn process_with_report(
        &self,
        table: &WideTable,
    ) -> Result<(WideTable, PipelineReport), TableError> {
        let pairs = pair_columns(&table.column_names())?;
        let rows = table.row_count();
        let mut output = table.clone();
        let mut report = PipelineReport::default();

        for pair in pairs {
            let x = &table.columns()[pair.x_position()];
            let y = &table.columns()[pair.y_position()];
            let series = self.smoother.smooth_series(&x.values, &y.values);

            if series.values.len() != rows {
                return Err(TableError::RowCountChanged {
                    column: pair.y_name,
                    expected: rows,
                    actual: series.values.len(),
                });
            }

            if series.applied {
                log::debug!(
                    "{}: {} spike(s) removed from '{}'",
                    x.key.rate,
                    series.rejected,
                    pair.y_name
                );
            } else {
                log::warn!(
                    "{}: '{}' has {} values, at most {}; left unsmoothed",
                    x.key.rate,
                    pair.y_name,
                    y.present_count(),
                    self.smoother.min_points()
                );
            }

            report.pairs.push(PairReport {
                rate: x.key.rate.clone(),
                x_name: pair.x_name.clone(),
                y_name: pair.y_name.clone(),
                smoothed: series.applied,
                spikes_removed: series.rejected,
            });
            output.replace_values(pair.y_position(), series.values);
        }

        log::info!(
            "Smoothed {}/{} pairs over {} rows, {} spike(s) removed",
            report.smoothed_pairs(),
            report.pairs.len(),
            rows,
            report.spikes_removed()
        );
        Ok((output, report))
    }
}
