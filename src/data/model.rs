use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::error::TableError;

/// Returns `true` for the missing-value marker used throughout the tables.
///
/// Missing cells are stored as `f64::NAN`, mirroring how blank spreadsheet
/// cells come out of the reader.
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

// ---------------------------------------------------------------------------
// Field – which half of a measurement pair a column holds
// ---------------------------------------------------------------------------

/// Independent (Temperature) or dependent (CTE) variable of a pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Temperature,
    Cte,
}

impl Field {
    /// Pairing is positional: even positions are Temperature, odd are CTE.
    pub fn for_position(position: usize) -> Self {
        if position % 2 == 0 {
            Field::Temperature
        } else {
            Field::Cte
        }
    }

    /// Label used in canonical column names and the export header.
    pub fn label(self) -> &'static str {
        match self {
            Field::Temperature => "Temperature",
            Field::Cte => "CTE",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// HeatingRate – display label of one measurement block
// ---------------------------------------------------------------------------

/// Heating-rate label such as `1K/min`. Only used for grouping and headers,
/// never for pairing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HeatingRate(String);

impl HeatingRate {
    pub fn new(label: impl Into<String>) -> Self {
        HeatingRate(label.into())
    }

    /// Derive the label from a `<rate>_<field>` column name. Names without an
    /// underscore use the whole name.
    pub fn from_column_name(name: &str) -> Self {
        match name.rsplit_once('_') {
            Some((prefix, _)) if !prefix.is_empty() => HeatingRate(prefix.to_string()),
            _ => HeatingRate(name.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HeatingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ColumnKey – structured identity decided once at ingestion
// ---------------------------------------------------------------------------

/// Structured identity of a column: which block it belongs to and which
/// variable it holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnKey {
    /// Index of the (Temperature, CTE) block in the source layout.
    pub rate_index: usize,
    pub rate: HeatingRate,
    pub field: Field,
}

impl ColumnKey {
    pub fn new(rate_index: usize, rate: HeatingRate, field: Field) -> Self {
        ColumnKey {
            rate_index,
            rate,
            field,
        }
    }

    /// Key for a column found at `position` whose name carries the rate.
    pub fn from_name(position: usize, name: &str) -> Self {
        ColumnKey {
            rate_index: position / 2,
            rate: HeatingRate::from_column_name(name),
            field: Field::for_position(position),
        }
    }

    /// `"<rate>_<field>"`, e.g. `1K/min_Temperature`.
    pub fn canonical_name(&self) -> String {
        format!("{}_{}", self.rate, self.field.label())
    }
}

// ---------------------------------------------------------------------------
// Column / WideTable
// ---------------------------------------------------------------------------

/// One named column of numeric-or-missing values.
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub key: ColumnKey,
    pub values: Vec<f64>,
}

impl Column {
    pub fn new(name: impl Into<String>, key: ColumnKey, values: Vec<f64>) -> Self {
        Column {
            name: name.into(),
            key,
            values,
        }
    }

    /// Number of non-missing values.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| !is_missing(**v)).count()
    }
}

/// Column-block table: several (Temperature, CTE) series side by side.
///
/// All columns share one logical row count; shorter runs are padded with
/// missing values on construction.
#[derive(Debug, Clone, Default)]
pub struct WideTable {
    columns: Vec<Column>,
}

impl WideTable {
    /// Build a table, padding ragged columns to the longest one.
    pub fn new(mut columns: Vec<Column>) -> Self {
        let rows = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        for column in &mut columns {
            column.values.resize(rows, f64::NAN);
        }
        WideTable { columns }
    }

    /// Build a table from plain `(name, values)` columns; keys are derived
    /// from the names and positions.
    pub fn from_named<S: Into<String>>(columns: Vec<(S, Vec<f64>)>) -> Self {
        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(position, (name, values))| {
                let name = name.into();
                let key = ColumnKey::from_name(position, &name);
                Column::new(name, key, values)
            })
            .collect();
        WideTable::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Replace the values of the column at `index`, keeping name and key.
    pub(crate) fn replace_values(&mut self, index: usize, values: Vec<f64>) {
        if let Some(column) = self.columns.get_mut(index) {
            column.values = values;
        }
    }

    /// A copy of the table with columns arranged in `order`.
    ///
    /// `order` must name every column exactly once.
    pub fn reordered<S: AsRef<str>>(&self, order: &[S]) -> Result<WideTable, TableError> {
        let actual: BTreeSet<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();

        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for name in order {
            *seen.entry(name.as_ref()).or_default() += 1;
        }

        let missing: Vec<String> = seen
            .keys()
            .filter(|name| !actual.contains(*name))
            .map(|name| name.to_string())
            .collect();
        let unexpected: Vec<String> = actual
            .iter()
            .filter(|name| !seen.contains_key(*name))
            .map(|name| name.to_string())
            .collect();
        let duplicated: Vec<String> = seen
            .iter()
            .filter(|(_, count)| **count > 1)
            .map(|(name, _)| name.to_string())
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() || !duplicated.is_empty() {
            return Err(TableError::ColumnMismatch {
                missing,
                unexpected,
                duplicated,
            });
        }

        let columns = order
            .iter()
            .filter_map(|name| self.column(name.as_ref()).cloned())
            .collect();
        Ok(WideTable { columns })
    }
}
