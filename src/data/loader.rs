use std::collections::{BTreeMap, BTreeSet};
use std::io::Cursor;
use std::path::Path;

use anyhow::{bail, Context, Result};
use base64::Engine;
use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};

use crate::config::IngestConfig;

use super::model::{Column, ColumnKey, Field, HeatingRate, WideTable};

// ---------------------------------------------------------------------------
// Upload – result of ingesting one file
// ---------------------------------------------------------------------------

/// A decoded upload: the renamed table plus what the file originally said.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub table: WideTable,
    /// Header texts as found in the file, in column order.
    pub source_headers: Vec<String>,
}

impl Upload {
    /// Canonical column order captured at upload; exports follow it.
    pub fn column_order(&self) -> Vec<String> {
        self.table.column_names()
    }

    /// `(source header, canonical name)` for every column.
    pub fn rename_map(&self) -> Vec<(String, String)> {
        self.source_headers
            .iter()
            .cloned()
            .zip(self.table.column_names())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a raw-data file from disk.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` – workbook with the configured raw-data sheet
/// * `.csv`            – same layout, one sheet
pub fn load_file(path: &Path, config: &IngestConfig) -> Result<Upload> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_bytes(&file_name, &bytes, config)
}

/// Decode an uploaded raw-data file held in memory.
///
/// Layout: `skip_rows` directive rows, one header row, then data. Columns are
/// renamed by position to `<rate>_Temperature` / `<rate>_CTE`.
pub fn load_bytes(file_name: &str, bytes: &[u8], config: &IngestConfig) -> Result<Upload> {
    let grid = read_grid(file_name, bytes, &config.sheet_name)?;
    let (headers, data) = split_single_header(grid, config.skip_rows)?;
    let table = canonical_table(&headers, data, &config.rate_labels);

    log::info!(
        "Loaded '{file_name}': {} columns x {} rows",
        table.column_count(),
        table.row_count()
    );
    Ok(Upload {
        file_name: file_name.to_string(),
        table,
        source_headers: headers,
    })
}

/// Read back a file written by the exporter (two grouped header rows).
/// Columns are named `<group>_<field>`.
pub fn reingest_exported(file_name: &str, bytes: &[u8], sheet_name: &str) -> Result<WideTable> {
    let grid = read_grid(file_name, bytes, sheet_name)?;
    let (groups, fields, data) = split_grouped_header(grid)?;

    let columns = groups
        .iter()
        .zip(&fields)
        .enumerate()
        .map(|(position, (group, field))| {
            let key = ColumnKey::new(
                position / 2,
                HeatingRate::new(group.as_str()),
                Field::for_position(position),
            );
            (format!("{group}_{field}"), key)
        })
        .collect::<Vec<_>>();
    Ok(build_table(columns, &data))
}

/// Decode a browser upload payload: `data:<mime>;base64,<payload>`.
pub fn decode_data_url(contents: &str) -> Result<Vec<u8>> {
    let (meta, payload) = contents
        .split_once(',')
        .context("upload payload has no ',' separator")?;
    if !meta.ends_with(";base64") {
        bail!("upload payload is not base64 encoded");
    }
    base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("decoding base64 upload payload")
}

// ---------------------------------------------------------------------------
// Cell grid
// ---------------------------------------------------------------------------

/// A single cell as read from either file format.
#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Number(f64),
    Text(String),
    Empty,
}

impl Cell {
    fn from_text(s: &str) -> Self {
        let s = s.trim();
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    fn from_xlsx(data: &Data) -> Self {
        match data {
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::String(s) => Cell::from_text(s),
            Data::Empty | Data::Error(_) => Cell::Empty,
            other => Cell::from_text(&other.to_string()),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    fn header_text(&self) -> String {
        match self {
            Cell::Number(v) => v.to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Empty => String::new(),
        }
    }

    /// Numbers as-is, numeric text parsed, everything else missing.
    fn value(&self) -> f64 {
        match self {
            Cell::Number(v) => *v,
            Cell::Text(s) => s.parse::<f64>().unwrap_or(f64::NAN),
            Cell::Empty => f64::NAN,
        }
    }
}

type Grid = Vec<Vec<Cell>>;

fn read_grid(file_name: &str, bytes: &[u8], sheet_name: &str) -> Result<Grid> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" => read_xlsx(bytes, sheet_name),
        "csv" => read_csv(bytes),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

fn read_xlsx(bytes: &[u8], sheet_name: &str) -> Result<Grid> {
    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(Cursor::new(bytes)).context("opening workbook")?;

    let sheets = workbook.sheet_names();
    if !sheets.iter().any(|s| s == sheet_name) {
        bail!("workbook has no sheet named '{sheet_name}' (found {sheets:?})");
    }
    let range = workbook
        .worksheet_range(sheet_name)
        .with_context(|| format!("reading sheet '{sheet_name}'"))?;

    // The range starts at the first used cell; keep absolute row positions so
    // directive rows are counted even when they are blank.
    let leading_rows = range.start().map_or(0, |(row, _)| row as usize);
    let mut grid: Grid = vec![Vec::new(); leading_rows];
    grid.extend(
        range
            .rows()
            .map(|row| row.iter().map(Cell::from_xlsx).collect::<Vec<_>>()),
    );
    Ok(grid)
}

fn read_csv(bytes: &[u8]) -> Result<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Grid::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        grid.push(record.iter().map(Cell::from_text).collect());
    }
    Ok(grid)
}

// ---------------------------------------------------------------------------
// Header handling
// ---------------------------------------------------------------------------

fn is_blank(row: &[Cell]) -> bool {
    row.iter().all(Cell::is_empty)
}

/// Skip the directive rows, take the next non-blank row as header.
fn split_single_header(grid: Grid, skip_rows: usize) -> Result<(Vec<String>, Grid)> {
    let mut rows = grid.into_iter().skip(skip_rows).skip_while(|r| is_blank(r));
    let header = rows.next().context("no header row found")?;
    let data: Grid = rows.collect();

    let width = table_width(&header, &data);
    let headers = (0..width)
        .map(|i| header.get(i).map(Cell::header_text).unwrap_or_default())
        .collect();
    Ok((headers, data))
}

/// First two non-blank rows are the group and field headers. Blank group
/// cells repeat the group to their left.
fn split_grouped_header(grid: Grid) -> Result<(Vec<String>, Vec<String>, Grid)> {
    let mut rows = grid.into_iter().skip_while(|r| is_blank(r));
    let group_row = rows.next().context("no group header row found")?;
    let field_row = rows.next().context("no field header row found")?;
    let data: Grid = rows.collect();

    let width = table_width(&group_row, &data).max(field_row.len());
    let mut groups = Vec::with_capacity(width);
    let mut current = String::new();
    for i in 0..width {
        let text = group_row.get(i).map(Cell::header_text).unwrap_or_default();
        if !text.is_empty() {
            current = text;
        }
        groups.push(current.clone());
    }
    let fields = (0..width)
        .map(|i| field_row.get(i).map(Cell::header_text).unwrap_or_default())
        .collect();
    Ok((groups, fields, data))
}

/// Number of columns: the widest of header and data, ignoring trailing
/// columns with neither a header nor any value.
fn table_width(header: &[Cell], data: &[Vec<Cell>]) -> usize {
    let widest = data.iter().map(Vec::len).chain([header.len()]).max().unwrap_or(0);
    (0..widest)
        .rev()
        .find(|&i| {
            header.get(i).is_some_and(|c| !c.is_empty())
                || data.iter().any(|r| r.get(i).is_some_and(|c| !c.is_empty()))
        })
        .map_or(0, |i| i + 1)
}

/// Apply the positional rename: pair `i` becomes `<label>_Temperature` and
/// `<label>_CTE`, where the label is `rate_labels[i]` or, past the configured
/// labels, the pair's deduplicated Temperature header. A trailing unpaired
/// column keeps its header text.
fn canonical_table(headers: &[String], data: Grid, rate_labels: &[String]) -> WideTable {
    let deduped = dedup_headers(headers);
    let labels = pair_labels(&deduped, rate_labels);

    let columns = deduped
        .into_iter()
        .enumerate()
        .map(|(position, header)| match labels.get(position / 2) {
            Some(label) => {
                let key = ColumnKey::new(
                    position / 2,
                    HeatingRate::new(label.as_str()),
                    Field::for_position(position),
                );
                (key.canonical_name(), key)
            }
            None => {
                let key = ColumnKey::from_name(position, &header);
                (header, key)
            }
        })
        .collect::<Vec<_>>();
    build_table(columns, &data)
}

/// One distinct group label per complete pair.
fn pair_labels(headers: &[String], rate_labels: &[String]) -> Vec<String> {
    let mut used: BTreeSet<String> = BTreeSet::new();
    (0..headers.len() / 2)
        .map(|i| {
            let base = rate_labels
                .get(i)
                .cloned()
                .unwrap_or_else(|| headers[2 * i].clone());
            let mut label = base.clone();
            let mut n = 1;
            while used.contains(&label) {
                label = format!("{base}.{n}");
                n += 1;
            }
            used.insert(label.clone());
            label
        })
        .collect()
}

/// Spreadsheet-reader style header cleanup: blanks become `Unnamed: <i>`,
/// repeats get `.1`, `.2`, … suffixes.
fn dedup_headers(headers: &[String]) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            let base = if h.is_empty() {
                format!("Unnamed: {i}")
            } else {
                h.clone()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{base}.{count}")
            };
            *count += 1;
            name
        })
        .collect()
}

/// Fill columns from the data rows. Trailing blank rows are dropped; blank
/// rows inside the data stay as all-missing rows.
fn build_table(columns: Vec<(String, ColumnKey)>, data: &[Vec<Cell>]) -> WideTable {
    let rows = data
        .iter()
        .rposition(|r| !is_blank(r))
        .map_or(0, |last| last + 1);

    let columns = columns
        .into_iter()
        .enumerate()
        .map(|(i, (name, key))| {
            let values = data[..rows]
                .iter()
                .map(|r| r.get(i).map_or(f64::NAN, Cell::value))
                .collect();
            Column::new(name, key, values)
        })
        .collect();
    WideTable::new(columns)
}
