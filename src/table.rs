//! The immutable metadata table the rules filter.
//!
//! A [`Table`] is a column store: every column is a typed vector and every row is
//! identified by its index, which never changes for the lifetime of the table. Row
//! subsets are [`RoaringBitmap`]s over those indices, so intersecting the results of
//! many rules stays cheap even for archives with millions of integrations.

use chrono::NaiveDateTime;
use roaring::RoaringBitmap;
use serde_json::Value as Json;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Result, SelectionError};
use crate::value::parse_timestamp;
use crate::ColumnHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
    Text,
    Time,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Int | ColumnKind::Float)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Text(Vec<String>),
    Time(Vec<NaiveDateTime>),
}

/// A borrowed view of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    Int(i64),
    Float(f64),
    Text(&'a str),
    Time(NaiveDateTime),
}

impl Cell<'_> {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(x) => Some(*x),
            _ => None,
        }
    }
}

impl Column {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Int(_) => ColumnKind::Int,
            Column::Float(_) => ColumnKind::Float,
            Column::Text(_) => ColumnKind::Text,
            Column::Time(_) => ColumnKind::Time,
        }
    }
    pub fn len(&self) -> usize {
        match self {
            Column::Int(v) => v.len(),
            Column::Float(v) => v.len(),
            Column::Text(v) => v.len(),
            Column::Time(v) => v.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    pub fn cell(&self, row: usize) -> Option<Cell<'_>> {
        match self {
            Column::Int(v) => v.get(row).map(|i| Cell::Int(*i)),
            Column::Float(v) => v.get(row).map(|x| Cell::Float(*x)),
            Column::Text(v) => v.get(row).map(|s| Cell::Text(s.as_str())),
            Column::Time(v) => v.get(row).map(|t| Cell::Time(*t)),
        }
    }
    /// Collects the indices of every row whose cell satisfies `predicate`.
    pub fn rows_where<F: Fn(Cell<'_>) -> bool>(&self, predicate: F) -> RoaringBitmap {
        let mut rows = RoaringBitmap::new();
        for row in 0..self.len() {
            if let Some(cell) = self.cell(row) {
                if predicate(cell) {
                    // row counts are capped at u32::MAX by the builder
                    rows.insert(row as u32);
                }
            }
        }
        rows
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    order: Vec<String>,
    columns: HashMap<String, Column, ColumnHasher>,
    rows: usize,
}

impl Table {
    pub fn builder() -> TableBuilder {
        TableBuilder::new()
    }

    /// Builds a table from JSON objects, one per row.
    ///
    /// The first record fixes the column set. Column types are inferred: all integers
    /// give an integer column, any other mix of numbers a float column, strings a text
    /// column. Every record must carry exactly the same keys.
    pub fn from_json_records(records: &[Json]) -> Result<Table> {
        let first = match records.first() {
            Some(Json::Object(map)) => map,
            Some(_) => return Err(SelectionError::Schema("records must be JSON objects".into())),
            None => return Table::builder().build(),
        };
        let names: Vec<String> = first.keys().cloned().collect();
        let mut builder = Table::builder();
        for name in &names {
            let mut cells = Vec::with_capacity(records.len());
            for (row, record) in records.iter().enumerate() {
                let map = record.as_object().ok_or_else(|| {
                    SelectionError::Schema(format!("record {row} is not a JSON object"))
                })?;
                if map.len() != names.len() {
                    return Err(SelectionError::Schema(format!(
                        "record {row} has {} fields, expected {}",
                        map.len(),
                        names.len()
                    )));
                }
                let cell = map.get(name).ok_or_else(|| {
                    SelectionError::Schema(format!("record {row} lacks column {name}"))
                })?;
                cells.push(cell);
            }
            builder = builder.column(name, infer_column(name, &cells)?);
        }
        builder.build()
    }

    pub fn len(&self) -> usize {
        self.rows
    }
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
    /// Column names in insertion order.
    pub fn column_names(&self) -> &[String] {
        &self.order
    }
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(&name.to_uppercase())
    }
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(&name.to_uppercase())
    }
    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.column(name).map(Column::kind)
    }
    pub fn cell(&self, name: &str, row: usize) -> Option<Cell<'_>> {
        self.column(name).and_then(|c| c.cell(row))
    }
    /// Every row of the table.
    pub fn all_rows(&self) -> RoaringBitmap {
        let mut rows = RoaringBitmap::new();
        rows.insert_range(0..self.rows as u32);
        rows
    }
}

fn infer_column(name: &str, cells: &[&Json]) -> Result<Column> {
    let mismatch = |row: usize| {
        SelectionError::Schema(format!("column {name} has an inconsistent type at record {row}"))
    };
    match cells.first() {
        Some(Json::String(_)) => {
            let mut texts = Vec::with_capacity(cells.len());
            for (row, cell) in cells.iter().enumerate() {
                texts.push(cell.as_str().ok_or_else(|| mismatch(row))?.to_string());
            }
            Ok(Column::Text(texts))
        }
        Some(Json::Number(_)) if cells.iter().all(|c| c.is_i64()) => {
            Ok(Column::Int(cells.iter().filter_map(|c| c.as_i64()).collect()))
        }
        Some(Json::Number(_)) => {
            let mut numbers = Vec::with_capacity(cells.len());
            for (row, cell) in cells.iter().enumerate() {
                numbers.push(cell.as_f64().ok_or_else(|| mismatch(row))?);
            }
            Ok(Column::Float(numbers))
        }
        _ => Err(SelectionError::Schema(format!(
            "column {name} must hold strings or numbers"
        ))),
    }
}

#[derive(Debug, Default)]
pub struct TableBuilder {
    columns: Vec<(String, Column)>,
    failure: Option<SelectionError>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn column(mut self, name: &str, column: Column) -> Self {
        self.columns.push((name.to_uppercase(), column));
        self
    }
    pub fn ints(self, name: &str, values: Vec<i64>) -> Self {
        self.column(name, Column::Int(values))
    }
    pub fn floats(self, name: &str, values: Vec<f64>) -> Self {
        self.column(name, Column::Float(values))
    }
    pub fn texts<S: Into<String>>(self, name: &str, values: Vec<S>) -> Self {
        self.column(name, Column::Text(values.into_iter().map(Into::into).collect()))
    }
    pub fn times(self, name: &str, values: Vec<NaiveDateTime>) -> Self {
        self.column(name, Column::Time(values))
    }
    /// Adds a timestamp column parsed from archive or ISO-8601 strings.
    pub fn timestamps(mut self, name: &str, values: &[&str]) -> Self {
        let mut times = Vec::with_capacity(values.len());
        for text in values {
            match parse_timestamp(text) {
                Some(t) => times.push(t),
                None => {
                    self.failure.get_or_insert(SelectionError::Schema(format!(
                        "column {} holds an unparseable timestamp: {text}",
                        name.to_uppercase()
                    )));
                    return self;
                }
            }
        }
        self.times(name, times)
    }
    pub fn build(self) -> Result<Table> {
        if let Some(e) = self.failure {
            return Err(e);
        }
        let rows = self.columns.first().map_or(0, |(_, c)| c.len());
        if rows > u32::MAX as usize {
            return Err(SelectionError::Schema(format!("{rows} rows exceed the row index range")));
        }
        let mut order = Vec::with_capacity(self.columns.len());
        let mut columns = HashMap::with_capacity_and_hasher(self.columns.len(), ColumnHasher::default());
        for (name, column) in self.columns {
            if column.len() != rows {
                return Err(SelectionError::Schema(format!(
                    "column {name} has {} rows, expected {rows}",
                    column.len()
                )));
            }
            if columns.insert(name.clone(), column).is_some() {
                return Err(SelectionError::Schema(format!("column {name} is defined twice")));
            }
            order.push(name);
        }
        Ok(Table { order, columns, rows })
    }
}

/// A table restricted to a subset of its rows.
///
/// This is what the calibration side receives from [`crate::Selection::finalize`]: it
/// slices spectra and per-row metadata with the row indices or the boolean mask.
#[derive(Debug, Clone)]
pub struct TableView {
    table: Arc<Table>,
    rows: RoaringBitmap,
}

impl TableView {
    pub fn new(table: Arc<Table>, rows: RoaringBitmap) -> Self {
        Self { table, rows }
    }
    pub fn table(&self) -> &Table {
        &self.table
    }
    pub fn rows(&self) -> &RoaringBitmap {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len() as usize
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    pub fn contains(&self, row: u32) -> bool {
        self.rows.contains(row)
    }
    pub fn row_indices(&self) -> Vec<u32> {
        self.rows.iter().collect()
    }
    /// One flag per row of the underlying table.
    pub fn mask(&self) -> Vec<bool> {
        let mut mask = vec![false; self.table.len()];
        for row in &self.rows {
            mask[row as usize] = true;
        }
        mask
    }
    /// A cell of a row inside the view; rows outside it are not visible.
    pub fn cell(&self, name: &str, row: u32) -> Option<Cell<'_>> {
        if !self.rows.contains(row) {
            return None;
        }
        self.table.cell(name, row as usize)
    }
    /// The cells of one column for every row in the view, in row order.
    pub fn column_cells(&self, name: &str) -> Option<Vec<Cell<'_>>> {
        let column = self.table.column(name)?;
        self.rows.iter().map(|row| column.cell(row as usize)).collect()
    }
}
