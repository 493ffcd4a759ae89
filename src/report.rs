use std::fmt;

/// A plain-text table, as produced by `show()`.
///
/// The cells are kept as strings so a front end can lay them out however it likes;
/// the `Display` impl gives the fixed-width rendering used interactively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Report {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { columns, rows }
    }
    pub fn columns(&self) -> &[String] {
        &self.columns
    }
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
    /// The cell of `row` under the column named `column`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }
}

fn numeric(column: &str) -> bool {
    column == "ID" || column == "# SELECTED"
}

fn write_line(f: &mut fmt::Formatter, columns: &[String], widths: &[usize], cells: &[String]) -> fmt::Result {
    let mut s = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            s.push(' ');
        }
        if numeric(&columns[i]) {
            s += &format!("{:>width$}", cell, width = *width);
        } else {
            s += &format!("{:<width$}", cell, width = *width);
        }
    }
    writeln!(f, "{}", s.trim_end())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let widths = self.widths();
        write_line(f, &self.columns, &widths, &self.columns)?;
        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_line(f, &self.columns, &widths, &dashes)?;
        for row in &self.rows {
            write_line(f, &self.columns, &widths, row)?;
        }
        Ok(())
    }
}
