use std::collections::HashMap;
use tracing::debug;

use crate::error::{Result, SelectionError};
use crate::table::Table;
use crate::ColumnHasher;

/// Case-insensitive short names for table columns.
///
/// Many aliases may point at the same column (`RA`, `GLON` and `GALLON` all mean
/// `CRVAL2` in a GBT index) and a column may have none. Canonical column names always
/// resolve to themselves, so callers never need to know whether they hold an alias.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    map: HashMap<String, String, ColumnHasher>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `alias` to `column`, replacing whatever `alias` meant before.
    pub fn register(&mut self, table: &Table, alias: &str, column: &str) -> Result<()> {
        let column = column.to_uppercase();
        if !table.has_column(&column) {
            return Err(SelectionError::UnknownColumn(column));
        }
        let alias = alias.to_uppercase();
        debug!(%alias, %column, "alias registered");
        self.map.insert(alias, column);
        Ok(())
    }

    /// Registers every pair, or none of them if any target is not a column.
    pub fn register_all<I, A, C>(&mut self, table: &Table, aliases: I) -> Result<()>
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        let pairs: Vec<(A, C)> = aliases.into_iter().collect();
        let unknown: Vec<String> = pairs
            .iter()
            .map(|(_, c)| c.as_ref().to_uppercase())
            .filter(|c| !table.has_column(c))
            .collect();
        if !unknown.is_empty() {
            return Err(SelectionError::UnknownKey(unknown));
        }
        for (alias, column) in &pairs {
            self.register(table, alias.as_ref(), column.as_ref())?;
        }
        Ok(())
    }

    /// The canonical column for `name`, or `name` upper-cased if it is not an alias.
    pub fn resolve(&self, name: &str) -> String {
        let upper = name.to_uppercase();
        match self.map.get(&upper) {
            Some(column) => column.clone(),
            None => upper,
        }
    }

    pub fn get(&self, alias: &str) -> Option<&str> {
        self.map.get(&alias.to_uppercase()).map(String::as_str)
    }

    pub fn aliases(&self) -> &HashMap<String, String, ColumnHasher> {
        &self.map
    }

    /// Aliases that point at `column`, sorted.
    pub fn aliases_of(&self, column: &str) -> Vec<&str> {
        let column = column.to_uppercase();
        let mut found: Vec<&str> = self
            .map
            .iter()
            .filter(|(_, c)| **c == column)
            .map(|(a, _)| a.as_str())
            .collect();
        found.sort_unstable();
        found
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
