//! Up-front checks for builder input.
//!
//! Interactive sessions are easier when every problem is reported at once, so each
//! check walks all of its input and fails with a single error listing every offender.

use crate::alias::AliasTable;
use crate::error::{Result, SelectionError};
use crate::table::{ColumnKind, Table};
use crate::value::Value;

/// Fails with `UnknownKey` naming every key that is neither a column nor an alias of one.
pub fn check_keys<'k, I>(table: &Table, aliases: &AliasTable, keys: I) -> Result<()>
where
    I: IntoIterator<Item = &'k str>,
{
    let unrecognized: Vec<String> = keys
        .into_iter()
        .filter(|k| !table.has_column(&aliases.resolve(k)))
        .map(str::to_uppercase)
        .collect();
    if unrecognized.is_empty() {
        Ok(())
    } else {
        Err(SelectionError::UnknownKey(unrecognized))
    }
}

/// Fails with `NotNumeric` naming every pair whose value is not a number.
pub fn check_numeric(pairs: &[(String, Value)]) -> Result<()> {
    let bad: Vec<(String, String)> = pairs
        .iter()
        .filter(|(_, v)| v.as_number().is_none())
        .map(|(k, v)| (k.clone(), v.to_string()))
        .collect();
    if bad.is_empty() {
        Ok(())
    } else {
        Err(SelectionError::NotNumeric(bad))
    }
}

/// Checks sanitized range criteria, `(column, bounds)` pairs.
///
/// Each bound set must be a sequence of one or two elements with at least one of them
/// given. Bounds must be numbers for numeric columns and timestamps for time columns;
/// text columns cannot be ranged at all.
pub fn check_range(table: &Table, pairs: &[(String, Value)]) -> Result<()> {
    let mut numeric = Vec::new();
    let mut bad = Vec::new();
    for (column, value) in pairs {
        let bounds = match value {
            Value::List(bounds) => bounds,
            other => {
                return Err(SelectionError::malformed(
                    column,
                    format!("range inputs must be a tuple or list, got {other}"),
                ));
            }
        };
        if bounds.is_empty() || bounds.len() > 2 {
            return Err(SelectionError::malformed(
                column,
                format!("couldn't parse {value} as a range"),
            ));
        }
        if bounds.iter().all(Value::is_null) {
            return Err(SelectionError::malformed(column, "a range needs at least one bound"));
        }
        match table.kind(column) {
            Some(ColumnKind::Time) => {
                if let Some(b) = bounds.iter().find(|b| !matches!(b, Value::Null | Value::Time(_))) {
                    return Err(SelectionError::malformed(
                        column,
                        format!("{b} is not a timestamp bound"),
                    ));
                }
            }
            Some(kind) if kind.is_numeric() => numeric.extend(
                bounds
                    .iter()
                    .filter(|b| !b.is_null())
                    .map(|b| (column.clone(), b.clone())),
            ),
            _ => bad.push((column.clone(), format!("{value} (text column)"))),
        }
    }
    if let Err(SelectionError::NotNumeric(more)) = check_numeric(&numeric) {
        bad.extend(more);
    }
    if bad.is_empty() {
        Ok(())
    } else {
        Err(SelectionError::NotNumeric(bad))
    }
}
