use crate::config::Settings;
use crate::error::{Result, SelectionError};
use crate::table::{ColumnKind, Table};
use crate::value::{parse_angle, parse_timestamp, Value};

/// Turns call-site values into plain comparable ones.
///
/// Coordinate columns receive decimal degrees whatever the caller wrote: a bare number
/// is already degrees, strings and quantities are converted, and sequences are converted
/// element by element with their shape kept. Timestamp columns parse their strings.
/// Everything else passes through untouched.
pub struct Sanitizer<'a> {
    table: &'a Table,
    settings: &'a Settings,
}

impl<'a> Sanitizer<'a> {
    pub fn new(table: &'a Table, settings: &'a Settings) -> Self {
        Self { table, settings }
    }

    /// `key` is the name as the caller wrote it, `column` the column it resolves to.
    pub fn sanitize(&self, key: &str, column: &str, value: &Value) -> Result<Value> {
        let sanitized = if self.settings.is_coordinate(column) || self.settings.is_coordinate(key) {
            to_degrees(column, value)?
        } else if self.table.kind(column) == Some(ColumnKind::Time) {
            to_time(column, value)?
        } else {
            value.clone()
        };
        self.check_for_disallowed_chars(column, &sanitized)?;
        Ok(sanitized)
    }

    /// Extension point for stricter input rules. Coordinates are decimal degrees by the
    /// time they get here, so only text criteria are inspected.
    pub fn check_for_disallowed_chars(&self, column: &str, value: &Value) -> Result<()> {
        if self.settings.disallowed_chars.is_empty() {
            return Ok(());
        }
        match value {
            Value::Text(s) => match s.chars().find(|c| self.settings.disallowed_chars.contains(*c)) {
                Some(c) => Err(SelectionError::malformed(
                    column,
                    format!("'{s}' contains the disallowed character '{c}'"),
                )),
                None => Ok(()),
            },
            Value::List(items) => items
                .iter()
                .try_for_each(|item| self.check_for_disallowed_chars(column, item)),
            _ => Ok(()),
        }
    }
}

fn to_degrees(column: &str, value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Null),
        Value::Int(i) => Ok(Value::Float(*i as f64)),
        Value::Float(x) => Ok(Value::Float(*x)),
        Value::Text(s) => parse_angle(s)
            .map(Value::Float)
            .ok_or_else(|| SelectionError::malformed(column, format!("'{s}' is not a valid angle"))),
        Value::Quantity(q) => q.in_degrees().map(Value::Float).ok_or_else(|| {
            SelectionError::malformed(column, format!("{} is not an angular unit", q.unit()))
        }),
        Value::Time(t) => Err(SelectionError::malformed(column, format!("{t} is not an angle"))),
        Value::List(items) => items
            .iter()
            .map(|item| to_degrees(column, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
    }
}

fn to_time(column: &str, value: &Value) -> Result<Value> {
    match value {
        Value::Text(s) => parse_timestamp(s)
            .map(Value::Time)
            .ok_or_else(|| SelectionError::malformed(column, format!("'{s}' is not a valid timestamp"))),
        Value::List(items) => items
            .iter()
            .map(|item| to_time(column, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        other => Ok(other.clone()),
    }
}
