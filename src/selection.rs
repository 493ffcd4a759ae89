//! The selection engine: rule builders on top of the alias table, the sanitizer, the
//! validators and the rule store.
//!
//! Every builder call is atomic. Keys are checked, values sanitized and validated and
//! the candidate row set computed before the store is touched, so a failing call leaves
//! no trace. Within one call the constraints on different keys are ANDed; across calls
//! the rules are ANDed again by [`Selection::finalize`].

use roaring::RoaringBitmap;
use std::sync::Arc;
use tracing::debug;

use crate::alias::AliasTable;
use crate::channel::ChannelSelection;
use crate::config::Settings;
use crate::error::{Result, SelectionError};
use crate::report::Report;
use crate::rule::{Rule, RuleId, RuleStore};
use crate::sanitize::Sanitizer;
use crate::table::{Cell, Column, ColumnKind, Table, TableView};
use crate::validate::{check_keys, check_range};
use crate::value::Value;

/// Keyword arguments for one builder call, plus an optional tag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    tag: Option<String>,
    entries: Vec<(String, Value)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with<V: Into<Value>>(mut self, key: &str, value: V) -> Self {
        self.entries.push((key.to_string(), value.into()));
        self
    }
    pub fn tagged<S: Into<String>>(mut self, tag: S) -> Self {
        self.tag = Some(tag.into());
        self
    }
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }
    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A candidate: the rendered criteria and the rows they select.
type Candidate = (Vec<(String, String)>, RoaringBitmap);

pub struct Selection {
    table: Arc<Table>,
    settings: Settings,
    aliases: AliasTable,
    store: RuleStore,
    channels: ChannelSelection,
}

impl Selection {
    /// A selection over `table` with the default settings.
    pub fn new(table: Arc<Table>) -> Self {
        let settings = Settings::default();
        let aliases = default_aliases(&table, &settings);
        Self {
            store: RuleStore::new(settings.tag_length),
            table,
            settings,
            aliases,
            channels: ChannelSelection::new(),
        }
    }

    pub fn with_settings(table: Arc<Table>, settings: Settings) -> Result<Self> {
        settings.validate()?;
        let aliases = default_aliases(&table, &settings);
        Ok(Self {
            store: RuleStore::new(settings.tag_length),
            table,
            settings,
            aliases,
            channels: ChannelSelection::new(),
        })
    }

    pub fn table(&self) -> &Arc<Table> {
        &self.table
    }
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }
    /// Read access to the rule ledger.
    pub fn rules(&self) -> &RuleStore {
        &self.store
    }

    /// Lets `alias` stand for `column` in every later call, e.g. `alias("lon", "crval2")`.
    pub fn alias(&mut self, alias: &str, column: &str) -> Result<()> {
        self.aliases.register(&self.table, alias, column)
    }

    pub fn alias_all<I, A, C>(&mut self, aliases: I) -> Result<()>
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        self.aliases.register_all(&self.table, aliases)
    }

    // ------------- exact -------------

    /// Adds an exact-match rule. A list of strings matches any of its members, and so
    /// does a list of angle strings or angle quantities on a coordinate column; numeric
    /// lists are refused because they are ranges in disguise.
    pub fn select(&mut self, criteria: Criteria) -> Result<Option<RuleId>> {
        let (rendered, rows) = self.exact_candidate(&criteria)?;
        self.store.add(rendered, rows, criteria.tag)
    }

    pub fn preview_select(&self, criteria: &Criteria) -> Result<RoaringBitmap> {
        self.exact_candidate(criteria).map(|(_, rows)| rows)
    }

    fn exact_candidate(&self, criteria: &Criteria) -> Result<Candidate> {
        let entries = self.resolve(criteria)?;
        // lists are judged as given, before angles become degrees
        for ((column, value), (key, raw)) in entries.iter().zip(&criteria.entries) {
            let coordinate = self.settings.is_coordinate(column) || self.settings.is_coordinate(key);
            let any_of = |v: &Value| match v {
                Value::Text(_) => true,
                Value::Quantity(_) => coordinate,
                _ => false,
            };
            match raw {
                Value::List(items) if items.is_empty() => {
                    return Err(SelectionError::malformed(column, "an any-of list needs at least one value"));
                }
                Value::List(items) if !items.iter().all(any_of) => {
                    return Err(SelectionError::malformed(
                        column,
                        format!("numeric lists are not allowed with exact selection, use select_range instead: {value}"),
                    ));
                }
                Value::Null => {
                    return Err(SelectionError::malformed(column, "None cannot be matched exactly"));
                }
                _ => (),
            }
        }
        let mut rows = self.table.all_rows();
        for (column, value) in &entries {
            rows &= &self.column(column)?.rows_where(|cell| matches_exactly(cell, value));
        }
        debug!(rows = rows.len(), "exact candidate computed");
        Ok((render(&entries), rows))
    }

    // ------------- range -------------

    /// Adds an inclusive range rule: `(lo, hi)`, `(None, hi)`, `(lo, None)` or `(lo,)`.
    pub fn select_range(&mut self, criteria: Criteria) -> Result<Option<RuleId>> {
        let (rendered, rows) = self.range_candidate(&criteria)?;
        self.store.add(rendered, rows, criteria.tag)
    }

    pub fn preview_range(&self, criteria: &Criteria) -> Result<RoaringBitmap> {
        self.range_candidate(criteria).map(|(_, rows)| rows)
    }

    fn range_candidate(&self, criteria: &Criteria) -> Result<Candidate> {
        let entries: Vec<(String, Value)> = self
            .resolve(criteria)?
            .into_iter()
            .map(|(column, value)| (column, without_units(value)))
            .collect();
        check_range(&self.table, &entries)?;
        let mut rows = self.table.all_rows();
        for (column, value) in &entries {
            let Value::List(bounds) = value else {
                return Err(SelectionError::malformed(column, "range inputs must be a tuple or list"));
            };
            let lo = bounds.first().unwrap_or(&Value::Null);
            let hi = bounds.get(1).unwrap_or(&Value::Null);
            rows &= &self.column(column)?.rows_where(|cell| within_bounds(cell, lo, hi));
        }
        debug!(rows = rows.len(), "range candidate computed");
        Ok((render(&entries), rows))
    }

    // ------------- within -------------

    /// Adds a tolerance rule, `(center, epsilon)`, selecting
    /// `center - epsilon <= value <= center + epsilon`.
    pub fn select_within(&mut self, criteria: Criteria) -> Result<Option<RuleId>> {
        let ranged = self.within_as_range(&criteria)?;
        self.select_range(ranged)
    }

    pub fn preview_within(&self, criteria: &Criteria) -> Result<RoaringBitmap> {
        self.preview_range(&self.within_as_range(criteria)?)
    }

    fn within_as_range(&self, criteria: &Criteria) -> Result<Criteria> {
        check_keys(&self.table, &self.aliases, criteria.entries.iter().map(|(k, _)| k.as_str()))?;
        let sanitizer = Sanitizer::new(&self.table, &self.settings);
        let mut ranged = Criteria { tag: criteria.tag.clone(), entries: Vec::new() };
        for (key, value) in &criteria.entries {
            let pair = match value {
                Value::List(pair) if pair.len() == 2 => pair,
                _ => {
                    return Err(SelectionError::malformed(
                        &key.to_uppercase(),
                        format!("within inputs must be (value, epsilon), got {value}"),
                    ));
                }
            };
            if pair.iter().any(Value::is_null) {
                return Err(SelectionError::malformed(
                    &key.to_uppercase(),
                    format!("within needs both a value and an epsilon, got {value}"),
                ));
            }
            let column = self.aliases.resolve(key);
            let coordinate = self.settings.is_coordinate(&column) || self.settings.is_coordinate(key);
            let (center, epsilon) = if coordinate {
                (pair[0].clone(), pair[1].clone())
            } else {
                common_unit(&column, &pair[0], &pair[1])?
            };
            let number = |v: &Value| -> Result<Option<f64>> {
                if coordinate {
                    Ok(sanitizer.sanitize(&key.to_uppercase(), &column, v)?.as_number())
                } else {
                    Ok(v.as_number())
                }
            };
            let bounds = match (number(&center)?, number(&epsilon)?) {
                (Some(center), Some(epsilon)) => {
                    Value::List(vec![Value::Float(center - epsilon), Value::Float(center + epsilon)])
                }
                // leave it to the range checks to report
                _ => value.clone(),
            };
            ranged.entries.push((key.clone(), bounds));
        }
        Ok(ranged)
    }

    // ------------- time -------------

    /// Adds a range rule on the time column (`DATE-OBS` by default). Bounds may be
    /// date-times or timestamp strings, and either may be `None`.
    pub fn select_time<V: Into<Value>>(&mut self, bounds: V, tag: Option<&str>) -> Result<Option<RuleId>> {
        let column = self.settings.time_column.to_uppercase();
        match self.table.kind(&column) {
            None => return Err(SelectionError::UnknownKey(vec![column])),
            Some(ColumnKind::Time) => (),
            Some(_) => {
                return Err(SelectionError::malformed(&column, "column does not hold timestamps"));
            }
        }
        let mut criteria = Criteria::new().with(&column, bounds);
        criteria.tag = tag.map(str::to_string);
        self.select_range(criteria)
    }

    // ------------- channels -------------

    /// Selects spectral channels. These never take part in [`Selection::finalize`].
    pub fn select_channel<V: Into<Value>>(&mut self, channels: V) -> Result<()> {
        self.channels.add(&channels.into())
    }
    pub fn channels(&self) -> &ChannelSelection {
        &self.channels
    }
    pub fn channel_mask(&self, nchan: usize) -> Vec<bool> {
        self.channels.mask(nchan)
    }
    pub fn clear_channels(&mut self) {
        self.channels.clear();
    }

    // ------------- bookkeeping -------------

    /// Removes rules by id or by tag; give exactly one.
    pub fn remove(&mut self, id: Option<RuleId>, tag: Option<&str>) -> Result<Vec<Rule>> {
        self.store.remove(id, tag)
    }
    pub fn remove_id(&mut self, id: RuleId) -> Result<Rule> {
        self.store.remove_id(id)
    }
    pub fn remove_tag(&mut self, tag: &str) -> Result<Vec<Rule>> {
        self.store.remove_tag(tag)
    }
    pub fn clear(&mut self) -> usize {
        self.store.clear()
    }

    pub fn show(&self) -> Report {
        self.store.show()
    }

    /// The rows present in the result of every active rule, or the whole table when
    /// there are none.
    pub fn finalize(&self) -> TableView {
        let rows = self.store.intersect(self.table.all_rows());
        debug!(rules = self.store.len(), rows = rows.len(), "selection finalized");
        TableView::new(Arc::clone(&self.table), rows)
    }

    // ------------- helpers -------------

    /// Checks keys and sanitizes values, giving `(column, value)` pairs.
    fn resolve(&self, criteria: &Criteria) -> Result<Vec<(String, Value)>> {
        if criteria.is_empty() {
            return Err(SelectionError::BadArguments("no selection keywords given".into()));
        }
        check_keys(&self.table, &self.aliases, criteria.entries.iter().map(|(k, _)| k.as_str()))?;
        let sanitizer = Sanitizer::new(&self.table, &self.settings);
        let mut resolved: Vec<(String, Value)> = Vec::with_capacity(criteria.entries.len());
        for (key, value) in &criteria.entries {
            let column = self.aliases.resolve(key);
            if resolved.iter().any(|(c, _)| *c == column) {
                return Err(SelectionError::BadArguments(format!("{column} is given more than once")));
            }
            let value = sanitizer.sanitize(&key.to_uppercase(), &column, value)?;
            resolved.push((column, value));
        }
        Ok(resolved)
    }

    fn column(&self, name: &str) -> Result<&Column> {
        self.table
            .column(name)
            .ok_or_else(|| SelectionError::UnknownColumn(name.to_string()))
    }
}

fn default_aliases(table: &Table, settings: &Settings) -> AliasTable {
    let mut aliases = AliasTable::new();
    for (alias, column) in &settings.aliases {
        if aliases.register(table, alias, column).is_err() {
            debug!(%alias, %column, "default alias skipped, no such column");
        }
    }
    aliases
}

fn render(entries: &[(String, Value)]) -> Vec<(String, String)> {
    entries.iter().map(|(c, v)| (c.clone(), v.to_string())).collect()
}

/// Puts a within pair on one unit before it is added up. Angles convert to degrees;
/// quantities in any other pair of differing units cannot be combined.
fn common_unit(column: &str, center: &Value, epsilon: &Value) -> Result<(Value, Value)> {
    match (center, epsilon) {
        (Value::Quantity(c), Value::Quantity(e)) if c.unit() != e.unit() => {
            match (c.in_degrees(), e.in_degrees()) {
                (Some(c), Some(e)) => Ok((Value::Float(c), Value::Float(e))),
                _ => Err(SelectionError::malformed(
                    column,
                    format!("cannot combine {c} with {e}, the units differ"),
                )),
            }
        }
        _ => Ok((center.clone(), epsilon.clone())),
    }
}

/// Range bounds only keep the magnitude of a quantity.
fn without_units(value: Value) -> Value {
    match value {
        Value::Quantity(q) => Value::Float(q.value()),
        Value::List(items) => Value::List(items.into_iter().map(without_units).collect()),
        other => other,
    }
}

fn matches_exactly(cell: Cell<'_>, value: &Value) -> bool {
    match (cell, value) {
        (_, Value::List(items)) => items.iter().any(|v| matches_exactly(cell, v)),
        (Cell::Text(s), Value::Text(t)) => s == t,
        (Cell::Int(i), Value::Int(j)) => i == *j,
        (Cell::Time(a), Value::Time(b)) => a == *b,
        (cell, value) => match (cell.as_number(), value.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

fn within_bounds(cell: Cell<'_>, lo: &Value, hi: &Value) -> bool {
    match cell {
        Cell::Time(t) => {
            let above = match lo {
                Value::Time(lo) => t >= *lo,
                _ => true,
            };
            let below = match hi {
                Value::Time(hi) => t <= *hi,
                _ => true,
            };
            above && below
        }
        cell => match cell.as_number() {
            Some(x) => {
                lo.as_number().is_none_or(|lo| x >= lo) && hi.as_number().is_none_or(|hi| x <= hi)
            }
            None => false,
        },
    }
}
