use roaring::RoaringBitmap;
use serde::Serialize;
use tracing::{info, warn};

// other keepers use HashMap
use core::hash::{BuildHasher, Hasher};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;
use seahash::SeaHasher;

use crate::error::{Result, SelectionError};
use crate::report::Report;
use crate::ColumnHasher;

// ------------- RuleId -------------
pub type RuleId = u64;

pub const GENESIS: RuleId = 0;

/// Hands out rule identities. Identities only ever grow; a removed rule's id is gone
/// for good, so an id seen in an old `show()` can never come to mean another rule.
#[derive(Debug)]
pub struct RuleIdGenerator {
    next: RuleId,
}

impl RuleIdGenerator {
    pub fn new() -> Self {
        Self { next: GENESIS }
    }
    pub fn generate(&mut self) -> RuleId {
        let id = self.next;
        self.next += 1;
        id
    }
    pub fn peek(&self) -> RuleId {
        self.next
    }
}

impl Default for RuleIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

// ------------- Lookups -------------
#[derive(Debug)]
pub struct Lookup<K, V, H = ColumnHasher> {
    index: HashMap<K, BTreeSet<V>, H>,
}
impl<K: Eq + Hash, V: Ord, H: BuildHasher + Default> Lookup<K, V, H> {
    pub fn new() -> Self {
        Self {
            index: HashMap::<K, BTreeSet<V>, H>::default(),
        }
    }
    pub fn insert(&mut self, key: K, value: V) {
        self.index.entry(key).or_default().insert(value);
    }
    pub fn lookup(&self, key: &K) -> Option<&BTreeSet<V>> {
        self.index.get(key)
    }
    pub fn remove(&mut self, key: &K, value: &V) {
        if let Some(values) = self.index.get_mut(key) {
            values.remove(value);
            if values.is_empty() {
                self.index.remove(key);
            }
        }
    }
    pub fn clear(&mut self) {
        self.index.clear();
    }
}
impl<K: Eq + Hash, V: Ord, H: BuildHasher + Default> Default for Lookup<K, V, H> {
    fn default() -> Self {
        Self::new()
    }
}

/// Stable tag for a rule: the BLAKE3 hex digest of the concatenated criteria,
/// truncated to `length` characters.
pub fn generate_tag<'v, I: IntoIterator<Item = &'v str>>(values: I, length: usize) -> String {
    let data: String = values.into_iter().collect();
    let digest = blake3::hash(data.as_bytes()).to_hex().to_string();
    digest[..length.min(digest.len())].to_string()
}

/// Cheap content hash of a row set, used to narrow down duplicate candidates.
pub fn fingerprint(rows: &RoaringBitmap) -> u64 {
    let mut hasher = SeaHasher::new();
    for row in rows {
        hasher.write_u32(row);
    }
    hasher.finish()
}

// ------------- Rule -------------
#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    id: RuleId,
    tag: String,
    criteria: Vec<(String, String)>,
    selected: u64,
    #[serde(skip)]
    result: RoaringBitmap,
    #[serde(skip)]
    fingerprint: u64,
}

impl Rule {
    // Rules are read-only once stored, hence getters only.
    pub fn id(&self) -> RuleId {
        self.id
    }
    pub fn tag(&self) -> &str {
        &self.tag
    }
    /// Column -> rendered criterion, in the order the caller gave them.
    pub fn criteria(&self) -> &[(String, String)] {
        &self.criteria
    }
    pub fn criterion(&self, column: &str) -> Option<&str> {
        self.criteria
            .iter()
            .find(|(c, _)| c.eq_ignore_ascii_case(column))
            .map(|(_, v)| v.as_str())
    }
    pub fn selected_count(&self) -> u64 {
        self.selected
    }
    pub fn result(&self) -> &RoaringBitmap {
        &self.result
    }
}

// ------------- RuleStore -------------
/// The ledger of active rules and their materialized results.
///
/// `add` and the `remove` family are the only ways in; both keep the rule map, the tag
/// index and the fingerprint index in step, so a rule is either fully present or fully
/// gone.
#[derive(Debug)]
pub struct RuleStore {
    generator: RuleIdGenerator,
    rules: BTreeMap<RuleId, Rule>,
    tags: Lookup<String, RuleId>,
    fingerprints: Lookup<u64, RuleId>,
    tag_length: usize,
}

impl RuleStore {
    pub fn new(tag_length: usize) -> Self {
        Self {
            generator: RuleIdGenerator::new(),
            rules: BTreeMap::new(),
            tags: Lookup::new(),
            fingerprints: Lookup::new(),
            tag_length,
        }
    }

    /// Records a rule for `candidate`.
    ///
    /// An empty candidate is not an error: it is logged as a warning, nothing is stored
    /// and `Ok(None)` comes back. A candidate equal to an active rule's result fails with
    /// `DuplicateRule`, whatever the criteria say.
    pub fn add(
        &mut self,
        criteria: Vec<(String, String)>,
        candidate: RoaringBitmap,
        tag: Option<String>,
    ) -> Result<Option<RuleId>> {
        if candidate.is_empty() {
            warn!("Your selection rule resulted in no data being selected. Ignoring.");
            return Ok(None);
        }
        let fingerprint = fingerprint(&candidate);
        if let Some(existing) = self.duplicate_of(&candidate, fingerprint) {
            return Err(SelectionError::DuplicateRule {
                id: existing.id,
                tag: existing.tag.clone(),
            });
        }
        let tag = tag.unwrap_or_else(|| {
            generate_tag(criteria.iter().map(|(_, v)| v.as_str()), self.tag_length)
        });
        let id = self.generator.generate();
        let rule = Rule {
            id,
            tag: tag.clone(),
            criteria,
            selected: candidate.len(),
            result: candidate,
            fingerprint,
        };
        info!(id, %tag, selected = rule.selected, "rule added");
        self.tags.insert(tag, id);
        self.fingerprints.insert(fingerprint, id);
        self.rules.insert(id, rule);
        Ok(Some(id))
    }

    fn duplicate_of(&self, candidate: &RoaringBitmap, fingerprint: u64) -> Option<&Rule> {
        self.fingerprints
            .lookup(&fingerprint)?
            .iter()
            .filter_map(|id| self.rules.get(id))
            .find(|rule| rule.result == *candidate)
    }

    /// Removes by id or by tag; exactly one of them must be given.
    pub fn remove(&mut self, id: Option<RuleId>, tag: Option<&str>) -> Result<Vec<Rule>> {
        match (id, tag) {
            (Some(_), Some(_)) => Err(SelectionError::BadArguments(
                "You can only specify one of id or tag".into(),
            )),
            (None, None) => Err(SelectionError::BadArguments(
                "You must specify either id or tag".into(),
            )),
            (Some(id), None) => self.remove_id(id).map(|rule| vec![rule]),
            (None, Some(tag)) => self.remove_tag(tag),
        }
    }

    pub fn remove_id(&mut self, id: RuleId) -> Result<Rule> {
        let rule = self
            .rules
            .remove(&id)
            .ok_or_else(|| SelectionError::NotFound(format!("No ID = {id} found in this selection")))?;
        self.tags.remove(&rule.tag, &id);
        self.fingerprints.remove(&rule.fingerprint, &id);
        info!(id, tag = %rule.tag, "rule removed");
        Ok(rule)
    }

    /// Removes every rule carrying `tag`.
    pub fn remove_tag(&mut self, tag: &str) -> Result<Vec<Rule>> {
        let ids: Vec<RuleId> = match self.tags.lookup(&tag.to_string()) {
            Some(ids) => ids.iter().copied().collect(),
            None => {
                return Err(SelectionError::NotFound(format!(
                    "No TAG = {tag} found in this selection"
                )));
            }
        };
        ids.into_iter().map(|id| self.remove_id(id)).collect()
    }

    /// Drops every rule. Identities keep counting from where they were.
    pub fn clear(&mut self) -> usize {
        let removed = self.rules.len();
        self.rules.clear();
        self.tags.clear();
        self.fingerprints.clear();
        if removed > 0 {
            info!(removed, "rules cleared");
        }
        removed
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(&id)
    }
    /// Active rules in id order.
    pub fn rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.values()
    }
    pub fn with_tag(&self, tag: &str) -> Vec<&Rule> {
        self.tags
            .lookup(&tag.to_string())
            .map(|ids| ids.iter().filter_map(|id| self.rules.get(id)).collect())
            .unwrap_or_default()
    }
    pub fn len(&self) -> usize {
        self.rules.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
    /// The id the next accepted rule will get.
    pub fn next_id(&self) -> RuleId {
        self.generator.peek()
    }

    /// Narrows `rows` down to the rows present in every active rule's result.
    pub fn intersect(&self, mut rows: RoaringBitmap) -> RoaringBitmap {
        for rule in self.rules.values() {
            rows &= &rule.result;
        }
        rows
    }

    /// The bookkeeping table: `ID`, `TAG`, one column per key used by any active rule
    /// (in order of first use) and `# SELECTED`.
    pub fn show(&self) -> Report {
        let mut keys: Vec<&str> = Vec::new();
        for rule in self.rules.values() {
            for (column, _) in &rule.criteria {
                if !keys.contains(&column.as_str()) {
                    keys.push(column);
                }
            }
        }
        let mut columns = vec!["ID".to_string(), "TAG".to_string()];
        columns.extend(keys.iter().map(|k| k.to_string()));
        columns.push("# SELECTED".to_string());
        let rows = self
            .rules
            .values()
            .map(|rule| {
                let mut row = vec![rule.id.to_string(), rule.tag.clone()];
                row.extend(keys.iter().map(|k| rule.criterion(k).unwrap_or("").to_string()));
                row.push(rule.selected.to_string());
                row
            })
            .collect();
        Report::new(columns, rows)
    }
}
