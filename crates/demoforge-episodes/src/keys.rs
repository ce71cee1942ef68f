//! Episode key ordering and demo id assignment.
//!
//! Numeric keys (`"0"`, `"17"`) keep their integer value as demo id. Any
//! other key gets an id from a [`KeyMap`]: labels already present keep their
//! id, unseen labels are numbered in lexicographic order after every id in
//! use. The map can be persisted so ids survive across runs.
//!
//! Episodes are enumerated by `(demo_id, episode_key)`, which puts numeric
//! keys first in integer order and labels after them.

use crate::Result;
use demoforge_common::DemoId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Integer value of a key made only of ASCII digits.
///
/// Keys that overflow `u64` are treated as labels, and so are keys written
/// with non-ASCII decimal digits such as `"٣"`. Those get a label id from
/// the [`KeyMap`] rather than their digit value.
pub fn parse_numeric_key(key: &str) -> Option<u64> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

/// Persisted `episode_key -> demo_id` assignments for non-numeric keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyMap {
    entries: BTreeMap<String, DemoId>,
}

impl KeyMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a map written by [`KeyMap::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Load a map if the file exists, otherwise start empty.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the map as indented JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        demoforge_common::json::write_json_pretty(path, self)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<DemoId> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DemoId)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Assign ids to every non-numeric key in `keys` that has none yet.
    ///
    /// New ids start after the largest numeric key and the largest id already
    /// in the map. Returns the number of keys newly assigned.
    pub fn assign<'a>(&mut self, keys: impl IntoIterator<Item = &'a str>) -> usize {
        let mut max_numeric: Option<u64> = None;
        let mut labels = BTreeSet::new();
        for key in keys {
            match parse_numeric_key(key) {
                Some(value) => max_numeric = max_numeric.max(Some(value)),
                None if !self.entries.contains_key(key) => {
                    labels.insert(key);
                }
                None => {}
            }
        }

        let max_mapped = self.entries.values().map(|id| id.get()).max();
        let mut next = match max_numeric.max(max_mapped) {
            Some(max) => max.saturating_add(1),
            None => 0,
        };

        let assigned = labels.len();
        for label in labels {
            tracing::debug!("Assigning demo id {} to episode key {:?}", next, label);
            self.entries.insert(label.to_string(), DemoId::new(next));
            next = next.saturating_add(1);
        }
        assigned
    }
}

/// One episode key with its demo id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeEntry {
    pub key: String,
    pub demo_id: DemoId,
}

/// Ordered list of the episodes in a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpisodeIndex {
    entries: Vec<EpisodeEntry>,
}

impl EpisodeIndex {
    /// Order `keys`, assigning ids for labels through `key_map`.
    pub fn build<I, S>(keys: I, key_map: &mut KeyMap) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        key_map.assign(keys.iter().map(String::as_str));

        let mut entries: Vec<EpisodeEntry> = keys
            .into_iter()
            .map(|key| {
                let demo_id = match parse_numeric_key(&key) {
                    Some(value) => DemoId::new(value),
                    None => key_map.get(&key).unwrap_or_default(),
                };
                EpisodeEntry { key, demo_id }
            })
            .collect();
        entries.sort_by(|a, b| a.demo_id.cmp(&b.demo_id).then_with(|| a.key.cmp(&b.key)));

        for pair in entries.windows(2) {
            if pair[0].demo_id == pair[1].demo_id {
                tracing::warn!(
                    "Episode keys {:?} and {:?} share demo id {}",
                    pair[0].key,
                    pair[1].key,
                    pair[0].demo_id
                );
            }
        }

        Self { entries }
    }

    /// Order `keys` with a fresh, unpersisted key map.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(keys, &mut KeyMap::new())
    }

    pub fn entries(&self) -> &[EpisodeEntry] {
        &self.entries
    }

    pub fn first(&self) -> Option<&EpisodeEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EpisodeEntry> {
        self.entries.iter()
    }

    /// Keep only the first `n` entries.
    pub fn truncate(&mut self, n: usize) {
        self.entries.truncate(n);
    }
}

impl<'a> IntoIterator for &'a EpisodeIndex {
    type Item = &'a EpisodeEntry;
    type IntoIter = std::slice::Iter<'a, EpisodeEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
