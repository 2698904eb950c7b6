use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::Result;

/// Entity-type keyed word lists (e.g. `PER -> {"Clinton", ...}`).
///
/// Built once from a lines file and shared read-only by every extractor; it
/// never holds tagging state.
#[derive(Debug, Default, Clone)]
pub struct Gazetteer {
    entries: HashMap<String, HashSet<String>>,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `TYPE entry...` lines; the entry may span several tokens
    /// ("LOC New York").
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut this = Self::new();
        for line in reader.lines() {
            let line = line?;
            match line.trim_end().split_once(' ') {
                Some((kind, entry)) if !entry.is_empty() => this.insert(kind, entry),
                _ => {
                    if !line.trim().is_empty() {
                        log::warn!("invalid gazetteer line: {line}");
                    }
                }
            }
        }
        Ok(this)
    }

    pub fn insert(&mut self, kind: &str, entry: &str) {
        self.entries
            .entry(kind.to_string())
            .or_default()
            .insert(entry.to_string());
    }

    /// Membership of `entry` in the list for `kind`; unknown kinds are empty.
    pub fn contains(&self, kind: &str, entry: &str) -> bool {
        self.entries
            .get(kind)
            .map(|set| set.contains(entry))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(|set| set.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
