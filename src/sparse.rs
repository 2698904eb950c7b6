use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::iter::FromIterator;
use std::path::Path;

use crate::error::{Error, Result};

/**
 * A sparse real-valued vector keyed by feature name.
 *  Keys that are not stored are implicitly 0. Two vectors over the same
 *  feature namespace combine through `scale_add`, which is the only
 *  mutation primitive the update rules rely on.
 */
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    values: HashMap<String, f64>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored (explicitly non-implicit) entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at `key`, 0 when absent.
    pub fn get(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// `self[key] += delta`, materializing the key if absent.
    pub fn add(&mut self, key: impl Into<String>, delta: f64) {
        *self.values.entry(key.into()).or_insert(0.0) += delta;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// `self += scalar * other`. Keys absent from `self` count as 0 before
    /// the add.
    pub fn scale_add(&mut self, scalar: f64, other: &SparseVector) {
        for (key, value) in &other.values {
            *self.values.entry(key.clone()).or_insert(0.0) += scalar * value;
        }
    }

    /// Dot product. Iterates over `other`'s keys, so callers should pass the
    /// sparser operand as `other`; the result is the same either way since
    /// missing keys contribute 0.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        other.values.iter().map(|(key, v)| v * self.get(key)).sum()
    }

    /// Elementwise square over the stored keys.
    pub fn squared(&self) -> SparseVector {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v * v))
            .collect()
    }

    /// Elementwise square root over the stored keys.
    pub fn sqrt(&self) -> SparseVector {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.sqrt()))
            .collect()
    }

    /// Elementwise `self[key] / other[key]` over `self`'s keys. A zero
    /// denominator yields 0 rather than NaN/Inf, so adaptive update rules
    /// stay finite on keys with no accumulated history.
    pub fn divide_or_zero(&self, other: &SparseVector) -> SparseVector {
        self.values
            .iter()
            .map(|(k, v)| {
                let d = other.get(k);
                let q = if d == 0.0 { 0.0 } else { v / d };
                (k.clone(), q)
            })
            .collect()
    }

    /// `self`'s value at each key present in `other` (implicit zeros
    /// included), e.g. the slice of accumulated history for the features
    /// touched by one example.
    pub fn restrict_to(&self, other: &SparseVector) -> SparseVector {
        other
            .values
            .keys()
            .map(|k| (k.clone(), self.get(k)))
            .collect()
    }

    /// Writes one `<key> <value>` pair per line.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut w = BufWriter::new(File::create(path)?);
        for (key, value) in &self.values {
            writeln!(w, "{} {}", key, value)?;
        }
        Ok(())
    }

    /// Reads a vector saved by `save`. Any line that is not exactly
    /// `<key> <value>` fails the whole load; duplicate keys keep the last
    /// occurrence.
    pub fn load(path: impl AsRef<Path>) -> Result<SparseVector> {
        let path = path.as_ref();
        let parse_err = |line: usize, msg: &str| Error::Parse {
            path: path.display().to_string(),
            line,
            msg: msg.to_string(),
        };
        let mut values = HashMap::new();
        for (lineno, line) in BufReader::new(File::open(path)?).lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let (key, raw) = match (fields.next(), fields.next(), fields.next()) {
                (Some(key), Some(raw), None) => (key, raw),
                _ => return Err(parse_err(lineno + 1, "expected `<key> <value>`")),
            };
            let value: f64 = raw
                .parse()
                .map_err(|_| parse_err(lineno + 1, "value is not a float"))?;
            values.insert(key.to_string(), value);
        }
        Ok(SparseVector { values })
    }
}

impl FromIterator<(String, f64)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        SparseVector {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(entries: &[(&str, f64)]) -> SparseVector {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn missing_keys_are_zero() {
        let v = vector(&[("a", 1.5)]);
        assert_eq!(v.get("a"), 1.5);
        assert_eq!(v.get("b"), 0.0);
    }

    #[test]
    fn scale_add_is_linear_under_dot() {
        let mut a = vector(&[("x", 1.0), ("y", -2.0)]);
        let b = vector(&[("y", 3.0), ("z", 0.5)]);
        let c = vector(&[("x", 2.0), ("y", 1.0), ("z", 4.0)]);
        let s = -1.5;

        let expected = a.dot(&c) + s * b.dot(&c);
        a.scale_add(s, &b);
        assert!((a.dot(&c) - expected).abs() < 1e-12);
    }

    #[test]
    fn dot_is_symmetric_over_sparsity() {
        let dense = vector(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let sparse = vector(&[("b", 5.0)]);
        assert_eq!(dense.dot(&sparse), sparse.dot(&dense));
        assert_eq!(dense.dot(&sparse), 10.0);
    }

    #[test]
    fn squared_and_sqrt_are_elementwise() {
        let v = vector(&[("a", 3.0), ("b", -2.0)]);
        let sq = v.squared();
        assert_eq!(sq.get("a"), 9.0);
        assert_eq!(sq.get("b"), 4.0);
        assert_eq!(sq.sqrt().get("a"), 3.0);
        assert_eq!(sq.sqrt().get("b"), 2.0);
    }

    #[test]
    fn divide_by_zero_denominator_yields_zero() {
        let num = vector(&[("a", 7.0), ("b", -4.0)]);
        let den = vector(&[("a", 2.0)]);
        let q = num.divide_or_zero(&den);
        assert_eq!(q.get("a"), 3.5);
        assert_eq!(q.get("b"), 0.0);
        assert!(q.iter().all(|(_, v)| v.is_finite()));
    }

    #[test]
    fn restrict_to_fetches_history_slice() {
        let history = vector(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        let touched = vector(&[("b", 9.0), ("d", 9.0)]);
        let slice = history.restrict_to(&touched);
        assert_eq!(slice.len(), 2);
        assert_eq!(slice.get("b"), 2.0);
        assert_eq!(slice.get("d"), 0.0);
    }

    #[test]
    fn save_load_round_trip() {
        let v = vector(&[("Wi=France+Ti=I-LOC", 1.25), ("Ti=O+Ti-1=<START>", -0.5)]);
        let path = std::env::temp_dir().join("seqtag_sparse_roundtrip.model");
        v.save(&path).unwrap();
        let loaded = SparseVector::load(&path).unwrap();
        assert_eq!(v, loaded);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn load_rejects_malformed_lines() {
        let path = std::env::temp_dir().join("seqtag_sparse_malformed.model");
        std::fs::write(&path, "only-one-field\n").unwrap();
        assert!(matches!(
            SparseVector::load(&path),
            Err(Error::Parse { line: 1, .. })
        ));

        std::fs::write(&path, "key not-a-float\n").unwrap();
        assert!(matches!(
            SparseVector::load(&path),
            Err(Error::Parse { line: 1, .. })
        ));
        std::fs::remove_file(&path).ok();
    }
}
