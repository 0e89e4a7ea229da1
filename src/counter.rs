use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// Insertion-ordered map from keys to real-valued counts
///
/// Feature extractors return a `Counter` of feature counts, and the
/// classifier returns a `Counter` of label probabilities. Iteration follows
/// the order in which each key was first inserted, so anything built by
/// scanning a counter is deterministic.
#[derive(Debug, Clone)]
pub struct Counter<K> {
    index: HashMap<K, usize>,
    entries: Vec<(K, f64)>,
}

impl<K: Clone + Eq + Hash> Counter<K> {
    /// Create a new empty counter
    pub fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            index: HashMap::with_capacity(cap),
            entries: Vec::with_capacity(cap),
        }
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add `amount` to the count of `key`, inserting it with that count if absent
    pub fn increment(&mut self, key: K, amount: f64) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 += amount,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, amount));
            }
        }
    }

    /// Overwrite the count of `key`
    pub fn set(&mut self, key: K, count: f64) {
        match self.index.get(&key) {
            Some(&pos) => self.entries[pos].1 = count,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, count));
            }
        }
    }

    /// Count of `key`, zero when absent
    pub fn get<Q>(&self, key: &Q) -> f64
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].1)
            .unwrap_or(0.0)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Sum of all counts
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    /// Key with the largest count; ties go to the key inserted first
    pub fn argmax(&self) -> Option<&K> {
        let mut best: Option<&(K, f64)> = None;
        for entry in &self.entries {
            match best {
                Some((_, c)) if entry.1 <= *c => {}
                _ => best = Some(entry),
            }
        }
        best.map(|(k, _)| k)
    }

    /// Iterate over `(key, count)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> + '_ {
        self.entries.iter().map(|(k, c)| (k, *c))
    }

    /// Iterate over keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.iter().map(|(k, _)| k)
    }
}

impl<K: Clone + Eq + Hash> Default for Counter<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone + Eq + Hash> PartialEq for Counter<K> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<K: Clone + Eq + Hash> FromIterator<(K, f64)> for Counter<K> {
    fn from_iter<T: IntoIterator<Item = (K, f64)>>(iter: T) -> Self {
        let mut counter = Counter::new();
        for (key, count) in iter {
            counter.increment(key, count);
        }
        counter
    }
}

impl<K: Clone + Eq + Hash> Extend<(K, f64)> for Counter<K> {
    fn extend<T: IntoIterator<Item = (K, f64)>>(&mut self, iter: T) {
        for (key, count) in iter {
            self.increment(key, count);
        }
    }
}

impl<K: Clone + Eq + Hash, const N: usize> From<[(K, f64); N]> for Counter<K> {
    fn from(pairs: [(K, f64); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl From<&[&str]> for Counter<String> {
    /// Each name counts once per occurrence
    fn from(names: &[&str]) -> Self {
        names.iter().map(|name| (name.to_string(), 1.0)).collect()
    }
}
