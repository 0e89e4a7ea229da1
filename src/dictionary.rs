use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// A bidirectional dictionary for mapping between values and integer IDs
///
/// IDs are handed out densely in first-seen order, so a dictionary holding
/// `n` entries always maps onto exactly `0..n`.
#[derive(Debug, Clone)]
pub struct Dictionary<T> {
    /// Map from value to ID
    to_id: HashMap<T, u32>,
    /// Map from ID to value
    from_id: Vec<T>,
}

impl<T: Clone + Eq + Hash> Dictionary<T> {
    /// Create a new empty dictionary
    pub fn new() -> Self {
        Self {
            to_id: HashMap::new(),
            from_id: Vec::new(),
        }
    }

    /// Get the number of entries in the dictionary
    pub fn len(&self) -> usize {
        self.from_id.len()
    }

    /// Returns `true` if the dictionary contains no entries
    pub fn is_empty(&self) -> bool {
        self.from_id.is_empty()
    }

    /// Get or create an ID for a value
    pub fn get_or_insert(&mut self, value: &T) -> u32 {
        if let Some(&id) = self.to_id.get(value) {
            id
        } else {
            let id = self.from_id.len() as u32;
            self.to_id.insert(value.clone(), id);
            self.from_id.push(value.clone());
            id
        }
    }

    /// Look up the ID of a value without inserting it
    pub fn id<Q>(&self, value: &Q) -> Option<u32>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.to_id.get(value).copied()
    }

    /// Look up the value behind an ID
    pub fn get(&self, id: u32) -> Option<&T> {
        self.from_id.get(id as usize)
    }

    /// Iterate over all (value, id) pairs in ID order
    pub fn iter(&self) -> impl Iterator<Item = (&T, u32)> + '_ {
        self.from_id
            .iter()
            .enumerate()
            .map(|(id, value)| (value, id as u32))
    }
}

impl<T: Clone + Eq + Hash> Default for Dictionary<T> {
    fn default() -> Self {
        Self::new()
    }
}
