use std::borrow::Borrow;
use std::hash::Hash;

use crate::counter::Counter;
use crate::dictionary::Dictionary;

/// Feature and label vocabularies of a training set
///
/// Features and labels are interned into dense ids `0..num_features()` and
/// `0..num_labels()` in the order they are first met. The encoding is built
/// once per training run and never changes afterwards.
#[derive(Debug, Clone)]
pub struct Encoding<F, L> {
    features: Dictionary<F>,
    labels: Dictionary<L>,
}

impl<F, L> Encoding<F, L>
where
    F: Clone + Eq + Hash,
    L: Clone + Eq + Hash,
{
    /// Build the vocabularies by scanning every labeled feature vector once.
    ///
    /// For each instance the label is interned first, then every feature in
    /// the counter's iteration order.
    pub fn build<'a, I>(data: I) -> Self
    where
        I: IntoIterator<Item = (&'a Counter<F>, &'a L)>,
        F: 'a,
        L: 'a,
    {
        let mut features = Dictionary::new();
        let mut labels = Dictionary::new();
        for (counts, label) in data {
            labels.get_or_insert(label);
            for feature in counts.keys() {
                features.get_or_insert(feature);
            }
        }
        Self { features, labels }
    }

    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    pub fn feature_id<Q>(&self, feature: &Q) -> Option<u32>
    where
        F: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.features.id(feature)
    }

    pub fn label_id<Q>(&self, label: &Q) -> Option<u32>
    where
        L: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.labels.id(label)
    }

    pub fn feature(&self, id: u32) -> Option<&F> {
        self.features.get(id)
    }

    pub fn label(&self, id: u32) -> Option<&L> {
        self.labels.get(id)
    }

    /// Iterate over features in id order
    pub fn features(&self) -> impl Iterator<Item = &F> + '_ {
        self.features.iter().map(|(f, _)| f)
    }

    /// Iterate over labels in id order
    pub fn labels(&self) -> impl Iterator<Item = &L> + '_ {
        self.labels.iter().map(|(l, _)| l)
    }
}

/// Flattens the features-by-labels grid into one weight vector.
///
/// Labels vary fastest: `linear_index(f, l) = l + f * num_labels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexLinearizer {
    num_features: usize,
    num_labels: usize,
}

impl IndexLinearizer {
    pub fn new(num_features: usize, num_labels: usize) -> Self {
        Self {
            num_features,
            num_labels,
        }
    }

    /// Size the linearizer from an encoding
    pub fn for_encoding<F, L>(encoding: &Encoding<F, L>) -> Self
    where
        F: Clone + Eq + Hash,
        L: Clone + Eq + Hash,
    {
        Self::new(encoding.num_features(), encoding.num_labels())
    }

    pub fn num_features(&self) -> usize {
        self.num_features
    }

    pub fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// Length of the flat weight vector
    pub fn total(&self) -> usize {
        self.num_features * self.num_labels
    }

    #[inline]
    pub fn linear_index(&self, feature: u32, label: u32) -> usize {
        label as usize + feature as usize * self.num_labels
    }

    #[inline]
    pub fn feature_index(&self, linear_index: usize) -> u32 {
        (linear_index / self.num_labels) as u32
    }

    #[inline]
    pub fn label_index(&self, linear_index: usize) -> u32 {
        (linear_index % self.num_labels) as u32
    }
}
