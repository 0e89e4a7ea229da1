//! Feature extractors turn raw inputs into sparse feature counts.
//!
//! An extractor must be a pure function of its input: the same extractor
//! is used to encode training data and, later, every input the classifier
//! is asked about.

use std::hash::Hash;
use std::marker::PhantomData;

use crate::counter::Counter;

/// Maps an input to a counter of named features
///
/// Counts must be finite and non-negative; encoding rejects anything else.
pub trait FeatureExtractor {
    /// Raw input type
    type Input: ?Sized;
    /// Feature key type
    type Feature: Clone + Eq + Hash;

    fn extract(&self, input: &Self::Input) -> Counter<Self::Feature>;
}

/// Pass-through extractor for inputs that already are feature counts
#[derive(Debug)]
pub struct Identity<F>(PhantomData<fn() -> F>);

impl<F> Identity<F> {
    pub fn new() -> Self {
        Identity(PhantomData)
    }
}

impl<F> Default for Identity<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> Clone for Identity<F> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<F: Clone + Eq + Hash> FeatureExtractor for Identity<F> {
    type Input = Counter<F>;
    type Feature = F;

    fn extract(&self, input: &Counter<F>) -> Counter<F> {
        input.clone()
    }
}

/// Adapts a closure into a [`FeatureExtractor`]
pub struct FnExtractor<I: ?Sized, F, G> {
    func: G,
    _marker: PhantomData<fn(&I) -> F>,
}

impl<I: ?Sized, F, G> FnExtractor<I, F, G>
where
    G: Fn(&I) -> Counter<F>,
{
    pub fn new(func: G) -> Self {
        Self {
            func,
            _marker: PhantomData,
        }
    }
}

impl<I: ?Sized, F, G: Clone> Clone for FnExtractor<I, F, G> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            _marker: PhantomData,
        }
    }
}

impl<I: ?Sized, F, G> FeatureExtractor for FnExtractor<I, F, G>
where
    F: Clone + Eq + Hash,
    G: Fn(&I) -> Counter<F>,
{
    type Input = I;
    type Feature = F;

    fn extract(&self, input: &I) -> Counter<F> {
        (self.func)(input)
    }
}

/// Character n-gram features for short names such as proper nouns
///
/// Produces, for a name:
/// - `begin-<c>` for the first character and `end-<c>` for the last one,
/// - `word-<w>` for every whitespace-separated word longer than one character,
/// - `bi-<ab>` for every character bigram, plus `bi-begin-<ab>` (names of
///   three or more characters) and `bi-end-<ab>` at the edges,
/// - `tri-<abc>` for every character trigram, plus `tri-begin-<abc>` and
///   `tri-end-<abc>` at the edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameFeatures;

impl FeatureExtractor for NameFeatures {
    type Input = str;
    type Feature = String;

    fn extract(&self, name: &str) -> Counter<String> {
        let chars: Vec<char> = name.chars().collect();
        let n = chars.len();
        let mut features = Counter::with_capacity(4 * n);

        if let (Some(first), Some(last)) = (chars.first(), chars.last()) {
            features.increment(format!("begin-{}", first), 1.0);
            features.increment(format!("end-{}", last), 1.0);
        }

        for word in name.split_whitespace() {
            if word.chars().count() > 1 {
                features.increment(format!("word-{}", word), 1.0);
            }
        }

        for (i, pair) in chars.windows(2).enumerate() {
            let bigram: String = pair.iter().collect();
            if i == 0 && n >= 3 {
                features.increment(format!("bi-begin-{}", bigram), 1.0);
            }
            features.increment(format!("bi-{}", bigram), 1.0);
            if i + 2 == n {
                features.increment(format!("bi-end-{}", bigram), 1.0);
            }
        }

        for (i, triple) in chars.windows(3).enumerate() {
            let trigram: String = triple.iter().collect();
            if i == 0 {
                features.increment(format!("tri-begin-{}", trigram), 1.0);
            }
            features.increment(format!("tri-{}", trigram), 1.0);
            if i + 3 == n {
                features.increment(format!("tri-end-{}", trigram), 1.0);
            }
        }

        features
    }
}
