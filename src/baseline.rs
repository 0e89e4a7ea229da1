use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use log::info;

use crate::classifier::ProbabilisticClassifier;
use crate::counter::Counter;
use crate::error::{Error, Result};

/// Classifier that ignores its input and predicts the label distribution
/// of the training data.
pub struct MostFrequentLabel<I: ?Sized, L> {
    distribution: Counter<L>,
    best: L,
    _input: PhantomData<fn(&I)>,
}

impl<I: ?Sized, L: Clone + Eq + Hash> MostFrequentLabel<I, L> {
    /// Count the training labels.
    ///
    /// Ties go to the label seen first.
    pub fn train<T, M>(labels: T) -> Result<Self>
    where
        T: IntoIterator<Item = M>,
        M: Borrow<L>,
    {
        let mut counts = Counter::new();
        for label in labels {
            counts.increment(label.borrow().clone(), 1.0);
        }
        let total = counts.total();
        let best = counts
            .argmax()
            .cloned()
            .ok_or_else(|| Error::invalid_input("no training data"))?;
        info!(
            "Most frequent label baseline: {} labels over {} instances",
            counts.len(),
            total
        );

        let distribution = counts.iter().map(|(l, c)| (l.clone(), c / total)).collect();
        Ok(Self {
            distribution,
            best,
            _input: PhantomData,
        })
    }

    /// Relative frequency of every training label
    pub fn distribution(&self) -> &Counter<L> {
        &self.distribution
    }
}

impl<I: ?Sized, L: Clone + Eq + Hash> ProbabilisticClassifier for MostFrequentLabel<I, L> {
    type Input = I;
    type Label = L;

    fn probabilities(&self, _input: &I) -> Result<Counter<L>> {
        Ok(self.distribution.clone())
    }

    fn label(&self, _input: &I) -> Result<&L> {
        Ok(&self.best)
    }
}

impl<I: ?Sized, L: Clone> Clone for MostFrequentLabel<I, L> {
    fn clone(&self) -> Self {
        Self {
            distribution: self.distribution.clone(),
            best: self.best.clone(),
            _input: PhantomData,
        }
    }
}

impl<I: ?Sized, L: fmt::Debug> fmt::Debug for MostFrequentLabel<I, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MostFrequentLabel")
            .field("distribution", &self.distribution)
            .field("best", &self.best)
            .finish()
    }
}
