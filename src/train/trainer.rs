use std::borrow::Borrow;
use std::hash::Hash;
use std::str::FromStr;

use log::info;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::classifier::Classifier;
use crate::counter::Counter;
use crate::dataset::EncodedDatum;
use crate::encoding::{Encoding, IndexLinearizer};
use crate::error::{Error, Result};
use crate::extractor::FeatureExtractor;

mod maxent;
mod perceptron;

pub use self::maxent::{LineSearchAlgorithm, MaxEntParams};
pub use self::perceptron::{PerceptronParams, PerceptronWeights};

fn shuffle_indices(indices: &mut [usize], rng: &mut StdRng) {
    indices.shuffle(rng);
}

/// Parse a string-valued parameter, naming it in the error
fn parse_param<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid value for {}: {}", name, value)))
}

/// Training algorithm marker for maximum entropy (L-BFGS on the
/// regularized conditional log-likelihood).
#[derive(Debug, Clone, Copy)]
pub struct MaxEnt;

/// Training algorithm marker for the multiclass perceptron.
#[derive(Debug, Clone, Copy)]
pub struct Perceptron;

/// String-keyed access to training parameters.
pub trait ParamSet {
    /// Set a parameter from its string form
    fn set(&mut self, name: &str, value: &str) -> Result<()>;

    /// Get the string form of a parameter
    fn get(&self, name: &str) -> Result<String>;
}

/// Training algorithm interface.
///
/// An algorithm turns the encoded training data into a weight vector of
/// length `linearizer.total()`.
pub trait TrainingAlgorithm {
    type Params: Default + ParamSet;

    fn train(
        params: &Self::Params,
        data: &[EncodedDatum],
        linearizer: IndexLinearizer,
        verbose: bool,
    ) -> Result<Vec<f64>>;
}

/// Classifier trainer
///
/// Collects labeled inputs, extracting their features as they are
/// appended, and trains a [`Classifier`] with the selected algorithm.
pub struct Trainer<A, X, L>
where
    A: TrainingAlgorithm,
    X: FeatureExtractor,
{
    /// Feature extractor, handed over to the trained classifier
    extractor: X,
    /// Extracted training instances
    instances: Vec<(Counter<X::Feature>, L)>,
    /// Enable verbose progress logging
    verbose: bool,
    /// Training parameters
    params: A::Params,
}

impl<A, X, L> Trainer<A, X, L>
where
    A: TrainingAlgorithm,
    X: FeatureExtractor + Clone,
    L: Clone + Eq + Hash,
{
    /// Create a new trainer
    pub fn new(extractor: X) -> Self {
        Self {
            extractor,
            instances: Vec::new(),
            verbose: false,
            params: A::Params::default(),
        }
    }

    /// Enable or disable verbose output
    pub fn verbose(&mut self, enabled: bool) -> &mut Self {
        self.verbose = enabled;
        self
    }

    /// Get training parameters
    pub fn params(&self) -> &A::Params {
        &self.params
    }

    /// Get training parameters for mutation
    pub fn params_mut(&mut self) -> &mut A::Params {
        &mut self.params
    }

    /// Set a training parameter by name
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        self.params.set(name, value)
    }

    /// Get a training parameter by name
    pub fn get(&self, name: &str) -> Result<String> {
        self.params.get(name)
    }

    /// Append a labeled training input
    pub fn append(&mut self, input: &X::Input, label: L) {
        let counts = self.extractor.extract(input);
        self.instances.push((counts, label));
    }

    /// Append every `(input, label)` pair
    pub fn extend<I, B, M>(&mut self, instances: I)
    where
        I: IntoIterator<Item = (B, M)>,
        B: Borrow<X::Input>,
        M: Borrow<L>,
    {
        for (input, label) in instances {
            self.append(input.borrow(), label.borrow().clone());
        }
    }

    /// Number of appended instances
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Clear all training data
    pub fn clear(&mut self) {
        self.instances.clear();
    }

    /// Train a classifier on the appended data
    pub fn train(&self) -> Result<Classifier<X, L>> {
        if self.instances.is_empty() {
            return Err(Error::invalid_input("no training data"));
        }

        let encoding = Encoding::build(self.instances.iter().map(|(counts, label)| (counts, label)));
        let linearizer = IndexLinearizer::for_encoding(&encoding);
        let data = self
            .instances
            .iter()
            .map(|(counts, label)| EncodedDatum::encode_labeled(counts, label, &encoding))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "Training on {} instances: {} features, {} labels, {} weights",
            data.len(),
            encoding.num_features(),
            encoding.num_labels(),
            linearizer.total()
        );

        let weights = A::train(&self.params, &data, linearizer, self.verbose)?;
        Classifier::new(weights, encoding, linearizer, self.extractor.clone())
    }
}

impl<X, L> Trainer<MaxEnt, X, L>
where
    X: FeatureExtractor + Clone,
    L: Clone + Eq + Hash,
{
    /// Create a new maximum entropy trainer
    pub fn maxent(extractor: X) -> Self {
        Self::new(extractor)
    }

    /// Set L2 regularization strength (builder pattern)
    pub fn with_sigma(mut self, sigma: f64) -> Result<Self> {
        self.params.set_sigma(sigma)?;
        Ok(self)
    }

    /// Set maximum iterations (builder pattern)
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self> {
        self.params.set_max_iterations(max_iterations)?;
        Ok(self)
    }

    /// Set convergence epsilon (builder pattern)
    pub fn with_epsilon(mut self, epsilon: f64) -> Result<Self> {
        self.params.set_epsilon(epsilon)?;
        Ok(self)
    }
}

impl<X, L> Trainer<Perceptron, X, L>
where
    X: FeatureExtractor + Clone,
    L: Clone + Eq + Hash,
{
    /// Create a new perceptron trainer
    pub fn perceptron(extractor: X) -> Self {
        Self::new(extractor)
    }

    /// Set number of epochs (builder pattern)
    pub fn with_iterations(mut self, iterations: usize) -> Result<Self> {
        self.params.set_iterations(iterations)?;
        Ok(self)
    }

    /// Set shuffle seed (builder pattern)
    pub fn with_shuffle_seed(mut self, seed: u64) -> Self {
        self.params.set_shuffle_seed(Some(seed));
        self
    }

    /// Select final or averaged weights (builder pattern)
    pub fn with_weights(mut self, weights: PerceptronWeights) -> Self {
        self.params.set_weights(weights);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Identity;

    fn counts(names: &[&str]) -> Counter<String> {
        Counter::from(names)
    }

    #[test]
    fn test_trainer_basic() {
        let mut trainer = Trainer::maxent(Identity::<String>::new());
        trainer.append(&counts(&["walk", "shop"]), "sunny");
        trainer.append(&counts(&["clean"]), "rainy");
        assert_eq!(trainer.len(), 2);

        let classifier = trainer.train().unwrap();
        assert_eq!(classifier.encoding().num_features(), 3);
        assert_eq!(classifier.encoding().num_labels(), 2);
        assert_eq!(classifier.weights().len(), 6);
    }

    #[test]
    fn test_trainer_params() {
        let mut trainer: Trainer<MaxEnt, Identity<String>, &str> = Trainer::maxent(Identity::new());
        assert!(trainer.params_mut().set_sigma(0.5).is_ok());
        assert_eq!(trainer.params().sigma(), 0.5);
        trainer.set("max_iterations", "25").unwrap();
        assert_eq!(trainer.get("max_iterations").unwrap(), "25");
        assert_eq!(trainer.params().max_iterations(), 25);
    }

    #[test]
    fn test_trainer_rejects_empty_data() {
        let trainer: Trainer<Perceptron, Identity<String>, &str> =
            Trainer::perceptron(Identity::new());
        let err = trainer.train().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("no training data"));
    }

    #[test]
    fn test_trainer_extend_and_clear() {
        let data = vec![
            (counts(&["a"]), "x".to_string()),
            (counts(&["b"]), "y".to_string()),
        ];
        let mut trainer: Trainer<Perceptron, Identity<String>, String> =
            Trainer::perceptron(Identity::new());
        trainer.extend(data.iter().map(|(c, l)| (c, l)));
        assert_eq!(trainer.len(), 2);
        trainer.clear();
        assert!(trainer.is_empty());
    }

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param::<f64>("sigma", " 2.5 ").unwrap(), 2.5);
        let err = parse_param::<usize>("iterations", "ten").unwrap_err();
        assert_eq!(err.to_string(), "invalid value for iterations: ten");
    }
}
