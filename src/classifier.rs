use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;

use crate::context::ScoreContext;
use crate::counter::Counter;
use crate::dataset::EncodedDatum;
use crate::encoding::{Encoding, IndexLinearizer};
use crate::error::{Error, Result};
use crate::extractor::FeatureExtractor;

/// A classifier that assigns a probability to every label it knows.
pub trait ProbabilisticClassifier {
    /// Raw input type
    type Input: ?Sized;
    /// Label type
    type Label: Clone + Eq + Hash;

    /// Probability of every known label given `input`
    fn probabilities(&self, input: &Self::Input) -> Result<Counter<Self::Label>>;

    /// Most probable label for `input`
    fn label(&self, input: &Self::Input) -> Result<&Self::Label>;
}

/// Trained log-linear classifier
///
/// Holds the frozen weight vector together with the vocabulary encoding,
/// index linearizer and feature extractor it was trained with. Prediction
/// never mutates the classifier, so a shared reference can be used from
/// several threads when its parts allow it.
pub struct Classifier<X, L>
where
    X: FeatureExtractor,
{
    weights: Vec<f64>,
    encoding: Encoding<X::Feature, L>,
    linearizer: IndexLinearizer,
    extractor: X,
}

impl<X, L> Classifier<X, L>
where
    X: FeatureExtractor,
    L: Clone + Eq + Hash,
{
    /// Assemble a classifier from trained weights.
    ///
    /// Fails if the linearizer does not describe `encoding` or the weight
    /// vector does not cover every (feature, label) pair.
    pub fn new(
        weights: Vec<f64>,
        encoding: Encoding<X::Feature, L>,
        linearizer: IndexLinearizer,
        extractor: X,
    ) -> Result<Self> {
        if linearizer != IndexLinearizer::for_encoding(&encoding) {
            return Err(Error::invalid_input(format!(
                "linearizer covers {} features and {} labels, encoding has {} and {}",
                linearizer.num_features(),
                linearizer.num_labels(),
                encoding.num_features(),
                encoding.num_labels()
            )));
        }
        if weights.len() != linearizer.total() {
            return Err(Error::invalid_input(format!(
                "expected {} weights, got {}",
                linearizer.total(),
                weights.len()
            )));
        }
        Ok(Self {
            weights,
            encoding,
            linearizer,
            extractor,
        })
    }

    /// Extract and encode `input`, dropping features unseen in training
    pub fn encode(&self, input: &X::Input) -> Result<EncodedDatum> {
        let counts = self.extractor.extract(input);
        EncodedDatum::encode(&counts, &self.encoding)
    }

    /// Log-probability of every label, indexed by label id
    pub fn log_probabilities(&self, input: &X::Input) -> Result<Vec<f64>> {
        let datum = self.encode(input)?;
        let mut ctx = ScoreContext::new(self.linearizer);
        ctx.compute_scores(&datum, &self.weights)?;
        ctx.log_normalize();
        Ok(ctx.scores().to_vec())
    }

    /// Probability of every label, in label id order.
    ///
    /// An input with no known features gets the uniform distribution.
    pub fn probabilities(&self, input: &X::Input) -> Result<Counter<L>> {
        let log_probs = self.log_probabilities(input)?;
        Ok(self
            .encoding
            .labels()
            .zip(log_probs)
            .map(|(label, lp)| (label.clone(), lp.exp()))
            .collect())
    }

    /// Highest scoring label; ties go to the label seen first in training
    pub fn label(&self, input: &X::Input) -> Result<&L> {
        if self.encoding.num_labels() == 0 {
            return Err(Error::InvalidState("classifier has no labels".to_string()));
        }
        let datum = self.encode(input)?;
        let mut ctx = ScoreContext::new(self.linearizer);
        ctx.compute_scores(&datum, &self.weights)?;
        let best = ctx.best_label();
        self.encoding
            .label(best)
            .ok_or_else(|| Error::InvalidState(format!("no label with id {}", best)))
    }

    /// Weight of a (feature, label) pair, if both were seen in training
    pub fn weight(&self, feature: &X::Feature, label: &L) -> Option<f64> {
        let fid = self.encoding.feature_id(feature)?;
        let lid = self.encoding.label_id(label)?;
        Some(self.weights[self.linearizer.linear_index(fid, lid)])
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn encoding(&self) -> &Encoding<X::Feature, L> {
        &self.encoding
    }

    pub fn linearizer(&self) -> IndexLinearizer {
        self.linearizer
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }
}

impl<X, L> ProbabilisticClassifier for Classifier<X, L>
where
    X: FeatureExtractor,
    L: Clone + Eq + Hash,
{
    type Input = X::Input;
    type Label = L;

    fn probabilities(&self, input: &X::Input) -> Result<Counter<L>> {
        Classifier::probabilities(self, input)
    }

    fn label(&self, input: &X::Input) -> Result<&L> {
        Classifier::label(self, input)
    }
}

impl<X, L> Clone for Classifier<X, L>
where
    X: FeatureExtractor + Clone,
    L: Clone,
{
    fn clone(&self) -> Self {
        Self {
            weights: self.weights.clone(),
            encoding: self.encoding.clone(),
            linearizer: self.linearizer,
            extractor: self.extractor.clone(),
        }
    }
}

impl<X, L> fmt::Debug for Classifier<X, L>
where
    X: FeatureExtractor + fmt::Debug,
    X::Feature: fmt::Debug,
    L: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier")
            .field("num_features", &self.linearizer.num_features())
            .field("num_labels", &self.linearizer.num_labels())
            .field("encoding", &self.encoding)
            .field("extractor", &self.extractor)
            .finish()
    }
}

/// Fraction of `(input, label)` pairs the classifier labels correctly
pub fn accuracy<C, I, B, M>(classifier: &C, instances: I) -> Result<f64>
where
    C: ProbabilisticClassifier,
    I: IntoIterator<Item = (B, M)>,
    B: Borrow<C::Input>,
    M: Borrow<C::Label>,
{
    let mut total = 0usize;
    let mut correct = 0usize;
    for (input, gold) in instances {
        if classifier.label(input.borrow())? == gold.borrow() {
            correct += 1;
        }
        total += 1;
    }
    if total == 0 {
        return Err(Error::invalid_input("no evaluation data"));
    }
    Ok(correct as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Identity;

    fn counts(names: &[&str]) -> Counter<String> {
        Counter::from(names)
    }

    /// Features `a`, `b`; labels `x`, `y`
    fn classifier(weights: Vec<f64>) -> Classifier<Identity<String>, String> {
        let data = vec![
            (counts(&["a"]), "x".to_string()),
            (counts(&["b"]), "y".to_string()),
        ];
        let encoding = Encoding::build(data.iter().map(|(c, l)| (c, l)));
        let linearizer = IndexLinearizer::for_encoding(&encoding);
        Classifier::new(weights, encoding, linearizer, Identity::new()).unwrap()
    }

    #[test]
    fn test_probabilities_follow_weights() {
        // w[a,x] = 2, w[b,y] = 1
        let clf = classifier(vec![2.0, 0.0, 0.0, 1.0]);
        let probs = clf.probabilities(&counts(&["a"])).unwrap();
        let keys: Vec<_> = probs.keys().cloned().collect();
        assert_eq!(keys, vec!["x".to_string(), "y".to_string()]);

        let expected = 1.0 / (1.0 + (-2f64).exp());
        assert!((probs.get("x") - expected).abs() < 1e-12);
        assert!((probs.total() - 1.0).abs() < 1e-12);
        assert_eq!(clf.label(&counts(&["a"])).unwrap(), "x");
        assert_eq!(clf.label(&counts(&["b"])).unwrap(), "y");
    }

    #[test]
    fn test_unknown_features_are_ignored() {
        let clf = classifier(vec![2.0, 0.0, 0.0, 1.0]);
        let probs = clf.probabilities(&counts(&["zebra"])).unwrap();
        assert!((probs.get("x") - 0.5).abs() < 1e-12);
        assert!((probs.get("y") - 0.5).abs() < 1e-12);
        // Uniform scores tie, the first seen label wins
        assert_eq!(clf.label(&counts(&["zebra"])).unwrap(), "x");
        assert_eq!(clf.encode(&counts(&["zebra", "b"])).unwrap().num_active_features(), 1);
    }

    #[test]
    fn test_negative_counts_are_rejected() {
        let clf = classifier(vec![2.0, 0.0, 0.0, 1.0]);
        let input = Counter::from([("a".to_string(), -1.0)]);
        assert!(matches!(clf.probabilities(&input), Err(Error::InvalidInput(_))));
        assert!(clf.label(&input).is_err());
    }

    #[test]
    fn test_weight_lookup() {
        let clf = classifier(vec![2.0, 0.5, -1.0, 1.0]);
        assert_eq!(clf.weight(&"a".to_string(), &"y".to_string()), Some(0.5));
        assert_eq!(clf.weight(&"b".to_string(), &"x".to_string()), Some(-1.0));
        assert_eq!(clf.weight(&"c".to_string(), &"x".to_string()), None);
        assert_eq!(clf.weight(&"a".to_string(), &"z".to_string()), None);
    }

    #[test]
    fn test_new_rejects_mismatched_weights() {
        let data = vec![(counts(&["a"]), "x".to_string())];
        let encoding = Encoding::build(data.iter().map(|(c, l)| (c, l)));
        let linearizer = IndexLinearizer::for_encoding(&encoding);
        let result: Result<Classifier<Identity<String>, String>> =
            Classifier::new(vec![0.0; 3], encoding.clone(), linearizer, Identity::new());
        assert!(matches!(result, Err(Error::InvalidInput(_))));

        let result: Result<Classifier<Identity<String>, String>> = Classifier::new(
            vec![0.0; 4],
            encoding,
            IndexLinearizer::new(2, 2),
            Identity::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_accuracy() {
        let clf = classifier(vec![2.0, 0.0, 0.0, 1.0]);
        let eval = vec![
            (counts(&["a"]), "x".to_string()),
            (counts(&["b"]), "y".to_string()),
            (counts(&["b"]), "x".to_string()),
            (counts(&["a"]), "x".to_string()),
        ];
        let acc = accuracy(&clf, eval.iter().map(|(c, l)| (c, l))).unwrap();
        assert!((acc - 0.75).abs() < 1e-12);

        let empty: Vec<(Counter<String>, String)> = Vec::new();
        assert!(accuracy(&clf, empty).is_err());
    }
}
