//! Maximum entropy classifiers in pure Rust
//!
//! This library trains log-linear (multinomial logistic regression)
//! classifiers over sparse, string-named features, with a multiclass
//! perceptron as an alternative training algorithm.
//!
//! # Examples
//!
//! ## Training
//!
//! ```no_run
//! use maxent::train::Trainer;
//! use maxent::{Counter, Identity};
//!
//! let mut trainer = Trainer::maxent(Identity::<String>::new()).with_sigma(3.0)?;
//! trainer.append(&Counter::from(&["fuzzy", "claws", "small"][..]), "cat");
//! trainer.append(&Counter::from(&["fuzzy", "claws", "big"][..]), "bear");
//! trainer.append(&Counter::from(&["claws", "medium"][..]), "cat");
//!
//! let classifier = trainer.train()?;
//! # Ok::<(), maxent::Error>(())
//! ```
//!
//! ## Prediction
//!
//! ```no_run
//! use maxent::train::Trainer;
//! use maxent::NameFeatures;
//!
//! let mut trainer = Trainer::perceptron(NameFeatures).with_iterations(20)?;
//! trainer.append("Xanax", "drug");
//! trainer.append("Boston", "place");
//! let classifier = trainer.train()?;
//!
//! let label = classifier.label("Valium")?;
//! let probs = classifier.probabilities("Valium")?;
//! # Ok::<(), maxent::Error>(())
//! ```

mod baseline;
mod classifier;
mod context;
mod counter;
mod dataset;
mod dictionary;
mod encoding;
mod error;
mod extractor;

/// Training module containing the objective and the training algorithms
pub mod train;

// Re-export main types
pub use self::baseline::MostFrequentLabel;
pub use self::classifier::{accuracy, Classifier, ProbabilisticClassifier};
pub use self::context::{argmax, logsumexp, ScoreContext};
pub use self::counter::Counter;
pub use self::dataset::{ActiveFeature, EncodedDatum};
pub use self::dictionary::Dictionary;
pub use self::encoding::{Encoding, IndexLinearizer};
pub use self::error::{Error, Result};
pub use self::extractor::{FeatureExtractor, FnExtractor, Identity, NameFeatures};

// Re-export training types for convenience
pub use self::train::{MaxEnt, Perceptron, Trainer};
