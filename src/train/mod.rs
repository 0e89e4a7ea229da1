//! Training module for maximum entropy and perceptron classifiers
//!
//! This module contains the differentiable training objective, the
//! algorithm-specific trainers and the [`Trainer`] that drives them.

mod objective;
mod trainer;

// Re-export public types
pub use self::objective::{DifferentiableFunction, Objective};
pub use self::trainer::{
    LineSearchAlgorithm, MaxEnt, MaxEntParams, ParamSet, Perceptron, PerceptronParams,
    PerceptronWeights, Trainer, TrainingAlgorithm,
};
