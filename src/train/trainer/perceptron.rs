use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{parse_param, ParamSet, Perceptron, TrainingAlgorithm};
use crate::context::ScoreContext;
use crate::dataset::EncodedDatum;
use crate::encoding::IndexLinearizer;
use crate::error::{Error, Result};

/// Which weight vector the perceptron hands over to the classifier.
///
/// The trainer always accumulates the average of the weight vector over
/// every visited datum, but by default the classifier is built from the
/// final weights and the average is discarded. Pick `Averaged` to build it
/// from the running average instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PerceptronWeights {
    /// Weights after the last update
    #[default]
    Final,
    /// Mean of the weights after each visited datum, over all epochs
    Averaged,
}

impl PerceptronWeights {
    fn as_str(self) -> &'static str {
        match self {
            Self::Final => "final",
            Self::Averaged => "averaged",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "final" => Some(Self::Final),
            "averaged" => Some(Self::Averaged),
            _ => None,
        }
    }
}

/// Perceptron training parameters.
#[derive(Debug, Clone)]
pub struct PerceptronParams {
    iterations: usize,
    shuffle_seed: Option<u64>,
    weights: PerceptronWeights,
}

impl Default for PerceptronParams {
    fn default() -> Self {
        Self {
            iterations: 10,
            shuffle_seed: None,
            weights: PerceptronWeights::default(),
        }
    }
}

impl PerceptronParams {
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn set_iterations(&mut self, iterations: usize) -> Result<()> {
        if iterations < 1 {
            return Err(Error::invalid_input("iterations must be at least 1"));
        }
        self.iterations = iterations;
        Ok(())
    }

    pub fn shuffle_seed(&self) -> Option<u64> {
        self.shuffle_seed
    }

    /// Seed for the per-epoch shuffle; `None` seeds from OS entropy
    pub fn set_shuffle_seed(&mut self, seed: Option<u64>) {
        self.shuffle_seed = seed;
    }

    pub fn weights(&self) -> PerceptronWeights {
        self.weights
    }

    pub fn set_weights(&mut self, weights: PerceptronWeights) {
        self.weights = weights;
    }
}

impl ParamSet for PerceptronParams {
    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "iterations" | "max_iterations" => self.set_iterations(parse_param(name, value)?),
            "shuffle_seed" => {
                let seed = if value == "none" {
                    None
                } else {
                    Some(parse_param(name, value)?)
                };
                self.set_shuffle_seed(seed);
                Ok(())
            }
            "weights" => {
                let weights = PerceptronWeights::from_name(value).ok_or_else(|| {
                    Error::InvalidInput(format!("invalid value for weights: {}", value))
                })?;
                self.set_weights(weights);
                Ok(())
            }
            _ => Err(Error::InvalidInput(format!("unknown parameter: {}", name))),
        }
    }

    fn get(&self, name: &str) -> Result<String> {
        match name {
            "iterations" | "max_iterations" => Ok(self.iterations.to_string()),
            "shuffle_seed" => Ok(self
                .shuffle_seed
                .map_or_else(|| "none".to_string(), |seed| seed.to_string())),
            "weights" => Ok(self.weights.as_str().to_string()),
            _ => Err(Error::InvalidInput(format!("unknown parameter: {}", name))),
        }
    }
}

impl TrainingAlgorithm for Perceptron {
    type Params = PerceptronParams;

    fn train(
        params: &PerceptronParams,
        data: &[EncodedDatum],
        linearizer: IndexLinearizer,
        verbose: bool,
    ) -> Result<Vec<f64>> {
        let run = run_perceptron(params, data, linearizer, verbose)?;
        match params.weights() {
            PerceptronWeights::Final => {
                debug!("Using final perceptron weights; running average discarded");
                Ok(run.weights)
            }
            PerceptronWeights::Averaged => Ok(run.averaged),
        }
    }
}

/// Everything a perceptron run produces
#[derive(Debug, Clone)]
pub(crate) struct PerceptronRun {
    /// Weights after the last update
    pub weights: Vec<f64>,
    /// Mean of the weights after each visited datum
    pub averaged: Vec<f64>,
    /// Number of mistakes made in each epoch
    pub mistakes: Vec<usize>,
}

/// Multiclass perceptron: shuffled epochs of mistake-driven additive updates
pub(crate) fn run_perceptron(
    params: &PerceptronParams,
    data: &[EncodedDatum],
    linearizer: IndexLinearizer,
    verbose: bool,
) -> Result<PerceptronRun> {
    let num_weights = linearizer.total();
    let golds = data
        .iter()
        .map(EncodedDatum::label_id)
        .collect::<Result<Vec<u32>>>()?;

    // Initialize weights to zero
    let mut weights = vec![0.0; num_weights];
    // Step-weighted updates for the running average
    let mut summed_updates = vec![0.0; num_weights];
    let mut c = 0.0; // Steps taken before the current one

    let mut ctx = ScoreContext::new(linearizer);
    let mut order: Vec<usize> = (0..data.len()).collect();
    let mut rng = match params.shuffle_seed() {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut mistakes = Vec::with_capacity(params.iterations());

    for epoch in 0..params.iterations() {
        super::shuffle_indices(&mut order, &mut rng);

        let mut num_mistakes = 0;
        for &idx in &order {
            let datum = &data[idx];
            let gold = golds[idx];

            ctx.compute_scores(datum, &weights)?;
            let predicted = ctx.best_label();

            if predicted != gold {
                num_mistakes += 1;
                for active in datum.features() {
                    let to_gold = linearizer.linear_index(active.id, gold);
                    let from_pred = linearizer.linear_index(active.id, predicted);
                    weights[to_gold] += active.count;
                    weights[from_pred] -= active.count;
                    summed_updates[to_gold] += c * active.count;
                    summed_updates[from_pred] -= c * active.count;
                }
            }

            c += 1.0;
        }

        if verbose {
            info!("Epoch {}: {} mistakes", epoch + 1, num_mistakes);
        } else {
            debug!("Epoch {}: {} mistakes", epoch + 1, num_mistakes);
        }
        mistakes.push(num_mistakes);
    }

    // sum_t w_t = T * w_T - sum_k (k - 1) * u_k over T steps with updates u_k
    let averaged = if c > 0.0 {
        weights
            .iter()
            .zip(&summed_updates)
            .map(|(w, s)| w - s / c)
            .collect()
    } else {
        weights.clone()
    };

    Ok(PerceptronRun {
        weights,
        averaged,
        mistakes,
    })
}
