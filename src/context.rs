use crate::dataset::EncodedDatum;
use crate::encoding::IndexLinearizer;
use crate::error::{Error, Result};

/// Log-sum-exp trick for numerical stability.
///
/// Computes `log(sum(exp(values)))` by subtracting the maximum before
/// exponentiating. Returns NEG_INFINITY for empty slices or slices where all
/// values are NEG_INFINITY.
pub fn logsumexp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    let max_val = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max_val.is_infinite() {
        return max_val;
    }
    let sum: f64 = values.iter().map(|&v| (v - max_val).exp()).sum();
    max_val + sum.ln()
}

/// Index of the largest value; ties go to the lowest index
pub fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Score context maintains per-label work space for one datum at a time
#[derive(Debug, Clone)]
pub struct ScoreContext {
    /// Linearization of the weight vector
    linearizer: IndexLinearizer,
    /// Label scores
    ///
    /// This is a `[L]` vector whose element `[l]` is the total weight of the
    /// datum's active features associated with label #l.
    scores: Vec<f64>,
    /// Logarithm of the normalization factor of the last scored datum
    log_norm: f64,
}

impl ScoreContext {
    pub fn new(linearizer: IndexLinearizer) -> Self {
        Self {
            linearizer,
            scores: vec![0.0; linearizer.num_labels()],
            log_norm: 0.0,
        }
    }

    /// Compute the score of every label for `datum` under `weights`.
    ///
    /// A datum without active features gets zero for every label.
    pub fn compute_scores(&mut self, datum: &EncodedDatum, weights: &[f64]) -> Result<&[f64]> {
        self.scores.iter_mut().for_each(|s| *s = 0.0);
        let num_labels = self.linearizer.num_labels();
        for active in datum.features() {
            let base = self.linearizer.linear_index(active.id, 0);
            let row = &weights[base..base + num_labels];
            for (score, &w) in self.scores.iter_mut().zip(row) {
                *score += w * active.count;
            }
        }
        if let Some(bad) = self.scores.iter().position(|s| !s.is_finite()) {
            return Err(Error::Numerical(format!(
                "score for label {} is {}",
                bad, self.scores[bad]
            )));
        }
        Ok(&self.scores)
    }

    /// Turn the current scores into log-probabilities in place and return
    /// the log normalizer.
    pub fn log_normalize(&mut self) -> f64 {
        self.log_norm = logsumexp(&self.scores);
        let log_norm = self.log_norm;
        self.scores.iter_mut().for_each(|s| *s -= log_norm);
        log_norm
    }

    /// Current per-label values (scores or log-probabilities)
    pub fn scores(&self) -> &[f64] {
        &self.scores
    }

    pub fn log_norm(&self) -> f64 {
        self.log_norm
    }

    /// Label with the highest current value
    pub fn best_label(&self) -> u32 {
        argmax(&self.scores) as u32
    }
}
