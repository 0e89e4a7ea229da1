use crate::context::ScoreContext;
use crate::dataset::EncodedDatum;
use crate::encoding::IndexLinearizer;
use crate::error::{Error, Result};

/// A real-valued function with a gradient, as consumed by a minimizer.
pub trait DifferentiableFunction {
    /// Number of parameters
    fn dimension(&self) -> usize;

    /// Function value at `x`
    fn value_at(&mut self, x: &[f64]) -> Result<f64>;

    /// Gradient at `x`
    fn gradient_at(&mut self, x: &[f64]) -> Result<&[f64]>;

    /// Function value at `x`, writing the gradient into `gx`
    fn value_and_gradient(&mut self, x: &[f64], gx: &mut [f64]) -> Result<f64> {
        let value = self.value_at(x)?;
        gx.copy_from_slice(self.gradient_at(x)?);
        Ok(value)
    }
}

/// Regularized negative conditional log-likelihood of a maximum entropy model
///
/// For a weight vector `w` over the linearized (feature, label) grid:
///
/// ```text
/// J(w) = sum_i (log Z_i - score(i, y_i)) + (sigma^2 / 2) * ||w||^2
/// dJ/dw[f,l] = sum_i c_{i,f} * (P(l | i) - [y_i = l]) + sigma^2 * w[f,l]
/// ```
///
/// A `sigma` of zero disables the penalty entirely. Value and gradient are
/// computed together and cached for the last queried point, since a
/// minimizer usually asks for both at the same point.
#[derive(Debug)]
pub struct Objective<'a> {
    data: &'a [EncodedDatum],
    linearizer: IndexLinearizer,
    sigma: f64,
    ctx: ScoreContext,
    last_x: Option<Vec<f64>>,
    last_value: f64,
    last_gradient: Vec<f64>,
}

impl<'a> Objective<'a> {
    pub fn new(data: &'a [EncodedDatum], linearizer: IndexLinearizer, sigma: f64) -> Self {
        Self {
            data,
            linearizer,
            sigma,
            ctx: ScoreContext::new(linearizer),
            last_x: None,
            last_value: 0.0,
            last_gradient: vec![0.0; linearizer.total()],
        }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    fn requires_update(&self, x: &[f64]) -> bool {
        match &self.last_x {
            Some(last) => last.as_slice() != x,
            None => true,
        }
    }

    fn ensure_cache(&mut self, x: &[f64]) -> Result<()> {
        if x.len() != self.linearizer.total() {
            return Err(Error::Minimizer(format!(
                "point has dimension {}, expected {}",
                x.len(),
                self.linearizer.total()
            )));
        }
        if self.requires_update(x) {
            // Drop the cached point first so a failed evaluation is never reused
            self.last_x = None;
            self.last_value = self.calculate(x)?;
            self.last_x = Some(x.to_vec());
        }
        Ok(())
    }

    /// Compute the value at `x` and leave the gradient in `last_gradient`
    fn calculate(&mut self, x: &[f64]) -> Result<f64> {
        let num_labels = self.linearizer.num_labels();
        let gradient = &mut self.last_gradient;
        gradient.iter_mut().for_each(|g| *g = 0.0);

        let mut value = 0.0;
        for datum in self.data {
            let gold = datum.label_id()?;
            if gold as usize >= num_labels {
                return Err(Error::Encoding(format!(
                    "label id {} out of range for {} labels",
                    gold, num_labels
                )));
            }

            let gold_score = self.ctx.compute_scores(datum, x)?[gold as usize];
            let log_z = self.ctx.log_normalize();
            value += log_z - gold_score;

            // Expected minus empirical feature counts
            let log_probs = self.ctx.scores();
            for active in datum.features() {
                let base = self.linearizer.linear_index(active.id, 0);
                let row = &mut gradient[base..base + num_labels];
                for (g, &lp) in row.iter_mut().zip(log_probs) {
                    *g += active.count * lp.exp();
                }
                row[gold as usize] -= active.count;
            }
        }

        if self.sigma != 0.0 {
            let sigma2 = self.sigma * self.sigma;
            let mut norm2 = 0.0;
            for (g, &w) in gradient.iter_mut().zip(x) {
                *g += sigma2 * w;
                norm2 += w * w;
            }
            value += 0.5 * sigma2 * norm2;
        }

        if !value.is_finite() {
            return Err(Error::Numerical(format!("objective value is {}", value)));
        }
        if let Some(bad) = gradient.iter().position(|g| !g.is_finite()) {
            return Err(Error::Numerical(format!(
                "gradient component {} is {}",
                bad, gradient[bad]
            )));
        }
        Ok(value)
    }
}

impl<'a> DifferentiableFunction for Objective<'a> {
    fn dimension(&self) -> usize {
        self.linearizer.total()
    }

    fn value_at(&mut self, x: &[f64]) -> Result<f64> {
        self.ensure_cache(x)?;
        Ok(self.last_value)
    }

    fn gradient_at(&mut self, x: &[f64]) -> Result<&[f64]> {
        self.ensure_cache(x)?;
        Ok(&self.last_gradient)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::dataset::ActiveFeature;

    /// Three features, three labels, a handful of data points
    fn corpus() -> Vec<EncodedDatum> {
        vec![
            EncodedDatum::new(
                Some(0),
                vec![ActiveFeature::new(0, 1.0), ActiveFeature::new(1, 2.0)],
            ),
            EncodedDatum::new(
                Some(1),
                vec![ActiveFeature::new(1, 1.0), ActiveFeature::new(2, 1.0)],
            ),
            EncodedDatum::new(Some(2), vec![ActiveFeature::new(2, 3.0)]),
            EncodedDatum::new(Some(0), vec![ActiveFeature::new(0, 0.5)]),
            EncodedDatum::new(Some(1), vec![]),
        ]
    }

    fn check_gradient(sigma: f64, seed: u64) {
        let data = corpus();
        let lin = IndexLinearizer::new(3, 3);
        let mut objective = Objective::new(&data, lin, sigma);
        let mut rng = StdRng::seed_from_u64(seed);
        let x: Vec<f64> = (0..lin.total()).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let analytic = objective.gradient_at(&x).unwrap().to_vec();
        let h = 1e-5;
        for i in 0..x.len() {
            let mut plus = x.clone();
            let mut minus = x.clone();
            plus[i] += h;
            minus[i] -= h;
            let numeric =
                (objective.value_at(&plus).unwrap() - objective.value_at(&minus).unwrap()) / (2.0 * h);
            assert!(
                (numeric - analytic[i]).abs() < 1e-5,
                "component {}: analytic {} vs numeric {}",
                i,
                analytic[i],
                numeric
            );
        }
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        for seed in 0..5 {
            check_gradient(0.0, seed);
            check_gradient(1.5, seed);
        }
    }

    #[test]
    fn test_value_at_zero_is_uniform_loss() {
        let data = corpus();
        let lin = IndexLinearizer::new(3, 3);
        let mut objective = Objective::new(&data, lin, 2.0);
        let x = vec![0.0; lin.total()];
        let value = objective.value_at(&x).unwrap();
        // Every datum sees a uniform posterior over three labels
        assert!((value - 5.0 * 3f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_sigma_zero_has_no_penalty() {
        let data = vec![EncodedDatum::new(Some(0), vec![])];
        let lin = IndexLinearizer::new(1, 2);
        let x = vec![3.0, -4.0];

        let mut plain = Objective::new(&data, lin, 0.0);
        assert!((plain.value_at(&x).unwrap() - 2f64.ln()).abs() < 1e-12);
        assert_eq!(plain.gradient_at(&x).unwrap(), &[0.0, 0.0]);

        let mut ridge = Objective::new(&data, lin, 2.0);
        // 0.5 * 4 * 25
        assert!((ridge.value_at(&x).unwrap() - (2f64.ln() + 50.0)).abs() < 1e-12);
        assert_eq!(ridge.gradient_at(&x).unwrap(), &[12.0, -16.0]);
    }

    #[test]
    fn test_large_scores_stay_finite() {
        let data = vec![EncodedDatum::new(
            Some(1),
            vec![ActiveFeature::new(0, 1.0)],
        )];
        let lin = IndexLinearizer::new(1, 2);
        let mut objective = Objective::new(&data, lin, 0.0);
        let x = vec![1000.0, 0.0];
        let value = objective.value_at(&x).unwrap();
        assert!((value - 1000.0).abs() < 1e-9);
        let g = objective.gradient_at(&x).unwrap();
        assert!((g[0] - 1.0).abs() < 1e-12);
        assert!((g[1] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cache_tracks_last_point() {
        let data = corpus();
        let lin = IndexLinearizer::new(3, 3);
        let mut objective = Objective::new(&data, lin, 1.0);
        let x0 = vec![0.0; lin.total()];
        let mut x1 = x0.clone();
        x1[4] = 0.75;

        let v0 = objective.value_at(&x0).unwrap();
        let g0 = objective.gradient_at(&x0).unwrap().to_vec();
        let v1 = objective.value_at(&x1).unwrap();
        assert_ne!(v0, v1);
        assert_eq!(objective.value_at(&x0).unwrap(), v0);
        assert_eq!(objective.gradient_at(&x0).unwrap(), g0.as_slice());
    }

    #[test]
    fn test_unlabeled_datum_is_invalid_state() {
        let data = vec![EncodedDatum::new(None, vec![ActiveFeature::new(0, 1.0)])];
        let lin = IndexLinearizer::new(1, 2);
        let mut objective = Objective::new(&data, lin, 1.0);
        let err = objective.value_at(&[0.0, 0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_non_finite_weights_are_numerical_error() {
        let data = corpus();
        let lin = IndexLinearizer::new(3, 3);
        let mut objective = Objective::new(&data, lin, 1.0);
        let mut x = vec![0.0; lin.total()];
        x[0] = f64::INFINITY;
        let err = objective.value_at(&x).unwrap_err();
        assert!(matches!(err, Error::Numerical(_)));
    }

    #[test]
    fn test_wrong_dimension() {
        let data = corpus();
        let lin = IndexLinearizer::new(3, 3);
        let mut objective = Objective::new(&data, lin, 1.0);
        assert!(objective.value_at(&[0.0; 4]).is_err());
    }
}
