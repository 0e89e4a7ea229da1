use std::cell::RefCell;

use log::{debug, info, warn};

use super::super::objective::{DifferentiableFunction, Objective};
use super::{parse_param, MaxEnt, ParamSet, TrainingAlgorithm};
use crate::dataset::EncodedDatum;
use crate::encoding::IndexLinearizer;
use crate::error::{Error, Result};

/// Line search algorithm for L-BFGS optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineSearchAlgorithm {
    /// More-Thuente line search
    #[default]
    MoreThuente,
    /// Backtracking with Armijo condition
    BacktrackingArmijo,
    /// Backtracking with Wolfe condition
    BacktrackingWolfe,
    /// Backtracking with strong Wolfe condition
    BacktrackingStrongWolfe,
}

impl LineSearchAlgorithm {
    fn to_liblbfgs_str(self) -> &'static str {
        match self {
            Self::MoreThuente => "MoreThuente",
            Self::BacktrackingArmijo => "BacktrackingArmijo",
            Self::BacktrackingWolfe => "BacktrackingWolfe",
            Self::BacktrackingStrongWolfe => "BacktrackingStrongWolfe",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "MoreThuente" => Some(Self::MoreThuente),
            "BacktrackingArmijo" => Some(Self::BacktrackingArmijo),
            "BacktrackingWolfe" => Some(Self::BacktrackingWolfe),
            "BacktrackingStrongWolfe" => Some(Self::BacktrackingStrongWolfe),
            _ => None,
        }
    }
}

/// Maximum entropy training parameters.
///
/// `sigma` scales the L2 penalty `(sigma^2 / 2) * ||w||^2`; zero turns it off.
#[derive(Debug, Clone)]
pub struct MaxEntParams {
    sigma: f64,
    max_iterations: usize,
    epsilon: f64,
    period: usize,
    delta: f64,
    linesearch: LineSearchAlgorithm,
    max_linesearch: usize,
}

impl Default for MaxEntParams {
    fn default() -> Self {
        Self {
            sigma: 1.0,
            max_iterations: 100,
            epsilon: 1e-4,
            period: 10,
            delta: 1e-5,
            linesearch: LineSearchAlgorithm::default(),
            max_linesearch: 20,
        }
    }
}

impl MaxEntParams {
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn set_sigma(&mut self, sigma: f64) -> Result<()> {
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(Error::invalid_input("sigma must be non-negative"));
        }
        self.sigma = sigma;
        Ok(())
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) -> Result<()> {
        if max_iterations < 1 {
            return Err(Error::invalid_input("max_iterations must be at least 1"));
        }
        self.max_iterations = max_iterations;
        Ok(())
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) -> Result<()> {
        if epsilon.is_nan() || epsilon < 0.0 {
            return Err(Error::invalid_input("epsilon must be non-negative"));
        }
        self.epsilon = epsilon;
        Ok(())
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Set the period for the delta-based convergence test.
    ///
    /// Setting period to 0 disables the delta-based convergence test
    /// (only gradient-based epsilon test is used).
    pub fn set_period(&mut self, period: usize) {
        self.period = period;
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn set_delta(&mut self, delta: f64) -> Result<()> {
        if delta.is_nan() || delta < 0.0 {
            return Err(Error::invalid_input("delta must be non-negative"));
        }
        self.delta = delta;
        Ok(())
    }

    pub fn linesearch(&self) -> LineSearchAlgorithm {
        self.linesearch
    }

    pub fn set_linesearch(&mut self, linesearch: LineSearchAlgorithm) {
        self.linesearch = linesearch;
    }

    pub fn max_linesearch(&self) -> usize {
        self.max_linesearch
    }

    pub fn set_max_linesearch(&mut self, max_linesearch: usize) -> Result<()> {
        if max_linesearch == 0 {
            return Err(Error::invalid_input("max_linesearch must be positive"));
        }
        self.max_linesearch = max_linesearch;
        Ok(())
    }
}

impl ParamSet for MaxEntParams {
    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "sigma" => self.set_sigma(parse_param(name, value)?),
            "max_iterations" | "iterations" => self.set_max_iterations(parse_param(name, value)?),
            "epsilon" => self.set_epsilon(parse_param(name, value)?),
            "period" => {
                self.set_period(parse_param(name, value)?);
                Ok(())
            }
            "delta" => self.set_delta(parse_param(name, value)?),
            "linesearch" => {
                let linesearch = LineSearchAlgorithm::from_name(value).ok_or_else(|| {
                    Error::InvalidInput(format!("invalid value for linesearch: {}", value))
                })?;
                self.set_linesearch(linesearch);
                Ok(())
            }
            "max_linesearch" => self.set_max_linesearch(parse_param(name, value)?),
            _ => Err(Error::InvalidInput(format!("unknown parameter: {}", name))),
        }
    }

    fn get(&self, name: &str) -> Result<String> {
        match name {
            "sigma" => Ok(self.sigma.to_string()),
            "max_iterations" | "iterations" => Ok(self.max_iterations.to_string()),
            "epsilon" => Ok(self.epsilon.to_string()),
            "period" => Ok(self.period.to_string()),
            "delta" => Ok(self.delta.to_string()),
            "linesearch" => Ok(self.linesearch.to_liblbfgs_str().to_string()),
            "max_linesearch" => Ok(self.max_linesearch.to_string()),
            _ => Err(Error::InvalidInput(format!("unknown parameter: {}", name))),
        }
    }
}

impl TrainingAlgorithm for MaxEnt {
    type Params = MaxEntParams;

    fn train(
        params: &MaxEntParams,
        data: &[EncodedDatum],
        linearizer: IndexLinearizer,
        verbose: bool,
    ) -> Result<Vec<f64>> {
        let mut objective = Objective::new(data, linearizer, params.sigma());
        let initial = vec![0.0; linearizer.total()];
        let minimized = minimize(&mut objective, initial, params, verbose)?;
        info!(
            "Maximum entropy training: {} iterations, converged = {}",
            minimized.trace.len().saturating_sub(1),
            minimized.converged
        );
        Ok(minimized.weights)
    }
}

/// Outcome of a minimization run
#[derive(Debug, Clone)]
pub(crate) struct Minimized {
    /// Last accepted point
    pub weights: Vec<f64>,
    /// Objective value at the start and at every accepted point after it
    pub trace: Vec<f64>,
    /// Whether the run stopped on the gradient-norm or the delta test
    pub converged: bool,
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Relative decrease of the objective over the last `period` iterations
/// is at most `delta`
fn reached_delta(trace: &[f64], period: usize, delta: f64) -> bool {
    if period == 0 || trace.len() <= period {
        return false;
    }
    let current = trace[trace.len() - 1];
    let past = trace[trace.len() - 1 - period];
    (past - current).abs() <= delta * current.abs()
}

/// Minimize `function` with L-BFGS starting from `initial`.
///
/// Running out of iterations or failing a line search is not fatal: the
/// last accepted point is kept and `converged` is false. An error raised by
/// `function` itself (for instance a non-finite gradient) aborts the run
/// and is returned as is.
pub(crate) fn minimize<D: DifferentiableFunction>(
    function: &mut D,
    initial: Vec<f64>,
    params: &MaxEntParams,
    verbose: bool,
) -> Result<Minimized> {
    let mut weights = initial;
    if weights.len() != function.dimension() {
        return Err(Error::Minimizer(format!(
            "initial point has dimension {}, expected {}",
            weights.len(),
            function.dimension()
        )));
    }
    if weights.is_empty() {
        debug!("Nothing to optimize: no known features");
        return Ok(Minimized {
            weights,
            trace: Vec::new(),
            converged: true,
        });
    }

    let mut trace = vec![function.value_at(&weights)?];
    let mut last_point = weights.clone();
    let mut delta_reached = false;
    let function = RefCell::new(function);
    let failure: RefCell<Option<Error>> = RefCell::new(None);

    // Objective function: negative log-likelihood + L2 regularization
    let evaluate = |x: &[f64], gx: &mut [f64]| -> anyhow::Result<f64> {
        function
            .borrow_mut()
            .value_and_gradient(x, gx)
            .map_err(|err| {
                *failure.borrow_mut() = Some(err.clone());
                anyhow::Error::from(err)
            })
    };

    // Progress callback. liblbfgs reports every point before stepping away
    // from it, so the start shows up more than once and the final point
    // never does; its `fx` is not refreshed by the line search either.
    let progress = |prgr: &liblbfgs::Progress| -> bool {
        if prgr.x == last_point.as_slice() {
            return false;
        }
        let fx = match function.borrow_mut().value_at(prgr.x) {
            Ok(fx) => fx,
            Err(err) => {
                *failure.borrow_mut() = Some(err);
                return true;
            }
        };
        last_point.copy_from_slice(prgr.x);
        trace.push(fx);

        let iteration = trace.len() - 1;
        if verbose {
            info!(
                "Iteration {}: loss = {:.6}, ||x|| = {:.6}, ||g|| = {:.6}",
                iteration, fx, prgr.xnorm, prgr.gnorm
            );
        } else {
            debug!(
                "Iteration {}: loss = {:.6}, ||x|| = {:.6}, ||g|| = {:.6}",
                iteration, fx, prgr.xnorm, prgr.gnorm
            );
        }

        // liblbfgs 0.1 takes a delta setting but never applies it
        if reached_delta(&trace, params.period(), params.delta()) {
            delta_reached = true;
            return true;
        }
        false
    };

    let result = liblbfgs::lbfgs()
        .with_max_iterations(params.max_iterations())
        .with_epsilon(params.epsilon())
        .with_max_linesearch(params.max_linesearch())
        .with_linesearch_algorithm(params.linesearch().to_liblbfgs_str())
        .minimize(&mut weights, evaluate, progress);

    if let Some(err) = failure.into_inner() {
        return Err(err);
    }
    let function = function.into_inner();

    let line_search_failed = match result {
        Ok(_) => false,
        Err(err) => {
            warn!("L-BFGS line search failed ({}); keeping the last accepted point", err);
            weights.copy_from_slice(&last_point);
            true
        }
    };
    if weights != last_point {
        trace.push(function.value_at(&weights)?);
    }

    let gnorm = norm(function.gradient_at(&weights)?);
    let gradient_small = gnorm / norm(&weights).max(1.0) <= params.epsilon();
    let converged = !line_search_failed && (gradient_small || delta_reached);
    let iterations = trace.len() - 1;
    let loss = trace[iterations];
    if converged {
        info!(
            "L-BFGS converged after {} iterations with loss = {:.6}",
            iterations, loss
        );
    } else if !line_search_failed {
        warn!(
            "L-BFGS stopped after {} iterations without converging (loss = {:.6}, ||g|| = {:.6}); keeping the last accepted point",
            iterations, loss, gnorm
        );
    }

    Ok(Minimized {
        weights,
        trace,
        converged,
    })
}
