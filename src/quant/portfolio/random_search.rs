//! # Random Search (Markowitz Frontier)
//!
//! $$
//! \mathbf{w}=\frac{\mathbf{u}}{\mathbf{1}^\top\mathbf{u}},\ \mathbf{u}\sim\mathcal U[0,1)^n,\qquad
//! \mu_p=\mathbf{w}^\top\mu,\ \sigma_p=\sqrt{\mathbf{w}^\top\Sigma\mathbf{w}}
//! $$
//!
//! Monte-Carlo estimate of the long-only efficient frontier.

use std::cmp::Reverse;

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use ndarray::parallel::prelude::*;
use ndarray_rand::RandomExt;
use ordered_float::OrderedFloat;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Uniform;

use super::data::PriceTable;
use super::data::ReturnKind;
use super::data::mean_returns;
use super::data::sample_covariance;
use super::error::PortfolioError;
use super::error::Result;
use super::types::Allocation;
use super::types::Candidate;
use super::types::DegeneracyPolicy;
use super::types::SelectionCriterion;

/// Volatilities below this make the Sharpe ratio undefined.
const ZERO_VOLATILITY: f64 = 1e-15;

/// Runtime configuration for [`RandomSearchOptimizer`].
#[derive(Clone, Debug)]
pub struct RandomSearchConfig {
  /// Number of sampled portfolios.
  pub samples: usize,
  /// Annual risk-free rate used in the Sharpe ratio.
  pub risk_free: f64,
  /// Annualization factor for mean returns and covariance (252 for daily data).
  pub periods_per_year: f64,
  /// Seed for reproducible sampling; `None` uses OS entropy.
  pub seed: Option<u64>,
  /// Evaluate candidates on the rayon pool.
  pub parallel: bool,
  /// Handling of zero-volatility candidates.
  pub policy: DegeneracyPolicy,
}

impl Default for RandomSearchConfig {
  fn default() -> Self {
    Self {
      samples: 10_000,
      risk_free: 0.0,
      periods_per_year: 252.0,
      seed: None,
      parallel: true,
      policy: DegeneracyPolicy::Fallback,
    }
  }
}

impl RandomSearchConfig {
  fn validate(&self) -> Result<()> {
    if self.samples == 0 {
      return Err(PortfolioError::invalid_argument(
        "samples",
        "must be a positive integer",
      ));
    }
    if !self.risk_free.is_finite() {
      return Err(PortfolioError::invalid_argument(
        "risk_free",
        format!("must be finite, got {}", self.risk_free),
      ));
    }
    if !self.periods_per_year.is_finite() || self.periods_per_year <= 0.0 {
      return Err(PortfolioError::invalid_argument(
        "periods_per_year",
        format!("must be finite and positive, got {}", self.periods_per_year),
      ));
    }
    Ok(())
  }
}

/// Table of sampled portfolios, one row per candidate.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frontier {
  candidates: Vec<Candidate>,
}

impl Frontier {
  pub fn candidates(&self) -> &[Candidate] {
    &self.candidates
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
    self.candidates.iter()
  }

  pub fn len(&self) -> usize {
    self.candidates.len()
  }

  pub fn is_empty(&self) -> bool {
    self.candidates.is_empty()
  }

  /// Expected return column.
  pub fn returns(&self) -> Array1<f64> {
    self.candidates.iter().map(|c| c.expected_return).collect()
  }

  /// Volatility column.
  pub fn volatilities(&self) -> Array1<f64> {
    self.candidates.iter().map(|c| c.volatility).collect()
  }

  /// Sharpe ratio column.
  pub fn sharpes(&self) -> Array1<f64> {
    self.candidates.iter().map(|c| c.sharpe).collect()
  }

  /// Row index of the best candidate; NaN metrics are skipped and ties go to the first row.
  pub fn best_index(&self, criterion: SelectionCriterion) -> Option<usize> {
    let rows = self.candidates.iter().enumerate();
    let best = match criterion {
      SelectionCriterion::MaxSharpe => rows
        .filter(|(_, c)| !c.sharpe.is_nan())
        .min_by_key(|(_, c)| Reverse(OrderedFloat(c.sharpe))),
      SelectionCriterion::MinVolatility => rows
        .filter(|(_, c)| !c.volatility.is_nan())
        .min_by_key(|(_, c)| OrderedFloat(c.volatility)),
      SelectionCriterion::MaxReturn => rows
        .filter(|(_, c)| !c.expected_return.is_nan())
        .min_by_key(|(_, c)| Reverse(OrderedFloat(c.expected_return))),
    };
    best.map(|(i, _)| i)
  }
}

impl<'a> IntoIterator for &'a Frontier {
  type Item = &'a Candidate;
  type IntoIter = std::slice::Iter<'a, Candidate>;

  fn into_iter(self) -> Self::IntoIter {
    self.candidates.iter()
  }
}

/// Monte-Carlo sampler of the long-only weight simplex.
#[derive(Clone, Debug)]
pub struct RandomSearchOptimizer {
  assets: Vec<String>,
  mean_returns: Array1<f64>,
  covariance: Array2<f64>,
  frontier: Frontier,
  config: RandomSearchConfig,
}

impl RandomSearchOptimizer {
  /// Estimate annualized moments from `prices` and sample `config.samples` portfolios.
  pub fn new(prices: &PriceTable, config: RandomSearchConfig) -> Result<Self> {
    prices.ensure_optimizable()?;
    config.validate()?;

    let returns = prices.returns(ReturnKind::Simple);
    let mean_returns = mean_returns(&returns) * config.periods_per_year;
    let covariance = sample_covariance(&returns)? * config.periods_per_year;

    let frontier = sample_frontier(&mean_returns, &covariance, &config)?;
    tracing::debug!(
      n_assets = prices.n_assets(),
      n_periods = prices.n_periods(),
      samples = frontier.len(),
      "random search frontier sampled"
    );

    Ok(Self {
      assets: prices.assets().to_vec(),
      mean_returns,
      covariance,
      frontier,
      config,
    })
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  /// Annualized mean simple returns.
  pub fn mean_returns(&self) -> &Array1<f64> {
    &self.mean_returns
  }

  /// Annualized sample covariance of simple returns.
  pub fn covariance(&self) -> &Array2<f64> {
    &self.covariance
  }

  pub fn config(&self) -> &RandomSearchConfig {
    &self.config
  }

  pub fn frontier(&self) -> &Frontier {
    &self.frontier
  }

  /// Best candidate under `criterion`.
  pub fn best_candidate(&self, criterion: SelectionCriterion) -> Result<&Candidate> {
    self
      .frontier
      .best_index(criterion)
      .map(|i| &self.frontier.candidates[i])
      .ok_or_else(|| {
        PortfolioError::DegenerateComputation(format!(
          "no candidate has a defined metric for {criterion}"
        ))
      })
  }

  /// Weights of the best candidate under `criterion`.
  pub fn best(&self, criterion: SelectionCriterion) -> Result<Array1<f64>> {
    Ok(self.best_candidate(criterion)?.weights.clone())
  }

  /// Like [`RandomSearchOptimizer::best`], with the criterion given by name
  /// (`"sharpe_ratio"`, `"volatility"`, `"return"`, ...).
  pub fn best_by_name(&self, criterion: &str) -> Result<Array1<f64>> {
    self.best(criterion.parse()?)
  }

  /// Best weights keyed by asset identifier.
  pub fn best_allocation(&self, criterion: SelectionCriterion) -> Result<Allocation> {
    Ok(Allocation::new(self.assets.clone(), self.best(criterion)?))
  }
}

fn sample_frontier(
  mu: &Array1<f64>,
  cov: &Array2<f64>,
  config: &RandomSearchConfig,
) -> Result<Frontier> {
  let n = mu.len();
  let mut rng = match config.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };

  let mut draws = Array2::random_using((config.samples, n), Uniform::new(0.0, 1.0), &mut rng);
  for mut row in draws.rows_mut() {
    let total = row.sum();
    if total > 0.0 {
      row /= total;
    } else {
      row.fill(1.0 / n as f64);
    }
  }

  let risk_free = config.risk_free;
  let evaluate = |w: ArrayView1<f64>| {
    let expected_return = w.dot(mu);
    let volatility = w.dot(&cov.dot(&w)).max(0.0).sqrt();
    let sharpe = if volatility > ZERO_VOLATILITY {
      (expected_return - risk_free) / volatility
    } else {
      f64::NAN
    };
    Candidate::new(w.to_owned(), expected_return, volatility, sharpe)
  };

  let candidates: Vec<Candidate> = if config.parallel {
    draws.axis_iter(Axis(0)).into_par_iter().map(&evaluate).collect()
  } else {
    draws.axis_iter(Axis(0)).map(&evaluate).collect()
  };

  let degenerate = candidates.iter().filter(|c| c.sharpe.is_nan()).count();
  if degenerate > 0 {
    match config.policy {
      DegeneracyPolicy::Fallback => tracing::warn!(
        degenerate,
        samples = candidates.len(),
        "zero volatility candidates, Sharpe ratio left undefined (NaN)"
      ),
      DegeneracyPolicy::Strict => {
        return Err(PortfolioError::DegenerateComputation(format!(
          "{degenerate} of {} candidates have zero volatility",
          candidates.len()
        )));
      }
    }
  }

  Ok(Frontier { candidates })
}
