//! # Portfolio Types
//!
//! $$
//! \mathbf{w}^\*=\arg\max_{\mathbf{w}} \frac{\mathbb E[R_p]-r_f}{\sigma_p}
//! $$
//!
//! Shared enums, records and result containers for portfolio optimization.

use std::fmt::Display;
use std::str::FromStr;

use impl_new_derive::ImplNew;
use ndarray::Array1;

use super::error::PortfolioError;
use super::report::allocation_table;

/// Supported portfolio optimization methods.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizerMethod {
  /// Monte-Carlo sampling of the long-only simplex (Markowitz frontier).
  #[default]
  RandomSearch,
  /// Hierarchical Risk Parity (Lopez de Prado).
  HRP,
}

impl FromStr for OptimizerMethod {
  type Err = PortfolioError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "random-search" | "randomsearch" | "random_search" | "markowitz" => Ok(Self::RandomSearch),
      "hrp" | "hierarchical-risk-parity" => Ok(Self::HRP),
      other => Err(PortfolioError::invalid_argument(
        "method",
        format!("unknown optimizer method '{other}'"),
      )),
    }
  }
}

/// Criterion used to pick the best sampled portfolio.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionCriterion {
  /// Highest Sharpe ratio.
  #[default]
  MaxSharpe,
  /// Lowest volatility.
  MinVolatility,
  /// Highest expected return.
  MaxReturn,
}

impl FromStr for SelectionCriterion {
  type Err = PortfolioError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "sharpe_ratio" | "sharpe" | "maximize_sharpe" => Ok(Self::MaxSharpe),
      "volatility" | "minimize_volatility" => Ok(Self::MinVolatility),
      "return" | "maximize_return" => Ok(Self::MaxReturn),
      other => Err(PortfolioError::invalid_argument(
        "criterion",
        format!("unknown selection criterion '{other}'"),
      )),
    }
  }
}

impl Display for SelectionCriterion {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SelectionCriterion::MaxSharpe => write!(f, "maximize_sharpe"),
      SelectionCriterion::MinVolatility => write!(f, "minimize_volatility"),
      SelectionCriterion::MaxReturn => write!(f, "maximize_return"),
    }
  }
}

/// How numeric degeneracies (zero volatility, zero cluster variance) are handled.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DegeneracyPolicy {
  /// Warn and continue: equal split in HRP, NaN Sharpe in random search.
  #[default]
  Fallback,
  /// Abort with [`PortfolioError::DegenerateComputation`].
  Strict,
}

/// One sampled portfolio and its annualized metrics.
#[derive(ImplNew, Clone, Debug, PartialEq)]
pub struct Candidate {
  /// Long-only weights summing to one.
  pub weights: Array1<f64>,
  /// `w · mu`.
  pub expected_return: f64,
  /// `sqrt(w' Sigma w)`.
  pub volatility: f64,
  /// `(expected_return - risk_free) / volatility`, NaN when volatility is zero.
  pub sharpe: f64,
}

/// Portfolio weights keyed by asset identifier.
#[derive(Clone, Debug, PartialEq)]
pub struct Allocation {
  assets: Vec<String>,
  weights: Array1<f64>,
}

impl Allocation {
  pub(crate) fn new(assets: Vec<String>, weights: Array1<f64>) -> Self {
    debug_assert_eq!(assets.len(), weights.len());
    Self { assets, weights }
  }

  /// Asset identifiers in input order.
  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  /// Weights aligned with [`Allocation::assets`].
  pub fn weights(&self) -> &Array1<f64> {
    &self.weights
  }

  /// Weight of a single asset, if present.
  pub fn get(&self, asset: &str) -> Option<f64> {
    self
      .assets
      .iter()
      .position(|a| a == asset)
      .map(|i| self.weights[i])
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
    self
      .assets
      .iter()
      .map(String::as_str)
      .zip(self.weights.iter().copied())
  }

  pub fn len(&self) -> usize {
    self.assets.len()
  }

  pub fn is_empty(&self) -> bool {
    self.assets.is_empty()
  }

  /// Sum of all weights.
  pub fn total(&self) -> f64 {
    self.weights.sum()
  }

  pub fn into_weights(self) -> Array1<f64> {
    self.weights
  }
}

impl Display for Allocation {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", allocation_table(self))
  }
}
