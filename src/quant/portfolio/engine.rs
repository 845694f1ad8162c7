//! # Portfolio Engine
//!
//! $$
//! \mathbf{w}^\* = \operatorname{Optimize}(\mu, \Sigma)
//! $$
//!
//! High-level orchestration API for optimizer selection over a price table.

use super::data::PriceTable;
use super::error::Result;
use super::hrp::HierarchicalRiskParityOptimizer;
use super::hrp::HrpConfig;
use super::random_search::RandomSearchConfig;
use super::random_search::RandomSearchOptimizer;
use super::types::Allocation;
use super::types::OptimizerMethod;
use super::types::SelectionCriterion;

/// Runtime configuration for [`PortfolioEngine`].
#[derive(Clone, Debug, Default)]
pub struct PortfolioEngineConfig {
  /// Optimizer used by [`PortfolioEngine::allocate`].
  pub method: OptimizerMethod,
  /// Candidate picked from the random-search frontier.
  pub criterion: SelectionCriterion,
  /// Random-search settings; `periods_per_year` also annualizes the HRP covariance.
  pub random_search: RandomSearchConfig,
  /// HRP settings.
  pub hrp: HrpConfig,
}

/// Single entry-point engine for portfolio allocation.
#[derive(Clone, Debug)]
pub struct PortfolioEngine {
  config: PortfolioEngineConfig,
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PortfolioEngineConfig) -> Self {
    Self { config }
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PortfolioEngineConfig {
    &self.config
  }

  /// Allocate across the assets of `prices` with the configured method.
  pub fn allocate(&self, prices: &PriceTable) -> Result<Allocation> {
    tracing::debug!(method = ?self.config.method, n_assets = prices.n_assets(), "allocating");
    match self.config.method {
      OptimizerMethod::RandomSearch => {
        RandomSearchOptimizer::new(prices, self.config.random_search.clone())?
          .best_allocation(self.config.criterion)
      }
      OptimizerMethod::HRP => Ok(
        HierarchicalRiskParityOptimizer::from_prices(
          prices,
          self.config.random_search.periods_per_year,
          self.config.hrp,
        )?
        .optimize()?
        .into_allocation(),
      ),
    }
  }
}
