//! # Hierarchical Risk Parity
//!
//! $$
//! \alpha = 1-\frac{\tilde V_L}{\tilde V_L+\tilde V_R},\qquad
//! \tilde V = \mathbf{w}_{\text{ivp}}^\top \Sigma\, \mathbf{w}_{\text{ivp}}
//! $$
//!
//! Seriation by agglomerative clustering of the correlation distance, then
//! level-by-level recursive bisection with inverse-variance risk budgets.

use std::ops::Range;

use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use rayon::prelude::*;

use super::cluster::ClusterTree;
use super::cluster::Linkage;
use super::cluster::correlation_distance;
use super::data::CovarianceMatrix;
use super::data::PriceTable;
use super::error::PortfolioError;
use super::error::Result;
use super::types::Allocation;
use super::types::DegeneracyPolicy;

/// Variances at or below this are treated as exactly zero.
const ZERO_VARIANCE: f64 = 1e-15;

/// Runtime configuration for [`HierarchicalRiskParityOptimizer`].
#[derive(Default, Clone, Copy, Debug)]
pub struct HrpConfig {
  /// Linkage used for the seriation tree.
  pub linkage: Linkage,
  /// Handling of sibling pairs whose cluster variances sum to zero.
  pub policy: DegeneracyPolicy,
}

/// Hierarchical Risk Parity allocator over a fixed covariance matrix.
#[derive(Clone, Debug)]
pub struct HierarchicalRiskParityOptimizer {
  cov: CovarianceMatrix,
  config: HrpConfig,
}

/// Output of [`HierarchicalRiskParityOptimizer::optimize`].
#[derive(Clone, Debug, PartialEq)]
pub struct HrpAllocation {
  allocation: Allocation,
  order: Vec<usize>,
  volatility: f64,
}

impl HrpAllocation {
  /// Weights keyed by the original asset identifiers.
  pub fn allocation(&self) -> &Allocation {
    &self.allocation
  }

  /// Weights in original asset order.
  pub fn weights(&self) -> &Array1<f64> {
    self.allocation.weights()
  }

  /// Seriated asset indices (quasi-diagonal order).
  pub fn order(&self) -> &[usize] {
    &self.order
  }

  /// `sqrt(w' Sigma w)` of the final weights.
  pub fn volatility(&self) -> f64 {
    self.volatility
  }

  pub fn into_allocation(self) -> Allocation {
    self.allocation
  }
}

/// Per-asset weight slots addressed by seriated position.
struct WeightArena {
  slots: Vec<f64>,
}

impl WeightArena {
  fn new(n: usize) -> Self {
    Self {
      slots: vec![1.0; n],
    }
  }

  fn scale(&mut self, range: Range<usize>, factor: f64) {
    for w in &mut self.slots[range] {
      *w *= factor;
    }
  }
}

impl HierarchicalRiskParityOptimizer {
  pub fn new(cov: CovarianceMatrix, config: HrpConfig) -> Self {
    Self { cov, config }
  }

  /// Validate a raw matrix and its identifiers, then build the optimizer.
  pub fn from_matrix(assets: Vec<String>, matrix: Array2<f64>, config: HrpConfig) -> Result<Self> {
    Ok(Self::new(CovarianceMatrix::new(assets, matrix)?, config))
  }

  /// Use the annualized simple-return covariance of a price table.
  pub fn from_prices(prices: &PriceTable, periods_per_year: f64, config: HrpConfig) -> Result<Self> {
    if !periods_per_year.is_finite() || periods_per_year <= 0.0 {
      return Err(PortfolioError::invalid_argument(
        "periods_per_year",
        format!("must be finite and positive, got {periods_per_year}"),
      ));
    }
    Ok(Self::new(
      CovarianceMatrix::from_prices(prices, periods_per_year)?,
      config,
    ))
  }

  pub fn covariance(&self) -> &CovarianceMatrix {
    &self.cov
  }

  pub fn config(&self) -> &HrpConfig {
    &self.config
  }

  /// Leaf order of the clustering tree.
  pub fn seriation(&self) -> Vec<usize> {
    let dist = correlation_distance(&self.cov.correlation());
    ClusterTree::build(&dist, self.config.linkage).leaf_order()
  }

  /// Compute HRP weights. Pure: repeated calls give identical results.
  pub fn optimize(&self) -> Result<HrpAllocation> {
    let cov = self.cov.matrix();
    let n = self.cov.n_assets();
    let order = self.seriation();
    tracing::debug!(n_assets = n, linkage = ?self.config.linkage, ?order, "hrp seriation");

    let mut arena = WeightArena::new(n);
    let mut clusters = vec![0..n];

    while !clusters.is_empty() {
      let pairs: Vec<(Range<usize>, Range<usize>)> = clusters
        .iter()
        .map(|c| {
          let mid = c.start + c.len() / 2;
          (c.start..mid, mid..c.end)
        })
        .collect();

      let variances: Vec<(f64, f64)> = pairs
        .par_iter()
        .map(|(l, r)| {
          (
            cluster_variance(cov, &order[l.clone()]),
            cluster_variance(cov, &order[r.clone()]),
          )
        })
        .collect();

      for ((left, right), (v_left, v_right)) in pairs.iter().zip(variances) {
        let alpha = self.allocation_factor(v_left, v_right, &order[left.start..right.end])?;
        arena.scale(left.clone(), alpha);
        arena.scale(right.clone(), 1.0 - alpha);
      }

      clusters = pairs
        .into_iter()
        .flat_map(|(l, r)| [l, r])
        .filter(|c| c.len() > 1)
        .collect();
    }

    let mut weights = Array1::<f64>::zeros(n);
    for (pos, &asset) in order.iter().enumerate() {
      weights[asset] = arena.slots[pos];
    }

    let volatility = weights.dot(&cov.dot(&weights)).max(0.0).sqrt();
    Ok(HrpAllocation {
      allocation: Allocation::new(self.cov.assets().to_vec(), weights),
      order,
      volatility,
    })
  }

  fn allocation_factor(&self, v_left: f64, v_right: f64, members: &[usize]) -> Result<f64> {
    let denom = v_left + v_right;
    if denom > 1e-30 {
      return Ok(1.0 - v_left / denom);
    }

    let names: Vec<&str> = members
      .iter()
      .map(|&i| self.cov.assets()[i].as_str())
      .collect();
    match self.config.policy {
      DegeneracyPolicy::Fallback => {
        tracing::warn!(
          assets = ?names,
          "zero cluster variance on both sides of a split, splitting 50/50"
        );
        Ok(0.5)
      }
      DegeneracyPolicy::Strict => Err(PortfolioError::DegenerateComputation(format!(
        "zero cluster variance on both sides of split over {names:?}"
      ))),
    }
  }
}

/// Inverse-variance weights over `members`. Zero-variance members take the
/// whole budget in equal parts (the limit of `1 / sigma^2`).
pub fn inverse_variance_weights(cov: &Array2<f64>, members: &[usize]) -> Array1<f64> {
  let variances: Array1<f64> = members.iter().map(|&i| cov[[i, i]]).collect();
  let zero = variances.iter().filter(|&&v| v <= ZERO_VARIANCE).count();

  if zero > 0 {
    let share = 1.0 / zero as f64;
    return variances.mapv(|v| if v <= ZERO_VARIANCE { share } else { 0.0 });
  }

  let inv = variances.mapv(f64::recip);
  let total = inv.sum();
  inv / total
}

/// Variance of the inverse-variance portfolio restricted to `members`.
pub fn cluster_variance(cov: &Array2<f64>, members: &[usize]) -> f64 {
  if members.is_empty() {
    return 0.0;
  }
  let w = inverse_variance_weights(cov, members);
  let sub = cov.select(Axis(0), members).select(Axis(1), members);
  w.dot(&sub.dot(&w))
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::Array2;
  use ndarray::array;
  use ndarray_rand::RandomExt;
  use rand::SeedableRng;
  use rand::rngs::StdRng;
  use rand_distr::StandardNormal;
  use tracing_test::traced_test;

  use super::*;

  fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("A{i}")).collect()
  }

  fn hrp(matrix: Array2<f64>) -> HierarchicalRiskParityOptimizer {
    HierarchicalRiskParityOptimizer::from_matrix(names(matrix.nrows()), matrix, HrpConfig::default())
      .unwrap()
  }

  fn random_covariance(n: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let m = n + 5;
    let a = Array2::<f64>::random_using((n, m), StandardNormal, &mut rng);
    let cov = a.dot(&a.t()) / m as f64;
    // exact symmetry
    (&cov + &cov.t()) / 2.0
  }

  #[test]
  fn uncorrelated_equal_variance_pair_splits_evenly() {
    let result = hrp(Array2::eye(2)).optimize().unwrap();
    assert_abs_diff_eq!(result.weights()[0], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(result.weights()[1], 0.5, epsilon = 1e-12);
  }

  #[test]
  fn uncorrelated_assets_reduce_to_inverse_variance() {
    let cov = Array2::from_diag(&array![1.0, 2.0, 4.0]);
    let result = hrp(cov).optimize().unwrap();

    assert_eq!(result.order(), &[2, 0, 1]);
    assert_abs_diff_eq!(result.weights()[0], 4.0 / 7.0, epsilon = 1e-12);
    assert_abs_diff_eq!(result.weights()[1], 2.0 / 7.0, epsilon = 1e-12);
    assert_abs_diff_eq!(result.weights()[2], 1.0 / 7.0, epsilon = 1e-12);
  }

  #[test]
  fn weights_sum_to_one_for_random_covariances() {
    for (n, seed) in [(2, 1), (3, 2), (5, 3), (8, 4), (13, 5), (21, 6)] {
      let result = hrp(random_covariance(n, seed)).optimize().unwrap();
      assert_abs_diff_eq!(result.weights().sum(), 1.0, epsilon = 1e-9);
      assert!(result.weights().iter().all(|&w| w >= 0.0));
    }
  }

  #[test]
  fn optimize_is_idempotent() {
    let optimizer = hrp(random_covariance(7, 42));
    let first = optimizer.optimize().unwrap();
    let second = optimizer.optimize().unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn correlated_blocks_are_seriated_together() {
    // pairs {0, 2} and {1, 3} correlate at 0.9, blocks are uncorrelated
    let sigmas = array![0.1, 0.2, 0.15, 0.3];
    let mut corr = Array2::<f64>::eye(4);
    for (i, j) in [(0, 2), (1, 3)] {
      corr[[i, j]] = 0.9;
      corr[[j, i]] = 0.9;
    }
    let cov = Array2::from_shape_fn((4, 4), |(i, j)| sigmas[i] * sigmas[j] * corr[[i, j]]);
    let result = hrp(cov.clone()).optimize().unwrap();

    let mut top_left = result.order()[..2].to_vec();
    top_left.sort_unstable();
    assert!(top_left == vec![0, 2] || top_left == vec![1, 3]);

    // the first split separates the blocks: each block's total follows the
    // inverse cluster variance of the other
    let v_a = cluster_variance(&cov, &[0, 2]);
    let v_b = cluster_variance(&cov, &[1, 3]);
    let w = result.weights();
    assert_abs_diff_eq!(w[0] + w[2], 1.0 - v_a / (v_a + v_b), epsilon = 1e-12);
    assert_abs_diff_eq!(w.sum(), 1.0, epsilon = 1e-9);
  }

  #[test]
  fn zero_variance_asset_takes_its_side_of_the_split() {
    let prices = array![
      [100.0, 20.0, 40.0],
      [100.0, 21.0, 41.5],
      [100.0, 20.5, 40.6],
      [100.0, 22.0, 43.1],
      [100.0, 21.2, 42.0],
      [100.0, 21.9, 43.3],
    ];
    let table = PriceTable::new(
      vec!["CASH".to_string(), "B".to_string(), "C".to_string()],
      prices,
    )
    .unwrap();
    let result = HierarchicalRiskParityOptimizer::from_prices(&table, 252.0, HrpConfig::default())
      .unwrap()
      .optimize()
      .unwrap();

    let alloc = result.allocation();
    let cash = alloc.get("CASH").unwrap();
    assert!(cash > alloc.get("B").unwrap());
    assert!(cash > alloc.get("C").unwrap());
    assert_abs_diff_eq!(alloc.total(), 1.0, epsilon = 1e-9);
  }

  #[test]
  #[traced_test]
  fn all_zero_covariance_falls_back_to_even_split() {
    let result = hrp(Array2::zeros((2, 2))).optimize().unwrap();
    assert_abs_diff_eq!(result.weights()[0], 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(result.weights()[1], 0.5, epsilon = 1e-12);
    assert!(logs_contain("zero cluster variance"));
  }

  #[test]
  fn all_zero_covariance_is_an_error_when_strict() {
    let optimizer = HierarchicalRiskParityOptimizer::from_matrix(
      names(2),
      Array2::zeros((2, 2)),
      HrpConfig {
        policy: DegeneracyPolicy::Strict,
        ..HrpConfig::default()
      },
    )
    .unwrap();
    let err = optimizer.optimize().unwrap_err();
    assert!(matches!(err, PortfolioError::DegenerateComputation(_)));
  }

  #[test]
  fn construction_rejects_mislabelled_matrix() {
    let err = HierarchicalRiskParityOptimizer::from_matrix(names(3), Array2::eye(2), HrpConfig::default())
      .unwrap_err();
    assert!(matches!(err, PortfolioError::InvalidInput(_)));
  }

  #[test]
  fn cluster_variance_of_uncorrelated_pair() {
    // ivp weights (2/3, 1/3) on variances (1, 2)
    let cov = Array2::from_diag(&array![1.0, 2.0]);
    assert_abs_diff_eq!(cluster_variance(&cov, &[0, 1]), 2.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(cluster_variance(&cov, &[1]), 2.0, epsilon = 1e-12);
  }
}
