//! # Portfolio Data Utilities
//!
//! $$
//! \Sigma_{ij} = \sigma_i \sigma_j \rho_{ij}
//! $$
//!
//! Price tables, return preprocessing and covariance/correlation construction.

use std::collections::HashSet;

use chrono::NaiveDate;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView2;
use ndarray::Axis;
use ndarray::s;
use ndarray_stats::CorrelationExt;

use super::error::PortfolioError;
use super::error::Result;

const SYMMETRY_TOL: f64 = 1e-9;

/// Period-over-period return convention.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReturnKind {
  /// `p_t / p_{t-1} - 1`
  #[default]
  Simple,
  /// `ln(p_t / p_{t-1})`
  Log,
}

/// Aligned close prices, one column per asset and one row per period.
#[derive(Clone, Debug)]
pub struct PriceTable {
  assets: Vec<String>,
  prices: Array2<f64>,
  index: Option<Vec<NaiveDate>>,
}

impl PriceTable {
  /// Build a price table from asset identifiers and a `periods x assets` matrix.
  ///
  /// Prices must be finite and strictly positive; identifiers must be unique.
  pub fn new(assets: Vec<String>, prices: Array2<f64>) -> Result<Self> {
    if prices.ncols() != assets.len() {
      return Err(PortfolioError::invalid_input(format!(
        "price table has {} columns but {} asset identifiers",
        prices.ncols(),
        assets.len()
      )));
    }
    ensure_unique(&assets)?;

    if let Some(((t, i), p)) = prices
      .indexed_iter()
      .find(|(_, p)| !p.is_finite() || **p <= 0.0)
    {
      return Err(PortfolioError::invalid_input(format!(
        "price of '{}' at period {t} must be finite and positive, got {p}",
        assets[i]
      )));
    }

    Ok(Self {
      assets,
      prices,
      index: None,
    })
  }

  /// Attach a calendar index; must have one strictly increasing date per period.
  pub fn with_index(mut self, index: Vec<NaiveDate>) -> Result<Self> {
    if index.len() != self.n_periods() {
      return Err(PortfolioError::invalid_input(format!(
        "index has {} dates but price table has {} periods",
        index.len(),
        self.n_periods()
      )));
    }
    if let Some(w) = index.windows(2).find(|w| w[1] <= w[0]) {
      return Err(PortfolioError::invalid_input(format!(
        "index must be strictly increasing ({} is followed by {})",
        w[0], w[1]
      )));
    }

    self.index = Some(index);
    Ok(self)
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn prices(&self) -> &Array2<f64> {
    &self.prices
  }

  pub fn index(&self) -> Option<&[NaiveDate]> {
    self.index.as_deref()
  }

  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }

  pub fn n_periods(&self) -> usize {
    self.prices.nrows()
  }

  /// Return matrix of shape `(periods - 1) x assets`.
  pub fn returns(&self, kind: ReturnKind) -> Array2<f64> {
    returns(self.prices.view(), kind)
  }

  /// Fail unless the table holds at least two assets and two periods.
  pub(crate) fn ensure_optimizable(&self) -> Result<()> {
    if self.n_assets() < 2 {
      return Err(PortfolioError::invalid_input(format!(
        "at least 2 assets are required, got {}",
        self.n_assets()
      )));
    }
    if self.n_periods() < 2 {
      return Err(PortfolioError::invalid_input(format!(
        "at least 2 periods are required, got {}",
        self.n_periods()
      )));
    }
    Ok(())
  }
}

/// Convert a `periods x assets` price matrix into period returns; the first period is dropped.
pub fn returns(prices: ArrayView2<f64>, kind: ReturnKind) -> Array2<f64> {
  let n = prices.nrows();
  if n < 2 {
    return Array2::zeros((0, prices.ncols()));
  }

  let prev = prices.slice(s![..n - 1, ..]);
  let next = prices.slice(s![1.., ..]);
  let ratio = &next / &prev;

  match kind {
    ReturnKind::Simple => ratio.mapv(|r| r - 1.0),
    ReturnKind::Log => ratio.mapv(f64::ln),
  }
}

/// Column means of a return matrix.
pub fn mean_returns(returns: &Array2<f64>) -> Array1<f64> {
  returns
    .mean_axis(Axis(0))
    .unwrap_or_else(|| Array1::zeros(returns.ncols()))
}

/// Sample covariance (ddof = 1) of a `periods x assets` return matrix.
///
/// A single observation has no dispersion estimate and yields a zero matrix.
pub fn sample_covariance(returns: &Array2<f64>) -> Result<Array2<f64>> {
  let n_assets = returns.ncols();
  match returns.nrows() {
    0 => Err(PortfolioError::invalid_input(
      "covariance needs at least one return observation",
    )),
    1 => Ok(Array2::zeros((n_assets, n_assets))),
    _ => returns
      .t()
      .cov(1.0)
      .map_err(|e| PortfolioError::invalid_input(e.to_string())),
  }
}

/// Covariance matrix with its asset labelling.
#[derive(Clone, Debug, PartialEq)]
pub struct CovarianceMatrix {
  assets: Vec<String>,
  matrix: Array2<f64>,
}

impl CovarianceMatrix {
  /// Validate and wrap an `N x N` covariance matrix.
  pub fn new(assets: Vec<String>, matrix: Array2<f64>) -> Result<Self> {
    let (rows, cols) = matrix.dim();
    if rows != cols {
      return Err(PortfolioError::invalid_input(format!(
        "covariance matrix must be square, got {rows}x{cols}"
      )));
    }
    if rows != assets.len() {
      return Err(PortfolioError::invalid_input(format!(
        "covariance matrix is {rows}x{rows} but {} asset identifiers were given",
        assets.len()
      )));
    }
    if rows < 2 {
      return Err(PortfolioError::invalid_input(format!(
        "at least 2 assets are required, got {rows}"
      )));
    }
    ensure_unique(&assets)?;

    if matrix.iter().any(|v| !v.is_finite()) {
      return Err(PortfolioError::invalid_input(
        "covariance matrix contains non-finite entries",
      ));
    }

    for i in 0..rows {
      if matrix[[i, i]] < 0.0 {
        return Err(PortfolioError::invalid_input(format!(
          "variance of '{}' is negative ({})",
          assets[i],
          matrix[[i, i]]
        )));
      }
      for j in (i + 1)..rows {
        let (a, b) = (matrix[[i, j]], matrix[[j, i]]);
        let scale = a.abs().max(b.abs()).max(1.0);
        if (a - b).abs() > SYMMETRY_TOL * scale {
          return Err(PortfolioError::invalid_input(format!(
            "covariance matrix is not symmetric at ({i}, {j}): {a} != {b}"
          )));
        }
      }
    }

    Ok(Self { assets, matrix })
  }

  /// Annualized sample covariance of simple returns.
  pub fn from_prices(prices: &PriceTable, periods_per_year: f64) -> Result<Self> {
    prices.ensure_optimizable()?;
    let cov = sample_covariance(&prices.returns(ReturnKind::Simple))? * periods_per_year;
    Self::new(prices.assets().to_vec(), cov)
  }

  pub fn assets(&self) -> &[String] {
    &self.assets
  }

  pub fn matrix(&self) -> &Array2<f64> {
    &self.matrix
  }

  pub fn n_assets(&self) -> usize {
    self.assets.len()
  }

  /// Diagonal of the matrix.
  pub fn variances(&self) -> Array1<f64> {
    self.matrix.diag().to_owned()
  }

  /// Correlation matrix implied by this covariance.
  pub fn correlation(&self) -> Array2<f64> {
    corr_from_cov(&self.matrix)
  }
}

/// Correlation from covariance; zero-variance assets are uncorrelated with everything else.
pub(crate) fn corr_from_cov(cov: &Array2<f64>) -> Array2<f64> {
  let n = cov.nrows();
  let sigmas = cov.diag().mapv(|v| v.max(0.0).sqrt());

  Array2::from_shape_fn((n, n), |(i, j)| {
    if i == j {
      return 1.0;
    }
    let denom = sigmas[i] * sigmas[j];
    if denom > 1e-15 {
      (cov[[i, j]] / denom).clamp(-1.0, 1.0)
    } else {
      0.0
    }
  })
}

fn ensure_unique(assets: &[String]) -> Result<()> {
  let mut seen = HashSet::with_capacity(assets.len());
  match assets.iter().find(|a| !seen.insert(a.as_str())) {
    Some(dup) => Err(PortfolioError::invalid_input(format!(
      "duplicate asset identifier '{dup}'"
    ))),
    None => Ok(()),
  }
}
