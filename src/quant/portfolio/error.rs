//! # Portfolio Errors
//!
//! Error taxonomy shared by the portfolio optimizers.

use thiserror::Error;

/// Errors raised by portfolio construction and optimization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PortfolioError {
  /// Malformed input shape or content (non-square matrix, too few assets or periods, ...).
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// Unrecognized name or out-of-range configuration value.
  #[error("invalid argument `{name}`: {reason}")]
  InvalidArgument { name: String, reason: String },

  /// Zero volatility or zero cluster variance where a ratio is required.
  #[error("degenerate computation: {0}")]
  DegenerateComputation(String),
}

impl PortfolioError {
  pub(crate) fn invalid_input(msg: impl Into<String>) -> Self {
    Self::InvalidInput(msg.into())
  }

  pub(crate) fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::InvalidArgument {
      name: name.into(),
      reason: reason.into(),
    }
  }
}

/// Result type alias for portfolio operations.
pub type Result<T> = std::result::Result<T, PortfolioError>;
