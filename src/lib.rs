//! # portfolio-rs
//!
//! Portfolio optimizers over aligned historical prices:
//!
//! - [`RandomSearchOptimizer`](quant::portfolio::RandomSearchOptimizer) samples the
//!   long-only simplex and reports the efficient frontier.
//! - [`HierarchicalRiskParityOptimizer`](quant::portfolio::HierarchicalRiskParityOptimizer)
//!   seriates assets by correlation clustering and splits risk recursively.
//!
//! ```ignore
//! use portfolio_rs::quant::portfolio::*;
//!
//! let prices = PriceTable::new(assets, closes)?;
//! let search = RandomSearchOptimizer::new(&prices, RandomSearchConfig::default())?;
//! let weights = search.best(SelectionCriterion::MaxSharpe)?;
//!
//! let hrp = HierarchicalRiskParityOptimizer::from_prices(&prices, 252.0, HrpConfig::default())?;
//! println!("{}", hrp.optimize()?.allocation());
//! ```

pub mod quant;
