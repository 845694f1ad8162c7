//! # Quant
//!
//! Allocation models built on historical price data.

pub mod portfolio;
