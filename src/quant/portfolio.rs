//! # Portfolio
//!
//! $$
//! \sigma_p^2 = \mathbf{w}^\top \Sigma \mathbf{w}
//! $$
//!
//! Monte-Carlo efficient frontier and hierarchical risk parity allocation.

pub mod cluster;
pub mod data;
pub mod engine;
pub mod error;
pub mod hrp;
pub mod random_search;
pub mod report;
pub mod types;

pub use cluster::ClusterTree;
pub use cluster::Linkage;
pub use data::CovarianceMatrix;
pub use data::PriceTable;
pub use data::ReturnKind;
pub use data::mean_returns;
pub use data::returns;
pub use data::sample_covariance;
pub use engine::PortfolioEngine;
pub use engine::PortfolioEngineConfig;
pub use error::PortfolioError;
pub use error::Result;
pub use hrp::HierarchicalRiskParityOptimizer;
pub use hrp::HrpAllocation;
pub use hrp::HrpConfig;
pub use hrp::cluster_variance;
pub use random_search::Frontier;
pub use random_search::RandomSearchConfig;
pub use random_search::RandomSearchOptimizer;
pub use report::allocation_table;
pub use report::frontier_table;
pub use types::Allocation;
pub use types::Candidate;
pub use types::DegeneracyPolicy;
pub use types::OptimizerMethod;
pub use types::SelectionCriterion;
