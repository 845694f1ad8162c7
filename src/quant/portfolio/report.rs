//! # Portfolio Report
//!
//! Plain-text tables of sampled frontiers and final allocations.

use std::cmp::Reverse;

use ordered_float::OrderedFloat;
use prettytable::Cell;
use prettytable::Row;
use prettytable::Table;
use prettytable::format;
use prettytable::row;

use super::random_search::Frontier;
use super::types::Allocation;

/// Asset weights, one row per asset.
pub fn allocation_table(allocation: &Allocation) -> Table {
  let mut table = Table::new();
  table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
  table.set_titles(row!["asset", "weight"]);
  for (asset, weight) in allocation.iter() {
    table.add_row(row![asset, format!("{weight:.4}")]);
  }
  table
}

/// Top `limit` candidates ranked by Sharpe ratio (undefined ratios last).
pub fn frontier_table(frontier: &Frontier, assets: &[String], limit: usize) -> Table {
  let mut ranked: Vec<_> = frontier.iter().collect();
  ranked.sort_by_key(|c| (c.sharpe.is_nan(), Reverse(OrderedFloat(c.sharpe))));

  let mut table = Table::new();
  table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);

  let mut titles = vec![
    Cell::new("#"),
    Cell::new("return"),
    Cell::new("volatility"),
    Cell::new("sharpe"),
  ];
  titles.extend(assets.iter().map(|a| Cell::new(a)));
  table.set_titles(Row::new(titles));

  for (rank, c) in ranked.into_iter().take(limit).enumerate() {
    let mut cells = vec![
      Cell::new(&(rank + 1).to_string()),
      Cell::new(&format!("{:.4}", c.expected_return)),
      Cell::new(&format!("{:.4}", c.volatility)),
      Cell::new(&format!("{:.4}", c.sharpe)),
    ];
    cells.extend(c.weights.iter().map(|w| Cell::new(&format!("{w:.4}"))));
    table.add_row(Row::new(cells));
  }

  table
}

#[cfg(test)]
mod tests {
  use ndarray::array;

  use super::*;
  use crate::quant::portfolio::data::PriceTable;
  use crate::quant::portfolio::random_search::RandomSearchConfig;
  use crate::quant::portfolio::random_search::RandomSearchOptimizer;

  #[test]
  fn allocation_renders_every_asset() {
    let alloc = Allocation::new(vec!["BOVA11".into(), "IVVB11".into()], array![0.25, 0.75]);
    let text = alloc.to_string();

    assert!(text.contains("BOVA11"));
    assert!(text.contains("0.7500"));
    assert_eq!(allocation_table(&alloc).len(), 2);
  }

  #[test]
  fn frontier_table_ranks_by_sharpe() {
    let prices = PriceTable::new(
      vec!["A".into(), "B".into()],
      array![[10.0, 20.0], [10.5, 19.0], [10.2, 19.8], [10.9, 19.1], [11.0, 20.4]],
    )
    .unwrap();
    let optimizer = RandomSearchOptimizer::new(
      &prices,
      RandomSearchConfig {
        samples: 50,
        seed: Some(3),
        ..RandomSearchConfig::default()
      },
    )
    .unwrap();

    let table = frontier_table(optimizer.frontier(), optimizer.assets(), 5);
    assert_eq!(table.len(), 5);

    let top = optimizer.frontier().sharpes().iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let first_row = table.get_row(0).unwrap();
    assert_eq!(first_row.get_cell(3).unwrap().get_content(), format!("{top:.4}"));
  }
}
