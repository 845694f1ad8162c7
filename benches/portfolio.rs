use std::hint::black_box;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;
use ndarray::Array2;
use ndarray_rand::RandomExt;
use portfolio_rs::quant::portfolio::HierarchicalRiskParityOptimizer;
use portfolio_rs::quant::portfolio::HrpConfig;
use portfolio_rs::quant::portfolio::PriceTable;
use portfolio_rs::quant::portfolio::RandomSearchConfig;
use portfolio_rs::quant::portfolio::RandomSearchOptimizer;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::Normal;

const PERIODS: usize = 504;

fn prices(n_assets: usize) -> PriceTable {
  let mut rng = StdRng::seed_from_u64(0);
  let shocks = Array2::random_using(
    (PERIODS, n_assets),
    Normal::new(0.0003, 0.01).unwrap(),
    &mut rng,
  );
  let mut closes = Array2::<f64>::zeros((PERIODS, n_assets));
  closes.row_mut(0).fill(100.0);
  for t in 1..PERIODS {
    for j in 0..n_assets {
      closes[[t, j]] = closes[[t - 1, j]] * (1.0 + shocks[[t, j]]);
    }
  }
  let names = (0..n_assets).map(|j| format!("A{j}")).collect();
  PriceTable::new(names, closes).unwrap()
}

fn bench_random_search(c: &mut Criterion) {
  let mut group = c.benchmark_group("RandomSearch");
  let table = prices(10);

  for parallel in [false, true] {
    group.bench_with_input(
      BenchmarkId::new("10k_samples", if parallel { "rayon" } else { "serial" }),
      &parallel,
      |b, &parallel| {
        b.iter(|| {
          let config = RandomSearchConfig {
            seed: Some(7),
            parallel,
            ..RandomSearchConfig::default()
          };
          black_box(RandomSearchOptimizer::new(&table, config).unwrap())
        })
      },
    );
  }

  group.finish();
}

fn bench_hrp(c: &mut Criterion) {
  let mut group = c.benchmark_group("HRP");

  for n in [16, 64, 256] {
    let optimizer = HierarchicalRiskParityOptimizer::from_prices(&prices(n), 252.0, HrpConfig::default())
      .unwrap();
    group.bench_with_input(BenchmarkId::new("optimize", n), &optimizer, |b, opt| {
      b.iter(|| black_box(opt.optimize().unwrap()))
    });
  }

  group.finish();
}

criterion_group!(benches, bench_random_search, bench_hrp);
criterion_main!(benches);
