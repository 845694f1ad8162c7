//! # Agglomerative Clustering
//!
//! $$
//! d(k, i\cup j)=\sqrt{\frac{(n_i+n_k)d_{ik}^2+(n_j+n_k)d_{jk}^2-n_k d_{ij}^2}{n_i+n_j+n_k}}
//! $$
//!
//! Lance-Williams agglomerative clustering over a dissimilarity matrix and the
//! leaf seriation used by hierarchical risk parity.

use ndarray::Array2;

/// Merge criterion used when joining two clusters.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Linkage {
  /// Minimum increase of within-cluster variance.
  #[default]
  Ward,
  /// Nearest-neighbour distance.
  Single,
  /// Farthest-neighbour distance.
  Complete,
  /// Size-weighted mean distance (UPGMA).
  Average,
}

impl Linkage {
  /// Distance from cluster `k` to the union of `i` and `j`.
  fn update(self, d_ik: f64, d_jk: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64 {
    let (n_i, n_j, n_k) = (n_i as f64, n_j as f64, n_k as f64);
    match self {
      Linkage::Single => d_ik.min(d_jk),
      Linkage::Complete => d_ik.max(d_jk),
      Linkage::Average => (n_i * d_ik + n_j * d_jk) / (n_i + n_j),
      Linkage::Ward => {
        let num = (n_i + n_k) * d_ik * d_ik + (n_j + n_k) * d_jk * d_jk - n_k * d_ij * d_ij;
        (num / (n_i + n_j + n_k)).max(0.0).sqrt()
      }
    }
  }
}

/// One agglomeration step. Node ids below the leaf count are leaves; merge `s`
/// creates node `n_leaves + s`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Merge {
  pub left: usize,
  pub right: usize,
  pub distance: f64,
  pub size: usize,
}

/// Binary merge tree produced by agglomerative clustering.
#[derive(Clone, Debug)]
pub struct ClusterTree {
  n_leaves: usize,
  merges: Vec<Merge>,
}

impl ClusterTree {
  /// Cluster `n` items from a symmetric dissimilarity matrix.
  ///
  /// The closest active pair is found by a row-major scan, so ties resolve to
  /// the lowest indices, and the lower node id always becomes the left child.
  pub fn build(dist: &Array2<f64>, linkage: Linkage) -> Self {
    let n = dist.nrows();
    let mut merges = Vec::with_capacity(n.saturating_sub(1));
    if n < 2 {
      return Self { n_leaves: n, merges };
    }

    let mut d = dist.clone();
    let mut active = vec![true; n];
    let mut node_id: Vec<usize> = (0..n).collect();
    let mut size = vec![1usize; n];

    for step in 0..(n - 1) {
      let mut min_d = f64::INFINITY;
      let mut mi = usize::MAX;
      let mut mj = usize::MAX;

      for i in (0..n).filter(|&i| active[i]) {
        for j in ((i + 1)..n).filter(|&j| active[j]) {
          if mi == usize::MAX || d[[i, j]] < min_d {
            min_d = d[[i, j]];
            mi = i;
            mj = j;
          }
        }
      }

      let (left, right) = if node_id[mi] < node_id[mj] {
        (node_id[mi], node_id[mj])
      } else {
        (node_id[mj], node_id[mi])
      };
      let merged_size = size[mi] + size[mj];
      merges.push(Merge {
        left,
        right,
        distance: min_d,
        size: merged_size,
      });

      for k in (0..n).filter(|&k| active[k] && k != mi && k != mj) {
        let updated = linkage.update(d[[mi, k]], d[[mj, k]], min_d, size[mi], size[mj], size[k]);
        d[[mi, k]] = updated;
        d[[k, mi]] = updated;
      }

      active[mj] = false;
      node_id[mi] = n + step;
      size[mi] = merged_size;
    }

    Self { n_leaves: n, merges }
  }

  pub fn n_leaves(&self) -> usize {
    self.n_leaves
  }

  pub fn merges(&self) -> &[Merge] {
    &self.merges
  }

  /// Leaves in left-to-right (pre-order) traversal of the tree.
  pub fn leaf_order(&self) -> Vec<usize> {
    let n = self.n_leaves;
    if n < 2 {
      return (0..n).collect();
    }

    let mut order = Vec::with_capacity(n);
    let mut stack = vec![n + self.merges.len() - 1];
    while let Some(node) = stack.pop() {
      if node < n {
        order.push(node);
      } else {
        let merge = &self.merges[node - n];
        stack.push(merge.right);
        stack.push(merge.left);
      }
    }
    order
  }
}

/// Correlation distance `sqrt((1 - rho) / 2)`.
pub fn correlation_distance(corr: &Array2<f64>) -> Array2<f64> {
  corr.mapv(|c| ((1.0 - c).max(0.0) / 2.0).sqrt())
}
