//! Fuzzy neighborhood graph in the input space.
//!
//! 1. Exact k-nearest neighbors (brute force, self excluded, ties by lower index).
//! 2. Per-point `rho` (distance to the nearest distinct neighbor) and `sigma` (bandwidth
//!    chosen so that the membership strengths sum to `log2(k + 1)`).
//! 3. Directed memberships `exp(-(d - rho) / sigma)`, symmetrized by fuzzy union
//!    `w_ij + w_ji - w_ij * w_ji`.

use std::collections::BTreeMap;

use rayon::prelude::*;

const SMOOTH_K_TOLERANCE: f64 = 1e-5;
const MIN_K_DIST_SCALE: f64 = 1e-3;
const BANDWIDTH_ITERS: usize = 64;

/// k nearest neighbors of every point.
#[derive(Clone, Debug)]
pub(crate) struct Neighbors {
    pub(crate) indices: Vec<Vec<usize>>,
    pub(crate) dists: Vec<Vec<f32>>,
}

/// Exact kNN by brute force. Requires `k < data.len()`.
pub(crate) fn exact_knn(data: &[Vec<f32>], k: usize) -> Neighbors {
    let n = data.len();
    debug_assert!(k < n);

    let rows: Vec<(Vec<usize>, Vec<f32>)> = (0..n)
        .into_par_iter()
        .map(|i| {
            let mut cand: Vec<(f32, usize)> = (0..n)
                .filter(|&j| j != i)
                .map(|j| (euclidean(&data[i], &data[j]), j))
                .collect();
            cand.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
            cand.truncate(k);
            cand.into_iter().map(|(d, j)| (j, d)).unzip()
        })
        .collect();

    let (indices, dists) = rows.into_iter().unzip();
    Neighbors { indices, dists }
}

#[inline]
fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum::<f32>()
        .sqrt()
}

/// Per-point `(sigma, rho)` via bisection on the bandwidth.
///
/// `k` counts other points, so the membership target `log2(k + 1)` is the log of the
/// neighborhood size including the point itself.
pub(crate) fn smooth_knn_dist(dists: &[Vec<f32>], k: usize) -> (Vec<f64>, Vec<f64>) {
    let target = ((k + 1) as f64).log2();
    let total: usize = dists.iter().map(Vec::len).sum();
    let mean_all = if total == 0 {
        0.0
    } else {
        dists.iter().flatten().map(|&d| f64::from(d)).sum::<f64>() / total as f64
    };

    let mut sigmas = Vec::with_capacity(dists.len());
    let mut rhos = Vec::with_capacity(dists.len());

    for row in dists {
        let row: Vec<f64> = row.iter().map(|&d| f64::from(d)).collect();
        let rho = row.iter().copied().find(|&d| d > 0.0).unwrap_or(0.0);

        let (mut lo, mut hi, mut mid) = (0.0f64, f64::INFINITY, 1.0f64);
        for _ in 0..BANDWIDTH_ITERS {
            let psum: f64 = row
                .iter()
                .map(|&d| {
                    let gap = d - rho;
                    if gap > 0.0 {
                        (-gap / mid).exp()
                    } else {
                        1.0
                    }
                })
                .sum();

            if (psum - target).abs() < SMOOTH_K_TOLERANCE {
                break;
            }
            if psum > target {
                hi = mid;
                mid = (lo + hi) / 2.0;
            } else {
                lo = mid;
                mid = if hi.is_infinite() { mid * 2.0 } else { (lo + hi) / 2.0 };
            }
        }

        let floor = if rho > 0.0 {
            MIN_K_DIST_SCALE * row.iter().sum::<f64>() / row.len().max(1) as f64
        } else {
            MIN_K_DIST_SCALE * mean_all
        };
        sigmas.push(mid.max(floor));
        rhos.push(rho);
    }

    (sigmas, rhos)
}

/// Symmetric fuzzy graph: both `(i, j)` and `(j, i)` are present, sorted by `(i, j)`.
#[derive(Clone, Debug)]
pub(crate) struct FuzzyGraph {
    pub(crate) edges: Vec<(usize, usize, f32)>,
}

impl FuzzyGraph {
    pub(crate) fn build(neighbors: &Neighbors, sigmas: &[f64], rhos: &[f64]) -> Self {
        let mut directed: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (i, (idx, dist)) in neighbors.indices.iter().zip(&neighbors.dists).enumerate() {
            for (&j, &d) in idx.iter().zip(dist) {
                let gap = f64::from(d) - rhos[i];
                let w = if gap <= 0.0 || sigmas[i] == 0.0 {
                    1.0
                } else {
                    (-gap / sigmas[i]).exp()
                };
                directed.insert((i, j), w);
            }
        }

        let mut sym: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (&(i, j), &w) in &directed {
            let wt = directed.get(&(j, i)).copied().unwrap_or(0.0);
            let p = w + wt - w * wt;
            sym.insert((i, j), p);
            sym.insert((j, i), p);
        }

        let edges = sym
            .into_iter()
            .filter(|&(_, w)| w > 0.0)
            .map(|((i, j), w)| (i, j, w as f32))
            .collect();
        Self { edges }
    }

    /// Drop edges too weak to be sampled within `n_epochs`.
    pub(crate) fn prune(&mut self, n_epochs: usize) {
        let max = self.max_weight();
        let threshold = max / n_epochs as f32;
        self.edges.retain(|&(_, _, w)| w >= threshold);
    }

    pub(crate) fn max_weight(&self) -> f32 {
        self.edges.iter().map(|e| e.2).fold(0.0, f32::max)
    }

    /// Epochs between samples of each edge: `max_weight / weight`.
    pub(crate) fn epochs_per_sample(&self) -> Vec<f32> {
        let max = self.max_weight();
        self.edges.iter().map(|&(_, _, w)| max / w).collect()
    }
}
