//! K-means: k-means++ seeding followed by Lloyd iterations.
//!
//! # Algorithm
//!
//! 1. **Seeding** (Arthur & Vassilvitskii, 2007): pick the first centroid uniformly, then
//!    each next centroid with probability proportional to its squared distance to the
//!    nearest centroid chosen so far.
//! 2. **Assignment**: each point goes to its nearest centroid (ties to the lower id).
//! 3. **Update**: each centroid moves to the mean of its points.
//! 4. Repeat 2-3 until labels stop changing, the total squared centroid shift drops to
//!    `tol * mean feature variance`, or `max_iter` is reached.
//!
//! # Empty clusters
//!
//! A cluster that loses all its points keeps its previous centroid and stays empty until
//! a point moves back to it. This never fails the fit. In particular, when the data has
//! fewer distinct points than `k`, seeding duplicates centroids and the duplicates stay
//! empty: identical input yields one non-empty cluster.
//!
//! # Determinism
//!
//! All randomness comes from one `StdRng` seeded with `seed`, so a fixed seed and fixed
//! input always give the same labels and centroids.

use rand::prelude::*;
use tracing::{debug, warn};

use super::traits::Clustering;
use super::util::{check_points, squared_euclidean};
use crate::error::{Error, Result, Stage};

/// K-means clustering.
#[derive(Debug, Clone)]
pub struct Kmeans {
    k: usize,
    max_iter: usize,
    tol: f32,
    n_init: usize,
    seed: u64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KmeansFit {
    /// Cluster id per point, in `[0, k)`.
    pub labels: Vec<usize>,
    /// One centroid per cluster id; the mean of its members (kept in place when empty).
    pub centroids: Vec<Vec<f32>>,
    /// Lloyd iterations run by the winning restart.
    pub iterations: usize,
    /// Whether the winning restart converged before `max_iter`.
    pub converged: bool,
    /// Sum of squared distances from each point to its centroid.
    pub inertia: f32,
}

impl KmeansFit {
    /// Number of points in each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.centroids.len()];
        for &l in &self.labels {
            sizes[l] += 1;
        }
        sizes
    }

    /// Number of clusters with at least one point.
    pub fn n_nonempty(&self) -> usize {
        self.cluster_sizes().iter().filter(|&&s| s > 0).count()
    }
}

impl Kmeans {
    /// Create a k-means clusterer with `k` clusters.
    ///
    /// Defaults: `max_iter = 300`, `tol = 1e-4`, `n_init = 1`, `seed = 42`.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 300,
            tol: 1e-4,
            n_init: 1,
            seed: 42,
        }
    }

    /// Set the iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the convergence tolerance (relative to the mean feature variance).
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Set the number of seeded restarts; the lowest-inertia one is kept.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Fit and return labels, centroids, and convergence details.
    pub fn fit(&self, data: &[Vec<f32>]) -> Result<KmeansFit> {
        if self.k == 0 {
            return Err(Error::InvalidParameter {
                name: "k",
                message: "must be at least 1",
            });
        }
        if self.max_iter == 0 {
            return Err(Error::InvalidParameter {
                name: "max_iter",
                message: "must be at least 1",
            });
        }
        if self.n_init == 0 {
            return Err(Error::InvalidParameter {
                name: "n_init",
                message: "must be at least 1",
            });
        }
        let n = data.len();
        if n < self.k {
            return Err(Error::InsufficientSamples {
                stage: Stage::Partition,
                required: self.k,
                n_items: n,
            });
        }
        let d = check_points(data, Stage::Partition)?;

        let tol = self.tol * mean_variance(data, d);
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut best: Option<KmeansFit> = None;
        for run in 0..self.n_init {
            let centroids = kmeans_plus_plus(data, self.k, &mut rng);
            let fit = lloyd(data, centroids, self.max_iter, tol);
            debug!(
                run,
                iterations = fit.iterations,
                converged = fit.converged,
                inertia = fit.inertia,
                "k-means run finished"
            );
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        // n_init >= 1, so at least one run happened.
        let fit = best.ok_or(Error::InvalidParameter {
            name: "n_init",
            message: "must be at least 1",
        })?;
        let empty = fit.cluster_sizes().iter().filter(|&&s| s == 0).count();
        if empty > 0 {
            warn!(empty, k = self.k, "k-means finished with empty clusters");
        }
        Ok(fit)
    }
}

impl Default for Kmeans {
    fn default() -> Self {
        Self::new(12)
    }
}

impl Clustering for Kmeans {
    fn fit_predict(&self, data: &[Vec<f32>]) -> Result<Vec<usize>> {
        Ok(self.fit(data)?.labels)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

fn mean_variance(data: &[Vec<f32>], d: usize) -> f32 {
    let n = data.len() as f64;
    let mut total = 0.0f64;
    for dim in 0..d {
        let mean = data.iter().map(|p| f64::from(p[dim])).sum::<f64>() / n;
        total += data
            .iter()
            .map(|p| (f64::from(p[dim]) - mean).powi(2))
            .sum::<f64>()
            / n;
    }
    (total / d as f64) as f32
}

fn kmeans_plus_plus(data: &[Vec<f32>], k: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let n = data.len();
    let first = rng.random_range(0..n);
    let mut centroids = Vec::with_capacity(k);
    centroids.push(data[first].clone());

    let mut nearest: Vec<f64> = data
        .iter()
        .map(|p| f64::from(squared_euclidean(p, &data[first])))
        .collect();

    for _ in 1..k {
        let total: f64 = nearest.iter().sum();
        let next = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            let mut pick = None;
            for (i, &w) in nearest.iter().enumerate() {
                if w <= 0.0 {
                    continue;
                }
                acc += w;
                pick = Some(i);
                if acc > target {
                    break;
                }
            }
            pick.unwrap_or(first)
        } else {
            // Every point already coincides with a centroid.
            first
        };

        centroids.push(data[next].clone());
        for (d, p) in nearest.iter_mut().zip(data) {
            let dist = f64::from(squared_euclidean(p, &data[next]));
            if dist < *d {
                *d = dist;
            }
        }
    }
    centroids
}

fn assign(data: &[Vec<f32>], centroids: &[Vec<f32>], labels: &mut [usize]) -> bool {
    let mut changed = false;
    for (label, p) in labels.iter_mut().zip(data) {
        let mut best = 0;
        let mut best_d = f32::INFINITY;
        for (c, centroid) in centroids.iter().enumerate() {
            let dist = squared_euclidean(p, centroid);
            if dist < best_d {
                best_d = dist;
                best = c;
            }
        }
        if *label != best {
            *label = best;
            changed = true;
        }
    }
    changed
}

/// Means of assigned points; empty clusters keep `previous`.
fn update(data: &[Vec<f32>], labels: &[usize], previous: &[Vec<f32>]) -> Vec<Vec<f32>> {
    let d = previous[0].len();
    let mut sums = vec![vec![0.0f64; d]; previous.len()];
    let mut counts = vec![0usize; previous.len()];
    for (p, &l) in data.iter().zip(labels) {
        counts[l] += 1;
        for (s, &v) in sums[l].iter_mut().zip(p) {
            *s += f64::from(v);
        }
    }
    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                sum.into_iter().map(|s| (s / count as f64) as f32).collect()
            }
        })
        .collect()
}

fn lloyd(data: &[Vec<f32>], mut centroids: Vec<Vec<f32>>, max_iter: usize, tol: f32) -> KmeansFit {
    // usize::MAX never matches a real label, so the first assignment always "changes".
    let mut labels = vec![usize::MAX; data.len()];
    assign(data, &centroids, &mut labels);

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iter {
        iterations += 1;
        let next = update(data, &labels, &centroids);
        let shift: f32 = centroids
            .iter()
            .zip(&next)
            .map(|(a, b)| squared_euclidean(a, b))
            .sum();
        centroids = next;

        let changed = assign(data, &centroids, &mut labels);
        if !changed || shift <= tol {
            converged = true;
            break;
        }
    }

    // Centroids are reported as the means of the final members.
    let centroids = update(data, &labels, &centroids);
    let inertia = data
        .iter()
        .zip(&labels)
        .map(|(p, &l)| squared_euclidean(p, &centroids[l]))
        .sum();

    KmeansFit {
        labels,
        centroids,
        iterations,
        converged,
        inertia,
    }
}
