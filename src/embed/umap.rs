//! UMAP-style manifold embedding into two dimensions.
//!
//! # Algorithm
//!
//! 1. Build a fuzzy kNN graph in the standardized input space (see `graph`).
//! 2. Fit the output-space similarity curve `1 / (1 + a d^(2b))` from `min_dist`/`spread`.
//! 3. Initialize coordinates from the graph's spectral layout (see `spectral`), or
//!    uniformly at random when the graph is disconnected or [`UmapInit::Random`] is
//!    asked for. Either start is rescaled to `[0, 10]` per axis.
//! 4. Run stochastic gradient descent over graph edges: each edge is sampled in
//!    proportion to its weight and pulls its endpoints together, and each sample draws
//!    `negative_sample_rate` random points that are pushed apart.
//!
//! Everything runs on one `StdRng` seeded from `seed`, and the edge loop is sequential, so
//! the same input and seed give bit-identical coordinates on a given platform.
//!
//! # References
//!
//! McInnes, Healy, Melville (2018). "UMAP: Uniform Manifold Approximation and Projection
//! for Dimension Reduction." arXiv:1802.03426.

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::curve::find_ab_params;
use super::graph::{exact_knn, smooth_knn_dist, FuzzyGraph};
use super::spectral::spectral_layout;
use super::{Embedder, Embedding};
use crate::error::{Error, Result, Stage};
use crate::scale::StandardizedMatrix;

const GRAD_CLIP: f32 = 4.0;
const INIT_RANGE: f32 = 10.0;
const INIT_NOISE: f32 = 1e-4;

/// Starting layout of the optimization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UmapInit {
    /// Leading nontrivial eigenvectors of the normalized graph Laplacian.
    #[default]
    Spectral,
    /// Uniform random coordinates.
    Random,
}

/// UMAP parameters.
#[derive(Clone, Debug)]
pub struct UmapParams {
    /// Size of each local neighborhood, counting the point itself, so every point
    /// is linked to its `n_neighbors - 1` nearest others.
    ///
    /// Clamped to `N - 1` when the dataset has `N <= n_neighbors` rows, and never
    /// below 2.
    pub n_neighbors: usize,

    /// Minimum distance between embedded points.
    pub min_dist: f32,

    /// Scale of the embedded clusters; `min_dist` is relative to it.
    pub spread: f32,

    /// Optimization epochs. `None` picks 500 for up to 10 000 rows, 200 beyond.
    pub n_epochs: Option<usize>,

    /// Initial SGD step size, decayed linearly to zero.
    pub learning_rate: f32,

    /// Negative samples drawn per positive edge sample.
    pub negative_sample_rate: usize,

    /// Weight of the repulsive term.
    pub repulsion_strength: f32,

    /// Starting layout.
    pub init: UmapInit,

    /// RNG seed.
    pub seed: u64,
}

impl Default for UmapParams {
    fn default() -> Self {
        Self {
            n_neighbors: 15,
            min_dist: 0.1,
            spread: 1.0,
            n_epochs: None,
            learning_rate: 1.0,
            negative_sample_rate: 5,
            repulsion_strength: 1.0,
            init: UmapInit::Spectral,
            seed: 42,
        }
    }
}

/// UMAP embedder.
#[derive(Clone, Debug, Default)]
pub struct Umap {
    params: UmapParams,
}

impl Umap {
    /// Create an embedder.
    pub fn new(params: UmapParams) -> Self {
        Self { params }
    }

    /// Access the parameters.
    pub fn params(&self) -> &UmapParams {
        &self.params
    }

    fn validate(&self) -> Result<()> {
        let p = &self.params;
        if p.n_neighbors < 2 {
            return Err(Error::InvalidParameter {
                name: "n_neighbors",
                message: "must be at least 2",
            });
        }
        if p.spread.is_nan() || p.spread <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "spread",
                message: "must be positive",
            });
        }
        if p.min_dist.is_nan() || p.min_dist < 0.0 || p.min_dist > p.spread {
            return Err(Error::InvalidParameter {
                name: "min_dist",
                message: "must be in [0, spread]",
            });
        }
        if p.learning_rate.is_nan() || p.learning_rate <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "learning_rate",
                message: "must be positive",
            });
        }
        if p.n_epochs == Some(0) {
            return Err(Error::InvalidParameter {
                name: "n_epochs",
                message: "must be at least 1",
            });
        }
        Ok(())
    }

    /// Embed the rows of `data` into 2-D.
    pub fn fit_transform(&self, data: &StandardizedMatrix) -> Result<Embedding> {
        self.validate()?;

        let n = data.n_rows();
        if n < 2 {
            return Err(Error::InsufficientSamples {
                stage: Stage::Embed,
                required: 2,
                n_items: n,
            });
        }
        if data.n_cols() == 0 {
            return Err(Error::invalid_input(Stage::Embed, "matrix has no columns"));
        }
        if data.is_constant() {
            return Err(Error::DegenerateInput {
                stage: Stage::Embed,
                message: "all rows are identical",
            });
        }

        let k = self.other_neighbors(n);
        let n_epochs = self
            .params
            .n_epochs
            .unwrap_or(if n <= 10_000 { 500 } else { 200 });

        let neighbors = exact_knn(data.rows(), k);
        let (sigmas, rhos) = smooth_knn_dist(&neighbors.dists, k);
        let mut graph = FuzzyGraph::build(&neighbors, &sigmas, &rhos);
        graph.prune(n_epochs);

        let (a, b) = find_ab_params(self.params.spread, self.params.min_dist);
        debug!(n, k, n_epochs, edges = graph.edges.len(), a, b, "fuzzy graph built");

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut coords = self.initial_layout(&graph, n, &mut rng);
        self.optimize_layout(&mut coords, &graph, n_epochs, a, b, &mut rng);

        if coords.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::DegenerateInput {
                stage: Stage::Embed,
                message: "layout optimization produced non-finite coordinates",
            });
        }
        Ok(Embedding::new(coords))
    }

    /// Other points linked to each point, after clamping to the dataset size.
    fn other_neighbors(&self, n: usize) -> usize {
        let requested = self.params.n_neighbors;
        let n_neighbors = if n <= requested {
            let clamped = n.saturating_sub(1).max(2);
            warn!(
                n_neighbors = requested,
                n_rows = n,
                clamped,
                "n_neighbors clamped to dataset size"
            );
            clamped
        } else {
            requested
        };
        (n_neighbors - 1).min(n - 1)
    }

    fn initial_layout(&self, graph: &FuzzyGraph, n: usize, rng: &mut StdRng) -> Vec<[f32; 2]> {
        if self.params.init == UmapInit::Spectral {
            match spectral_layout(graph, n, rng) {
                Some(mut coords) => {
                    // Largest coordinate magnitude becomes INIT_RANGE, plus a little noise.
                    let max = coords.iter().flatten().fold(0.0f32, |m, v| m.max(v.abs()));
                    if max > 0.0 {
                        let expansion = INIT_RANGE / max;
                        for v in coords.iter_mut().flatten() {
                            *v = *v * expansion + rng.random_range(-INIT_NOISE..INIT_NOISE);
                        }
                        rescale_to_box(&mut coords);
                        return coords;
                    }
                }
                None => debug!(n, "graph is disconnected; using random initialization"),
            }
        }
        random_init(n, rng)
    }

    fn optimize_layout(
        &self,
        coords: &mut [[f32; 2]],
        graph: &FuzzyGraph,
        n_epochs: usize,
        a: f32,
        b: f32,
        rng: &mut StdRng,
    ) {
        let n = coords.len();
        let gamma = self.params.repulsion_strength;
        let initial_alpha = self.params.learning_rate;
        let neg_rate = self.params.negative_sample_rate as f32;

        let eps = graph.epochs_per_sample();
        let eps_neg: Vec<f32> = eps.iter().map(|e| e / neg_rate).collect();
        let mut next_sample = eps.clone();
        let mut next_negative = eps_neg.clone();
        let mut alpha = initial_alpha;

        for epoch in 0..n_epochs {
            let epoch_f = epoch as f32;
            for (e, &(j, k, _)) in graph.edges.iter().enumerate() {
                if next_sample[e] > epoch_f {
                    continue;
                }

                let (cur, other) = (coords[j], coords[k]);
                let d2 = squared_dist(&cur, &other);
                let coeff = if d2 > 0.0 {
                    -2.0 * a * b * d2.powf(b - 1.0) / (a * d2.powf(b) + 1.0)
                } else {
                    0.0
                };
                for dim in 0..2 {
                    let grad = clip(coeff * (cur[dim] - other[dim])) * alpha;
                    coords[j][dim] += grad;
                    coords[k][dim] -= grad;
                }
                next_sample[e] += eps[e];

                if neg_rate > 0.0 {
                    let n_neg = ((epoch_f - next_negative[e]) / eps_neg[e]) as usize;
                    for _ in 0..n_neg {
                        let s = rng.random_range(0..n);
                        if s == j {
                            continue;
                        }
                        let (cur, other) = (coords[j], coords[s]);
                        let d2 = squared_dist(&cur, &other);
                        let coeff = if d2 > 0.0 {
                            2.0 * gamma * b / ((0.001 + d2) * (a * d2.powf(b) + 1.0))
                        } else {
                            0.0
                        };
                        for dim in 0..2 {
                            let grad = if coeff > 0.0 {
                                clip(coeff * (cur[dim] - other[dim]))
                            } else {
                                GRAD_CLIP
                            };
                            coords[j][dim] += grad * alpha;
                        }
                    }
                    next_negative[e] += n_neg as f32 * eps_neg[e];
                }
            }

            alpha = initial_alpha * (1.0 - (epoch + 1) as f32 / n_epochs as f32);
            if (epoch + 1) % 100 == 0 {
                debug!(epoch = epoch + 1, n_epochs, "layout optimization");
            }
        }
    }
}

impl Embedder for Umap {
    fn embed(&self, data: &StandardizedMatrix) -> Result<Embedding> {
        self.fit_transform(data)
    }
}

fn random_init(n: usize, rng: &mut StdRng) -> Vec<[f32; 2]> {
    let mut coords: Vec<[f32; 2]> = (0..n)
        .map(|_| {
            [
                rng.random_range(-INIT_RANGE..INIT_RANGE),
                rng.random_range(-INIT_RANGE..INIT_RANGE),
            ]
        })
        .collect();
    rescale_to_box(&mut coords);
    coords
}

/// Map each axis linearly onto `[0, INIT_RANGE]`.
fn rescale_to_box(coords: &mut [[f32; 2]]) {
    for dim in 0..2 {
        let (lo, hi) = coords
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), c| {
                (lo.min(c[dim]), hi.max(c[dim]))
            });
        let range = hi - lo;
        if range > 0.0 {
            for c in coords.iter_mut() {
                c[dim] = INIT_RANGE * (c[dim] - lo) / range;
            }
        }
    }
}

#[inline]
fn squared_dist(a: &[f32; 2], b: &[f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}

#[inline]
fn clip(v: f32) -> f32 {
    v.clamp(-GRAD_CLIP, GRAD_CLIP)
}
