//! Nonlinear 2-D embedding of standardized descriptors.
//!
//! The rest of the pipeline sees only the [`Embedder`] contract:
//! `(StandardizedMatrix, parameters, seed) -> Embedding`, deterministic for a fixed seed.
//! [`Umap`] is the implementation shipped here.
//!
//! ```rust
//! use compound_map::embed::{Embedder, Umap, UmapParams};
//! use compound_map::scale::StandardScaler;
//! use compound_map::table::FeatureMatrix;
//!
//! let rows: Vec<Vec<f32>> = (0..12).map(|i| vec![i as f32, (i % 3) as f32]).collect();
//! let (_, z) = StandardScaler::fit_transform(&FeatureMatrix::new(rows).unwrap()).unwrap();
//!
//! let umap = Umap::new(UmapParams { n_neighbors: 4, n_epochs: Some(50), ..Default::default() });
//! let emb = umap.embed(&z).unwrap();
//! assert_eq!(emb.len(), 12);
//! ```

mod curve;
mod graph;
mod spectral;
mod umap;

pub use umap::{Umap, UmapInit, UmapParams};

use crate::error::Result;
use crate::scale::StandardizedMatrix;

/// N x 2 embedded coordinates; row `i` belongs to compound `i`.
#[derive(Clone, Debug, PartialEq)]
pub struct Embedding {
    coords: Vec<[f32; 2]>,
}

impl Embedding {
    /// Wrap coordinates.
    pub fn new(coords: Vec<[f32; 2]>) -> Self {
        Self { coords }
    }

    /// Every point at the origin. Used when the input cannot be separated at all.
    pub fn collapsed(n: usize) -> Self {
        Self {
            coords: vec![[0.0, 0.0]; n],
        }
    }

    /// Coordinates, one per row.
    pub fn coords(&self) -> &[[f32; 2]] {
        &self.coords
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// True if there are no points.
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Coordinates as dense vectors, the input format of [`crate::cluster::Clustering`].
    pub fn to_vecs(&self) -> Vec<Vec<f32>> {
        self.coords.iter().map(|c| c.to_vec()).collect()
    }
}

/// A deterministic (given its seed) projection of standardized rows into 2-D.
pub trait Embedder {
    /// Embed every row of `data`, preserving row order.
    fn embed(&self, data: &StandardizedMatrix) -> Result<Embedding>;
}
