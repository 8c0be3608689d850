//! Run configuration.
//!
//! Every hyperparameter of a run lives in [`TriageConfig`]. All fields have defaults, so a
//! JSON config file only needs to name what it overrides:
//!
//! ```rust
//! use compound_map::TriageConfig;
//!
//! let config = TriageConfig::from_json(r#"{ "n_clusters": 8, "seed": 7 }"#).unwrap();
//! assert_eq!(config.n_clusters, 8);
//! assert_eq!(config.n_neighbors, 15);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::embed::UmapInit;
use crate::error::{Error, Result};

/// Default descriptor columns, in the order they form the feature matrix.
pub const DEFAULT_DESCRIPTORS: [&str; 13] = [
    "logS",
    "logP",
    "TPSA",
    "nRot",
    "BBB",
    "MW",
    "nHD",
    "nHA",
    "logVDss",
    "cl-plasma",
    "t0.5",
    "PPB",
    "Fsp3",
];

/// Hyperparameters for one pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Ordered descriptor column names.
    pub descriptors: Vec<String>,

    /// Column carrying the structure string (reported for exemplars).
    pub structure_column: String,

    /// Number of clusters K.
    pub n_clusters: usize,

    /// Neighborhood size for the embedding, counting each point itself.
    pub n_neighbors: usize,

    /// Minimum spacing between embedded points.
    pub min_dist: f32,

    /// Effective scale of embedded points.
    pub spread: f32,

    /// Embedding optimization epochs. `None` picks 500 for small datasets, 200 otherwise.
    pub n_epochs: Option<usize>,

    /// Starting layout of the embedding.
    pub init: UmapInit,

    /// K-means iteration cap.
    pub max_iter: usize,

    /// K-means convergence tolerance on centroid shift.
    pub tol: f32,

    /// Number of k-means restarts; the lowest-inertia run wins.
    pub n_init: usize,

    /// Seed shared by the embedding and the partitioner.
    pub seed: u64,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            descriptors: DEFAULT_DESCRIPTORS.iter().map(|s| s.to_string()).collect(),
            structure_column: "smiles".to_string(),
            n_clusters: 12,
            n_neighbors: 15,
            min_dist: 0.1,
            spread: 1.0,
            n_epochs: None,
            init: UmapInit::Spectral,
            max_iter: 300,
            tol: 1e-4,
            n_init: 1,
            seed: 42,
        }
    }
}

impl TriageConfig {
    /// Parse a JSON config; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Set the descriptor columns.
    pub fn with_descriptors<I, S>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptors = descriptors.into_iter().map(Into::into).collect();
        self
    }

    /// Set the structure column name.
    pub fn with_structure_column(mut self, column: impl Into<String>) -> Self {
        self.structure_column = column.into();
        self
    }

    /// Set the cluster count.
    pub fn with_n_clusters(mut self, k: usize) -> Self {
        self.n_clusters = k;
        self
    }

    /// Set the neighborhood size.
    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    /// Set the minimum spacing.
    pub fn with_min_dist(mut self, min_dist: f32) -> Self {
        self.min_dist = min_dist;
        self
    }

    /// Set the embedding scale.
    pub fn with_spread(mut self, spread: f32) -> Self {
        self.spread = spread;
        self
    }

    /// Set the number of embedding epochs.
    pub fn with_n_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = Some(n_epochs);
        self
    }

    /// Set the embedding's starting layout.
    pub fn with_init(mut self, init: UmapInit) -> Self {
        self.init = init;
        self
    }

    /// Set the k-means iteration cap.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set the k-means convergence tolerance.
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Set the k-means restart count.
    pub fn with_n_init(mut self, n_init: usize) -> Self {
        self.n_init = n_init;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check parameter ranges before any work is done.
    pub fn validate(&self) -> Result<()> {
        if self.descriptors.is_empty() {
            return Err(Error::InvalidParameter {
                name: "descriptors",
                message: "must name at least one column",
            });
        }
        if self.n_clusters == 0 {
            return Err(Error::InvalidParameter {
                name: "n_clusters",
                message: "must be at least 1",
            });
        }
        if self.n_neighbors < 2 {
            return Err(Error::InvalidParameter {
                name: "n_neighbors",
                message: "must be at least 2",
            });
        }
        if self.min_dist.is_nan() || self.min_dist < 0.0 {
            return Err(Error::InvalidParameter {
                name: "min_dist",
                message: "must be non-negative",
            });
        }
        if self.spread.is_nan() || self.spread <= 0.0 || self.min_dist > self.spread {
            return Err(Error::InvalidParameter {
                name: "spread",
                message: "must be positive and at least min_dist",
            });
        }
        if self.n_epochs == Some(0) {
            return Err(Error::InvalidParameter {
                name: "n_epochs",
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
        if self.tol.is_nan() || self.tol < 0.0 {
            return Err(Error::InvalidParameter {
                name: "tol",
                message: "must be non-negative",
            });
        }
        Ok(())
    }
}
