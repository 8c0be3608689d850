//! Partitioning of embedded points and exemplar selection.
//!
//! ## K-means
//!
//! The classic algorithm: assign each point to the nearest centroid, then
//! update centroids to the mean of their points. Repeat.
//!
//! **Objective**: Minimize within-cluster sum of squares:
//!
//! ```text
//! J = Σ_k Σ_{x ∈ C_k} ||x - μ_k||²
//! ```
//!
//! In this crate k-means runs on 2-D embedded coordinates, where the spherical-cluster
//! assumption is a reasonable fit for visual triage.
//!
//! ## Exemplars
//!
//! For every non-empty cluster, the member nearest to the centroid is its exemplar
//! (a "medoid" in the loose sense: an actual data point standing in for the cluster).
//!
//! ## Usage
//!
//! ```rust
//! use compound_map::cluster::{select_exemplars, Clustering, Kmeans};
//!
//! let data = vec![
//!     vec![0.0, 0.0],
//!     vec![0.1, 0.1],
//!     vec![10.0, 10.0],
//!     vec![10.1, 10.1],
//! ];
//!
//! let fit = Kmeans::new(2).with_seed(42).fit(&data).unwrap();
//! assert_eq!(fit.labels[0], fit.labels[1]);
//! assert_ne!(fit.labels[0], fit.labels[2]);
//!
//! let exemplars = select_exemplars(&data, &fit.labels, &fit.centroids).unwrap();
//! assert_eq!(exemplars.len(), 2);
//!
//! // The trait gives labels only.
//! let labels = Kmeans::new(2).fit_predict(&data).unwrap();
//! assert_eq!(labels.len(), data.len());
//! ```

mod exemplar;
mod kmeans;
mod traits;
mod util;

pub use exemplar::{select_exemplars, Exemplar};
pub use kmeans::{Kmeans, KmeansFit};
pub use traits::Clustering;
