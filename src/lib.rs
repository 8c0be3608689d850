//! Compound triage maps.
//!
//! `compound-map` takes a filtered table of compounds with numeric descriptors and
//! produces a 2-D map of them for visual triage:
//!
//! - [`scale`]: per-column standardization (zero mean, unit variance)
//! - [`embed`]: UMAP-style nonlinear embedding into 2-D
//! - [`cluster`]: k-means (k-means++ seeding, Lloyd iterations) and exemplar selection
//! - [`assemble`]: coordinates, cluster ids, and exemplars merged back onto the table
//!
//! [`Pipeline`] runs all stages with one [`TriageConfig`]; every stochastic step is
//! seeded, so a fixed config and input give identical output.
//!
//! ```rust
//! use compound_map::{CompoundRecord, CompoundTable, DescriptorSchema, Pipeline, TriageConfig};
//!
//! let schema = DescriptorSchema::new(["MW", "logP"]).unwrap();
//! let records: Vec<CompoundRecord> = (0..16)
//!     .map(|i| {
//!         let shift = if i < 8 { 0.0 } else { 200.0 };
//!         CompoundRecord::new(format!("C{i}"), "CCO", vec![shift + i as f32, (i % 4) as f32])
//!     })
//!     .collect();
//! let table = CompoundTable::from_records("id", "smiles", &schema, &records).unwrap();
//!
//! let config = TriageConfig::default()
//!     .with_descriptors(["MW", "logP"])
//!     .with_n_clusters(2)
//!     .with_n_neighbors(4)
//!     .with_n_epochs(50);
//! let result = Pipeline::new(config).unwrap().run(table).unwrap();
//!
//! assert_eq!(result.len(), 16);
//! assert!(result.exemplars().len() <= 2);
//! ```

#![forbid(unsafe_code)]

pub mod assemble;
pub mod cluster;
pub mod config;
pub mod embed;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod scale;
pub mod table;

pub use assemble::{AnnotatedRow, PartitionSummary, TriageResult};
pub use cluster::{select_exemplars, Clustering, Exemplar, Kmeans, KmeansFit};
pub use config::{TriageConfig, DEFAULT_DESCRIPTORS};
pub use embed::{Embedder, Embedding, Umap, UmapInit, UmapParams};
pub use error::{Error, Result, Stage};
pub use pipeline::Pipeline;
pub use scale::{StandardScaler, StandardizedMatrix};
pub use table::{CompoundRecord, CompoundTable, DescriptorSchema, FeatureMatrix};
