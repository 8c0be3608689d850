//! End-to-end run: table → standardize → embed → partition → exemplars → result.
//!
//! Each stage consumes the previous stage's output in full and never mutates it. Any
//! error aborts the run; nothing is written by the pipeline itself.

use tracing::{info, info_span, warn};

use crate::assemble::{check_output_columns, TriageResult};
use crate::cluster::{select_exemplars, Kmeans};
use crate::config::TriageConfig;
use crate::embed::{Embedder, Embedding, Umap, UmapParams};
use crate::error::{Error, Result, Stage};
use crate::scale::StandardScaler;
use crate::table::{CompoundTable, DescriptorSchema};

/// Configured pipeline.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: TriageConfig,
    schema: DescriptorSchema,
}

impl Pipeline {
    /// Validate `config` and build a pipeline.
    pub fn new(config: TriageConfig) -> Result<Self> {
        config.validate()?;
        let schema = DescriptorSchema::new(config.descriptors.iter().cloned())?;
        Ok(Self { config, schema })
    }

    /// The configuration in use.
    pub fn config(&self) -> &TriageConfig {
        &self.config
    }

    /// The UMAP embedder this configuration describes.
    pub fn umap(&self) -> Umap {
        Umap::new(UmapParams {
            n_neighbors: self.config.n_neighbors,
            min_dist: self.config.min_dist,
            spread: self.config.spread,
            n_epochs: self.config.n_epochs,
            init: self.config.init,
            seed: self.config.seed,
            ..Default::default()
        })
    }

    /// The partitioner this configuration describes.
    pub fn kmeans(&self) -> Kmeans {
        Kmeans::new(self.config.n_clusters)
            .with_max_iter(self.config.max_iter)
            .with_tol(self.config.tol)
            .with_n_init(self.config.n_init)
            .with_seed(self.config.seed)
    }

    /// Run with the configured UMAP embedder.
    pub fn run(&self, table: CompoundTable) -> Result<TriageResult> {
        let umap = self.umap();
        self.run_with(table, &umap)
    }

    /// Run with a caller-supplied embedder.
    pub fn run_with<E: Embedder + ?Sized>(
        &self,
        table: CompoundTable,
        embedder: &E,
    ) -> Result<TriageResult> {
        let n = table.len();
        let k = self.config.n_clusters;
        info!(rows = n, descriptors = self.schema.len(), k, "starting run");

        // Fail before any expensive stage.
        check_output_columns(&table, Stage::Input)?;
        if n < k {
            return Err(Error::InsufficientSamples {
                stage: Stage::Partition,
                required: k,
                n_items: n,
            });
        }

        let features = {
            let _span = info_span!("input").entered();
            table.feature_matrix(&self.schema)?
        };

        let standardized = {
            let _span = info_span!("standardize").entered();
            StandardScaler::fit_transform(&features)?.1
        };

        let embedding = {
            let _span = info_span!("embed").entered();
            if standardized.is_constant() {
                warn!(rows = n, "all compounds have identical descriptors; collapsing embedding");
                Embedding::collapsed(n)
            } else {
                embedder.embed(&standardized)?
            }
        };
        if embedding.len() != n {
            return Err(Error::invalid_input(
                Stage::Embed,
                format!("embedder returned {} rows for {n} inputs", embedding.len()),
            ));
        }

        let points = embedding.to_vecs();
        let fit = {
            let _span = info_span!("partition").entered();
            self.kmeans().fit(&points)?
        };
        info!(
            iterations = fit.iterations,
            converged = fit.converged,
            inertia = fit.inertia,
            non_empty = fit.n_nonempty(),
            "partitioned embedding"
        );

        let exemplars = {
            let _span = info_span!("exemplar").entered();
            select_exemplars(&points, &fit.labels, &fit.centroids)?
        };

        let result = {
            let _span = info_span!("assemble").entered();
            TriageResult::assemble(table, embedding, fit, exemplars)?
        };

        self.report_exemplars(&result);
        info!(
            rows = result.len(),
            exemplars = result.exemplars().len(),
            "run complete"
        );
        Ok(result)
    }

    fn report_exemplars(&self, result: &TriageResult) {
        let Some(col) = result.input().column_index(&self.config.structure_column) else {
            return;
        };
        for (i, row) in result.exemplar_rows().enumerate() {
            info!(
                cluster = row.cluster,
                row = row.index,
                "exemplar {}: {}",
                i + 1,
                row.fields[col]
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::CompoundRecord;

    fn config() -> TriageConfig {
        TriageConfig::default()
            .with_descriptors(["x", "y", "z"])
            .with_n_clusters(3)
            .with_n_neighbors(5)
            .with_n_epochs(100)
    }

    fn table(records: &[CompoundRecord]) -> CompoundTable {
        let schema = DescriptorSchema::new(["x", "y", "z"]).unwrap();
        CompoundTable::from_records("id", "smiles", &schema, records).unwrap()
    }

    fn blobs() -> Vec<CompoundRecord> {
        let centers = [[0.0f32, 0.0, 0.0], [10.0, 0.0, 5.0], [0.0, 10.0, -5.0]];
        let mut out = Vec::new();
        for (b, c) in centers.iter().enumerate() {
            for i in 0..10 {
                let jitter = (i as f32 * 0.618).fract() - 0.5;
                out.push(CompoundRecord::new(
                    format!("B{b}-{i}"),
                    format!("C{}", "C".repeat(i)),
                    vec![c[0] + jitter, c[1] - jitter, c[2] + jitter * 0.5],
                ));
            }
        }
        out
    }

    struct FixedEmbedder(Vec<[f32; 2]>);

    impl Embedder for FixedEmbedder {
        fn embed(&self, _: &crate::scale::StandardizedMatrix) -> Result<Embedding> {
            Ok(Embedding::new(self.0.clone()))
        }
    }

    #[test]
    fn run_produces_aligned_outputs() {
        let result = Pipeline::new(config()).unwrap().run(table(&blobs())).unwrap();
        assert_eq!(result.len(), 30);
        assert_eq!(result.labels().len(), 30);
        assert!(result.exemplars().len() <= 3);
        assert!(!result.exemplars().is_empty());
        assert_eq!(result.full_table().unwrap().columns().len(), 3 + 2 + 3);
    }

    #[test]
    fn too_few_rows_fails_before_embedding() {
        let err = Pipeline::new(config().with_n_clusters(12))
            .unwrap()
            .run(table(&blobs()[..5]))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientSamples {
                stage: Stage::Partition,
                ..
            }
        ));
    }

    #[test]
    fn identical_rows_collapse_to_one_exemplar() {
        let recs: Vec<CompoundRecord> = (0..20)
            .map(|i| CompoundRecord::new(format!("C{i}"), "CCO", vec![1.0, 2.0, 3.0]))
            .collect();
        let result = Pipeline::new(config()).unwrap().run(table(&recs)).unwrap();
        assert_eq!(result.exemplars().len(), 1);
        assert_eq!(result.exemplars()[0].row, 0);
        assert!(result.labels().iter().all(|&l| l == 0));
    }

    #[test]
    fn custom_embedder_is_used() {
        let recs = blobs();
        let coords: Vec<[f32; 2]> = (0..recs.len())
            .map(|i| [(i / 10) as f32 * 100.0, (i % 10) as f32 * 0.1])
            .collect();
        let result = Pipeline::new(config())
            .unwrap()
            .run_with(table(&recs), &FixedEmbedder(coords.clone()))
            .unwrap();
        assert_eq!(result.embedding().coords(), coords.as_slice());
        for blob in 0..3 {
            let l = result.labels()[blob * 10];
            assert!(result.labels()[blob * 10..blob * 10 + 10]
                .iter()
                .all(|&x| x == l));
        }
        assert_eq!(result.exemplars().len(), 3);
    }

    #[test]
    fn embedder_returning_wrong_length_is_rejected() {
        let err = Pipeline::new(config())
            .unwrap()
            .run_with(table(&blobs()), &FixedEmbedder(vec![[0.0, 0.0]; 3]))
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Embed));
    }

    #[test]
    fn annotated_input_is_rejected() {
        let recs = blobs();
        let schema = DescriptorSchema::new(["x", "y", "z"]).unwrap();
        let t = CompoundTable::from_records("cluster", "smiles", &schema, &recs).unwrap();
        let err = Pipeline::new(config()).unwrap().run(t).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { stage: Stage::Input, .. }));

        // A previous run's full table cannot be fed back in.
        let first = Pipeline::new(config()).unwrap().run(table(&recs)).unwrap();
        let err = Pipeline::new(config())
            .unwrap()
            .run(first.full_table().unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { stage: Stage::Input, .. }));
    }

    #[test]
    fn missing_descriptor_is_invalid_input() {
        let t = CompoundTable::new(vec!["x".into()], vec![vec!["1".into()]; 5]).unwrap();
        let err = Pipeline::new(config()).unwrap().run(t).unwrap_err();
        assert!(matches!(err, Error::InvalidInput { stage: Stage::Input, .. }));
    }
}
