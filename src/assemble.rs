//! Merging embedding, cluster ids, and exemplars back onto the compound table.
//!
//! The full table is the input table with three columns appended
//! ([`EMBED_X_COLUMN`], [`EMBED_Y_COLUMN`], [`CLUSTER_COLUMN`]), in input row order.
//! The exemplar table holds the same columns for exemplar rows only, in ascending
//! cluster id.

use crate::cluster::{Exemplar, KmeansFit};
use crate::embed::Embedding;
use crate::error::{Error, Result, Stage};
use crate::table::CompoundTable;

/// Name of the appended x-coordinate column.
pub const EMBED_X_COLUMN: &str = "embedX";
/// Name of the appended y-coordinate column.
pub const EMBED_Y_COLUMN: &str = "embedY";
/// Name of the appended cluster id column.
pub const CLUSTER_COLUMN: &str = "cluster";

/// Fail if `table` already has a column the annotated output appends.
pub(crate) fn check_output_columns(table: &CompoundTable, stage: Stage) -> Result<()> {
    for name in [EMBED_X_COLUMN, EMBED_Y_COLUMN, CLUSTER_COLUMN] {
        if table.column_index(name).is_some() {
            return Err(Error::invalid_input(
                stage,
                format!("input already has a column named {name:?}"),
            ));
        }
    }
    Ok(())
}

/// Partitioning diagnostics carried alongside the result.
#[derive(Clone, Debug, PartialEq)]
pub struct PartitionSummary {
    /// Lloyd iterations.
    pub iterations: usize,
    /// Whether k-means converged before its cap.
    pub converged: bool,
    /// Within-cluster sum of squares in embedded space.
    pub inertia: f32,
    /// Members per cluster id.
    pub cluster_sizes: Vec<usize>,
}

/// One compound with its annotations.
#[derive(Clone, Copy, Debug)]
pub struct AnnotatedRow<'a> {
    /// Row index in the input table.
    pub index: usize,
    /// Original fields, in input column order.
    pub fields: &'a [String],
    /// Embedded coordinate.
    pub coord: [f32; 2],
    /// Cluster id.
    pub cluster: usize,
    /// Whether this row is its cluster's exemplar.
    pub is_exemplar: bool,
}

impl AnnotatedRow<'_> {
    /// Original fields followed by `embedX`, `embedY`, `cluster`.
    pub fn to_record(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.fields.len() + 3);
        out.extend(self.fields.iter().cloned());
        out.push(self.coord[0].to_string());
        out.push(self.coord[1].to_string());
        out.push(self.cluster.to_string());
        out
    }
}

/// Output of a pipeline run.
#[derive(Clone, Debug)]
pub struct TriageResult {
    table: CompoundTable,
    embedding: Embedding,
    labels: Vec<usize>,
    centroids: Vec<[f32; 2]>,
    exemplars: Vec<Exemplar>,
    is_exemplar: Vec<bool>,
    summary: PartitionSummary,
}

impl TriageResult {
    /// Combine stage outputs, checking they are row-aligned with `table`.
    pub fn assemble(
        table: CompoundTable,
        embedding: Embedding,
        fit: KmeansFit,
        exemplars: Vec<Exemplar>,
    ) -> Result<Self> {
        check_output_columns(&table, Stage::Assemble)?;
        let n = table.len();
        if embedding.len() != n || fit.labels.len() != n {
            return Err(Error::invalid_input(
                Stage::Assemble,
                format!(
                    "table has {n} rows, embedding {}, labels {}",
                    embedding.len(),
                    fit.labels.len()
                ),
            ));
        }

        let k = fit.centroids.len();
        if let Some((row, label)) = fit.labels.iter().enumerate().find(|(_, &l)| l >= k) {
            return Err(Error::invalid_input(
                Stage::Assemble,
                format!("row {row} has cluster {label}, but there are {k} centroids"),
            ));
        }

        let mut centroids = Vec::with_capacity(k);
        for (c, centroid) in fit.centroids.iter().enumerate() {
            match centroid.as_slice() {
                &[x, y] => centroids.push([x, y]),
                _ => {
                    return Err(Error::invalid_input(
                        Stage::Assemble,
                        format!("centroid {c} is not 2-D"),
                    ))
                }
            }
        }

        let mut is_exemplar = vec![false; n];
        let mut last_cluster: Option<usize> = None;
        for ex in &exemplars {
            if last_cluster.is_some_and(|c| ex.cluster <= c) {
                return Err(Error::invalid_input(
                    Stage::Assemble,
                    "exemplars must have unique, ascending cluster ids",
                ));
            }
            if ex.row >= n || fit.labels[ex.row] != ex.cluster {
                return Err(Error::invalid_input(
                    Stage::Assemble,
                    format!("exemplar row {} is not a member of cluster {}", ex.row, ex.cluster),
                ));
            }
            is_exemplar[ex.row] = true;
            last_cluster = Some(ex.cluster);
        }

        let summary = PartitionSummary {
            iterations: fit.iterations,
            converged: fit.converged,
            inertia: fit.inertia,
            cluster_sizes: fit.cluster_sizes(),
        };

        Ok(Self {
            table,
            embedding,
            labels: fit.labels,
            centroids,
            exemplars,
            is_exemplar,
            summary,
        })
    }

    /// Number of compounds.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if there are no compounds.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The input table, unchanged.
    pub fn input(&self) -> &CompoundTable {
        &self.table
    }

    /// Embedded coordinates.
    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }

    /// Cluster id per row.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Final centroid per cluster id.
    pub fn centroids(&self) -> &[[f32; 2]] {
        &self.centroids
    }

    /// Exemplars in ascending cluster id.
    pub fn exemplars(&self) -> &[Exemplar] {
        &self.exemplars
    }

    /// Partitioning diagnostics.
    pub fn summary(&self) -> &PartitionSummary {
        &self.summary
    }

    /// Header of the full and exemplar tables.
    pub fn columns(&self) -> Vec<String> {
        let mut cols = self.table.columns().to_vec();
        cols.push(EMBED_X_COLUMN.to_string());
        cols.push(EMBED_Y_COLUMN.to_string());
        cols.push(CLUSTER_COLUMN.to_string());
        cols
    }

    /// Annotated row `i`.
    pub fn row(&self, i: usize) -> Option<AnnotatedRow<'_>> {
        let fields = self.table.rows().get(i)?;
        Some(AnnotatedRow {
            index: i,
            fields,
            coord: self.embedding.coords()[i],
            cluster: self.labels[i],
            is_exemplar: self.is_exemplar[i],
        })
    }

    /// All rows, in input order.
    pub fn rows(&self) -> impl Iterator<Item = AnnotatedRow<'_>> + '_ {
        (0..self.len()).filter_map(move |i| self.row(i))
    }

    /// Exemplar rows, in ascending cluster id.
    pub fn exemplar_rows(&self) -> impl Iterator<Item = AnnotatedRow<'_>> + '_ {
        self.exemplars.iter().filter_map(move |ex| self.row(ex.row))
    }

    /// The full annotated table.
    pub fn full_table(&self) -> Result<CompoundTable> {
        CompoundTable::new(self.columns(), self.rows().map(|r| r.to_record()).collect())
    }

    /// The exemplar-only table.
    pub fn exemplar_table(&self) -> Result<CompoundTable> {
        CompoundTable::new(
            self.columns(),
            self.exemplar_rows().map(|r| r.to_record()).collect(),
        )
    }
}
