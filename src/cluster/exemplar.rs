//! Exemplar (medoid) selection: the member of each cluster closest to its centroid.
//!
//! Each cluster is reduced independently, so clusters are scanned in parallel and
//! gathered back in ascending cluster id. Exact distance ties go to the lower row index.
//! Clusters with no members produce no exemplar.

use rayon::prelude::*;

use super::util::{check_points, squared_euclidean};
use crate::error::{Error, Result, Stage};

/// Representative row of one cluster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Exemplar {
    /// Cluster id.
    pub cluster: usize,
    /// Row index of the chosen point.
    pub row: usize,
    /// Euclidean distance from the point to the cluster centroid.
    pub distance: f32,
}

/// Pick one exemplar per non-empty cluster, ordered by cluster id.
pub fn select_exemplars(
    points: &[Vec<f32>],
    labels: &[usize],
    centroids: &[Vec<f32>],
) -> Result<Vec<Exemplar>> {
    if labels.len() != points.len() {
        return Err(Error::invalid_input(
            Stage::Exemplar,
            format!(
                "{} labels for {} points",
                labels.len(),
                points.len()
            ),
        ));
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }
    let d = check_points(points, Stage::Exemplar)?;
    if let Some(c) = centroids.iter().position(|c| c.len() != d) {
        return Err(Error::invalid_input(
            Stage::Exemplar,
            format!("centroid {c} has dimension {}, expected {d}", centroids[c].len()),
        ));
    }

    let mut members: Vec<Vec<usize>> = vec![Vec::new(); centroids.len()];
    for (row, &label) in labels.iter().enumerate() {
        let slot = members.get_mut(label).ok_or_else(|| {
            Error::invalid_input(
                Stage::Exemplar,
                format!(
                    "row {row} has cluster {label}, but there are {} centroids",
                    centroids.len()
                ),
            )
        })?;
        slot.push(row);
    }

    let exemplars = members
        .par_iter()
        .enumerate()
        .filter_map(|(cluster, rows)| {
            let centroid = &centroids[cluster];
            // Rows are ascending, so strict `<` keeps the first of equal distances.
            let mut best: Option<(usize, f32)> = None;
            for &row in rows {
                let d2 = squared_euclidean(&points[row], centroid);
                if best.map_or(true, |(_, b)| d2 < b) {
                    best = Some((row, d2));
                }
            }
            best.map(|(row, d2)| Exemplar {
                cluster,
                row,
                distance: d2.sqrt(),
            })
        })
        .collect();

    Ok(exemplars)
}
