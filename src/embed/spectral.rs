//! Spectral layout of the fuzzy graph, used as the starting point of the embedding.
//!
//! The layout is given by the two eigenvectors of the normalized adjacency
//! `D^-1/2 W D^-1/2` with the largest nontrivial eigenvalues, which are the smallest
//! nontrivial eigenvectors of the normalized Laplacian. They are found by orthogonal
//! iteration on the shifted operator `(I + D^-1/2 W D^-1/2) / 2`, whose spectrum lies in
//! `[0, 1]`. The trivial eigenvector `D^1/2 1` is projected out at every step.
//!
//! A disconnected graph has more than one trivial eigenvector, so no layout is returned
//! and the caller falls back to a random start.

use std::collections::VecDeque;

use rand::prelude::*;

use super::graph::FuzzyGraph;

const MAX_ITERS: usize = 1000;
const TOL: f64 = 1e-10;
const MIN_NORM: f64 = 1e-12;

/// Two leading nontrivial eigenvectors, one `[x, y]` per node.
///
/// Returns `None` if the graph is disconnected or the iteration collapses.
pub(crate) fn spectral_layout(
    graph: &FuzzyGraph,
    n: usize,
    rng: &mut StdRng,
) -> Option<Vec<[f32; 2]>> {
    // Three eigenvectors are needed: the trivial one plus two.
    if n < 3 {
        return None;
    }

    let mut adj: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
    for &(i, j, w) in &graph.edges {
        adj[i].push((j, f64::from(w)));
    }
    if !is_connected(&adj) {
        return None;
    }

    let inv_sqrt_deg: Vec<f64> = adj
        .iter()
        .map(|row| 1.0 / row.iter().map(|&(_, w)| w).sum::<f64>().sqrt())
        .collect();
    let mut trivial: Vec<f64> = inv_sqrt_deg.iter().map(|s| 1.0 / s).collect();
    normalize(&mut trivial)?;

    let apply = |x: &[f64]| -> Vec<f64> {
        adj.iter()
            .enumerate()
            .map(|(i, row)| {
                let mixed: f64 = row
                    .iter()
                    .map(|&(j, w)| w * inv_sqrt_deg[j] * x[j])
                    .sum();
                0.5 * (x[i] + inv_sqrt_deg[i] * mixed)
            })
            .collect()
    };

    let start = [random_vector(n, rng), random_vector(n, rng)];
    let mut basis = orthonormalize(start, &trivial)?;

    for _ in 0..MAX_ITERS {
        let next = orthonormalize([apply(&basis[0]), apply(&basis[1])], &trivial)?;
        let delta = basis
            .iter()
            .zip(&next)
            .map(|(a, b)| 1.0 - dot(a, b).abs())
            .fold(0.0, f64::max);
        basis = next;
        if delta < TOL {
            break;
        }
    }

    let [x, y] = basis;
    Some(
        x.into_iter()
            .zip(y)
            .map(|(a, b)| [a as f32, b as f32])
            .collect(),
    )
}

fn is_connected(adj: &[Vec<(usize, f64)>]) -> bool {
    let mut seen = vec![false; adj.len()];
    let mut queue = VecDeque::from([0usize]);
    seen[0] = true;
    let mut reached = 1;
    while let Some(i) = queue.pop_front() {
        for &(j, w) in &adj[i] {
            if w > 0.0 && !seen[j] {
                seen[j] = true;
                reached += 1;
                queue.push_back(j);
            }
        }
    }
    reached == adj.len()
}

fn random_vector(n: usize, rng: &mut StdRng) -> Vec<f64> {
    (0..n).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// Gram-Schmidt against `trivial`, then against each other.
fn orthonormalize(mut vs: [Vec<f64>; 2], trivial: &[f64]) -> Option<[Vec<f64>; 2]> {
    for k in 0..2 {
        let (done, rest) = vs.split_at_mut(k);
        let v = &mut rest[0];
        for b in std::iter::once(trivial).chain(done.iter().map(Vec::as_slice)) {
            let c = dot(v, b);
            for (x, &y) in v.iter_mut().zip(b) {
                *x -= c * y;
            }
        }
        normalize(v)?;
    }
    Some(vs)
}

fn normalize(v: &mut [f64]) -> Option<()> {
    let norm = dot(v, v).sqrt();
    if !norm.is_finite() || norm < MIN_NORM {
        return None;
    }
    v.iter_mut().for_each(|x| *x /= norm);
    Some(())
}

#[inline]
fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
