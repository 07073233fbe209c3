//! Seeded k-means clustering (Lloyd's algorithm, k-means++ seeding).
//!
//! # Responsibility
//! - Partition standardized feature rows into `k` clusters.
//! - Keep every source of randomness behind one explicit seed.
//!
//! # Invariants
//! - Identical `(points, params)` always produce identical output.
//! - Every returned label is in `[0, k)`.
//! - Requires at least `k` distinct points; callers handle underflow first.

use super::features::{FeatureMatrix, FeatureRow, FEATURE_COUNT};
use log::debug;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum ClusterError {
    NoPoints,
    InvalidClusterCount(usize),
    TooFewDistinctPoints { k: usize, distinct: usize },
    NonFinitePoint { index: usize },
}

impl Display for ClusterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoPoints => write!(f, "cannot cluster an empty point set"),
            Self::InvalidClusterCount(k) => write!(f, "cluster count must be >= 1, got {k}"),
            Self::TooFewDistinctPoints { k, distinct } => write!(
                f,
                "cannot form {k} clusters from {distinct} distinct points"
            ),
            Self::NonFinitePoint { index } => {
                write!(f, "point {index} has a non-finite coordinate")
            }
        }
    }
}

impl Error for ClusterError {}

/// Parameters for one clustering call.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansParams {
    pub k: usize,
    pub seed: u64,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub restarts: usize,
}

/// Result of the best (lowest-inertia) restart.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub assignments: Vec<usize>,
    pub centroids: Vec<FeatureRow>,
    pub iterations: usize,
    pub converged: bool,
    pub inertia: f64,
}

/// Clusters a feature matrix and returns only the labels.
pub fn assign_clusters(
    matrix: &FeatureMatrix,
    k: usize,
    seed: u64,
) -> Result<Vec<usize>, ClusterError> {
    let params = KMeansParams {
        k,
        seed,
        max_iterations: crate::config::DEFAULT_MAX_ITERATIONS,
        tolerance: crate::config::DEFAULT_TOLERANCE,
        restarts: crate::config::DEFAULT_RESTARTS,
    };
    kmeans(matrix.rows(), &params).map(|clustering| clustering.assignments)
}

/// Runs `params.restarts` seeded k-means passes and keeps the lowest inertia.
///
/// Ties on inertia keep the earliest restart.
pub fn kmeans(points: &[FeatureRow], params: &KMeansParams) -> Result<Clustering, ClusterError> {
    if params.k == 0 {
        return Err(ClusterError::InvalidClusterCount(params.k));
    }
    if points.is_empty() {
        return Err(ClusterError::NoPoints);
    }
    if let Some(index) = points
        .iter()
        .position(|point| point.iter().any(|value| !value.is_finite()))
    {
        return Err(ClusterError::NonFinitePoint { index });
    }
    let distinct = FeatureMatrix::from_rows(points.to_vec()).distinct_row_count();
    if distinct < params.k {
        return Err(ClusterError::TooFewDistinctPoints {
            k: params.k,
            distinct,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut best: Option<Clustering> = None;
    for restart in 0..params.restarts.max(1) {
        let run = lloyd(points, params, &mut rng);
        debug!(
            "event=clustering module=cluster status=ok restart={} iterations={} converged={} inertia={:.6}",
            restart, run.iterations, run.converged, run.inertia
        );
        let improves = best
            .as_ref()
            .map_or(true, |current| run.inertia < current.inertia);
        if improves {
            best = Some(run);
        }
    }

    best.ok_or(ClusterError::NoPoints)
}

fn lloyd(points: &[FeatureRow], params: &KMeansParams, rng: &mut ChaCha8Rng) -> Clustering {
    let mut centroids = kmeans_plus_plus_init(points, params.k, rng);
    let mut assignments = vec![usize::MAX; points.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iterations.max(1) {
        iterations += 1;
        if !assign_points(points, &centroids, &mut assignments) {
            converged = true;
            break;
        }
        let shift = update_centroids(points, &assignments, &mut centroids);
        if shift <= params.tolerance {
            assign_points(points, &centroids, &mut assignments);
            converged = true;
            break;
        }
    }
    if !converged {
        assign_points(points, &centroids, &mut assignments);
    }

    let inertia = compute_inertia(points, &assignments, &centroids);
    Clustering {
        assignments,
        centroids,
        iterations,
        converged,
        inertia,
    }
}

/// k-means++ seeding: first centroid uniform, the rest drawn with
/// probability proportional to squared distance from the nearest centroid.
fn kmeans_plus_plus_init(points: &[FeatureRow], k: usize, rng: &mut ChaCha8Rng) -> Vec<FeatureRow> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    let mut min_distances = vec![f64::MAX; points.len()];
    while centroids.len() < k {
        let last = centroids[centroids.len() - 1];
        for (i, point) in points.iter().enumerate() {
            min_distances[i] = min_distances[i].min(squared_distance(point, &last));
        }

        let total: f64 = min_distances.iter().sum();
        let next = if total > 0.0 {
            let target = rng.gen::<f64>() * total;
            let mut cumulative = 0.0;
            let mut chosen = None;
            for (i, &distance) in min_distances.iter().enumerate() {
                if distance <= 0.0 {
                    continue;
                }
                cumulative += distance;
                chosen = Some(i);
                if cumulative >= target {
                    break;
                }
            }
            chosen
        } else {
            None
        };

        // Distinct-point precondition guarantees an uncovered point exists.
        let index = next
            .or_else(|| min_distances.iter().position(|&distance| distance > 0.0))
            .unwrap_or(0);
        centroids.push(points[index]);
    }

    centroids
}

/// Assigns each point to its nearest centroid. Returns whether any label changed.
fn assign_points(points: &[FeatureRow], centroids: &[FeatureRow], assignments: &mut [usize]) -> bool {
    let mut changed = false;
    for (point, slot) in points.iter().zip(assignments.iter_mut()) {
        let nearest = nearest_centroid(point, centroids);
        if *slot != nearest {
            *slot = nearest;
            changed = true;
        }
    }
    changed
}

fn nearest_centroid(point: &FeatureRow, centroids: &[FeatureRow]) -> usize {
    let mut best_index = 0;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let distance = squared_distance(point, centroid);
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
        }
    }
    best_index
}

/// Recomputes centroids as member means and returns the summed squared shift.
///
/// An empty cluster takes the point farthest from its previous-iteration
/// centroid, so the reseed does not depend on cluster processing order.
fn update_centroids(points: &[FeatureRow], assignments: &[usize], centroids: &mut [FeatureRow]) -> f64 {
    let k = centroids.len();
    let mut sums = vec![[0.0; FEATURE_COUNT]; k];
    let mut counts = vec![0usize; k];
    for (point, &cluster) in points.iter().zip(assignments) {
        counts[cluster] += 1;
        for (sum, value) in sums[cluster].iter_mut().zip(point) {
            *sum += value;
        }
    }

    let mut next = centroids.to_vec();
    let mut taken: Vec<usize> = Vec::new();
    for cluster in 0..k {
        next[cluster] = if counts[cluster] > 0 {
            sums[cluster].map(|sum| sum / counts[cluster] as f64)
        } else {
            let index = farthest_point(points, assignments, centroids, &taken);
            taken.push(index);
            points[index]
        };
    }

    let shift = centroids
        .iter()
        .zip(&next)
        .map(|(old, new)| squared_distance(old, new))
        .sum();
    centroids.copy_from_slice(&next);
    shift
}

fn farthest_point(
    points: &[FeatureRow],
    assignments: &[usize],
    centroids: &[FeatureRow],
    taken: &[usize],
) -> usize {
    let mut best_index = 0;
    let mut best_distance = f64::NEG_INFINITY;
    for (index, (point, &cluster)) in points.iter().zip(assignments).enumerate() {
        if taken.contains(&index) {
            continue;
        }
        let distance = squared_distance(point, &centroids[cluster]);
        if distance > best_distance {
            best_distance = distance;
            best_index = index;
        }
    }
    best_index
}

fn compute_inertia(points: &[FeatureRow], assignments: &[usize], centroids: &[FeatureRow]) -> f64 {
    points
        .iter()
        .zip(assignments)
        .map(|(point, &cluster)| squared_distance(point, &centroids[cluster]))
        .sum()
}

fn squared_distance(a: &FeatureRow, b: &FeatureRow) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
