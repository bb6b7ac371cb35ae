//! Flat-kernel mean-shift clustering
//!
//! Every candidate seeds a hill climb. Converged modes are sorted by how
//! many points supported them, and modes lying within one bandwidth of a
//! stronger mode are suppressed. Points are then assigned to their nearest
//! surviving mode.

use std::cmp::Ordering;

use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::{CandidateSet, ClusteringStrategy, NOISE};
use crate::error::{Error, Result};
use crate::geometry::{distance, mean_point, Point};

/// Bandwidth substituted when the estimate collapses to zero
pub const MIN_BANDWIDTH: f64 = 1e-17;

/// Mean-shift parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanShift {
    /// Kernel radius; estimated from the candidates when absent
    pub bandwidth: Option<f64>,

    /// Neighbour quantile used by the bandwidth estimate
    pub quantile: f64,

    /// Assign every point to a mode, even those outside all kernels
    pub cluster_all: bool,

    /// Hill-climb iteration cap per seed
    pub max_iterations: usize,
}

impl Default for MeanShift {
    fn default() -> Self {
        Self {
            bandwidth: None,
            quantile: 0.3,
            cluster_all: false,
            max_iterations: 300,
        }
    }
}

/// Mean distance from each point to its k-th nearest point, self included
///
/// `k = max(1, floor(n * quantile))`.
pub fn estimate_bandwidth(points: &[Point], quantile: f64) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let n = points.len();
    let k = ((n as f64 * quantile) as usize).clamp(1, n);

    let total: f64 = points
        .par_iter()
        .map(|p| {
            let mut distances: Vec<f64> = points.iter().map(|q| distance(p, q)).collect();
            distances.sort_unstable_by(f64::total_cmp);
            distances[k - 1]
        })
        .sum();

    total / n as f64
}

fn compare_points(a: &Point, b: &Point) -> Ordering {
    a.iter()
        .zip(b)
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

impl MeanShift {
    /// Shift `seed` to its mode; returns the mode and its support
    fn climb(&self, seed: &Point, points: &[Point], bandwidth: f64) -> Option<(Point, usize)> {
        let stop = 1e-3 * bandwidth;
        let mut mean = *seed;
        let mut support = 0;

        for _ in 0..=self.max_iterations {
            let within: Vec<Point> = points
                .iter()
                .filter(|p| distance(p, &mean) <= bandwidth)
                .copied()
                .collect();
            if within.is_empty() {
                break;
            }
            support = within.len();

            let previous = mean;
            mean = mean_point(&within);
            if distance(&mean, &previous) <= stop {
                break;
            }
        }

        (support > 0).then_some((mean, support))
    }

    fn resolve_bandwidth(&self, points: &[Point]) -> Result<f64> {
        let bandwidth = match self.bandwidth {
            Some(b) => b,
            None => estimate_bandwidth(points, self.quantile),
        };
        if !bandwidth.is_finite() || bandwidth < 0.0 {
            return Err(Error::clustering(
                self.name(),
                format!("invalid bandwidth {}", bandwidth),
            ));
        }
        Ok(if bandwidth == 0.0 { MIN_BANDWIDTH } else { bandwidth })
    }
}

impl ClusteringStrategy for MeanShift {
    fn name(&self) -> &'static str {
        "mean-shift"
    }

    fn label(&self, candidates: &CandidateSet<'_>) -> Result<Vec<i64>> {
        let points = &candidates.points;
        let bandwidth = self.resolve_bandwidth(points)?;

        let mut modes: Vec<(Point, usize)> = points
            .par_iter()
            .filter_map(|seed| self.climb(seed, points, bandwidth))
            .collect();
        if modes.is_empty() {
            return Err(Error::clustering(
                self.name(),
                format!("no seed has a point within bandwidth {}", bandwidth),
            ));
        }

        // strongest support first, ties broken on the larger mode coordinates
        modes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| compare_points(&b.0, &a.0)));

        let mut keep = vec![true; modes.len()];
        for i in 0..modes.len() {
            if !keep[i] {
                continue;
            }
            for j in (i + 1)..modes.len() {
                if keep[j] && distance(&modes[i].0, &modes[j].0) <= bandwidth {
                    keep[j] = false;
                }
            }
        }
        let centers: Vec<Point> = modes
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(mode, _)| mode.0)
            .collect();

        log::debug!(
            "mean-shift: bandwidth {:.4}, {} modes, {} centers",
            bandwidth,
            modes.len(),
            centers.len()
        );

        let labels = points
            .iter()
            .map(|p| {
                let (nearest, d) = centers
                    .iter()
                    .map(|c| distance(p, c))
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(&b.1))
                    .unwrap_or((0, f64::INFINITY));
                if !self.cluster_all && d > bandwidth {
                    NOISE
                } else {
                    nearest as i64
                }
            })
            .collect_vec();

        Ok(labels)
    }
}
