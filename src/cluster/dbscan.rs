//! Density-based clustering (DBSCAN)

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cluster::{CandidateSet, ClusteringStrategy, NOISE};
use crate::error::{Error, Result};
use crate::geometry::distance;

/// DBSCAN parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dbscan {
    /// Neighbourhood radius
    pub eps: f64,

    /// Points (self included) needed within `eps` to seed a cluster
    pub min_samples: usize,
}

impl Default for Dbscan {
    fn default() -> Self {
        Self {
            eps: 3.0,
            min_samples: 5,
        }
    }
}

impl ClusteringStrategy for Dbscan {
    fn name(&self) -> &'static str {
        "dbscan"
    }

    fn label(&self, candidates: &CandidateSet<'_>) -> Result<Vec<i64>> {
        if !(self.eps > 0.0) || self.min_samples == 0 {
            return Err(Error::clustering(
                self.name(),
                format!("need eps > 0 and min_samples >= 1, got {} and {}", self.eps, self.min_samples),
            ));
        }

        let points = &candidates.points;
        let neighborhoods: Vec<Vec<usize>> = points
            .par_iter()
            .map(|p| {
                points
                    .iter()
                    .enumerate()
                    .filter(|(_, q)| distance(p, q) <= self.eps)
                    .map(|(j, _)| j)
                    .collect()
            })
            .collect();
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|n| n.len() >= self.min_samples)
            .collect();

        let mut labels = vec![NOISE; points.len()];
        let mut next = 0i64;
        for seed in 0..points.len() {
            if labels[seed] != NOISE || !is_core[seed] {
                continue;
            }

            labels[seed] = next;
            let mut stack = vec![seed];
            while let Some(p) = stack.pop() {
                // border points join but do not expand
                if !is_core[p] {
                    continue;
                }
                for &q in &neighborhoods[p] {
                    if labels[q] == NOISE {
                        labels[q] = next;
                        stack.push(q);
                    }
                }
            }
            next += 1;
        }

        Ok(labels)
    }
}
