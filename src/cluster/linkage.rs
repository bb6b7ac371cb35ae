//! Single-linkage agglomerative clustering with a distance cutoff
//!
//! Merging stops once the closest pair of clusters is at least
//! `distance_threshold` apart, so the clusters are exactly the connected
//! components of the graph joining candidates closer than the threshold.

use serde::{Deserialize, Serialize};

use crate::cluster::{CandidateSet, ClusteringStrategy};
use crate::error::{Error, Result};
use crate::geometry::distance;

/// Union-Find over candidate indices
pub struct DisjointSets {
    /// Parent pointers (parent[i] = parent of node i)
    parent: Vec<usize>,

    /// Size of each set, valid at roots
    size: Vec<usize>,
}

impl DisjointSets {
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            size: vec![1; len],
        }
    }

    /// Find the root of the set containing x with path halving
    pub fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    /// Union the sets containing x and y
    pub fn union(&mut self, x: usize, y: usize) {
        let root_x = self.find(x);
        let root_y = self.find(y);

        if root_x == root_y {
            return;
        }

        // Attach smaller tree under root of larger tree
        if self.size[root_x] > self.size[root_y] {
            self.parent[root_y] = root_x;
            self.size[root_x] += self.size[root_y];
        } else {
            self.parent[root_x] = root_y;
            self.size[root_y] += self.size[root_x];
        }
    }

    /// Dense component label per element, numbered by first appearance
    pub fn component_labels(&mut self) -> Vec<i64> {
        let len = self.parent.len();
        let mut label_of_root = vec![-1i64; len];
        let mut next = 0i64;
        (0..len)
            .map(|x| {
                let root = self.find(x);
                if label_of_root[root] < 0 {
                    label_of_root[root] = next;
                    next += 1;
                }
                label_of_root[root]
            })
            .collect()
    }
}

/// Single-linkage clustering parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linkage {
    /// Candidates strictly closer than this end up in the same cluster
    pub distance_threshold: f64,
}

impl Default for Linkage {
    fn default() -> Self {
        Self {
            distance_threshold: 3.0,
        }
    }
}

impl ClusteringStrategy for Linkage {
    fn name(&self) -> &'static str {
        "linkage"
    }

    fn label(&self, candidates: &CandidateSet<'_>) -> Result<Vec<i64>> {
        if !(self.distance_threshold > 0.0) {
            return Err(Error::clustering(
                self.name(),
                format!("distance threshold must be positive, got {}", self.distance_threshold),
            ));
        }

        let points = &candidates.points;
        let mut sets = DisjointSets::new(points.len());
        for i in 0..points.len() {
            for j in (i + 1)..points.len() {
                if distance(&points[i], &points[j]) < self.distance_threshold {
                    sets.union(i, j);
                }
            }
        }

        Ok(sets.component_labels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_find_merges_by_size() {
        let mut sets = DisjointSets::new(5);
        sets.union(0, 1);
        sets.union(3, 4);
        sets.union(1, 4);
        let root = sets.find(0);
        assert_eq!(sets.size[root], 4);
        assert_eq!(sets.find(4), root);
        assert_ne!(sets.find(2), root);
        assert_eq!(sets.component_labels(), vec![0, 0, 1, 0, 0]);
    }

    #[test]
    fn chains_link_through_close_pairs() {
        // 0-1-2 chained at 2.0, 3 is 2.5 from 2, 4 far away
        let points = vec![
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [6.5, 0.0, 0.0],
            [20.0, 0.0, 0.0],
        ];
        let indices: Vec<usize> = (0..points.len()).collect();
        let candidates = CandidateSet {
            indices: &indices,
            points,
            adjacency: None,
        };

        let labels = Linkage { distance_threshold: 2.5 }.label(&candidates).unwrap();
        // 2.5 is not strictly below the threshold
        assert_eq!(labels, vec![0, 0, 0, 1, 2]);

        let labels = Linkage { distance_threshold: 3.0 }.label(&candidates).unwrap();
        assert_eq!(labels, vec![0, 0, 0, 0, 1]);
    }
}
