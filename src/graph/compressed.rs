//! Memory-efficient atom adjacency representation

use serde::{Serialize, Deserialize};

/// Compressed sparse representation of an undirected atom graph
///
/// Every edge is stored in both directions and carries the Euclidean distance
/// between its atoms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyGraph {
    /// Number of atoms in the graph
    pub node_count: usize,

    /// Offset array: index where each node's edges begin
    /// offsets[i] to offsets[i+1] defines the edge range for node i
    pub offsets: Vec<u32>,

    /// Edge array: concatenated, sorted neighbour lists
    pub targets: Vec<u32>,

    /// Inter-atomic distance for each entry of `targets`
    pub distances: Vec<f64>,
}

impl AdjacencyGraph {
    /// Create a new graph with pre-allocated capacity
    pub fn with_capacity(node_count: usize, edge_count: usize) -> Self {
        Self {
            node_count,
            offsets: Vec::with_capacity(node_count + 1),
            targets: Vec::with_capacity(edge_count),
            distances: Vec::with_capacity(edge_count),
        }
    }

    /// Neighbours of a node
    pub fn neighbors(&self, node: usize) -> &[u32] {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        &self.targets[start..end]
    }

    /// Neighbours of a node paired with their distances
    pub fn weighted_neighbors(&self, node: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.offsets[node] as usize;
        let end = self.offsets[node + 1] as usize;
        self.targets[start..end]
            .iter()
            .zip(&self.distances[start..end])
            .map(|(&t, &d)| (t as usize, d))
    }

    /// Distance stored on the edge between `src` and `dst`, if any
    pub fn distance(&self, src: usize, dst: usize) -> Option<f64> {
        let start = self.offsets[src] as usize;
        self.neighbors(src)
            .binary_search(&(dst as u32))
            .ok()
            .map(|pos| self.distances[start + pos])
    }

    /// Check if there's an edge between src and dst
    pub fn has_edge(&self, src: usize, dst: usize) -> bool {
        self.neighbors(src).binary_search(&(dst as u32)).is_ok()
    }

    /// Number of undirected edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }
}
