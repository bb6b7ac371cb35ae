//! Adjacency graph construction

use crate::error::{Error, Result};
use crate::geometry::{distance, Point};
use crate::graph::AdjacencyGraph;

/// Builder for incrementally constructing an AdjacencyGraph
pub struct GraphBuilder {
    /// Number of nodes
    node_count: usize,

    /// Adjacency lists for each node: (neighbour, distance)
    adjacency_lists: Vec<Vec<(u32, f64)>>,
}

impl GraphBuilder {
    /// Create a new graph builder for a fixed number of atoms
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            adjacency_lists: vec![Vec::new(); node_count],
        }
    }

    /// Add an undirected edge; self-loops and out-of-range atoms are ignored
    pub fn add_edge(&mut self, a: usize, b: usize, distance: f64) {
        if a == b || a >= self.node_count || b >= self.node_count {
            return;
        }
        self.adjacency_lists[a].push((b as u32, distance));
        self.adjacency_lists[b].push((a as u32, distance));
    }

    /// Build the compressed graph
    pub fn build(mut self) -> AdjacencyGraph {
        // Count total edges
        let edge_count: usize = self.adjacency_lists.iter()
            .map(|list| list.len())
            .sum();

        let mut graph = AdjacencyGraph::with_capacity(self.node_count, edge_count);

        graph.offsets.push(0);
        let mut offset = 0;
        for list in &mut self.adjacency_lists {
            // Sort for binary search; keep the first copy of repeated edges
            list.sort_by_key(|&(target, _)| target);
            list.dedup_by_key(|&mut (target, _)| target);

            for &(target, dist) in list.iter() {
                graph.targets.push(target);
                graph.distances.push(dist);
            }
            offset += list.len() as u32;
            graph.offsets.push(offset);
        }

        graph
    }
}

/// Connect every pair of atoms closer than `cutoff`
pub fn from_coordinates(coords: &[Point], cutoff: f64) -> AdjacencyGraph {
    let mut builder = GraphBuilder::new(coords.len());
    for i in 0..coords.len() {
        for j in (i + 1)..coords.len() {
            let d = distance(&coords[i], &coords[j]);
            if d <= cutoff {
                builder.add_edge(i, j, d);
            }
        }
    }
    builder.build()
}

/// Build a graph from an explicit `(a, b, distance)` edge list
///
/// Self-loops are ignored. An endpoint outside `0..node_count` or a distance
/// that is negative or not finite is an error.
pub fn from_edges(node_count: usize, edges: &[(usize, usize, f64)]) -> Result<AdjacencyGraph> {
    let mut builder = GraphBuilder::new(node_count);
    for (i, &(a, b, d)) in edges.iter().enumerate() {
        if a >= node_count || b >= node_count {
            return Err(Error::invalid_input(format!(
                "edge {} ({}, {}) references an atom outside 0..{}",
                i, a, b, node_count
            )));
        }
        if !d.is_finite() || d < 0.0 {
            return Err(Error::invalid_input(format!(
                "edge {} ({}, {}) has invalid distance {}",
                i, a, b, d
            )));
        }
        builder.add_edge(a, b, d);
    }
    Ok(builder.build())
}
