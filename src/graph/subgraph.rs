//! Node-subset extraction for adjacency graphs

use crate::graph::AdjacencyGraph;

impl AdjacencyGraph {
    /// Restrict the graph to the atoms selected by `mask`
    ///
    /// Kept atoms are renumbered in their original order, matching
    /// `AtomSet::subset` and `ProbabilityField::subset`.
    pub fn restrict(&self, mask: &[bool]) -> AdjacencyGraph {
        // Create mapping from original to filtered indices
        let mut orig_to_filtered = vec![u32::MAX; self.node_count];
        let mut filtered_count = 0u32;
        for node in 0..self.node_count {
            if mask.get(node).copied().unwrap_or(false) {
                orig_to_filtered[node] = filtered_count;
                filtered_count += 1;
            }
        }

        let mut filtered = AdjacencyGraph::with_capacity(filtered_count as usize, 0);
        filtered.offsets.push(0);
        let mut offset = 0;

        for node in 0..self.node_count {
            if orig_to_filtered[node] == u32::MAX {
                continue;
            }

            for (target, dist) in self.weighted_neighbors(node) {
                // Only include edges where both endpoints pass the filter
                let mapped = orig_to_filtered[target];
                if mapped != u32::MAX {
                    filtered.targets.push(mapped);
                    filtered.distances.push(dist);
                    offset += 1;
                }
            }
            filtered.offsets.push(offset);
        }

        filtered
    }
}
