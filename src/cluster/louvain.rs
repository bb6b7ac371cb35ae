//! Louvain community detection on the candidate contact graph
//!
//! Candidates become nodes of an unweighted graph joining atoms whose
//! adjacency distance is within `cutoff`. Communities are found by greedy
//! modularity optimisation: nodes move to the neighbouring community with the
//! best positive gain until no move helps, the communities are collapsed into
//! super-nodes, and the process repeats while modularity improves by more than
//! `threshold`. Nodes are visited in index order so results are reproducible.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::cluster::{CandidateSet, ClusteringStrategy};
use crate::error::{Error, Result};

/// Safety cap on local-move sweeps per level
const MAX_SWEEPS: usize = 1_000;

/// Louvain parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Louvain {
    /// Longest adjacency distance kept as an edge
    pub cutoff: f64,

    /// Modularity resolution; small values favour large communities
    pub resolution: f64,

    /// Minimum modularity gain for another aggregation level
    pub threshold: f64,
}

impl Default for Louvain {
    fn default() -> Self {
        Self {
            cutoff: 3.0,
            resolution: 0.05,
            threshold: 1e-7,
        }
    }
}

impl Louvain {
    /// Build the candidate graph; node weights are atom indices
    fn candidate_graph(&self, candidates: &CandidateSet<'_>) -> Result<UnGraph<usize, f64>> {
        let adjacency = candidates
            .adjacency
            .ok_or_else(|| Error::clustering(self.name(), "no adjacency graph supplied"))?;

        let local: HashMap<usize, usize> = candidates
            .indices
            .iter()
            .enumerate()
            .map(|(i, &atom)| (atom, i))
            .collect();

        let mut graph = UnGraph::with_capacity(candidates.len(), 0);
        let nodes: Vec<NodeIndex> = candidates
            .indices
            .iter()
            .map(|&atom| graph.add_node(atom))
            .collect();

        for (i, &atom) in candidates.indices.iter().enumerate() {
            if atom >= adjacency.node_count {
                return Err(Error::clustering(
                    self.name(),
                    format!("atom {} outside adjacency graph of {} nodes", atom, adjacency.node_count),
                ));
            }
            for (neighbor, dist) in adjacency.weighted_neighbors(atom) {
                if let Some(&j) = local.get(&neighbor) {
                    if j > i && dist <= self.cutoff {
                        graph.add_edge(nodes[i], nodes[j], dist);
                    }
                }
            }
        }

        Ok(graph)
    }
}

impl ClusteringStrategy for Louvain {
    fn name(&self) -> &'static str {
        "louvain"
    }

    fn label(&self, candidates: &CandidateSet<'_>) -> Result<Vec<i64>> {
        let graph = self.candidate_graph(candidates)?;
        let communities = louvain_communities(&graph, self.resolution, self.threshold);

        log::debug!(
            "louvain: {} nodes, {} edges, {} communities",
            graph.node_count(),
            graph.edge_count(),
            communities.len()
        );

        let mut labels = vec![0i64; graph.node_count()];
        for (label, community) in communities.iter().enumerate() {
            for &node in community {
                labels[node] = label as i64;
            }
        }
        Ok(labels)
    }
}

/// One aggregation level: weighted adjacency plus self-loop weight per node
#[derive(Debug, Clone)]
struct Level {
    neighbors: Vec<BTreeMap<usize, f64>>,
    self_loops: Vec<f64>,
}

impl Level {
    /// Unit weight per edge; stored distances are ignored
    fn unweighted<N>(graph: &UnGraph<N, f64>) -> Self {
        let n = graph.node_count();
        let mut level = Self {
            neighbors: vec![BTreeMap::new(); n],
            self_loops: vec![0.0; n],
        };
        for edge in graph.edge_references() {
            let (a, b) = (edge.source().index(), edge.target().index());
            if a == b {
                level.self_loops[a] += 1.0;
            } else {
                *level.neighbors[a].entry(b).or_insert(0.0) += 1.0;
                *level.neighbors[b].entry(a).or_insert(0.0) += 1.0;
            }
        }
        level
    }

    fn len(&self) -> usize {
        self.self_loops.len()
    }

    /// Weighted degree; a self-loop counts twice
    fn degree(&self, node: usize) -> f64 {
        self.neighbors[node].values().sum::<f64>() + 2.0 * self.self_loops[node]
    }

    fn total_weight(&self) -> f64 {
        let between: f64 = self.neighbors.iter().flat_map(|n| n.values()).sum();
        between / 2.0 + self.self_loops.iter().sum::<f64>()
    }

    fn modularity(&self, communities: &[Vec<usize>], m: f64, resolution: f64) -> f64 {
        let mut community_of = vec![0; self.len()];
        for (c, members) in communities.iter().enumerate() {
            for &node in members {
                community_of[node] = c;
            }
        }

        communities
            .iter()
            .enumerate()
            .map(|(c, members)| {
                let internal: f64 = members
                    .iter()
                    .map(|&u| {
                        let inside: f64 = self.neighbors[u]
                            .iter()
                            .filter(|(v, _)| community_of[**v] == c)
                            .map(|(_, w)| *w)
                            .sum();
                        self.self_loops[u] + inside / 2.0
                    })
                    .sum();
                let degree: f64 = members.iter().map(|&u| self.degree(u)).sum();
                internal / m - resolution * (degree / (2.0 * m)).powi(2)
            })
            .sum()
    }

    /// Local moving phase; returns communities of this level's nodes
    fn one_level(&self, m: f64, resolution: f64) -> (Vec<Vec<usize>>, bool) {
        let n = self.len();
        let degrees: Vec<f64> = (0..n).map(|u| self.degree(u)).collect();
        let mut community_of: Vec<usize> = (0..n).collect();
        let mut stot = degrees.clone();
        let mut improved = false;

        for _ in 0..MAX_SWEEPS {
            let mut moves = 0;
            for u in 0..n {
                let current = community_of[u];
                let degree = degrees[u];

                let mut links: BTreeMap<usize, f64> = BTreeMap::new();
                for (&v, &w) in &self.neighbors[u] {
                    *links.entry(community_of[v]).or_insert(0.0) += w;
                }

                stot[current] -= degree;
                let remove_cost = -links.get(&current).copied().unwrap_or(0.0) / m
                    + resolution * stot[current] * degree / (2.0 * m * m);

                let mut best_gain = 0.0;
                let mut best = current;
                for (&community, &weight) in &links {
                    let gain = remove_cost + weight / m
                        - resolution * stot[community] * degree / (2.0 * m * m);
                    if gain > best_gain {
                        best_gain = gain;
                        best = community;
                    }
                }
                stot[best] += degree;

                if best != current {
                    community_of[u] = best;
                    improved = true;
                    moves += 1;
                }
            }
            if moves == 0 {
                break;
            }
        }

        let mut grouped: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (u, &c) in community_of.iter().enumerate() {
            grouped.entry(c).or_default().push(u);
        }
        (grouped.into_values().collect(), improved)
    }

    /// Collapse each community into a single node
    fn aggregate(&self, communities: &[Vec<usize>]) -> Self {
        let mut community_of = vec![0; self.len()];
        for (c, members) in communities.iter().enumerate() {
            for &node in members {
                community_of[node] = c;
            }
        }

        let mut next = Self {
            neighbors: vec![BTreeMap::new(); communities.len()],
            self_loops: vec![0.0; communities.len()],
        };
        for u in 0..self.len() {
            let cu = community_of[u];
            next.self_loops[cu] += self.self_loops[u];
            for (&v, &w) in self.neighbors[u].range(u + 1..) {
                let cv = community_of[v];
                if cu == cv {
                    next.self_loops[cu] += w;
                } else {
                    *next.neighbors[cu].entry(cv).or_insert(0.0) += w;
                    *next.neighbors[cv].entry(cu).or_insert(0.0) += w;
                }
            }
        }
        next
    }
}

/// Louvain communities of `graph` as lists of node indices
///
/// A graph without edges yields one community per node.
pub fn louvain_communities<N>(graph: &UnGraph<N, f64>, resolution: f64, threshold: f64) -> Vec<Vec<usize>> {
    let mut level = Level::unweighted(graph);
    let mut communities: Vec<Vec<usize>> = (0..graph.node_count()).map(|u| vec![u]).collect();

    let m = level.total_weight();
    if m == 0.0 {
        return communities;
    }

    let mut modularity = level.modularity(&communities, m, resolution);
    loop {
        let (inner, improved) = level.one_level(m, resolution);
        if !improved {
            break;
        }

        communities = inner
            .iter()
            .map(|members| {
                let mut nodes: Vec<usize> = members
                    .iter()
                    .flat_map(|&super_node| communities[super_node].iter().copied())
                    .collect();
                nodes.sort_unstable();
                nodes
            })
            .collect();

        let next_modularity = level.modularity(&inner, m, resolution);
        if next_modularity - modularity <= threshold {
            break;
        }
        modularity = next_modularity;
        level = level.aggregate(&inner);
    }

    communities
}
