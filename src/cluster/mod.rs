//! Region clustering of atoms predicted to line a binding site
//!
//! Every strategy sees the same candidate set: the atoms whose positive-class
//! probability exceeds the threshold. A strategy only assigns raw labels to
//! the candidates (`-1` for noise); the shared ranking step then scores each
//! raw cluster and renumbers them so that rank 0 is the *least* confident
//! region. Regions with equal scores are ranked by ascending raw label. Use
//! [`Partition::best_first`] to walk regions from the most confident down.

pub mod dbscan;
pub mod linkage;
pub mod louvain;
pub mod meanshift;

pub use dbscan::Dbscan;
pub use linkage::Linkage;
pub use louvain::Louvain;
pub use meanshift::MeanShift;

use std::collections::HashMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::Point;
use crate::graph::AdjacencyGraph;
use crate::model::{AtomSet, ProbabilityField};

/// Label of atoms that belong to no ranked region
pub const NOISE: i64 = -1;

/// How member probabilities combine into a region confidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScoreFunction {
    #[default]
    Mean,
    Sum,
    /// Sum of squared probabilities
    #[serde(rename = "square")]
    #[value(name = "square")]
    SumOfSquares,
}

impl ScoreFunction {
    pub fn aggregate<I: IntoIterator<Item = f64>>(&self, probabilities: I) -> f64 {
        match self {
            Self::Mean => {
                let (sum, count) = probabilities
                    .into_iter()
                    .fold((0.0, 0usize), |(s, c), p| (s + p, c + 1));
                sum / count as f64
            }
            Self::Sum => probabilities.into_iter().sum(),
            Self::SumOfSquares => probabilities.into_iter().map(|p| p * p).sum(),
        }
    }
}

/// A ranked group of atoms believed to form one binding site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Position in ascending confidence order (0 = least confident)
    pub rank: usize,

    /// Atom indices into the clustered atom set, ascending
    pub members: Vec<usize>,

    /// Aggregate confidence
    pub score: f64,
}

/// Outcome of clustering one structure
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// Rank per atom of the full structure, or [`NOISE`]
    labels: Vec<i64>,

    /// Regions in ascending rank order
    regions: Vec<Region>,
}

impl Partition {
    /// Partition with no regions: nothing passed the threshold
    pub fn empty(atom_count: usize) -> Self {
        Self {
            labels: vec![NOISE; atom_count],
            regions: Vec::new(),
        }
    }

    /// Rank raw candidate labels and spread them over the full structure
    ///
    /// `candidates[i]` is the atom index of candidate `i`, `raw_labels[i]` its
    /// strategy label and `positives[i]` its positive-class probability.
    pub fn from_raw_labels(
        atom_count: usize,
        candidates: &[usize],
        raw_labels: &[i64],
        positives: &[f64],
        score: ScoreFunction,
    ) -> Self {
        let raw_ids: Vec<i64> = raw_labels
            .iter()
            .copied()
            .filter(|&label| label != NOISE)
            .unique()
            .collect();

        let scored: Vec<(i64, f64)> = raw_ids
            .iter()
            .map(|&id| {
                let probs = raw_labels
                    .iter()
                    .zip(positives)
                    .filter(|(label, _)| **label == id)
                    .map(|(_, p)| *p);
                (id, score.aggregate(probs))
            })
            .collect();

        // equal scores are ordered by ascending raw id
        let ordered: Vec<(i64, f64)> = scored
            .into_iter()
            .sorted_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
            .collect();

        let rank_of: HashMap<i64, usize> = ordered
            .iter()
            .enumerate()
            .map(|(rank, &(id, _))| (id, rank))
            .collect();

        let mut labels = vec![NOISE; atom_count];
        let mut regions: Vec<Region> = ordered
            .iter()
            .enumerate()
            .map(|(rank, &(_, score))| Region {
                rank,
                members: Vec::new(),
                score,
            })
            .collect();

        for (&atom, label) in candidates.iter().zip(raw_labels) {
            if let Some(&rank) = rank_of.get(label) {
                labels[atom] = rank as i64;
                regions[rank].members.push(atom);
            }
        }
        for region in &mut regions {
            region.members.sort_unstable();
        }

        Self { labels, regions }
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Per-atom ranks over the full structure, [`NOISE`] when unclustered
    pub fn labels(&self) -> &[i64] {
        &self.labels
    }

    /// Regions in ascending confidence order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Regions from the most confident down
    pub fn best_first(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter().rev()
    }

    /// Number of ranked (non-noise) regions
    pub fn n_predicted(&self) -> usize {
        self.regions.len()
    }
}

/// Atoms that passed the probability threshold
#[derive(Debug, Clone)]
pub struct CandidateSet<'a> {
    /// Atom index of each candidate
    pub indices: &'a [usize],

    /// Candidate coordinates, aligned with `indices`
    pub points: Vec<Point>,

    /// Pairwise-distance graph over the whole atom set, when available
    pub adjacency: Option<&'a AdjacencyGraph>,
}

impl CandidateSet<'_> {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A clustering algorithm usable for region detection
pub trait ClusteringStrategy: Send + Sync {
    /// Short identifier used in logs and errors
    fn name(&self) -> &'static str;

    /// Raw cluster label per candidate, [`NOISE`] for unclustered points
    ///
    /// Called only with two or more candidates.
    fn label(&self, candidates: &CandidateSet<'_>) -> Result<Vec<i64>>;

    /// Threshold the probability field, cluster the candidates and rank them
    fn partition(
        &self,
        atoms: &AtomSet,
        probabilities: &ProbabilityField,
        adjacency: Option<&AdjacencyGraph>,
        threshold: f64,
        score: ScoreFunction,
    ) -> Result<Partition> {
        if atoms.len() != probabilities.len() {
            return Err(Error::invalid_input(format!(
                "{} atoms but {} probability rows",
                atoms.len(),
                probabilities.len()
            )));
        }

        let indices: Vec<usize> = (0..atoms.len())
            .filter(|&i| probabilities.positive(i) > threshold)
            .collect();

        if indices.is_empty() {
            log::debug!("No atom above threshold {}", threshold);
            return Ok(Partition::empty(atoms.len()));
        }

        let raw_labels = if indices.len() == 1 {
            // a lone atom is its own region
            vec![0]
        } else {
            let candidates = CandidateSet {
                indices: &indices,
                points: indices.iter().map(|&i| atoms.coords()[i]).collect(),
                adjacency,
            };
            let labels = self.label(&candidates)?;
            if labels.len() != indices.len() {
                return Err(Error::clustering(
                    self.name(),
                    format!("{} labels for {} candidates", labels.len(), indices.len()),
                ));
            }
            labels
        };

        let positives: Vec<f64> = indices.iter().map(|&i| probabilities.positive(i)).collect();
        let partition =
            Partition::from_raw_labels(atoms.len(), &indices, &raw_labels, &positives, score);

        log::debug!(
            "{} clustering: {} candidates, {} regions",
            self.name(),
            indices.len(),
            partition.n_predicted()
        );

        Ok(partition)
    }
}

/// The clustering strategies, one variant per algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum ClusterMethod {
    MeanShift(MeanShift),
    Dbscan(Dbscan),
    Louvain(Louvain),
    Linkage(Linkage),
}

impl Default for ClusterMethod {
    fn default() -> Self {
        Self::Louvain(Louvain::default())
    }
}

impl ClusterMethod {
    fn strategy(&self) -> &dyn ClusteringStrategy {
        match self {
            Self::MeanShift(s) => s,
            Self::Dbscan(s) => s,
            Self::Louvain(s) => s,
            Self::Linkage(s) => s,
        }
    }

    /// Whether this method reads the adjacency graph
    pub fn needs_adjacency(&self) -> bool {
        matches!(self, Self::Louvain(_))
    }

    /// Copy with the distance parameter replaced
    ///
    /// Sets DBSCAN `eps`, the Louvain edge cutoff or the linkage threshold.
    /// Mean shift keeps its own bandwidth.
    pub fn with_distance(&self, distance: f64) -> Self {
        match self {
            Self::MeanShift(s) => Self::MeanShift(s.clone()),
            Self::Dbscan(s) => Self::Dbscan(Dbscan { eps: distance, ..s.clone() }),
            Self::Louvain(s) => Self::Louvain(Louvain {
                cutoff: distance,
                ..s.clone()
            }),
            Self::Linkage(_) => Self::Linkage(Linkage {
                distance_threshold: distance,
            }),
        }
    }

    pub fn kind(&self) -> MethodKind {
        match self {
            Self::MeanShift(_) => MethodKind::Meanshift,
            Self::Dbscan(_) => MethodKind::Dbscan,
            Self::Louvain(_) => MethodKind::Louvain,
            Self::Linkage(_) => MethodKind::Linkage,
        }
    }
}

/// Algorithm selector for the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum MethodKind {
    Meanshift,
    Dbscan,
    Louvain,
    Linkage,
}

impl MethodKind {
    /// Default parameters for this algorithm
    pub fn default_method(self) -> ClusterMethod {
        match self {
            Self::Meanshift => ClusterMethod::MeanShift(MeanShift::default()),
            Self::Dbscan => ClusterMethod::Dbscan(Dbscan::default()),
            Self::Louvain => ClusterMethod::Louvain(Louvain::default()),
            Self::Linkage => ClusterMethod::Linkage(Linkage::default()),
        }
    }
}

impl ClusteringStrategy for ClusterMethod {
    fn name(&self) -> &'static str {
        self.strategy().name()
    }

    fn label(&self, candidates: &CandidateSet<'_>) -> Result<Vec<i64>> {
        self.strategy().label(candidates)
    }
}
