//! Representative points for the most confident regions

use serde::{Deserialize, Serialize};

use crate::cluster::Partition;
use crate::error::Result;
use crate::geometry::{mean_point, weighted_center, ConvexHull, Point};
use crate::model::{AtomSet, ProbabilityField};

/// How a region's centroid is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum CentroidMode {
    /// Volume centroid of the region's convex hull
    #[default]
    #[serde(rename = "hull")]
    #[value(name = "hull")]
    Hull,

    /// Center of mass weighted by positive-class probability
    #[serde(rename = "prob")]
    #[value(name = "prob")]
    Probability,

    /// Center of mass weighted by squared probability
    #[serde(rename = "square")]
    #[value(name = "square")]
    ProbabilitySquared,
}

/// A selected region ready for scoring
#[derive(Debug, Clone)]
pub struct PredictedSite {
    /// Rank in the partition (higher is more confident)
    pub rank: usize,

    /// Member coordinates
    pub points: Vec<Point>,

    pub centroid: Point,

    /// Absent for regions with fewer than 4 points or no volume
    pub hull: Option<ConvexHull>,
}

/// Walk regions best-first and build up to `limit` predicted sites
pub fn select_sites(
    partition: &Partition,
    atoms: &AtomSet,
    probabilities: &ProbabilityField,
    limit: usize,
    mode: CentroidMode,
) -> Result<Vec<PredictedSite>> {
    partition
        .best_first()
        .take(limit)
        .map(|region| {
            let points: Vec<Point> = region.members.iter().map(|&i| atoms.coords()[i]).collect();

            let hull = if points.len() >= 4 {
                match ConvexHull::new(&points) {
                    Ok(hull) => Some(hull),
                    Err(e) if e.is_degenerate_geometry() => {
                        log::debug!("Region {} has no hull: {}", region.rank, e);
                        None
                    }
                    Err(e) => return Err(e),
                }
            } else {
                None
            };

            let centroid = match mode {
                CentroidMode::Hull => hull
                    .as_ref()
                    .map(ConvexHull::centroid)
                    .unwrap_or_else(|| mean_point(&points)),
                CentroidMode::Probability => {
                    let weights: Vec<f64> =
                        region.members.iter().map(|&i| probabilities.positive(i)).collect();
                    weighted_center(&points, &weights)
                }
                CentroidMode::ProbabilitySquared => {
                    let weights: Vec<f64> = region
                        .members
                        .iter()
                        .map(|&i| probabilities.positive(i).powi(2))
                        .collect();
                    weighted_center(&points, &weights)
                }
            };

            Ok(PredictedSite {
                rank: region.rank,
                points,
                centroid,
                hull,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ScoreFunction, NOISE};
    use approx::assert_relative_eq;

    fn structure() -> (AtomSet, ProbabilityField, Partition) {
        // region A: unit tetrahedron (atoms 0..4), region B: a pair (4, 5), atom 6 noise
        let atoms = AtomSet::new(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [10.0, 0.0, 0.0],
            [12.0, 0.0, 0.0],
            [50.0, 0.0, 0.0],
        ]);
        let probs =
            ProbabilityField::from_positive(&[0.9, 0.9, 0.9, 0.9, 0.6, 0.8, 0.1]).unwrap();
        let partition = Partition::from_raw_labels(
            7,
            &[0, 1, 2, 3, 4, 5],
            &[0, 0, 0, 0, 1, 1],
            &[0.9, 0.9, 0.9, 0.9, 0.6, 0.8],
            ScoreFunction::Mean,
        );
        (atoms, probs, partition)
    }

    #[test]
    fn selects_best_regions_first() {
        let (atoms, probs, partition) = structure();
        assert_eq!(partition.labels()[6], NOISE);

        let sites = select_sites(&partition, &atoms, &probs, 5, CentroidMode::Hull).unwrap();
        assert_eq!(sites.len(), 2);
        assert_eq!(sites[0].rank, 1);
        assert!(sites[0].hull.is_some());
        assert_relative_eq!(sites[0].centroid[0], 0.25, epsilon = 1e-12);

        // fewer than 4 points: arithmetic mean, no hull
        assert!(sites[1].hull.is_none());
        assert_relative_eq!(sites[1].centroid[0], 11.0);

        let one = select_sites(&partition, &atoms, &probs, 1, CentroidMode::Hull).unwrap();
        assert_eq!(one.len(), 1);
        assert!(select_sites(&partition, &atoms, &probs, 0, CentroidMode::Hull)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn probability_weighting() {
        let (atoms, probs, partition) = structure();

        let sites = select_sites(&partition, &atoms, &probs, 2, CentroidMode::Probability).unwrap();
        assert_relative_eq!(sites[1].centroid[0], (0.6 * 10.0 + 0.8 * 12.0) / 1.4, epsilon = 1e-12);

        let sites =
            select_sites(&partition, &atoms, &probs, 2, CentroidMode::ProbabilitySquared).unwrap();
        assert_relative_eq!(
            sites[1].centroid[0],
            (0.36 * 10.0 + 0.64 * 12.0) / 1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn coplanar_region_has_no_hull() {
        let atoms = AtomSet::new(vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ]);
        let probs = ProbabilityField::from_positive(&[0.9; 4]).unwrap();
        let partition =
            Partition::from_raw_labels(4, &[0, 1, 2, 3], &[0; 4], &[0.9; 4], ScoreFunction::Mean);
        let sites = select_sites(&partition, &atoms, &probs, 1, CentroidMode::Hull).unwrap();
        assert!(sites[0].hull.is_none());
        assert_relative_eq!(sites[0].centroid[0], 0.5);
        assert_relative_eq!(sites[0].centroid[1], 0.5);
    }
}
