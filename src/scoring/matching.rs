//! Pairing predicted regions with true sites

use itertools::Itertools;
use ndarray::Array2;

use crate::centroid::PredictedSite;
use crate::error::{Error, Result};
use crate::geometry::{distance, min_distance, volumetric_overlap};
use crate::scoring::{StructureMetrics, TrueSite};

/// Choose the predicted list that feeds DCC_lig and DCA
///
/// The full-atom list always drives DCC_site and the overlap.
pub fn contact_predictions<'a>(
    full: &'a [PredictedSite],
    surface: Option<&'a [PredictedSite]>,
    use_surface_for_contact_metrics: bool,
) -> Result<&'a [PredictedSite]> {
    if !use_surface_for_contact_metrics {
        return Ok(full);
    }
    surface.ok_or_else(|| Error::invalid_input("surface metrics requested without surface predictions"))
}

/// `|true| x |predicted|` matrix of center-to-centroid distances
pub fn center_distances(true_sites: &[TrueSite], predicted: &[PredictedSite]) -> Array2<f64> {
    Array2::from_shape_fn((true_sites.len(), predicted.len()), |(i, j)| {
        distance(&true_sites[i].center, &predicted[j].centroid)
    })
}

/// Score every true site against its nearest predicted region
///
/// Matching is greedy per row, so two true sites can claim the same region.
pub fn score_sites(
    name: &str,
    true_sites: &[TrueSite],
    predicted: &[PredictedSite],
    contact: &[PredictedSite],
    n_predicted: usize,
) -> Result<StructureMetrics> {
    if predicted.is_empty() {
        return Ok(StructureMetrics::no_prediction(name, true_sites.len()));
    }

    let distances = center_distances(true_sites, predicted);
    let mut metrics = StructureMetrics::with_capacity(name, true_sites.len(), n_predicted);

    for (site, row) in true_sites.iter().zip(distances.rows()) {
        let matched = row
            .iter()
            .position_min_by(|a, b| a.total_cmp(b))
            .unwrap_or_default();

        let (dcc_lig, dca) = if contact.is_empty() {
            (f64::NAN, f64::NAN)
        } else {
            let lig = contact
                .iter()
                .map(|p| distance(&site.ligand_center, &p.centroid))
                .fold(f64::INFINITY, f64::min);
            let dca = contact
                .iter()
                .map(|p| min_distance(&p.centroid, &site.ligand_atoms))
                .fold(f64::INFINITY, f64::min);
            (lig, dca)
        };

        let overlap = match &predicted[matched].hull {
            Some(hull) => volumetric_overlap(hull, &site.hull)?,
            None => f64::NAN,
        };

        log::trace!(
            "{}: site {} matched rank {} at {:.3}",
            name,
            site.index,
            predicted[matched].rank,
            row[matched]
        );

        metrics.dcc_site.push(row[matched]);
        metrics.dcc_lig.push(dcc_lig);
        metrics.dca.push(dca);
        metrics.volumetric_overlap.push(overlap);
    }

    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ConvexHull, Point};
    use crate::model::{AtomSet, Site};
    use approx::assert_relative_eq;

    fn cube(origin: Point, side: f64) -> Vec<Point> {
        let mut points = Vec::new();
        for dx in [0.0, side] {
            for dy in [0.0, side] {
                for dz in [0.0, side] {
                    points.push([origin[0] + dx, origin[1] + dy, origin[2] + dz]);
                }
            }
        }
        points
    }

    fn true_site(index: usize, origin: Point, ligand: Vec<Point>) -> TrueSite {
        let site = Site {
            atoms: AtomSet::new(cube(origin, 2.0)),
            ligand: AtomSet::new(ligand),
        };
        TrueSite::from_site(index, &site).unwrap()
    }

    fn predicted(rank: usize, points: Vec<Point>) -> PredictedSite {
        let hull = ConvexHull::new(&points).ok();
        let centroid = hull.as_ref().map(ConvexHull::centroid).unwrap_or(points[0]);
        PredictedSite {
            rank,
            points,
            centroid,
            hull,
        }
    }

    #[test]
    fn identical_region_scores_perfectly() {
        let site = true_site(0, [0.0; 3], vec![[1.0, 1.0, 1.0], [1.0, 1.0, 3.0]]);
        let pred = vec![predicted(0, cube([0.0; 3], 2.0))];

        let metrics = score_sites("s", &[site], &pred, &pred, 1).unwrap();
        assert_eq!(metrics.dcc_site, vec![0.0]);
        assert_relative_eq!(metrics.volumetric_overlap[0], 1.0, epsilon = 1e-6);
        // ligand center of mass (1, 1, 2)
        assert_relative_eq!(metrics.dcc_lig[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(metrics.dca[0], 0.0, epsilon = 1e-12);
        assert!(!metrics.no_prediction);
    }

    #[test]
    fn hull_less_region_gives_nan_overlap() {
        let site = true_site(0, [0.0; 3], vec![[1.0, 1.0, 1.0]]);
        let pred = vec![predicted(0, vec![[1.0, 1.0, 1.0], [1.0, 1.0, 2.0]])];
        let metrics = score_sites("s", &[site], &pred, &pred, 1).unwrap();
        assert!(metrics.volumetric_overlap[0].is_nan());
        assert_relative_eq!(metrics.dcc_site[0], 0.0, epsilon = 1e-9);
    }

    #[test]
    fn disjoint_region_gives_zero_overlap() {
        let site = true_site(0, [0.0; 3], vec![[1.0, 1.0, 1.0]]);
        let pred = vec![predicted(0, cube([10.0, 0.0, 0.0], 2.0))];
        let metrics = score_sites("s", &[site], &pred, &pred, 1).unwrap();
        assert_eq!(metrics.volumetric_overlap[0], 0.0);
        assert_relative_eq!(metrics.dcc_site[0], 10.0, epsilon = 1e-9);
    }

    #[test]
    fn greedy_matching_lets_sites_share_a_region() {
        let a = true_site(0, [0.0; 3], vec![[1.0, 1.0, 1.0]]);
        let b = true_site(1, [3.0, 0.0, 0.0], vec![[4.0, 1.0, 1.0]]);
        // one region between both sites, one far away
        let pred = vec![
            predicted(1, cube([1.5, 0.0, 0.0], 2.0)),
            predicted(0, cube([40.0, 0.0, 0.0], 2.0)),
        ];
        let metrics = score_sites("s", &[a, b], &pred, &pred, 2).unwrap();
        assert_relative_eq!(metrics.dcc_site[0], 1.5, epsilon = 1e-9);
        assert_relative_eq!(metrics.dcc_site[1], 1.5, epsilon = 1e-9);
        assert!(metrics.volumetric_overlap.iter().all(|&v| v > 0.0));
    }

    #[test]
    fn contact_metrics_follow_the_selected_list() {
        let site = true_site(0, [0.0; 3], vec![[1.0, 1.0, 1.0]]);
        let full = vec![predicted(0, cube([0.0; 3], 2.0))];
        let surface = vec![predicted(0, cube([5.0, 0.0, 0.0], 2.0))];

        let contact = contact_predictions(&full, Some(surface.as_slice()), true).unwrap();
        let metrics = score_sites("s", &[site], &full, contact, 1).unwrap();
        assert_relative_eq!(metrics.dcc_site[0], 0.0);
        assert_relative_eq!(metrics.dcc_lig[0], 5.0, epsilon = 1e-9);

        let contact = contact_predictions(&full, Some(surface.as_slice()), false).unwrap();
        assert_eq!(contact.len(), 1);
        assert_eq!(contact[0].centroid, full[0].centroid);

        assert!(contact_predictions(&full, None, true).is_err());
    }

    #[test]
    fn empty_surface_list_gives_nan_contact_metrics() {
        let site = true_site(0, [0.0; 3], vec![[1.0, 1.0, 1.0]]);
        let full = vec![predicted(0, cube([0.0; 3], 2.0))];
        let metrics = score_sites("s", &[site], &full, &[], 1).unwrap();
        assert!(metrics.dcc_lig[0].is_nan());
        assert!(metrics.dca[0].is_nan());
        assert_eq!(metrics.dcc_site[0], 0.0);
    }

    #[test]
    fn no_prediction_keeps_site_count() {
        let sites = vec![
            true_site(0, [0.0; 3], vec![[1.0, 1.0, 1.0]]),
            true_site(1, [9.0, 0.0, 0.0], vec![[10.0, 1.0, 1.0]]),
        ];
        let metrics = score_sites("s", &sites, &[], &[], 0).unwrap();
        assert!(metrics.no_prediction);
        assert_eq!(metrics.n_predicted, 0);
        assert_eq!(metrics.dcc_site.len(), 2);
        assert!(metrics.dcc_lig.iter().chain(&metrics.dca).all(|v| v.is_nan()));
    }
}
