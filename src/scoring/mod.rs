//! Per-structure evaluation: cluster, select regions, score against truth
//!
//! Four numbers are reported per true site:
//! - `dcc_site`: distance from the true site's hull centroid to the centroid
//!   of the nearest predicted region
//! - `dcc_lig`: distance from the ligand center of mass to the closest
//!   predicted centroid
//! - `dca`: shortest distance from any predicted centroid to any ligand atom
//! - `volumetric_overlap`: Jaccard overlap of the matched region's hull with
//!   the true site's hull, NaN when the region has no hull

pub mod matching;

pub use matching::{contact_predictions, score_sites};

use serde::{Deserialize, Serialize};

use crate::centroid::{select_sites, PredictedSite};
use crate::cluster::ClusteringStrategy;
use crate::config::EvalConfig;
use crate::error::{Error, Result};
use crate::geometry::{ConvexHull, Point};
use crate::model::{Site, StructureInput};

/// A ground-truth site prepared for scoring
#[derive(Debug, Clone)]
pub struct TrueSite {
    /// Position in the structure's site list
    pub index: usize,
    pub hull: ConvexHull,
    /// Hull centroid of the pocket atoms
    pub center: Point,
    pub ligand_center: Point,
    pub ligand_atoms: Vec<Point>,
}

impl TrueSite {
    /// Fails when the pocket atoms do not span a volume
    pub fn from_site(index: usize, site: &Site) -> Result<Self> {
        let hull = ConvexHull::new(site.atoms.coords()).map_err(|e| match e {
            Error::DegenerateGeometry { reason, .. } => {
                Error::degenerate(format!("true site {}", index), reason)
            }
            other => other,
        })?;

        Ok(Self {
            index,
            center: hull.centroid(),
            hull,
            ligand_center: site.ligand.center_of_mass(),
            ligand_atoms: site.ligand.coords().to_vec(),
        })
    }
}

/// Metrics for one structure, one entry per true site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureMetrics {
    pub name: String,
    pub dcc_lig: Vec<f64>,
    pub dcc_site: Vec<f64>,
    pub dca: Vec<f64>,
    pub volumetric_overlap: Vec<f64>,

    /// Ranked regions found before the selection limit
    pub n_predicted: usize,

    /// No region survived clustering
    pub no_prediction: bool,
}

impl StructureMetrics {
    pub(crate) fn with_capacity(name: &str, sites: usize, n_predicted: usize) -> Self {
        Self {
            name: name.to_string(),
            dcc_lig: Vec::with_capacity(sites),
            dcc_site: Vec::with_capacity(sites),
            dca: Vec::with_capacity(sites),
            volumetric_overlap: Vec::with_capacity(sites),
            n_predicted,
            no_prediction: false,
        }
    }

    /// All-NaN record for a structure without predicted regions
    pub fn no_prediction(name: &str, sites: usize) -> Self {
        Self {
            name: name.to_string(),
            dcc_lig: vec![f64::NAN; sites],
            dcc_site: vec![f64::NAN; sites],
            dca: vec![f64::NAN; sites],
            volumetric_overlap: vec![f64::NAN; sites],
            n_predicted: 0,
            no_prediction: true,
        }
    }

    pub fn site_count(&self) -> usize {
        self.dcc_site.len()
    }
}

/// Cluster the surface-exposed atoms and select their regions
fn surface_sites(input: &StructureInput, config: &EvalConfig, limit: usize) -> Result<Vec<PredictedSite>> {
    let mask = input
        .surface_mask
        .as_deref()
        .ok_or_else(|| Error::invalid_input("surface metrics need a surface mask"))?;

    let atoms = input.atoms.subset(mask);
    let probabilities = input.probabilities.subset(mask);
    let adjacency = input.adjacency.as_ref().map(|g| g.restrict(mask));

    let partition = config.method.partition(
        &atoms,
        &probabilities,
        adjacency.as_ref(),
        config.threshold,
        config.score,
    )?;
    select_sites(&partition, &atoms, &probabilities, limit, config.centroid)
}

/// Evaluate one structure end to end
pub fn evaluate_structure(input: &StructureInput, config: &EvalConfig) -> Result<StructureMetrics> {
    input.validate()?;

    let true_sites = input
        .sites
        .iter()
        .enumerate()
        .map(|(i, site)| TrueSite::from_site(i, site))
        .collect::<Result<Vec<_>>>()?;
    let limit = config.site_limit(true_sites.len());

    let partition = config.method.partition(
        &input.atoms,
        &input.probabilities,
        input.adjacency.as_ref(),
        config.threshold,
        config.score,
    )?;
    let predicted = select_sites(&partition, &input.atoms, &input.probabilities, limit, config.centroid)?;

    let surface = if config.use_surface_for_contact_metrics {
        Some(surface_sites(input, config, limit)?)
    } else {
        None
    };
    let contact = contact_predictions(&predicted, surface.as_deref(), config.use_surface_for_contact_metrics)?;

    log::debug!(
        "{}: {} regions, {} selected for {} sites",
        input.name,
        partition.n_predicted(),
        predicted.len(),
        true_sites.len()
    );

    score_sites(&input.name, &true_sites, &predicted, contact, partition.n_predicted())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{ClusterMethod, Linkage};
    use crate::model::{AtomSet, ProbabilityField};

    fn tetra_site() -> Site {
        Site {
            atoms: AtomSet::new(vec![
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [0.0, 2.0, 0.0],
                [0.0, 0.0, 2.0],
            ]),
            ligand: AtomSet::new(vec![[0.5, 0.5, 0.5]]),
        }
    }

    #[test]
    fn degenerate_true_site_names_its_index() {
        let flat = Site {
            atoms: AtomSet::new(vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]]),
            ligand: AtomSet::new(vec![[0.0; 3]]),
        };
        let err = TrueSite::from_site(3, &flat).unwrap_err();
        assert!(err.is_degenerate_geometry());
        assert!(err.to_string().contains("true site 3"));
    }

    #[test]
    fn surface_mode_requires_a_mask() {
        let input = StructureInput::new(
            "s",
            AtomSet::new(tetra_site().atoms.coords().to_vec()),
            ProbabilityField::from_positive(&[0.9; 4]).unwrap(),
            vec![tetra_site()],
        )
        .unwrap();
        let config = EvalConfig {
            method: ClusterMethod::Linkage(Linkage::default()),
            use_surface_for_contact_metrics: true,
            ..EvalConfig::default()
        };
        assert!(evaluate_structure(&input, &config).is_err());

        let masked = input.with_surface_mask(vec![true, true, false, true]).unwrap();
        let metrics = evaluate_structure(&masked, &config).unwrap();
        assert_eq!(metrics.dcc_site, vec![0.0]);
        // the surface region is a triangle, so its centroid is the mean
        assert!(metrics.dcc_lig[0] > 0.0);
    }
}
