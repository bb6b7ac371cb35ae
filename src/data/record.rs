//! On-disk structure records

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;
use crate::graph::builder::{from_coordinates, from_edges};
use crate::model::{AtomSet, ProbabilityField, Site, StructureInput};

/// One true site as stored on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRecord {
    /// Pocket atom coordinates
    pub atoms: Vec<Point>,

    /// Ligand heavy-atom coordinates
    pub ligand: Vec<Point>,

    #[serde(default)]
    pub ligand_masses: Option<Vec<f64>>,
}

/// One protein with its predictions and ground truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub name: String,

    /// Protein atom coordinates
    pub coords: Vec<Point>,

    /// `[p_negative, p_positive]` per atom
    #[serde(default)]
    pub probabilities: Option<Vec<[f64; 2]>>,

    /// Ground-truth binding-site membership per atom
    #[serde(default)]
    pub labels: Option<Vec<bool>>,

    pub sites: Vec<SiteRecord>,

    /// `(a, b, distance)` atom contacts
    #[serde(default)]
    pub edges: Option<Vec<(usize, usize, f64)>>,

    /// Solvent-accessible surface area per atom
    #[serde(default)]
    pub sasa: Option<Vec<f64>>,
}

/// How records become evaluation inputs
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOptions {
    /// Replace predictions with probabilities synthesized from labels
    pub use_labels: bool,

    /// Atoms with SASA above this are surface-exposed
    pub sasa_threshold: f64,

    /// Build a contact graph from coordinates when none is stored
    pub build_adjacency: bool,

    /// Contact radius for the generated graph
    pub adjacency_radius: f64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            use_labels: false,
            sasa_threshold: 1e-4,
            build_adjacency: false,
            adjacency_radius: 5.0,
        }
    }
}

/// A structure ready for evaluation, with its labels kept for ROC analysis
#[derive(Debug, Clone)]
pub struct LoadedStructure {
    pub input: StructureInput,
    pub labels: Option<Vec<bool>>,
}

impl StructureRecord {
    /// Convert into a validated evaluation input
    pub fn into_structure(self, options: &LoadOptions) -> Result<LoadedStructure> {
        let probabilities = if options.use_labels {
            let labels = self
                .labels
                .as_deref()
                .ok_or_else(|| anyhow!("{}: labels requested but not present", self.name))?;
            ProbabilityField::from_labels(labels)
        } else {
            let rows = self
                .probabilities
                .as_deref()
                .ok_or_else(|| anyhow!("{}: no probabilities", self.name))?;
            ProbabilityField::from_rows(rows)?
        };

        let sites = self
            .sites
            .into_iter()
            .map(|site| {
                let ligand = match site.ligand_masses {
                    Some(masses) => AtomSet::with_masses(site.ligand, masses)?,
                    None => AtomSet::new(site.ligand),
                };
                Ok(Site {
                    atoms: AtomSet::new(site.atoms),
                    ligand,
                })
            })
            .collect::<crate::error::Result<Vec<_>>>()?;

        let adjacency = match &self.edges {
            Some(edges) => Some(
                from_edges(self.coords.len(), edges).map_err(|e| e.in_structure(self.name.as_str()))?,
            ),
            None if options.build_adjacency => Some(from_coordinates(&self.coords, options.adjacency_radius)),
            None => None,
        };
        let surface_mask: Option<Vec<bool>> = self
            .sasa
            .as_ref()
            .map(|sasa| sasa.iter().map(|&a| a > options.sasa_threshold).collect());

        let mut input = StructureInput::new(self.name, AtomSet::new(self.coords), probabilities, sites)?;
        if let Some(graph) = adjacency {
            input = input.with_adjacency(graph)?;
        }
        if let Some(mask) = surface_mask {
            input = input.with_surface_mask(mask)?;
        }

        Ok(LoadedStructure {
            input,
            labels: self.labels,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> StructureRecord {
        StructureRecord {
            name: "1abc".to_string(),
            coords: vec![[0.0; 3], [1.0, 0.0, 0.0], [9.0, 0.0, 0.0]],
            probabilities: Some(vec![[0.2, 0.8], [0.6, 0.4], [0.9, 0.1]]),
            labels: Some(vec![true, true, false]),
            sites: vec![SiteRecord {
                atoms: vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                ligand: vec![[0.2, 0.2, 0.2], [0.4, 0.2, 0.2]],
                ligand_masses: Some(vec![12.0, 16.0]),
            }],
            edges: None,
            sasa: Some(vec![0.0, 5.2, 1e-5]),
        }
    }

    #[test]
    fn converts_predictions_and_surface_mask() {
        let loaded = record().into_structure(&LoadOptions::default()).unwrap();
        assert_eq!(loaded.input.probabilities.positive(0), 0.8);
        assert_eq!(loaded.input.surface_mask, Some(vec![false, true, false]));
        assert!(loaded.input.adjacency.is_none());
        assert_eq!(loaded.input.sites[0].ligand.masses(), Some(&[12.0, 16.0][..]));
        assert_eq!(loaded.labels, Some(vec![true, true, false]));
    }

    #[test]
    fn labels_replace_predictions() {
        let options = LoadOptions {
            use_labels: true,
            ..LoadOptions::default()
        };
        let loaded = record().into_structure(&options).unwrap();
        assert_eq!(loaded.input.probabilities.positive(1), 1.0);
        assert_eq!(loaded.input.probabilities.positive(2), 0.0);

        let mut unlabeled = record();
        unlabeled.labels = None;
        assert!(unlabeled.into_structure(&options).is_err());
    }

    #[test]
    fn adjacency_from_edges_or_coordinates() {
        let options = LoadOptions {
            build_adjacency: true,
            ..LoadOptions::default()
        };
        let built = record().into_structure(&options).unwrap();
        let graph = built.input.adjacency.unwrap();
        assert!(graph.has_edge(0, 1));
        assert!(!graph.has_edge(1, 2));

        let mut with_edges = record();
        with_edges.edges = Some(vec![(1, 2, 8.0)]);
        let loaded = with_edges.into_structure(&options).unwrap();
        let graph = loaded.input.adjacency.unwrap();
        assert_eq!(graph.distance(2, 1), Some(8.0));
        assert!(!graph.has_edge(0, 1));
    }

    #[test]
    fn malformed_edge_lists_abort_loading() {
        let mut out_of_range = record();
        out_of_range.edges = Some(vec![(0, 1, 1.0), (0, 99, 1.0)]);
        let err = out_of_range.into_structure(&LoadOptions::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1abc"), "{}", message);
        assert!(message.contains("99"), "{}", message);

        let mut nan_distance = record();
        nan_distance.edges = Some(vec![(0, 1, f64::NAN)]);
        assert!(nan_distance.into_structure(&LoadOptions::default()).is_err());

        let mut negative = record();
        negative.edges = Some(vec![(1, 2, -1.0)]);
        assert!(negative.into_structure(&LoadOptions::default()).is_err());

        let mut self_loop = record();
        self_loop.edges = Some(vec![(2, 2, 0.0), (0, 1, 1.0)]);
        let loaded = self_loop.into_structure(&LoadOptions::default()).unwrap();
        assert_eq!(loaded.input.adjacency.unwrap().edge_count(), 1);
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut bad = record();
        bad.sasa = Some(vec![1.0]);
        assert!(bad.into_structure(&LoadOptions::default()).is_err());

        let mut bad = record();
        bad.probabilities = Some(vec![[0.5, 0.7], [0.6, 0.4], [0.9, 0.1]]);
        assert!(bad.into_structure(&LoadOptions::default()).is_err());
    }
}
