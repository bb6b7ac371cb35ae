//! In-memory structure model consumed by the evaluation core

pub mod probability;

pub use probability::ProbabilityField;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::geometry::{mean_point, weighted_center, Point};
use crate::graph::AdjacencyGraph;

/// Ordered atom coordinates with optional per-atom masses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtomSet {
    coords: Vec<Point>,
    masses: Option<Vec<f64>>,
}

impl AtomSet {
    pub fn new(coords: Vec<Point>) -> Self {
        Self {
            coords,
            masses: None,
        }
    }

    /// Atom set carrying one mass per atom
    pub fn with_masses(coords: Vec<Point>, masses: Vec<f64>) -> Result<Self> {
        if coords.len() != masses.len() {
            return Err(Error::invalid_input(format!(
                "{} coordinates but {} masses",
                coords.len(),
                masses.len()
            )));
        }
        Ok(Self {
            coords,
            masses: Some(masses),
        })
    }

    pub fn coords(&self) -> &[Point] {
        &self.coords
    }

    pub fn masses(&self) -> Option<&[f64]> {
        self.masses.as_deref()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Center of mass, falling back to the plain centroid without masses
    pub fn center_of_mass(&self) -> Point {
        match &self.masses {
            Some(masses) => weighted_center(&self.coords, masses),
            None => mean_point(&self.coords),
        }
    }

    /// Atoms selected by `mask`, in their original order
    pub fn subset(&self, mask: &[bool]) -> Self {
        let coords = self
            .coords
            .iter()
            .zip(mask)
            .filter(|(_, keep)| **keep)
            .map(|(c, _)| *c)
            .collect();
        let masses = self.masses.as_ref().map(|masses| {
            masses
                .iter()
                .zip(mask)
                .filter(|(_, keep)| **keep)
                .map(|(m, _)| *m)
                .collect()
        });
        Self { coords, masses }
    }
}

/// One ground-truth binding site and the ligand that occupies it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    /// Protein atoms lining the pocket
    pub atoms: AtomSet,

    /// Ligand heavy atoms with their masses
    pub ligand: AtomSet,
}

/// Everything the core needs to evaluate one structure
#[derive(Debug, Clone)]
pub struct StructureInput {
    pub name: String,
    pub atoms: AtomSet,
    pub probabilities: ProbabilityField,
    pub sites: Vec<Site>,
    pub adjacency: Option<AdjacencyGraph>,
    pub surface_mask: Option<Vec<bool>>,
}

impl StructureInput {
    pub fn new(
        name: impl Into<String>,
        atoms: AtomSet,
        probabilities: ProbabilityField,
        sites: Vec<Site>,
    ) -> Result<Self> {
        let input = Self {
            name: name.into(),
            atoms,
            probabilities,
            sites,
            adjacency: None,
            surface_mask: None,
        };
        input.validate()?;
        Ok(input)
    }

    pub fn with_adjacency(mut self, adjacency: AdjacencyGraph) -> Result<Self> {
        self.adjacency = Some(adjacency);
        self.validate()?;
        Ok(self)
    }

    pub fn with_surface_mask(mut self, mask: Vec<bool>) -> Result<Self> {
        self.surface_mask = Some(mask);
        self.validate()?;
        Ok(self)
    }

    /// Check that every per-atom array lines up with the atom set
    pub fn validate(&self) -> Result<()> {
        let n = self.atoms.len();
        if self.probabilities.len() != n {
            return Err(Error::invalid_input(format!(
                "{} atoms but {} probability rows",
                n,
                self.probabilities.len()
            )));
        }
        if let Some(graph) = &self.adjacency {
            if graph.node_count != n {
                return Err(Error::invalid_input(format!(
                    "{} atoms but adjacency graph has {} nodes",
                    n, graph.node_count
                )));
            }
        }
        if let Some(mask) = &self.surface_mask {
            if mask.len() != n {
                return Err(Error::invalid_input(format!(
                    "{} atoms but surface mask has {} entries",
                    n,
                    mask.len()
                )));
            }
        }
        for (i, site) in self.sites.iter().enumerate() {
            if site.ligand.is_empty() {
                return Err(Error::invalid_input(format!("site {i} has an empty ligand")));
            }
        }
        Ok(())
    }
}
