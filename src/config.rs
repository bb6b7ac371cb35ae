//! Evaluation configuration

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::centroid::CentroidMode;
use crate::cluster::{ClusterMethod, ScoreFunction};
use crate::error::Result;

/// Settings for one evaluation run, shared by every structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Clustering algorithm and its parameters
    pub method: ClusterMethod,

    /// Atoms with positive-class probability above this are candidates
    pub threshold: f64,

    /// Predicted regions considered beyond the number of true sites
    pub extra_sites: usize,

    /// Region confidence aggregate
    pub score: ScoreFunction,

    pub centroid: CentroidMode,

    /// Feed DCC_lig and DCA from surface-exposed atoms only
    pub use_surface_for_contact_metrics: bool,

    /// Distances below this (Å) count as a successful prediction
    pub success_cutoff: f64,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            method: ClusterMethod::default(),
            threshold: 0.5,
            extra_sites: 0,
            score: ScoreFunction::Mean,
            centroid: CentroidMode::Hull,
            use_surface_for_contact_metrics: false,
            success_cutoff: 4.0,
        }
    }
}

impl EvalConfig {
    /// Create a new configuration with custom values
    pub fn new(method: ClusterMethod, threshold: f64, extra_sites: usize) -> Self {
        Self {
            method,
            threshold,
            extra_sites,
            ..Self::default()
        }
    }

    /// Load a configuration from a JSON file; missing fields take defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Number of regions to select for a structure with `true_sites` sites
    pub fn site_limit(&self, true_sites: usize) -> usize {
        true_sites + self.extra_sites
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Linkage;
    use std::io::Write;

    #[test]
    fn partial_json_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"method": {{"method": "linkage", "distance_threshold": 6.0}}, "centroid": "square", "extra_sites": 2}}"#
        )
        .unwrap();

        let config = EvalConfig::from_json_file(file.path()).unwrap();
        assert_eq!(
            config.method,
            ClusterMethod::Linkage(Linkage {
                distance_threshold: 6.0
            })
        );
        assert_eq!(config.centroid, CentroidMode::ProbabilitySquared);
        assert_eq!(config.site_limit(3), 5);
        assert_eq!(config.threshold, 0.5);
        assert_eq!(config.success_cutoff, 4.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(EvalConfig::from_json_file(file.path()).is_err());
    }
}
