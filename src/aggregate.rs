//! Dataset-level evaluation and summary statistics

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::cluster::ClusteringStrategy;
use crate::config::EvalConfig;
use crate::error::Result;
use crate::model::StructureInput;
use crate::scoring::{evaluate_structure, StructureMetrics};

/// Evaluate every structure in parallel; results are sorted by name
///
/// The first failing structure aborts the run, its error tagged with the
/// structure's name.
pub fn evaluate_dataset(inputs: &[StructureInput], config: &EvalConfig) -> Result<Vec<StructureMetrics>> {
    log::info!("Evaluating {} structures with {}", inputs.len(), config.method.name());

    let mut results = inputs
        .par_iter()
        .map(|input| evaluate_structure(input, config).map_err(|e| e.in_structure(&input.name)))
        .collect::<Result<Vec<_>>>()?;

    results.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(results)
}

/// Mean of the non-NaN values; NaN when none remain
fn nan_mean<I: IntoIterator<Item = f64>>(values: I) -> f64 {
    values.into_iter().filter(|v| !v.is_nan()).mean()
}

/// Concatenate one per-site metric across structures
fn flatten(metrics: &[StructureMetrics], select: impl Fn(&StructureMetrics) -> &[f64]) -> Vec<f64> {
    metrics.iter().flat_map(|m| select(m).iter().copied()).collect()
}

/// Success rate and mean of one distance metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSummary {
    /// Fraction of sites below the cutoff; NaN counts as a miss
    pub success_rate: f64,

    /// Mean over non-NaN values
    pub mean: f64,
}

impl MetricSummary {
    pub fn from_values(values: &[f64], cutoff: f64) -> Self {
        let success_rate = if values.is_empty() {
            f64::NAN
        } else {
            values.iter().filter(|&&v| v < cutoff).count() as f64 / values.len() as f64
        };
        Self {
            success_rate,
            mean: nan_mean(values.iter().copied()),
        }
    }
}

/// Statistics over all structures and sites of a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub structures: usize,
    pub sites: usize,
    pub dcc_lig: MetricSummary,
    pub dcc_site: MetricSummary,
    pub dca: MetricSummary,

    /// Mean overlap over sites whose region had a hull
    pub mean_overlap: f64,

    /// Mean overlap over sites with a successful DCC_site
    pub mean_overlap_on_success: f64,

    /// Mean region count over structures with a prediction
    pub mean_n_predicted: f64,

    /// Structures without any predicted region
    pub no_prediction: usize,
}

/// Reduce per-structure metrics to dataset statistics
pub fn summarize(metrics: &[StructureMetrics], success_cutoff: f64) -> DatasetSummary {
    let dcc_site = flatten(metrics, |m| m.dcc_site.as_slice());
    let overlap = flatten(metrics, |m| m.volumetric_overlap.as_slice());

    let overlap_on_success = dcc_site
        .iter()
        .zip(&overlap)
        .filter(|(d, _)| **d < success_cutoff)
        .map(|(_, v)| *v);

    DatasetSummary {
        structures: metrics.len(),
        sites: dcc_site.len(),
        dcc_lig: MetricSummary::from_values(&flatten(metrics, |m| m.dcc_lig.as_slice()), success_cutoff),
        dcc_site: MetricSummary::from_values(&dcc_site, success_cutoff),
        dca: MetricSummary::from_values(&flatten(metrics, |m| m.dca.as_slice()), success_cutoff),
        mean_overlap: nan_mean(overlap.iter().copied()),
        mean_overlap_on_success: nan_mean(overlap_on_success),
        mean_n_predicted: nan_mean(
            metrics
                .iter()
                .filter(|m| !m.no_prediction)
                .map(|m| m.n_predicted as f64),
        ),
        no_prediction: metrics.iter().filter(|m| m.no_prediction).count(),
    }
}
