//! Evaluation of predicted protein binding sites against ground truth
//!
//! Per-atom binding probabilities are clustered into candidate regions,
//! the most confident regions are matched to the true sites, and each match
//! is scored by center distances and convex-hull volumetric overlap.

pub mod aggregate;
pub mod centroid;
pub mod cluster;
pub mod config;
pub mod data;
pub mod error;
pub mod geometry;
pub mod graph;
pub mod model;
pub mod scoring;
pub mod storage;
pub mod threshold;

pub use aggregate::{evaluate_dataset, summarize, DatasetSummary, MetricSummary};
pub use centroid::{select_sites, CentroidMode, PredictedSite};
pub use cluster::{ClusterMethod, ClusteringStrategy, Partition, Region, ScoreFunction, NOISE};
pub use config::EvalConfig;
pub use error::{Error, Result};
pub use model::{AtomSet, ProbabilityField, Site, StructureInput};
pub use scoring::{evaluate_structure, StructureMetrics};
