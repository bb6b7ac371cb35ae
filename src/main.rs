use anyhow::Result;
use clap::Parser;
use std::path::{Path, PathBuf};

use binding_site_metrics::cluster::{ClusterMethod, MethodKind};
use binding_site_metrics::data::{self, LoadOptions, LoadedStructure};
use binding_site_metrics::threshold::RocReport;
use binding_site_metrics::{
    evaluate_dataset, storage, summarize, CentroidMode, DatasetSummary, EvalConfig, ScoreFunction,
};

#[derive(Parser, Debug)]
#[clap(
    name = "binding-site-metrics",
    about = "Cluster per-atom binding predictions into sites and score them against ground truth"
)]
struct Cli {
    /// Directory of structure records (one JSON file per structure)
    #[clap(long)]
    input: PathBuf,

    /// Output directory for results
    #[clap(long, default_value = "site_metrics")]
    output_dir: PathBuf,

    /// JSON configuration; command-line flags below are ignored when given
    #[clap(long)]
    config: Option<PathBuf>,

    /// Clustering method
    #[clap(long, value_enum, default_value = "louvain")]
    method: MethodKind,

    /// Probability threshold for atom classification
    #[clap(long, default_value = "0.5")]
    prob_threshold: f64,

    /// Distance thresholds for clustering (not used by meanshift)
    #[clap(long, num_args = 1.., default_values_t = vec![3.0])]
    dist_thresholds: Vec<f64>,

    /// Numbers of additional sites to consider
    #[clap(long, num_args = 1.., default_values_t = vec![0, 2, 10])]
    extra_sites: Vec<usize>,

    /// Function combining atom scores into site scores
    #[clap(long, value_enum, default_value = "mean")]
    aggregation: ScoreFunction,

    /// Site center definition
    #[clap(long, value_enum, default_value = "hull")]
    centroid: CentroidMode,

    /// Louvain resolution
    #[clap(long, default_value = "0.05")]
    resolution: f64,

    /// Mean-shift bandwidth (estimated when absent)
    #[clap(long)]
    bandwidth: Option<f64>,

    /// Neighbour quantile for the mean-shift bandwidth estimate
    #[clap(long, default_value = "0.3")]
    quantile: f64,

    /// Assign every atom to a mean-shift cluster
    #[clap(long)]
    cluster_all: bool,

    /// DBSCAN core point size
    #[clap(long, default_value = "5")]
    min_samples: usize,

    /// Cluster ground-truth labels instead of predictions
    #[clap(long)]
    use_labels: bool,

    /// Use surface atoms for DCA and DCC_lig
    #[clap(long)]
    use_surface: bool,

    /// SASA above which an atom is on the surface
    #[clap(long, default_value = "1e-4")]
    sasa_threshold: f64,

    /// Contact radius when building adjacency from coordinates
    #[clap(long, default_value = "5.0")]
    adjacency_radius: f64,

    /// Pick the probability threshold from the ROC curve of the dataset
    #[clap(long)]
    compute_optimal: bool,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

impl Cli {
    fn base_config(&self) -> Result<EvalConfig> {
        if let Some(path) = &self.config {
            log::info!("Reading configuration from {}", path.display());
            return Ok(EvalConfig::from_json_file(path)?);
        }

        let method = match self.method.default_method() {
            ClusterMethod::MeanShift(mut s) => {
                s.bandwidth = self.bandwidth;
                s.quantile = self.quantile;
                s.cluster_all = self.cluster_all;
                ClusterMethod::MeanShift(s)
            }
            ClusterMethod::Dbscan(mut s) => {
                s.min_samples = self.min_samples;
                ClusterMethod::Dbscan(s)
            }
            ClusterMethod::Louvain(mut s) => {
                s.resolution = self.resolution;
                ClusterMethod::Louvain(s)
            }
            other => other,
        };

        Ok(EvalConfig {
            method,
            threshold: self.prob_threshold,
            score: self.aggregation,
            centroid: self.centroid,
            use_surface_for_contact_metrics: self.use_surface,
            ..EvalConfig::default()
        })
    }
}

/// Threshold maximising the ROC G-mean over all labelled atoms
fn optimal_threshold(structures: &[LoadedStructure]) -> Result<f64> {
    let fields = structures.iter().filter_map(|s| {
        s.labels
            .as_deref()
            .map(|labels| (&s.input.probabilities, labels))
    });
    let report = RocReport::from_fields(fields)?;
    let threshold = report.optimal_threshold();
    log::info!("Optimal threshold {:.4}", threshold);
    log::info!(
        "AUC: micro {:.4}, macro {:.4}, negative class {:.4}, positive class {:.4}",
        report.micro_auc,
        report.macro_auc,
        report.negative.auc(),
        report.positive.auc()
    );
    Ok(threshold)
}

fn log_summary(summary: &DatasetSummary) {
    log::info!(
        "{} structures, {} sites, {} without prediction",
        summary.structures,
        summary.sites,
        summary.no_prediction
    );
    log::info!(
        "DCC_lig: {:.1}% success, mean {:.3}",
        summary.dcc_lig.success_rate * 100.0,
        summary.dcc_lig.mean
    );
    log::info!(
        "DCC_site: {:.1}% success, mean {:.3}",
        summary.dcc_site.success_rate * 100.0,
        summary.dcc_site.mean
    );
    log::info!(
        "DCA: {:.1}% success, mean {:.3}",
        summary.dca.success_rate * 100.0,
        summary.dca.mean
    );
    log::info!(
        "Volumetric overlap: mean {:.3}, mean on DCC_site success {:.3}",
        summary.mean_overlap,
        summary.mean_overlap_on_success
    );
    log::info!("Mean predicted regions: {:.2}", summary.mean_n_predicted);
}

fn run_directory(output_dir: &Path, config: &EvalConfig, distance: f64) -> PathBuf {
    let name = format!(
        "{:?}_t{}_d{}_n{}",
        config.method.kind(),
        config.threshold,
        distance,
        config.extra_sites
    );
    output_dir.join(name.to_lowercase())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        // If threads = 0, use all available cores
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    let mut base = args.base_config()?;
    log::info!("Input: {}", args.input.display());
    log::info!("Output: {}", args.output_dir.display());

    // 1. Load data
    let options = LoadOptions {
        use_labels: args.use_labels,
        sasa_threshold: args.sasa_threshold,
        build_adjacency: base.method.needs_adjacency(),
        adjacency_radius: args.adjacency_radius,
    };
    if args.use_labels {
        log::info!("Using labels rather than probabilities");
    }
    let structures = data::load_dataset(&args.input, &options)?;

    // 2. Optionally replace the probability threshold
    if args.compute_optimal {
        base.threshold = optimal_threshold(&structures)?;
    }

    let inputs: Vec<_> = structures.into_iter().map(|s| s.input).collect();

    // 3. Sweep distance thresholds and extra-site counts
    for &distance in &args.dist_thresholds {
        for &extra in &args.extra_sites {
            let config = EvalConfig {
                method: base.method.with_distance(distance),
                extra_sites: extra,
                ..base.clone()
            };
            log::info!(
                "Calculating n+{} metrics for {} threshold with distance cutoff {}",
                extra,
                config.threshold,
                distance
            );

            let metrics = evaluate_dataset(&inputs, &config)?;
            let summary = summarize(&metrics, config.success_cutoff);
            log_summary(&summary);

            let run_dir = run_directory(&args.output_dir, &config, distance);
            storage::save_results(&metrics, &summary, &config, &run_dir)?;
        }
    }

    log::info!("Evaluation complete. Results saved to {}", args.output_dir.display());

    Ok(())
}
