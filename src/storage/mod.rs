//! Results persistence module

use anyhow::Result;
use polars::prelude::*;
use serde_json::{json, to_string_pretty};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::aggregate::{DatasetSummary, MetricSummary};
use crate::cluster::ClusteringStrategy;
use crate::config::EvalConfig;
use crate::scoring::StructureMetrics;

pub const SUMMARY_FILE: &str = "summary.json";
pub const CONFIG_FILE: &str = "config.json";
pub const BUNDLE_FILE: &str = "metrics.bin";
pub const TABLE_FILE: &str = "metrics.parquet";

/// Save one evaluation run to `output_dir`
pub fn save_results(
    metrics: &[StructureMetrics],
    summary: &DatasetSummary,
    config: &EvalConfig,
    output_dir: &Path,
) -> Result<()> {
    log::info!("Saving metrics for {} structures to {}", metrics.len(), output_dir.display());

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_summary(summary, config, output_dir)?;
    save_config(config, output_dir)?;
    save_bundle(metrics, output_dir)?;
    save_table(metrics, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save summary statistics
fn save_summary(summary: &DatasetSummary, config: &EvalConfig, output_dir: &Path) -> Result<()> {
    let mut file = File::create(output_dir.join(SUMMARY_FILE))?;

    let metric = |m: &MetricSummary| {
        json!({
            "success_rate": m.success_rate,
            "mean": m.mean,
        })
    };

    let summary_json = json!({
        "method": config.method.name(),
        "threshold": config.threshold,
        "extra_sites": config.extra_sites,
        "success_cutoff": config.success_cutoff,
        "counts": {
            "structures": summary.structures,
            "sites": summary.sites,
            "no_prediction": summary.no_prediction,
        },
        "dcc_lig": metric(&summary.dcc_lig),
        "dcc_site": metric(&summary.dcc_site),
        "dca": metric(&summary.dca),
        "volumetric_overlap": {
            "mean": summary.mean_overlap,
            "mean_on_dcc_site_success": summary.mean_overlap_on_success,
        },
        "mean_n_predicted": summary.mean_n_predicted,
    });

    file.write_all(to_string_pretty(&summary_json)?.as_bytes())?;

    Ok(())
}

/// Save the configuration that produced the run
fn save_config(config: &EvalConfig, output_dir: &Path) -> Result<()> {
    let mut file = File::create(output_dir.join(CONFIG_FILE))?;
    file.write_all(to_string_pretty(config)?.as_bytes())?;
    Ok(())
}

/// Save per-structure records keyed by structure name
fn save_bundle(metrics: &[StructureMetrics], output_dir: &Path) -> Result<()> {
    let bundle: BTreeMap<&str, &StructureMetrics> =
        metrics.iter().map(|m| (m.name.as_str(), m)).collect();
    let writer = BufWriter::new(File::create(output_dir.join(BUNDLE_FILE))?);
    bincode::serialize_into(writer, &bundle)?;
    Ok(())
}

/// Read back a bundle written by [`save_results`]
pub fn load_bundle(output_dir: &Path) -> Result<BTreeMap<String, StructureMetrics>> {
    let reader = BufReader::new(File::open(output_dir.join(BUNDLE_FILE))?);
    Ok(bincode::deserialize_from(reader)?)
}

/// One row per (structure, true site)
pub fn metrics_frame(metrics: &[StructureMetrics]) -> Result<DataFrame> {
    let rows = metrics.iter().flat_map(|m| (0..m.site_count()).map(move |i| (m, i)));

    let mut names = Vec::new();
    let mut sites = Vec::new();
    let mut dcc_lig = Vec::new();
    let mut dcc_site = Vec::new();
    let mut dca = Vec::new();
    let mut overlap = Vec::new();
    let mut n_predicted = Vec::new();
    let mut no_prediction = Vec::new();
    for (m, i) in rows {
        names.push(m.name.clone());
        sites.push(i as u32);
        dcc_lig.push(m.dcc_lig[i]);
        dcc_site.push(m.dcc_site[i]);
        dca.push(m.dca[i]);
        overlap.push(m.volumetric_overlap[i]);
        n_predicted.push(m.n_predicted as u32);
        no_prediction.push(m.no_prediction);
    }

    let frame = df!(
        "structure" => names,
        "site" => sites,
        "dcc_lig" => dcc_lig,
        "dcc_site" => dcc_site,
        "dca" => dca,
        "volumetric_overlap" => overlap,
        "n_predicted" => n_predicted,
        "no_prediction" => no_prediction
    )?;
    Ok(frame)
}

fn save_table(metrics: &[StructureMetrics], output_dir: &Path) -> Result<()> {
    let mut frame = metrics_frame(metrics)?;
    let file = File::create(output_dir.join(TABLE_FILE))?;
    ParquetWriter::new(file).finish(&mut frame)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;

    fn metrics() -> Vec<StructureMetrics> {
        vec![
            StructureMetrics {
                name: "a".to_string(),
                dcc_lig: vec![1.0, 7.0],
                dcc_site: vec![2.0, 9.0],
                dca: vec![0.5, 6.0],
                volumetric_overlap: vec![0.4, f64::NAN],
                n_predicted: 4,
                no_prediction: false,
            },
            StructureMetrics::no_prediction("b", 1),
        ]
    }

    #[test]
    fn writes_every_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = metrics();
        let config = EvalConfig::default();
        let summary = summarize(&metrics, config.success_cutoff);

        save_results(&metrics, &summary, &config, dir.path()).unwrap();

        for file in [SUMMARY_FILE, CONFIG_FILE, BUNDLE_FILE, TABLE_FILE] {
            assert!(dir.path().join(file).exists(), "{} missing", file);
        }

        let text = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(json["counts"]["sites"], 3);
        assert_eq!(json["counts"]["no_prediction"], 1);
        assert_eq!(json["method"], "louvain");

        let stored = EvalConfig::from_json_file(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(stored, config);
    }

    #[test]
    fn bundle_is_keyed_by_name() {
        let dir = tempfile::tempdir().unwrap();
        let metrics = metrics();
        let summary = summarize(&metrics, 4.0);
        save_results(&metrics, &summary, &EvalConfig::default(), dir.path()).unwrap();

        let bundle = load_bundle(dir.path()).unwrap();
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle["a"].dcc_site, vec![2.0, 9.0]);
        assert!(bundle["b"].no_prediction);
        assert!(bundle["b"].dcc_lig[0].is_nan());
    }

    #[test]
    fn frame_has_one_row_per_site() {
        let frame = metrics_frame(&metrics()).unwrap();
        assert_eq!(frame.height(), 3);
        assert_eq!(frame.width(), 8);
    }
}
