//! Dataset loading: one JSON record per structure in a directory

pub mod record;

pub use record::{LoadOptions, LoadedStructure, SiteRecord, StructureRecord};

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rayon::prelude::*;

/// Read a single structure record
pub fn load_record(path: &Path) -> Result<StructureRecord> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// `.json` files of a directory in name order
fn record_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(anyhow::anyhow!("Input directory not found: {}", dir.display()));
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Load and convert every record of `dir` in parallel
pub fn load_dataset(dir: &Path, options: &LoadOptions) -> Result<Vec<LoadedStructure>> {
    log::info!("Reading structure records from {}", dir.display());
    let paths = record_paths(dir)?;

    let structures = paths
        .par_iter()
        .map(|path| {
            load_record(path)?
                .into_structure(options)
                .with_context(|| format!("converting {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;

    let atoms: usize = structures.iter().map(|s| s.input.atoms.len()).sum();
    let sites: usize = structures.iter().map(|s| s.input.sites.len()).sum();
    log::info!(
        "Loaded {} structures ({} atoms, {} true sites)",
        structures.len(),
        atoms,
        sites
    );

    Ok(structures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const RECORD: &str = r#"{
        "name": "2xyz",
        "coords": [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]],
        "probabilities": [[0.1, 0.9], [0.1, 0.9], [0.1, 0.9], [0.9, 0.1]],
        "sites": [{"atoms": [[0, 0, 0], [1, 0, 0], [0, 1, 0], [0, 0, 1]], "ligand": [[0.2, 0.2, 0.2]]}]
    }"#;

    #[test]
    fn loads_json_files_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = fs::File::create(dir.path().join("2xyz.json")).unwrap();
        file.write_all(RECORD.as_bytes()).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = load_dataset(dir.path(), &LoadOptions::default()).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].input.name, "2xyz");
        assert_eq!(loaded[0].input.atoms.len(), 4);
        assert!(loaded[0].labels.is_none());
    }

    #[test]
    fn broken_record_names_its_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{").unwrap();
        let err = load_dataset(dir.path(), &LoadOptions::default()).unwrap_err();
        assert!(format!("{:#}", err).contains("bad.json"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        assert!(load_dataset(Path::new("/definitely/not/here"), &LoadOptions::default()).is_err());
    }
}
