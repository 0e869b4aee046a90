// Dataset snapshots: the embedded seed or a JSON file on disk

use crate::error::{DashboardError, Result};
use crate::models::{Crossing, DataFile, PersonRecord, QueryResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const SEED: &str = include_str!("../data/seed.json");

/// Everything the dashboard holds in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub files: Vec<DataFile>,
    #[serde(default)]
    pub crossings: Vec<Crossing>,
    #[serde(default)]
    pub results: Vec<QueryResult>,
    /// Personal-registration records used for comparisons
    #[serde(default)]
    pub people: Vec<PersonRecord>,
}

impl Dataset {
    /// The deterministic dataset shipped with the crate
    pub fn seed() -> Result<Self> {
        Self::from_json(SEED)
            .map_err(|e| DashboardError::Data(format!("Invalid seed dataset: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| DashboardError::Data(e.to_string()))
    }

    /// Reads a JSON snapshot from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DashboardError::Data(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content).map_err(|e| {
            DashboardError::Data(format!("Failed to parse {}: {}", path.display(), e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpf::is_valid_cpf;

    #[test]
    fn seed_is_complete() {
        let data = Dataset::seed().unwrap();
        assert_eq!(data.files.len(), 20);
        assert_eq!(data.crossings.len(), 15);
        assert_eq!(data.results.len(), 30);
        assert!(!data.people.is_empty());
    }

    #[test]
    fn seed_cpfs_are_valid() {
        let data = Dataset::seed().unwrap();
        assert!(data.results.iter().all(|r| is_valid_cpf(&r.cpf)));
        assert!(data.people.iter().all(|p| is_valid_cpf(&p.cpf)));
    }

    #[test]
    fn every_crossing_points_at_a_file() {
        let data = Dataset::seed().unwrap();
        for c in &data.crossings {
            assert!(data.files.iter().any(|f| f.id == c.file_id), "{}", c.id);
        }
    }

    #[test]
    fn load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, r#"{"files": [], "crossings": []}"#).unwrap();

        let data = Dataset::load(&path).unwrap();
        assert!(data.files.is_empty() && data.results.is_empty());
    }

    #[test]
    fn load_failures_are_data_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Dataset::load(&dir.path().join("missing.json"));
        assert!(matches!(missing, Err(DashboardError::Data(_))));

        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Dataset::load(&path), Err(DashboardError::Data(_))));
    }
}
