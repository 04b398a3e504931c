// Metadata Store
// Persists the metadata of all routines between builds as one JSON document

use anyhow::{Context, Result};
use log::debug;
use sproc_utils::RoutineMetadataRecord;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Routine metadata keyed by routine name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataStore {
    path: PathBuf,
    routines: BTreeMap<String, RoutineMetadataRecord>,
}

impl MetadataStore {
    /// Load the store from `path`. A missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            debug!("No metadata file at {}, starting empty", path.display());
            return Ok(Self {
                path,
                routines: BTreeMap::new(),
            });
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read metadata file: {}", path.display()))?;
        let routines: BTreeMap<String, RoutineMetadataRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid metadata file: {}", path.display()))?;

        Ok(Self { path, routines })
    }

    /// Write the store back. The file is replaced atomically so an
    /// interrupted write never leaves a truncated document behind.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let mut json = serde_json::to_string_pretty(&self.routines)?;
        json.push('\n');

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, json)
            .with_context(|| format!("Failed to write metadata file: {}", temp_path.display()))?;
        fs::rename(&temp_path, &self.path)
            .with_context(|| format!("Failed to replace metadata file: {}", self.path.display()))?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, routine_name: &str) -> Option<&RoutineMetadataRecord> {
        self.routines.get(routine_name)
    }

    /// Store a record, replacing any previous record of the same routine
    pub fn insert(&mut self, record: RoutineMetadataRecord) {
        self.routines.insert(record.routine_name.clone(), record);
    }

    /// Keep only the routines for which `keep` returns true
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.routines.retain(|name, _| keep(name));
    }

    pub fn len(&self) -> usize {
        self.routines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routines.is_empty()
    }
}

#[cfg(test)]
#[path = "metadata_store/metadata_store_tests.rs"]
mod metadata_store_tests;
