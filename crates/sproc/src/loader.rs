//! Batch loader
//!
//! Loads every routine source of a project (or an explicit list of files)
//! over one gateway connection, keeps the metadata store up to date and
//! reports what happened to each routine.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use sproc_utils::CatalogRoutineInfo;

use crate::compiler::{CompileStatus, RoutineCompiler};
use crate::config::Config;
use crate::diagnostics::Diagnostic;
use crate::gateway::{DatabaseGateway, GatewayError, SchemaColumn};
use crate::metadata_store::MetadataStore;
use crate::placeholder::ReplacePairs;
use crate::source_finder::SourceFinder;

/// A routine that could not be loaded
#[derive(Debug, Clone)]
pub struct LoadFailure {
    pub routine: String,
    /// Source file, absent for failures of routines without a source
    pub path: Option<PathBuf>,
    pub message: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of one batch run
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub loaded: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<LoadFailure>,
    /// Routines dropped from the database because their source is gone
    pub dropped: Vec<String>,
    /// Advisories of successfully loaded routines
    pub warnings: Vec<(String, Diagnostic)>,
}

impl LoadSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

pub struct BatchLoader<'a> {
    gateway: &'a mut dyn DatabaseGateway,
    config: &'a Config,
}

impl<'a> BatchLoader<'a> {
    pub fn new(gateway: &'a mut dyn DatabaseGateway, config: &'a Config) -> Self {
        Self { gateway, config }
    }

    /// Load the given files, or the whole source directory when `files` is
    /// empty. Only a full run drops obsolete routines and purges their
    /// metadata.
    pub fn run(&mut self, files: &[PathBuf]) -> Result<LoadSummary> {
        let full_run = files.is_empty();
        let sources = if full_run {
            let source_dir = &self.config.loader.source_dir;
            SourceFinder::new(source_dir, &self.config.loader.extension)
                .scan()
                .with_context(|| {
                    format!("Failed to scan source directory: {}", source_dir.display())
                })?
        } else {
            files.to_vec()
        };

        let mut summary = LoadSummary::default();
        let known_routines: HashSet<String> =
            sources.iter().map(|path| routine_name(path)).collect();
        let sources = reject_duplicates(sources, &mut summary);

        let mut store = MetadataStore::load(&self.config.loader.metadata)?;
        debug!("{} metadata record(s) in {}", store.len(), store.path().display());
        let replace_pairs = self
            .replace_pairs()
            .context("Failed to read schema columns")?;
        let session = self.config.session();
        let catalog: HashMap<String, CatalogRoutineInfo> = self
            .gateway
            .routines()
            .context("Failed to read routine catalog")?
            .into_iter()
            .map(|info| (info.routine_name.clone(), info))
            .collect();

        info!("Loading {} routine(s)", sources.len());

        let mut compiler = RoutineCompiler::new(&mut *self.gateway, &session, &replace_pairs);
        for path in &sources {
            let name = routine_name(path);
            let result = compiler.compile(path, store.get(&name), catalog.get(&name));
            match result {
                Ok(outcome) => {
                    match outcome.status {
                        CompileStatus::Skipped => summary.skipped.push(name.clone()),
                        CompileStatus::Loaded { .. } => summary.loaded.push(name.clone()),
                    }
                    summary
                        .warnings
                        .extend(outcome.diagnostics.into_iter().map(|d| (name.clone(), d)));
                    store.insert(outcome.record);
                }
                Err(err) => {
                    error!("{}", err);
                    summary.failed.push(LoadFailure {
                        routine: name,
                        path: Some(path.clone()),
                        message: err.kind.to_string(),
                        diagnostics: err.diagnostics().to_vec(),
                    });
                }
            }
        }

        if full_run {
            self.drop_obsolete(&catalog, &known_routines, &mut summary);
            store.retain(|name| known_routines.contains(name));
        }

        store.save()?;

        info!(
            "{} loaded, {} skipped, {} failed, {} dropped",
            summary.loaded.len(),
            summary.skipped.len(),
            summary.failed.len(),
            summary.dropped.len()
        );

        Ok(summary)
    }

    /// Configured placeholders, extended with column types of the schema
    fn replace_pairs(&mut self) -> Result<ReplacePairs, GatewayError> {
        let mut pairs = self.config.replace_pairs();
        if self.config.loader.column_type_placeholders {
            let columns = self.gateway.schema_columns()?;
            for (token, value) in column_type_placeholders(&columns) {
                pairs.insert_if_absent(&token, value);
            }
        }
        Ok(pairs)
    }

    fn drop_obsolete(
        &mut self,
        catalog: &HashMap<String, CatalogRoutineInfo>,
        known_routines: &HashSet<String>,
        summary: &mut LoadSummary,
    ) {
        let mut obsolete: Vec<&CatalogRoutineInfo> = catalog
            .values()
            .filter(|info| !known_routines.contains(&info.routine_name))
            .collect();
        obsolete.sort_by(|a, b| a.routine_name.cmp(&b.routine_name));

        for info in obsolete {
            info!("Dropping {} {}: no source file", info.routine_type, info.routine_name);
            match self.gateway.drop_routine(info.routine_type, &info.routine_name) {
                Ok(()) => summary.dropped.push(info.routine_name.clone()),
                Err(err) => {
                    error!("Failed to drop {}: {}", info.routine_name, err);
                    summary.failed.push(LoadFailure {
                        routine: info.routine_name.clone(),
                        path: None,
                        message: err.to_string(),
                        diagnostics: Vec::new(),
                    });
                }
            }
        }
    }
}

/// Run a batch over `gateway`, then close it with `close` whether or not the
/// batch succeeded. A batch error takes precedence over a close error.
pub fn load_and_close<G: DatabaseGateway>(
    mut gateway: G,
    config: &Config,
    files: &[PathBuf],
    close: impl FnOnce(G) -> Result<(), GatewayError>,
) -> Result<LoadSummary> {
    let result = BatchLoader::new(&mut gateway, config).run(files);
    let closed = close(gateway);

    let summary = result?;
    closed.context("Failed to close database connection")?;
    Ok(summary)
}

/// `@table.column%type@` placeholders for the given schema columns
pub fn column_type_placeholders(columns: &[SchemaColumn]) -> Vec<(String, String)> {
    columns
        .iter()
        .map(|column| {
            let token = format!("@{}.{}%type@", column.table_name, column.column_name);
            let value = match &column.character_set {
                Some(charset) => format!("{} character set {}", column.column_type, charset),
                None => column.column_type.clone(),
            };
            (token, value)
        })
        .collect()
}

fn routine_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Remove every source whose routine name is defined by more than one file
fn reject_duplicates(sources: Vec<PathBuf>, summary: &mut LoadSummary) -> Vec<PathBuf> {
    let mut by_name: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for path in &sources {
        by_name.entry(routine_name(path)).or_default().push(path.clone());
    }

    sources
        .into_iter()
        .filter(|path| {
            let name = routine_name(path);
            let Some(paths) = by_name.get(&name).filter(|paths| paths.len() > 1) else {
                return true;
            };

            let others: Vec<String> = paths
                .iter()
                .filter(|other| *other != path)
                .map(|other| other.display().to_string())
                .collect();
            warn!("Duplicate routine name '{}' in {}", name, path.display());
            summary.failed.push(LoadFailure {
                routine: name,
                path: Some(path.clone()),
                message: format!("Duplicate routine name, also defined in {}", others.join(", ")),
                diagnostics: Vec::new(),
            });
            false
        })
        .collect()
}
