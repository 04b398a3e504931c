//! Routine compiler
//!
//! Turns one annotated routine source file into a [`RoutineMetadataRecord`].
//! The pipeline runs in two phases:
//!
//! 1. [`prepare`] performs everything that doesn't need the database: scan the
//!    source, resolve placeholders, designation and return type, check the
//!    routine header and build the text that will be loaded.
//! 2. [`RoutineCompiler::compile`] decides whether the routine must be
//!    reloaded at all, and if so loads the prepared routine and reconciles it
//!    with what the database reports.
//!
//! Every step either hands a complete value to the next one or fails the
//! whole routine; no partial record is ever produced.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use log::{debug, info, warn};
use regex::Regex;
use sproc_utils::{
    BulkInsertTable, CatalogRoutineInfo, Designation, ExtendedParameterSpec, ReturnType,
    RoutineKind, RoutineMetadataRecord,
};

use crate::config::SessionSettings;
use crate::designation::resolve_designation;
use crate::diagnostics::Diagnostic;
use crate::doc_block::{extract_doc_comment, DocBlockParser, DocComment, DocCommentParser};
use crate::error::{CompileError, CompileErrorKind};
use crate::extended_params::parse_extended_parameters;
use crate::gateway::{quote_literal, DatabaseGateway, GatewayError, TableColumn};
use crate::placeholder::{expand_placeholders, ReplacePairs, Substitution};
use crate::reconcile::{build_doc_block, merge_parameters, validate_parameter_lists};
use crate::reload::{reload_reason, ReloadInputs, ReloadReason};
use crate::return_type::{resolve_return_type, validate_return_type};
use crate::source_scanner::{modification_time, SourceFile};

static ROUTINE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bcreate\s+(procedure|function)\s+`?([a-z0-9_]+)`?")
        .expect("routine header pattern")
});

static DEFAULT_DOC_PARSER: DocBlockParser = DocBlockParser;

/// A routine that passed every database-independent step
#[derive(Debug, Clone)]
pub struct PreparedRoutine {
    pub source: SourceFile,
    pub routine_name: String,
    pub routine_kind: RoutineKind,
    pub designation: Designation,
    pub return_type: Option<ReturnType>,
    /// Placeholders used by the source, sorted by token
    pub placeholders: BTreeMap<String, String>,
    pub extended_parameters: Vec<ExtendedParameterSpec>,
    pub doc_comment: DocComment,
    /// Source text after substitution, as it is sent to the database
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileStatus {
    /// The previous metadata is still valid; nothing was loaded
    Skipped,
    Loaded { reason: ReloadReason },
}

#[derive(Debug, Clone)]
pub struct CompileOutcome {
    pub record: RoutineMetadataRecord,
    pub status: CompileStatus,
    /// Advisories raised while compiling
    pub diagnostics: Vec<Diagnostic>,
}

/// Run the database-independent steps of the pipeline.
pub fn prepare(
    path: &Path,
    replace_pairs: &ReplacePairs,
    doc_parser: &dyn DocCommentParser,
) -> Result<PreparedRoutine, CompileError> {
    prepare_source(path, replace_pairs, doc_parser)
        .map_err(|kind| kind.for_routine(routine_name_of(path)))
}

fn prepare_source(
    path: &Path,
    replace_pairs: &ReplacePairs,
    doc_parser: &dyn DocCommentParser,
) -> Result<PreparedRoutine, CompileErrorKind> {
    let source = SourceFile::read(path)?;
    let mut diagnostics = Vec::new();

    let placeholders = expand_placeholders(&source, replace_pairs)?;
    let designation = resolve_designation(&source)?;
    let return_type = resolve_return_type(&source, &designation, &mut diagnostics)?;

    let (routine_kind, routine_name) = extract_header(&source)?;

    if let Some(return_type) = &return_type {
        validate_return_type(&designation, return_type)?;
    }

    let extended_parameters = parse_extended_parameters(&source)?;
    let doc_comment = source
        .directive_region()
        .and_then(extract_doc_comment)
        .map(|comment| doc_parser.parse(&comment))
        .unwrap_or_default();

    let code = Substitution::new(&placeholders)
        .with_magic_constants(
            quote_literal(&source.path.to_string_lossy()),
            quote_literal(&source.directory().to_string_lossy()),
            quote_literal(&routine_name),
        )
        .apply(&source.lines);

    Ok(PreparedRoutine {
        source,
        routine_name,
        routine_kind,
        designation,
        return_type,
        placeholders,
        extended_parameters,
        doc_comment,
        code,
        diagnostics,
    })
}

/// Find the first `create procedure|function <name>` and check the name
/// against the file name.
fn extract_header(source: &SourceFile) -> Result<(RoutineKind, String), CompileErrorKind> {
    let captures = ROUTINE_HEADER
        .captures(&source.text)
        .ok_or(CompileErrorKind::MissingHeader)?;

    let routine_kind = RoutineKind::parse(&captures[1]).ok_or(CompileErrorKind::MissingHeader)?;
    let routine_name = captures[2].to_string();

    let file_name = source.base_name();
    if routine_name != file_name {
        return Err(CompileErrorKind::NameMismatch {
            routine_name,
            file_name,
        });
    }

    Ok((routine_kind, routine_name))
}

fn routine_name_of(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Compiles routines against one database connection. Compiles through the
/// same compiler run one after the other.
pub struct RoutineCompiler<'a> {
    gateway: &'a mut dyn DatabaseGateway,
    session: &'a SessionSettings,
    replace_pairs: &'a ReplacePairs,
    doc_parser: &'a dyn DocCommentParser,
}

impl<'a> RoutineCompiler<'a> {
    pub fn new(
        gateway: &'a mut dyn DatabaseGateway,
        session: &'a SessionSettings,
        replace_pairs: &'a ReplacePairs,
    ) -> Self {
        Self {
            gateway,
            session,
            replace_pairs,
            doc_parser: &DEFAULT_DOC_PARSER,
        }
    }

    pub fn with_doc_parser(mut self, doc_parser: &'a dyn DocCommentParser) -> Self {
        self.doc_parser = doc_parser;
        self
    }

    /// Compile one routine source file.
    ///
    /// `previous` is the record of the last successful build (if any) and
    /// `catalog` the routine as currently present in the database (if at all).
    /// When nothing relevant changed, the previous record is returned as is.
    pub fn compile(
        &mut self,
        path: &Path,
        previous: Option<&RoutineMetadataRecord>,
        catalog: Option<&CatalogRoutineInfo>,
    ) -> Result<CompileOutcome, CompileError> {
        let timestamp = modification_time(path).map_err(|source| {
            CompileErrorKind::SourceIo {
                path: path.to_path_buf(),
                source,
            }
            .for_routine(routine_name_of(path))
        })?;

        let inputs = ReloadInputs {
            previous,
            timestamp,
            replace_pairs: self.replace_pairs,
            catalog,
            session: self.session,
        };

        let reason = match (reload_reason(&inputs), previous) {
            (None, Some(previous)) => {
                debug!("Skipping {}: unchanged", previous.routine_name);
                return Ok(CompileOutcome {
                    record: previous.clone(),
                    status: CompileStatus::Skipped,
                    diagnostics: Vec::new(),
                });
            }
            (Some(reason), _) => reason,
            (None, None) => ReloadReason::FirstSight,
        };

        let prepared = prepare(path, self.replace_pairs, self.doc_parser)?;
        info!("Loading {} {} ({})", prepared.routine_kind, prepared.routine_name, reason);

        let routine_name = prepared.routine_name.clone();
        let (record, diagnostics) = self
            .load(prepared, catalog)
            .map_err(|kind| kind.for_routine(routine_name))?;

        Ok(CompileOutcome {
            record,
            status: CompileStatus::Loaded { reason },
            diagnostics,
        })
    }

    /// Load a prepared routine and reconcile it with the catalog
    fn load(
        &mut self,
        prepared: PreparedRoutine,
        catalog: Option<&CatalogRoutineInfo>,
    ) -> Result<(RoutineMetadataRecord, Vec<Diagnostic>), CompileErrorKind> {
        let PreparedRoutine {
            source,
            routine_name,
            designation,
            return_type,
            placeholders,
            extended_parameters,
            doc_comment,
            code,
            mut diagnostics,
            ..
        } = prepared;

        if let Some(info) = catalog {
            self.gateway.drop_routine(info.routine_type, &routine_name)?;
        }

        self.gateway.set_sql_mode(&self.session.sql_mode)?;
        self.gateway
            .set_charset(&self.session.character_set, &self.session.collation)?;
        self.gateway.execute(&code)?;

        let bulk_insert = match &designation {
            Designation::BulkInsert {
                table_name,
                columns: keys,
            } => {
                let described =
                    describe_bulk_insert_table(&mut *self.gateway, &routine_name, table_name)?;
                if described.len() != keys.len() {
                    return Err(CompileErrorKind::BulkInsertColumnCountMismatch {
                        declared: keys.len(),
                        described: described.len(),
                    });
                }
                Some(BulkInsertTable {
                    table_name: table_name.clone(),
                    keys: keys.clone(),
                    fields: described.iter().map(|c| c.field.clone()).collect(),
                    columns: described.iter().map(|c| c.column_type.clone()).collect(),
                })
            }
            _ => None,
        };

        let catalog_parameters = self.gateway.routine_parameters(&routine_name)?;
        let parameters = merge_parameters(catalog_parameters, &extended_parameters)?;

        let doc_block = build_doc_block(&doc_comment, &parameters);
        validate_parameter_lists(&routine_name, &parameters, &doc_comment, &mut diagnostics);

        let record = RoutineMetadataRecord {
            routine_name,
            designation,
            return_type,
            parameters,
            replace: placeholders,
            timestamp: source.timestamp,
            bulk_insert,
            doc_block,
        };

        Ok((record, diagnostics))
    }
}

/// Describe the target table of a bulk insert routine.
///
/// A table that is not a permanent table of the schema is a temporary table
/// created by the routine itself: call the routine to create it, describe it,
/// and drop it again whatever happens.
fn describe_bulk_insert_table(
    gateway: &mut dyn DatabaseGateway,
    routine_name: &str,
    table_name: &str,
) -> Result<Vec<TableColumn>, GatewayError> {
    if gateway.table_exists(table_name)? {
        return gateway.describe_table(table_name);
    }

    let mut temporary = TemporaryTable {
        gateway,
        table_name,
        dropped: false,
    };
    temporary.gateway.call_procedure(routine_name)?;
    let columns = temporary.gateway.describe_table(table_name)?;
    temporary.drop_table()?;

    Ok(columns)
}

/// Drops a temporary table when it goes out of scope, unless it was dropped
/// explicitly already.
struct TemporaryTable<'g, 't> {
    gateway: &'g mut dyn DatabaseGateway,
    table_name: &'t str,
    dropped: bool,
}

impl TemporaryTable<'_, '_> {
    fn drop_table(mut self) -> Result<(), GatewayError> {
        self.dropped = true;
        self.gateway.drop_temporary_table(self.table_name)
    }
}

impl Drop for TemporaryTable<'_, '_> {
    fn drop(&mut self) {
        if self.dropped {
            return;
        }
        if let Err(err) = self.gateway.drop_temporary_table(self.table_name) {
            warn!("Failed to drop temporary table {}: {}", self.table_name, err);
        }
    }
}
