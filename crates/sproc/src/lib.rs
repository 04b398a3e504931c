mod compiler;
mod config;
mod designation;
mod diagnostics;
mod doc_block;
mod error;
mod extended_params;
mod gateway;
mod loader;
mod metadata_store;
mod placeholder;
mod reconcile;
mod reload;
mod return_type;
mod source_finder;
mod source_scanner;

pub use compiler::{prepare, CompileOutcome, CompileStatus, PreparedRoutine, RoutineCompiler};
pub use config::{
    Config, DatabaseSettings, LoaderSettings, SessionSettings, CONFIG_FILE, PASSWORD_ENV,
};
pub use designation::resolve_designation;
pub use diagnostics::{Diagnostic, Position, Severity, Span};
pub use doc_block::{extract_doc_comment, DocBlockParser, DocComment, DocCommentParser};
pub use error::{CompileError, CompileErrorKind};
pub use extended_params::parse_extended_parameters;
pub use gateway::mysql::MySqlGateway;
pub use gateway::{
    quote_identifier, quote_literal, DatabaseGateway, GatewayError, RoutineParameter, Row,
    SchemaColumn, TableColumn,
};
pub use loader::{
    column_type_placeholders, load_and_close, BatchLoader, LoadFailure, LoadSummary,
};
pub use metadata_store::MetadataStore;
pub use placeholder::{expand_placeholders, ReplacePairs, Substitution};
pub use reconcile::{build_doc_block, merge_parameters, validate_parameter_lists};
pub use reload::{reload_reason, ReloadInputs, ReloadReason};
pub use return_type::{resolve_return_type, validate_return_type};
pub use source_finder::SourceFinder;
pub use source_scanner::{modification_time, SourceFile, BODY_MARKER};
