use std::path::PathBuf;

use thiserror::Error;

use crate::diagnostics::Diagnostic;
use crate::gateway::GatewayError;

/// A failed routine compile. Carries the routine name so a batch driver can
/// report it and continue with the next file.
#[derive(Debug, Error)]
#[error("Routine '{routine}': {kind}")]
pub struct CompileError {
    pub routine: String,
    pub kind: CompileErrorKind,
}

#[derive(Debug, Error)]
pub enum CompileErrorKind {
    #[error("Failed to read source file {}: {source}", path.display())]
    SourceIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown placeholder(s): {}", placeholders.join(", "))]
    UnknownPlaceholder {
        placeholders: Vec<String>,
        /// One error per occurrence, pointing at the offending source
        occurrences: Vec<Diagnostic>,
    },

    #[error("Designation type not found: {0}")]
    MissingDesignation(String),

    #[error("Malformed directive on line {line}: {message}")]
    MalformedDirective { line: usize, message: String },

    #[error("Duplicate extended parameter '{0}'")]
    DuplicateExtendedParameter(String),

    #[error("Extended parameter '{0}' is not a parameter of the routine")]
    UnknownExtendedParameter(String),

    #[error("No 'create procedure|function <name>' header found")]
    MissingHeader,

    #[error("Stored routine name '{routine_name}' does not match file name '{file_name}'")]
    NameMismatch {
        routine_name: String,
        file_name: String,
    },

    #[error("Invalid return type: {0}")]
    ReturnTypeValidation(String),

    #[error(
        "Number of declared bulk insert keys ({declared}) does not match \
         number of table columns ({described})"
    )]
    BulkInsertColumnCountMismatch { declared: usize, described: usize },

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl CompileErrorKind {
    /// Attach the routine name
    pub fn for_routine(self, routine: impl Into<String>) -> CompileError {
        CompileError {
            routine: routine.into(),
            kind: self,
        }
    }
}

impl CompileError {
    /// Diagnostics that point into the source, if the failure has any
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match &self.kind {
            CompileErrorKind::UnknownPlaceholder { occurrences, .. } => occurrences,
            _ => &[],
        }
    }
}
