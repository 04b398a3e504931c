//! Shared data model for the stored routine compiler
//!
//! This crate contains the serializable records produced by the compiler and
//! consumed by the metadata store and by wrapper generators, kept separate so
//! downstream crates don't depend on the compiler itself.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position in source code (line and column, both 0-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Span in source code (start and end positions)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    /// Span covering `len` characters on a single line
    pub fn on_line(line: usize, column: usize, len: usize) -> Self {
        Self {
            start: Position { line, column },
            end: Position {
                line,
                column: column + len,
            },
        }
    }

    /// Span for diagnostics that are not tied to a source location
    pub fn none() -> Self {
        Self::on_line(0, 0, 0)
    }
}

/// Kind of stored routine as declared by `create procedure|function`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutineKind {
    Procedure,
    Function,
}

impl RoutineKind {
    /// Parse a routine kind as reported by the header or by the catalog
    /// (`PROCEDURE`, `function`, ...). Case-insensitive.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "procedure" => Some(RoutineKind::Procedure),
            "function" => Some(RoutineKind::Function),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutineKind::Procedure => "procedure",
            RoutineKind::Function => "function",
        }
    }
}

impl std::fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared shape of a routine's result.
///
/// Exactly one designation applies per routine. It is taken from the
/// `-- type:` directive and never inferred from the SQL body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Designation {
    None,
    Procedure,
    Function,
    Table,
    Singleton0,
    Singleton1,
    /// Rows keyed by the listed columns
    RowsWithKey { columns: Vec<String> },
    /// Rows indexed by the listed columns
    RowsWithIndex { columns: Vec<String> },
    /// Bulk insert into `table_name` using the listed keys
    BulkInsert {
        table_name: String,
        columns: Vec<String>,
    },
}

impl Designation {
    /// The directive keyword for this designation (e.g. `rows_with_key`)
    pub fn keyword(&self) -> &'static str {
        match self {
            Designation::None => "none",
            Designation::Procedure => "procedure",
            Designation::Function => "function",
            Designation::Table => "table",
            Designation::Singleton0 => "singleton0",
            Designation::Singleton1 => "singleton1",
            Designation::RowsWithKey { .. } => "rows_with_key",
            Designation::RowsWithIndex { .. } => "rows_with_index",
            Designation::BulkInsert { .. } => "bulk_insert",
        }
    }

    /// Designations whose wrapper returns a single scalar value and therefore
    /// carry a return type.
    pub fn is_function_like(&self) -> bool {
        matches!(
            self,
            Designation::Function | Designation::Singleton0 | Designation::Singleton1
        )
    }
}

impl std::fmt::Display for Designation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Designation::RowsWithKey { columns } | Designation::RowsWithIndex { columns } => {
                write!(f, "{} {}", self.keyword(), columns.join(","))
            }
            Designation::BulkInsert {
                table_name,
                columns,
            } => write!(f, "{} {} {}", self.keyword(), table_name, columns.join(",")),
            _ => write!(f, "{}", self.keyword()),
        }
    }
}

/// A member of a return type union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    Mixed,
    Bool,
    Int,
    Float,
    String,
    Null,
}

impl ScalarType {
    pub fn parse(word: &str) -> Option<Self> {
        match word {
            "mixed" => Some(ScalarType::Mixed),
            "bool" => Some(ScalarType::Bool),
            "int" => Some(ScalarType::Int),
            "float" => Some(ScalarType::Float),
            "string" => Some(ScalarType::String),
            "null" => Some(ScalarType::Null),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarType::Mixed => "mixed",
            ScalarType::Bool => "bool",
            ScalarType::Int => "int",
            ScalarType::Float => "float",
            ScalarType::String => "string",
            ScalarType::Null => "null",
        }
    }
}

/// Return type union of a function-like routine, e.g. `int|null`.
///
/// Members keep their declaration order. Serialized as the pipe-separated
/// string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReturnType {
    members: Vec<ScalarType>,
}

impl ReturnType {
    /// The default return type when no `-- return:` directive is present
    pub fn mixed() -> Self {
        Self {
            members: vec![ScalarType::Mixed],
        }
    }

    /// Parse a pipe-separated union. Every member must be a known scalar type.
    pub fn parse(union: &str) -> Result<Self, String> {
        let mut members = Vec::new();
        for word in union.split('|') {
            let word = word.trim();
            let member = ScalarType::parse(word)
                .ok_or_else(|| format!("Unknown return type '{}' in '{}'", word, union))?;
            if !members.contains(&member) {
                members.push(member);
            }
        }
        Ok(Self { members })
    }

    pub fn members(&self) -> &[ScalarType] {
        &self.members
    }

    pub fn contains(&self, member: ScalarType) -> bool {
        self.members.contains(&member)
    }

    /// True when the union consists of exactly this one member
    pub fn is_exactly(&self, member: ScalarType) -> bool {
        self.members == [member]
    }
}

impl std::fmt::Display for ReturnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<&str> = self.members.iter().map(|m| m.as_str()).collect();
        write!(f, "{}", parts.join("|"))
    }
}

impl TryFrom<String> for ReturnType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ReturnType::parse(&value)
    }
}

impl From<ReturnType> for String {
    fn from(value: ReturnType) -> Self {
        value.to_string()
    }
}

/// Describes how a scalar argument is decoded into a list before it is passed
/// to the routine (`-- param:` directive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedParameterSpec {
    pub name: String,
    /// Declared element type of the list
    pub list_type: String,
    pub delimiter: char,
    pub enclosure: char,
    pub escape: char,
}

impl ExtendedParameterSpec {
    pub const DEFAULT_DELIMITER: char = ',';
    pub const DEFAULT_ENCLOSURE: char = '"';
    pub const DEFAULT_ESCAPE: char = '\\';
}

/// A routine parameter as reported by the catalog, merged with its extended
/// parameter spec (if any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterMetadata {
    pub name: String,
    /// Base data type, e.g. `varchar`
    pub data_type: String,
    /// Full data type descriptor including character set and collation,
    /// e.g. `varchar(50) character set utf8mb4 collation utf8mb4_general_ci`
    pub data_type_descriptor: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub character_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub collation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub extended: Option<ExtendedParameterSpec>,
}

/// A parameter entry of the wrapper-facing doc block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocParameter {
    pub name: String,
    pub data_type: String,
    pub description: String,
}

/// Wrapper-facing documentation of a routine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocBlock {
    pub short_description: String,
    pub long_description: String,
    pub parameters: Vec<DocParameter>,
}

/// Columns of the target table of a `bulk_insert` routine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkInsertTable {
    pub table_name: String,
    /// Keys declared in the `-- type: bulk_insert` directive
    pub keys: Vec<String>,
    /// Column names as described by the database
    pub fields: Vec<String>,
    /// Column types as described by the database
    pub columns: Vec<String>,
}

/// Routine state as last observed in the database catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRoutineInfo {
    pub routine_name: String,
    pub routine_type: RoutineKind,
    pub sql_mode: String,
    pub character_set_client: String,
    pub collation_connection: String,
}

/// The compiled metadata of one stored routine.
///
/// This is the unit persisted across builds and compared by the reload
/// decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineMetadataRecord {
    pub routine_name: String,
    pub designation: Designation,
    #[serde(rename = "return", skip_serializing_if = "Option::is_none", default)]
    pub return_type: Option<ReturnType>,
    pub parameters: Vec<ParameterMetadata>,
    /// Placeholders used by the source and the values they were replaced
    /// with, sorted by token. Magic constants are never stored here.
    pub replace: BTreeMap<String, String>,
    /// Modification time of the source file (seconds since the Unix epoch)
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub bulk_insert: Option<BulkInsertTable>,
    pub doc_block: DocBlock,
}

#[cfg(test)]
#[path = "lib/lib_tests.rs"]
mod lib_tests;
