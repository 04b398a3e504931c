//! Database gateway
//!
//! The compiler talks to the database only through [`DatabaseGateway`].
//! Implementations provide `execute` and `query_rows`; every other operation
//! has a default that issues the corresponding MySQL statement through those
//! two, so a gateway only overrides what it can answer more directly.
//!
//! A gateway holds one live connection. Loading a routine sets session state
//! (sql mode, character set) and drops/creates objects, so compiles sharing a
//! gateway must run one after the other.

use std::collections::BTreeMap;

use sproc_utils::{CatalogRoutineInfo, RoutineKind};
use thiserror::Error;

pub mod mysql;

#[cfg(test)]
pub(crate) mod mock;

/// One result row: column name → value (`None` for SQL NULL)
pub type Row = BTreeMap<String, Option<String>>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Failed to connect to database: {0}")]
    Connection(String),

    #[error("Query failed: {message}\nQuery: {sql}")]
    Query { sql: String, message: String },

    #[error("Unexpected catalog data: {0}")]
    Catalog(String),
}

/// A column of a table as reported by `describe`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub field: String,
    pub column_type: String,
}

/// A routine parameter as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineParameter {
    pub name: String,
    pub data_type: String,
    /// Full type, e.g. `varchar(50)`
    pub dtd_identifier: String,
    pub character_set: Option<String>,
    pub collation: Option<String>,
}

/// A column of the current schema, used for `%type` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaColumn {
    pub table_name: String,
    pub column_name: String,
    pub column_type: String,
    pub character_set: Option<String>,
}

pub trait DatabaseGateway {
    /// Execute a single statement, discarding any result
    fn execute(&mut self, sql: &str) -> Result<(), GatewayError>;

    /// Execute a query and return all rows of its first result set
    fn query_rows(&mut self, sql: &str) -> Result<Vec<Row>, GatewayError>;

    /// Quote a value as a SQL string literal
    fn quote(&self, value: &str) -> String {
        quote_literal(value)
    }

    fn describe_table(&mut self, table_name: &str) -> Result<Vec<TableColumn>, GatewayError> {
        let rows = self.query_rows(&format!("describe {}", quote_identifier(table_name)))?;
        rows.iter()
            .map(|row| {
                Ok(TableColumn {
                    field: required(row, "Field")?,
                    column_type: required(row, "Type")?,
                })
            })
            .collect()
    }

    /// Whether a permanent (non-temporary) table exists in the current schema
    fn table_exists(&mut self, table_name: &str) -> Result<bool, GatewayError> {
        let sql = format!(
            "select 1 from information_schema.TABLES \
             where table_schema = database() and table_name = {}",
            self.quote(table_name)
        );
        Ok(!self.query_rows(&sql)?.is_empty())
    }

    /// Catalog info of every routine in the current schema
    fn routines(&mut self) -> Result<Vec<CatalogRoutineInfo>, GatewayError> {
        let sql = format!("{} order by routine_name", ROUTINES_QUERY);
        self.query_rows(&sql)?.iter().map(routine_info_from_row).collect()
    }

    fn routine_info(
        &mut self,
        routine_name: &str,
    ) -> Result<Option<CatalogRoutineInfo>, GatewayError> {
        let sql = format!("{} and routine_name = {}", ROUTINES_QUERY, self.quote(routine_name));
        self.query_rows(&sql)?.first().map(routine_info_from_row).transpose()
    }

    /// Parameters of a routine in declaration order (a function's return
    /// value is not a parameter)
    fn routine_parameters(
        &mut self,
        routine_name: &str,
    ) -> Result<Vec<RoutineParameter>, GatewayError> {
        let sql = format!(
            "select parameter_name as parameter_name, data_type as data_type, \
             dtd_identifier as dtd_identifier, \
             character_set_name as character_set_name, collation_name as collation_name \
             from information_schema.PARAMETERS \
             where specific_schema = database() and specific_name = {} \
             and parameter_mode is not null \
             order by ordinal_position",
            self.quote(routine_name)
        );
        self.query_rows(&sql)?
            .iter()
            .map(|row| {
                Ok(RoutineParameter {
                    name: required(row, "parameter_name")?,
                    data_type: required(row, "data_type")?,
                    dtd_identifier: required(row, "dtd_identifier")?,
                    character_set: optional(row, "character_set_name"),
                    collation: optional(row, "collation_name"),
                })
            })
            .collect()
    }

    /// All columns of all tables in the current schema
    fn schema_columns(&mut self) -> Result<Vec<SchemaColumn>, GatewayError> {
        let sql = "select table_name as table_name, column_name as column_name, \
                   column_type as column_type, \
                   character_set_name as character_set_name \
                   from information_schema.COLUMNS where table_schema = database() \
                   order by table_name, ordinal_position";
        self.query_rows(sql)?
            .iter()
            .map(|row| {
                Ok(SchemaColumn {
                    table_name: required(row, "table_name")?,
                    column_name: required(row, "column_name")?,
                    column_type: required(row, "column_type")?,
                    character_set: optional(row, "character_set_name"),
                })
            })
            .collect()
    }

    fn set_sql_mode(&mut self, sql_mode: &str) -> Result<(), GatewayError> {
        let sql = format!("set sql_mode = {}", self.quote(sql_mode));
        self.execute(&sql)
    }

    fn set_charset(&mut self, character_set: &str, collation: &str) -> Result<(), GatewayError> {
        let sql = format!(
            "set names {} collate {}",
            self.quote(character_set),
            self.quote(collation)
        );
        self.execute(&sql)
    }

    fn drop_routine(&mut self, kind: RoutineKind, routine_name: &str) -> Result<(), GatewayError> {
        self.execute(&format!("drop {} if exists {}", kind, quote_identifier(routine_name)))
    }

    fn drop_temporary_table(&mut self, table_name: &str) -> Result<(), GatewayError> {
        self.execute(&format!("drop temporary table if exists {}", quote_identifier(table_name)))
    }

    /// Call a procedure without arguments, discarding its result sets
    fn call_procedure(&mut self, routine_name: &str) -> Result<(), GatewayError> {
        self.execute(&format!("call {}()", quote_identifier(routine_name)))
    }
}

const ROUTINES_QUERY: &str = "select routine_name as routine_name, routine_type as routine_type, \
     sql_mode as sql_mode, character_set_client as character_set_client, \
     collation_connection as collation_connection \
     from information_schema.ROUTINES where routine_schema = database()";

/// MySQL string literal with backslash and quote escaping
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        match ch {
            '\'' => quoted.push_str("\\'"),
            '\\' => quoted.push_str("\\\\"),
            '\0' => quoted.push_str("\\0"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\x1a' => quoted.push_str("\\Z"),
            other => quoted.push(other),
        }
    }
    quoted.push('\'');
    quoted
}

/// Backtick-quoted identifier
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Value of a column, matched case-insensitively (MySQL may report
/// catalog column names in upper case)
pub fn column<'a>(row: &'a Row, name: &str) -> Option<&'a str> {
    row.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, value)| value.as_deref())
}

fn required(row: &Row, name: &str) -> Result<String, GatewayError> {
    column(row, name)
        .map(str::to_string)
        .ok_or_else(|| GatewayError::Catalog(format!("missing column '{}'", name)))
}

fn optional(row: &Row, name: &str) -> Option<String> {
    column(row, name).map(str::to_string)
}

fn routine_info_from_row(row: &Row) -> Result<CatalogRoutineInfo, GatewayError> {
    let routine_type = required(row, "routine_type")?;
    Ok(CatalogRoutineInfo {
        routine_name: required(row, "routine_name")?,
        routine_type: RoutineKind::parse(&routine_type)
            .ok_or_else(|| {
                GatewayError::Catalog(format!("unknown routine type '{}'", routine_type))
            })?,
        sql_mode: required(row, "sql_mode")?,
        character_set_client: required(row, "character_set_client")?,
        collation_connection: required(row, "collation_connection")?,
    })
}
