//! In-memory gateway for unit tests. Records every statement it is asked to
//! execute and answers catalog questions from its fields.

use std::collections::{HashMap, HashSet};

use sproc_utils::{CatalogRoutineInfo, RoutineKind};

use super::{DatabaseGateway, GatewayError, Row, RoutineParameter, SchemaColumn, TableColumn};

#[derive(Debug, Default)]
pub struct MockGateway {
    pub executed: Vec<String>,
    pub catalog: Vec<CatalogRoutineInfo>,
    pub parameters: HashMap<String, Vec<RoutineParameter>>,
    pub permanent_tables: HashSet<String>,
    /// Column lists returned by `describe`, by table name
    pub table_columns: HashMap<String, Vec<TableColumn>>,
    /// Procedure name → temporary table it creates when called
    pub creates_temporary: HashMap<String, String>,
    pub temporary_tables: HashSet<String>,
    pub schema_columns: Vec<SchemaColumn>,
    /// Any executed statement containing this text fails
    pub fail_on: Option<String>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, routine: &str, name: &str, dtd_identifier: &str) -> Self {
        let data_type = dtd_identifier
            .split('(')
            .next()
            .unwrap_or(dtd_identifier)
            .to_string();
        self.parameters
            .entry(routine.to_string())
            .or_default()
            .push(RoutineParameter {
                name: name.to_string(),
                data_type,
                dtd_identifier: dtd_identifier.to_string(),
                character_set: None,
                collation: None,
            });
        self
    }

    pub fn with_routine(mut self, name: &str, kind: RoutineKind) -> Self {
        self.catalog.push(CatalogRoutineInfo {
            routine_name: name.to_string(),
            routine_type: kind,
            sql_mode: "STRICT_ALL_TABLES".to_string(),
            character_set_client: "utf8mb4".to_string(),
            collation_connection: "utf8mb4_general_ci".to_string(),
        });
        self
    }

    pub fn with_table(mut self, name: &str, columns: &[(&str, &str)], permanent: bool) -> Self {
        self.table_columns.insert(
            name.to_string(),
            columns
                .iter()
                .map(|(field, column_type)| TableColumn {
                    field: field.to_string(),
                    column_type: column_type.to_string(),
                })
                .collect(),
        );
        if permanent {
            self.permanent_tables.insert(name.to_string());
        }
        self
    }

    /// Statements executed so far that start with the given prefix
    pub fn executed_starting_with(&self, prefix: &str) -> Vec<&str> {
        self.executed
            .iter()
            .filter(|sql| sql.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }
}

impl DatabaseGateway for MockGateway {
    fn execute(&mut self, sql: &str) -> Result<(), GatewayError> {
        self.executed.push(sql.to_string());
        match &self.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => Err(GatewayError::Query {
                sql: sql.to_string(),
                message: "mock failure".to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn query_rows(&mut self, _sql: &str) -> Result<Vec<Row>, GatewayError> {
        Ok(Vec::new())
    }

    fn describe_table(&mut self, table_name: &str) -> Result<Vec<TableColumn>, GatewayError> {
        let visible = self.permanent_tables.contains(table_name)
            || self.temporary_tables.contains(table_name);
        match self.table_columns.get(table_name) {
            Some(columns) if visible => Ok(columns.clone()),
            _ => Err(GatewayError::Query {
                sql: format!("describe `{}`", table_name),
                message: format!("Table '{}' doesn't exist", table_name),
            }),
        }
    }

    fn table_exists(&mut self, table_name: &str) -> Result<bool, GatewayError> {
        Ok(self.permanent_tables.contains(table_name))
    }

    fn routines(&mut self) -> Result<Vec<CatalogRoutineInfo>, GatewayError> {
        Ok(self.catalog.clone())
    }

    fn routine_info(
        &mut self,
        routine_name: &str,
    ) -> Result<Option<CatalogRoutineInfo>, GatewayError> {
        Ok(self
            .catalog
            .iter()
            .find(|info| info.routine_name == routine_name)
            .cloned())
    }

    fn routine_parameters(
        &mut self,
        routine_name: &str,
    ) -> Result<Vec<RoutineParameter>, GatewayError> {
        Ok(self.parameters.get(routine_name).cloned().unwrap_or_default())
    }

    fn schema_columns(&mut self) -> Result<Vec<SchemaColumn>, GatewayError> {
        Ok(self.schema_columns.clone())
    }

    fn call_procedure(&mut self, routine_name: &str) -> Result<(), GatewayError> {
        self.execute(&format!("call `{}`()", routine_name))?;
        if let Some(table) = self.creates_temporary.get(routine_name) {
            self.temporary_tables.insert(table.clone());
        }
        Ok(())
    }

    fn drop_temporary_table(&mut self, table_name: &str) -> Result<(), GatewayError> {
        self.execute(&format!("drop temporary table if exists `{}`", table_name))?;
        self.temporary_tables.remove(table_name);
        Ok(())
    }
}
