//! MySQL implementation of the database gateway.
//!
//! Holds exactly one connection. The compiler is synchronous, so every call
//! blocks on a current-thread runtime.

use log::{debug, info};
use mysql_async::prelude::*;
use mysql_async::{Conn, OptsBuilder, Value};
use tokio::runtime::Runtime;

use super::{DatabaseGateway, GatewayError, Row};
use crate::config::DatabaseSettings;

/// Fields drop in declaration order; the connection goes before its runtime.
pub struct MySqlGateway {
    conn: Conn,
    runtime: Runtime,
}

impl MySqlGateway {
    /// Open the connection described by the settings
    pub fn connect(settings: &DatabaseSettings) -> Result<Self, GatewayError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| GatewayError::Connection(format!("Failed to start runtime: {e}")))?;

        info!(
            "Connecting to MySQL: {}:{}/{}",
            settings.host, settings.port, settings.database
        );

        let opts = OptsBuilder::default()
            .ip_or_hostname(settings.host.as_str())
            .tcp_port(settings.port)
            .user(Some(settings.user.as_str()))
            .pass(settings.password.as_deref())
            .db_name(Some(settings.database.as_str()));

        let conn = runtime
            .block_on(Conn::new(opts))
            .map_err(|e| GatewayError::Connection(e.to_string()))?;

        Ok(Self { conn, runtime })
    }

    /// Close the connection
    pub fn disconnect(self) -> Result<(), GatewayError> {
        let Self { conn, runtime } = self;
        runtime
            .block_on(conn.disconnect())
            .map_err(|e| GatewayError::Connection(e.to_string()))
    }
}

impl DatabaseGateway for MySqlGateway {
    fn execute(&mut self, sql: &str) -> Result<(), GatewayError> {
        debug!("Executing: {}", first_line(sql));
        self.runtime
            .block_on(self.conn.query_drop(sql))
            .map_err(|e| query_error(sql, e))
    }

    fn query_rows(&mut self, sql: &str) -> Result<Vec<Row>, GatewayError> {
        debug!("Querying: {}", first_line(sql));
        let rows: Vec<mysql_async::Row> = self
            .runtime
            .block_on(self.conn.query(sql))
            .map_err(|e| query_error(sql, e))?;

        Ok(rows.iter().map(convert_row).collect())
    }
}

fn convert_row(row: &mysql_async::Row) -> Row {
    row.columns_ref()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let value = row.as_ref(index).and_then(value_to_string);
            (column.name_str().to_string(), value)
        })
        .collect()
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::NULL => None,
        Value::Bytes(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::Int(number) => Some(number.to_string()),
        Value::UInt(number) => Some(number.to_string()),
        Value::Float(number) => Some(number.to_string()),
        Value::Double(number) => Some(number.to_string()),
        other => Some(other.as_sql(true).trim_matches('\'').to_string()),
    }
}

fn query_error(sql: &str, error: mysql_async::Error) -> GatewayError {
    GatewayError::Query {
        sql: sql.to_string(),
        message: error.to_string(),
    }
}

fn first_line(sql: &str) -> &str {
    sql.lines().next().unwrap_or("")
}
