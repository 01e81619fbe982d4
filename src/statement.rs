//! Statement implementation for the ADBC-Influx driver.
//!
//! The `InfluxStatement` executes raw statement text eagerly. Text of the
//! form `INSERT INTO <db>.<line protocol>` is written through the write
//! endpoint; anything else goes to the query endpoint. Rows are never
//! streamed back: `execute_update` is the only execution entry point.

#![allow(refining_impl_trait)]

use std::sync::Arc;

use adbc_core::{Optionable, Statement, options::{OptionStatement, OptionValue}};
use arrow_array::RecordBatch;
use arrow_schema::Schema;
use log::debug;

use crate::client::{Client, Query};
use crate::error::{InfluxError, not_implemented};
use crate::line_protocol::{Precision, WriteOptions};
use crate::router::{StatementKind, classify};

/// Outcome of executing a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    /// Always 0; the database does not assign row ids.
    pub last_insert_id: i64,
    /// Number of result blocks for generic statements, 0 for inserts.
    pub rows_affected: i64,
}

/// Statement bound to one connection.
pub struct InfluxStatement {
    client: Arc<dyn Client>,
    database: String,
    precision: Precision,
    query: Option<String>,
}

impl InfluxStatement {
    /// Creates a statement using `database` and `precision` as defaults for
    /// generic statements. Both are fixed for the statement's lifetime.
    pub fn new(client: Arc<dyn Client>, database: String, precision: Precision) -> Self {
        Self {
            client,
            database,
            precision,
            query: None,
        }
    }

    /// Returns the current query string.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Executes the current statement.
    ///
    /// # Errors
    /// Fails with an invalid-state error when no statement text is set, and
    /// otherwise with whatever the transport or server reports.
    pub fn exec(&self) -> Result<ExecResult, InfluxError> {
        let text = self
            .query
            .as_deref()
            .ok_or_else(|| InfluxError::invalid_state("no query set"))?;

        match classify(text) {
            StatementKind::Insert { database, body } => {
                debug!("insert statement routed to write on {:?}", database);
                self.client
                    .write(body.as_bytes(), &WriteOptions::new(database))?;
                Ok(ExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                })
            }
            StatementKind::Generic { text } => {
                let query = Query::new(text, self.database.as_str()).with_precision(self.precision);
                let resp = self.client.query(&query)?;
                if let Some(err) = resp.error() {
                    return Err(err);
                }
                Ok(ExecResult {
                    last_insert_id: 0,
                    rows_affected: resp.results.len() as i64,
                })
            }
        }
    }
}

impl Optionable for InfluxStatement {
    type Option = OptionStatement;

    fn set_option(
        &mut self,
        _key: Self::Option,
        _value: OptionValue,
    ) -> adbc_core::error::Result<()> {
        Err(not_implemented("Statement options"))
    }

    fn get_option_string(&self, _key: Self::Option) -> adbc_core::error::Result<String> {
        Err(not_implemented("Statement options"))
    }

    fn get_option_bytes(&self, _key: Self::Option) -> adbc_core::error::Result<Vec<u8>> {
        Err(not_implemented("Statement options"))
    }

    fn get_option_double(&self, _key: Self::Option) -> adbc_core::error::Result<f64> {
        Err(not_implemented("Statement options"))
    }

    fn get_option_int(&self, _key: Self::Option) -> adbc_core::error::Result<i64> {
        Err(not_implemented("Statement options"))
    }
}

impl Statement for InfluxStatement {
    fn bind(&mut self, _batch: RecordBatch) -> adbc_core::error::Result<()> {
        Err(not_implemented("Parameter binding"))
    }

    fn bind_stream(
        &mut self,
        _reader: Box<dyn arrow_array::RecordBatchReader + Send>,
    ) -> adbc_core::error::Result<()> {
        Err(not_implemented("Parameter binding"))
    }

    fn execute(&mut self) -> adbc_core::error::Result<Box<dyn arrow_array::RecordBatchReader + Send>> {
        Err(not_implemented("Fetching rows"))
    }

    fn execute_update(&mut self) -> adbc_core::error::Result<Option<i64>> {
        let result = self.exec()?;
        Ok(Some(result.rows_affected))
    }

    fn execute_schema(&mut self) -> adbc_core::error::Result<Schema> {
        Err(not_implemented("Result schema"))
    }

    fn execute_partitions(&mut self) -> adbc_core::error::Result<adbc_core::PartitionedResult> {
        Err(not_implemented("Partitioned execution"))
    }

    fn get_parameter_schema(&self) -> adbc_core::error::Result<Schema> {
        // Statements take no parameters.
        Ok(Schema::empty())
    }

    fn prepare(&mut self) -> adbc_core::error::Result<()> {
        if self.query.is_none() {
            return Err(InfluxError::invalid_state("no query set").into());
        }
        Ok(())
    }

    fn set_sql_query(&mut self, query: impl AsRef<str>) -> adbc_core::error::Result<()> {
        self.query = Some(query.as_ref().to_string());
        Ok(())
    }

    fn set_substrait_plan(&mut self, _plan: impl AsRef<[u8]>) -> adbc_core::error::Result<()> {
        Err(not_implemented("Substrait"))
    }

    fn cancel(&mut self) -> adbc_core::error::Result<()> {
        Err(not_implemented("Cancellation"))
    }
}
