//! Connection implementation for the ADBC-Influx driver.
//!
//! The `InfluxConnection` owns a transport client, the default database and
//! precision, and at most one open transaction. Metadata calls are answered
//! with `SHOW ...` statements on the query endpoint.

#![allow(refining_impl_trait)]

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use adbc_core::{Connection, Optionable, options::{InfoCode, ObjectDepth, OptionConnection, OptionValue}};
use arrow_array::{ArrayRef, RecordBatch, StringArray, UInt32Array};
use arrow_schema::{DataType, Field, Schema};
use log::{debug, warn};

use super::client::{Client, Pong, Query, Response};
use super::error::{InfluxError, internal, not_implemented};
use super::line_protocol::{Point, Precision};
use super::reader::VecRecordBatchReader;
use super::statement::InfluxStatement;
use super::transaction::Transaction;
use super::types::measurement_schema;

/// Table type reported for measurements.
const MEASUREMENT_TABLE_TYPE: &str = "MEASUREMENT";

/// Active connection to one server.
pub struct InfluxConnection {
    client: Arc<dyn Client>,
    database: String,
    precision: Precision,
    tx: Option<Transaction>,
}

impl InfluxConnection {
    /// Wraps `client`, using `database` and `precision` as defaults.
    pub fn new(client: Arc<dyn Client>, database: impl Into<String>, precision: Precision) -> Self {
        Self {
            client,
            database: database.into(),
            precision,
            tx: None,
        }
    }

    /// Default database for generic statements and commits.
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    /// Shared handle to the transport client.
    pub fn client(&self) -> &Arc<dyn Client> {
        &self.client
    }

    /// Pings the server; see [`Client::ping`].
    pub fn ping(&self, timeout: Duration) -> Result<Pong, InfluxError> {
        self.client.ping(timeout)
    }

    /// Closes the transport client. An open transaction is discarded.
    pub fn close(&mut self) -> Result<(), InfluxError> {
        if let Some(tx) = self.tx.take() {
            warn!("closing connection with an open transaction; buffered points are dropped");
            tx.rollback();
        }
        self.client.close()
    }

    /// Opens a transaction.
    ///
    /// Only points added through [`add_point`](Self::add_point) /
    /// [`add_points`](Self::add_points) join the transaction. `INSERT INTO`
    /// statements executed meanwhile are written immediately and are not
    /// part of the commit.
    ///
    /// # Errors
    /// Nested transactions are unsupported: a second `begin` fails and the
    /// open transaction is left untouched.
    pub fn begin(&mut self) -> Result<&mut Transaction, InfluxError> {
        if self.tx.is_some() {
            return Err(InfluxError::unsupported("transaction already open"));
        }
        debug!("transaction opened on {:?}", self.database);
        Ok(self.tx.insert(Transaction::new()))
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Returns the open transaction, if any.
    pub fn transaction_mut(&mut self) -> Option<&mut Transaction> {
        self.tx.as_mut()
    }

    /// Adds a point to the open transaction.
    pub fn add_point(&mut self, point: Point) -> Result<(), InfluxError> {
        self.open_tx()?.add_point(point);
        Ok(())
    }

    /// Adds points to the open transaction, keeping their order.
    pub fn add_points(&mut self, points: impl IntoIterator<Item = Point>) -> Result<(), InfluxError> {
        self.open_tx()?.add_points(points);
        Ok(())
    }

    fn open_tx(&mut self) -> Result<&mut Transaction, InfluxError> {
        self.tx
            .as_mut()
            .ok_or_else(|| InfluxError::invalid_state("no transaction open"))
    }

    /// Commits the open transaction. The slot is released before the write,
    /// so a failed commit is not retryable.
    fn commit_tx(&mut self) -> Result<(), InfluxError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| InfluxError::invalid_state("no transaction open"))?;
        tx.commit(self.client.as_ref(), &self.database)
    }

    fn rollback_tx(&mut self) -> Result<(), InfluxError> {
        let tx = self
            .tx
            .take()
            .ok_or_else(|| InfluxError::invalid_state("no transaction open"))?;
        tx.rollback();
        Ok(())
    }

    /// Runs a metadata statement and fails on any server-reported error.
    fn show(&self, command: String, database: &str) -> Result<Response, InfluxError> {
        let resp = self.client.query(&Query::new(command, database))?;
        match resp.error() {
            Some(err) => Err(err),
            None => Ok(resp),
        }
    }

    fn list_databases(&self) -> Result<Vec<String>, InfluxError> {
        let resp = self.show("SHOW DATABASES".to_string(), "")?;
        Ok(string_column(&resp, "name"))
    }

    fn list_measurements(&self, database: &str) -> Result<Vec<String>, InfluxError> {
        let resp = self.show("SHOW MEASUREMENTS".to_string(), database)?;
        Ok(string_column(&resp, "name"))
    }

    fn tag_keys(&self, database: &str, measurement: &str) -> Result<Vec<String>, InfluxError> {
        let resp = self.show(format!("SHOW TAG KEYS FROM {}", quote_ident(measurement)), database)?;
        Ok(string_column(&resp, "tagKey"))
    }

    fn field_keys(&self, database: &str, measurement: &str) -> Result<Vec<(String, String)>, InfluxError> {
        let resp = self.show(format!("SHOW FIELD KEYS FROM {}", quote_ident(measurement)), database)?;
        let mut out = Vec::new();
        for series in resp.results.iter().flat_map(|r| r.series.iter()) {
            let names = series.string_column("fieldKey");
            let types = series.string_column("fieldType");
            out.extend(names.into_iter().zip(types));
        }
        Ok(out)
    }

    /// Returns the server version, or `"unknown"` when the ping fails.
    fn server_version(&self) -> String {
        match self.client.ping(Duration::ZERO) {
            Ok(pong) if !pong.version.is_empty() => pong.version,
            Ok(_) => "unknown".to_string(),
            Err(e) => {
                debug!("ping for server version failed: {}", e);
                "unknown".to_string()
            }
        }
    }
}

/// Collects the string values of `column` across every series of `resp`.
fn string_column(resp: &Response, column: &str) -> Vec<String> {
    resp.results
        .iter()
        .flat_map(|r| r.series.iter())
        .flat_map(|s| s.string_column(column))
        .collect()
}

/// Double-quotes an identifier for use in a statement.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl Optionable for InfluxConnection {
    type Option = OptionConnection;

    fn set_option(&mut self, key: Self::Option, value: OptionValue) -> adbc_core::error::Result<()> {
        let OptionValue::String(value) = value else {
            return Err(adbc_core::error::Error::with_message_and_status(
                "Expected string value for connection option",
                adbc_core::error::Status::InvalidArguments,
            ));
        };
        match key {
            OptionConnection::AutoCommit => {
                let enabled = parse_bool(&value).ok_or_else(|| {
                    adbc_core::error::Error::with_message_and_status(
                        format!("Invalid autocommit value {:?}", value),
                        adbc_core::error::Status::InvalidArguments,
                    )
                })?;
                match (enabled, self.tx.is_some()) {
                    (false, false) => {
                        self.begin()?;
                    }
                    (true, true) => self.commit_tx()?,
                    _ => {}
                }
                Ok(())
            }
            OptionConnection::CurrentCatalog => {
                self.database = value;
                Ok(())
            }
            _ => Err(not_implemented("Connection option")),
        }
    }

    fn get_option_string(&self, key: Self::Option) -> adbc_core::error::Result<String> {
        match key {
            OptionConnection::AutoCommit => Ok((!self.in_transaction()).to_string()),
            OptionConnection::CurrentCatalog => Ok(self.database.clone()),
            _ => Err(not_implemented("Connection option")),
        }
    }

    fn get_option_bytes(&self, _key: Self::Option) -> adbc_core::error::Result<Vec<u8>> {
        Err(not_implemented("Connection option"))
    }

    fn get_option_double(&self, _key: Self::Option) -> adbc_core::error::Result<f64> {
        Err(not_implemented("Connection option"))
    }

    fn get_option_int(&self, _key: Self::Option) -> adbc_core::error::Result<i64> {
        Err(not_implemented("Connection option"))
    }
}

impl Connection for InfluxConnection {
    type StatementType = InfluxStatement;

    /// Creates a statement sharing this connection's client.
    ///
    /// The statement keeps the database current at creation time; a later
    /// `CurrentCatalog` change only applies to statements created after it.
    fn new_statement(&mut self) -> adbc_core::error::Result<Self::StatementType> {
        Ok(InfluxStatement::new(
            Arc::clone(&self.client),
            self.database.clone(),
            self.precision,
        ))
    }

    fn cancel(&mut self) -> adbc_core::error::Result<()> {
        Err(not_implemented("Cancellation"))
    }

    fn get_info(
        &self,
        codes: Option<HashSet<InfoCode>>,
    ) -> adbc_core::error::Result<impl arrow_array::RecordBatchReader + Send> {
        let all = [
            (InfoCode::VendorName, "InfluxDB".to_string()),
            (InfoCode::VendorVersion, self.server_version()),
            (InfoCode::DriverName, "ADBC-Influx".to_string()),
            (InfoCode::DriverVersion, env!("CARGO_PKG_VERSION").to_string()),
        ];

        let (info_codes, info_values): (Vec<u32>, Vec<String>) = all
            .into_iter()
            .filter(|(code, _)| codes.as_ref().is_none_or(|c| c.contains(code)))
            .map(|(code, value)| (code as u32, value))
            .unzip();

        let schema = Schema::new(vec![
            Field::new("info_code", DataType::UInt32, false),
            Field::new("info_value", DataType::Utf8, false),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(UInt32Array::from(info_codes)),
                Arc::new(StringArray::from(info_values)),
            ],
        )
        .map_err(|e| internal("Failed to create info batch", e))?;

        Ok(VecRecordBatchReader::single(batch))
    }

    fn get_objects(
        &self,
        depth: ObjectDepth,
        catalog: Option<&str>,
        _db_schema: Option<&str>,
        table_name: Option<&str>,
        table_type: Option<Vec<&str>>,
        column_name: Option<&str>,
    ) -> adbc_core::error::Result<Box<dyn arrow_array::RecordBatchReader + Send>> {
        let databases: Vec<String> = self
            .list_databases()?
            .into_iter()
            .filter(|db| catalog.is_none_or(|c| c == db.as_str()))
            .collect();

        let mut catalog_names: Vec<String> = Vec::new();
        let mut table_names: Vec<Option<String>> = Vec::new();
        let mut table_types: Vec<Option<String>> = Vec::new();
        let mut column_names: Vec<Option<String>> = Vec::new();
        let mut column_types: Vec<Option<String>> = Vec::new();

        let type_match = table_type
            .as_ref()
            .is_none_or(|types| types.contains(&MEASUREMENT_TABLE_TYPE));

        for db in &databases {
            let want_tables = matches!(depth, ObjectDepth::All | ObjectDepth::Tables | ObjectDepth::Columns);
            if !want_tables || !type_match {
                catalog_names.push(db.clone());
                table_names.push(None);
                table_types.push(None);
                column_names.push(None);
                column_types.push(None);
                continue;
            }

            let measurements: Vec<String> = self
                .list_measurements(db)?
                .into_iter()
                .filter(|m| table_name.is_none_or(|t| t == m.as_str()))
                .collect();

            for m in measurements {
                let columns: Vec<(String, String)> = if matches!(depth, ObjectDepth::Tables) {
                    Vec::new()
                } else {
                    let mut cols: Vec<(String, String)> = self
                        .tag_keys(db, &m)?
                        .into_iter()
                        .map(|t| (t, "tag".to_string()))
                        .collect();
                    cols.extend(self.field_keys(db, &m)?);
                    cols.retain(|(c, _)| column_name.is_none_or(|n| n == c.as_str()));
                    cols
                };

                if columns.is_empty() {
                    catalog_names.push(db.clone());
                    table_names.push(Some(m.clone()));
                    table_types.push(Some(MEASUREMENT_TABLE_TYPE.to_string()));
                    column_names.push(None);
                    column_types.push(None);
                    continue;
                }
                for (col, ty) in columns {
                    catalog_names.push(db.clone());
                    table_names.push(Some(m.clone()));
                    table_types.push(Some(MEASUREMENT_TABLE_TYPE.to_string()));
                    column_names.push(Some(col));
                    column_types.push(Some(ty));
                }
            }
        }

        let schema = Schema::new(vec![
            Field::new("catalog_name", DataType::Utf8, true),
            Field::new("table_name", DataType::Utf8, true),
            Field::new("table_type", DataType::Utf8, true),
            Field::new("column_name", DataType::Utf8, true),
            Field::new("column_type", DataType::Utf8, true),
        ]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(StringArray::from(catalog_names)) as ArrayRef,
                Arc::new(StringArray::from(table_names)) as ArrayRef,
                Arc::new(StringArray::from(table_types)) as ArrayRef,
                Arc::new(StringArray::from(column_names)) as ArrayRef,
                Arc::new(StringArray::from(column_types)) as ArrayRef,
            ],
        )
        .map_err(|e| internal("Failed to create objects batch", e))?;

        Ok(Box::new(VecRecordBatchReader::single(batch)))
    }

    fn get_table_schema(
        &self,
        catalog: Option<&str>,
        _db_schema: Option<&str>,
        table_name: &str,
    ) -> adbc_core::error::Result<Schema> {
        let db = catalog.unwrap_or(&self.database);
        let tags = self.tag_keys(db, table_name)?;
        let fields = self.field_keys(db, table_name)?;
        if tags.is_empty() && fields.is_empty() {
            return Err(adbc_core::error::Error::with_message_and_status(
                format!("Measurement {:?} not found in {:?}", table_name, db),
                adbc_core::error::Status::NotFound,
            ));
        }
        Ok(measurement_schema(self.precision, &tags, &fields))
    }

    fn get_table_types(&self) -> adbc_core::error::Result<impl arrow_array::RecordBatchReader + Send> {
        let schema = Schema::new(vec![Field::new("table_type", DataType::Utf8, false)]);
        let batch = RecordBatch::try_new(
            Arc::new(schema),
            vec![Arc::new(StringArray::from(vec![MEASUREMENT_TABLE_TYPE]))],
        )
        .map_err(|e| internal("Failed to create table types batch", e))?;

        Ok(VecRecordBatchReader::single(batch))
    }

    fn get_statistic_names(&self) -> adbc_core::error::Result<impl arrow_array::RecordBatchReader + Send> {
        let schema = Schema::new(vec![
            Field::new("statistic_name", DataType::Utf8, false),
            Field::new("statistic_key", DataType::Int16, false),
        ]);
        Ok(VecRecordBatchReader::empty(schema))
    }

    fn get_statistics(
        &self,
        _catalog: Option<&str>,
        _db_schema: Option<&str>,
        _table_name: Option<&str>,
        _approximate: bool,
    ) -> adbc_core::error::Result<impl arrow_array::RecordBatchReader + Send> {
        Ok(VecRecordBatchReader::empty(Schema::empty()))
    }

    fn commit(&mut self) -> adbc_core::error::Result<()> {
        Ok(self.commit_tx()?)
    }

    fn rollback(&mut self) -> adbc_core::error::Result<()> {
        Ok(self.rollback_tx()?)
    }

    fn read_partition(
        &self,
        _partition: impl AsRef<[u8]>,
    ) -> adbc_core::error::Result<Box<dyn arrow_array::RecordBatchReader + Send>> {
        Err(not_implemented("Partitioned reads"))
    }
}
