//! Metadata retrieval example for ADBC-Influx driver.
//!
//! This example demonstrates how to retrieve driver and server metadata
//! including version information, table types, and measurement schemas.

use adbc_core::{Connection, Database, Driver, options::{ObjectDepth, OptionDatabase}};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let host = std::env::var("INFLUX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("INFLUX_PORT").unwrap_or_else(|_| "8086".to_string());
    let db_name = std::env::var("INFLUX_DATABASE").unwrap_or_else(|_| "_internal".to_string());
    let measurement = std::env::var("INFLUX_MEASUREMENT").unwrap_or_else(|_| "runtime".to_string());

    println!("Retrieving metadata from InfluxDB at {}:{}", host, port);

    let mut driver = adbc_influx::driver::InfluxDriver::default();
    let db = driver.new_database_with_opts([(
        OptionDatabase::Uri,
        format!("http://{}:{}/{}", host, port, db_name).into(),
    )])?;
    let connection = db.new_connection()?;

    // Get driver and server info
    println!("\n=== Driver and Server Info ===");
    println!("\nInfo Code | Info Value");
    println!("----------|------------");
    for batch in connection.get_info(None)? {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            if let (Some(code), Some(value)) = (
                format_column(batch.column(0).as_ref(), row),
                format_column(batch.column(1).as_ref(), row),
            ) {
                println!("{:>9} | {}", code, value);
            }
        }
    }

    // Get table types
    println!("\n=== Supported Table Types ===");
    for batch in connection.get_table_types()? {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            if let Some(value) = format_column(batch.column(0).as_ref(), row) {
                println!("{}", value);
            }
        }
    }

    // List measurements
    println!("\n=== Measurements in {} ===", db_name);
    for batch in connection.get_objects(ObjectDepth::Tables, Some(&db_name), None, None, None, None)? {
        let batch = batch?;
        for row in 0..batch.num_rows() {
            if let Some(table) = format_column(batch.column(1).as_ref(), row) {
                println!("{}", table);
            }
        }
    }

    // Get measurement schema
    println!("\n=== Measurement Schema Example ===");
    match connection.get_table_schema(Some(&db_name), None, &measurement) {
        Ok(schema) => {
            println!("\nMeasurement: {}.{}", db_name, measurement);
            println!("\nColumn Name       | Data Type              | Nullable");
            println!("------------------|------------------------|---------");
            for field in schema.fields() {
                println!("{:>18} | {:22} | {}",
                    field.name(),
                    format!("{:?}", field.data_type()),
                    if field.is_nullable() { "YES" } else { "NO" }
                );
            }
        }
        Err(e) => {
            println!("Could not retrieve measurement schema: {}", e);
            println!("(Measurement '{}' may not exist in database '{}')", measurement, db_name);
        }
    }

    Ok(())
}

/// Format Arrow column value as string.
fn format_column(column: &dyn arrow_array::Array, row: usize) -> Option<String> {
    use arrow_array::{StringArray, UInt32Array};

    if column.is_null(row) {
        return Some("NULL".to_string());
    }

    let as_any = column.as_any();
    if let Some(arr) = as_any.downcast_ref::<StringArray>() {
        Some(arr.value(row).to_string())
    } else {
        as_any
            .downcast_ref::<UInt32Array>()
            .map(|arr| arr.value(row).to_string())
    }
}
