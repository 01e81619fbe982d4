//! Query execution example for ADBC-Influx driver.
//!
//! Statements run through ADBC report only how many result blocks they
//! produced; rows are read with the client's raw query call.

use adbc_core::{Connection, Statement};
use adbc_influx::{Client, Precision, Query};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let host = std::env::var("INFLUX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("INFLUX_PORT").unwrap_or_else(|_| "8086".to_string());
    let db_name = std::env::var("INFLUX_DATABASE").unwrap_or_else(|_| "test_db".to_string());

    println!("Querying InfluxDB at {}:{}", host, port);

    let mut connection =
        adbc_influx::open(&format!("http://{}:{}/{}?precision=ms", host, port, db_name))?;

    let query = "SELECT * FROM sensor_data LIMIT 10";

    // Execute through ADBC
    let mut stmt = connection.new_statement()?;
    stmt.set_sql_query(query)?;
    let blocks = stmt.execute_update()?;
    println!("\nQuery: {}", query);
    println!("Result blocks: {:?}", blocks);

    // Fetch the rows themselves
    let resp = connection
        .client()
        .query(&Query::new(query, db_name.as_str()).with_precision(Precision::Millisecond))?;
    if let Some(err) = resp.error() {
        return Err(err.into());
    }

    println!("\nResults:");
    let mut row_count = 0;
    for result in &resp.results {
        for series in &result.series {
            println!("  Series {} {:?}", series.name, series.tags);
            println!("    {}", series.columns.join(" | "));
            for row in series.values.iter().take(5) {
                let cells: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                println!("    {}", cells.join(" | "));
            }
            if series.values.len() > 5 {
                println!("    ...");
            }
            row_count += series.values.len();
        }
        for message in &result.messages {
            println!("  [{}] {}", message.level, message.text);
        }
    }

    println!("\nTotal rows: {}", row_count);

    Ok(())
}
