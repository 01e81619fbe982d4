//! Basic connection example for ADBC-Influx driver.
//!
//! This example demonstrates how to establish a connection to InfluxDB
//! using the ADBC API and check that the server answers.

use std::time::Duration;

use adbc_core::{Database, Driver, options::{OptionDatabase, OptionValue}};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    // Get connection parameters from environment or use defaults
    let host = std::env::var("INFLUX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("INFLUX_PORT").unwrap_or_else(|_| "8086".to_string());
    let user = std::env::var("INFLUX_USER").unwrap_or_default();
    let password = std::env::var("INFLUX_PASSWORD").unwrap_or_default();

    println!("Connecting to InfluxDB at {}:{}", host, port);

    // Create driver instance
    let mut driver = adbc_influx::driver::InfluxDriver::default();

    let mut opts: Vec<(OptionDatabase, OptionValue)> = vec![(OptionDatabase::Uri, format!("http://{}:{}", host, port).into())];
    if !user.is_empty() {
        opts.push((OptionDatabase::Username, user.into()));
        opts.push((OptionDatabase::Password, password.into()));
    }
    let database = driver.new_database_with_opts(opts)?;

    // Establish connection
    let connection = database.new_connection()?;
    let pong = connection.ping(Duration::from_secs(1))?;

    println!("Connected successfully!");
    println!("Server version: {} (round trip {:?})", pong.version, pong.rtt);

    Ok(())
}
