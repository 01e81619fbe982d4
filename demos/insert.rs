//! Data insertion example for ADBC-Influx driver.
//!
//! Writes points three ways: an `INSERT INTO` statement, a transaction
//! committed as one batch, and the UDP transport when `INFLUX_UDP_PORT`
//! is set.

use std::time::SystemTime;

use adbc_core::{Connection, Statement};
use adbc_influx::line_protocol::{FieldValue, Point};

fn main() -> anyhow::Result<()> {
    env_logger::init();
    dotenvy::dotenv().ok();

    let host = std::env::var("INFLUX_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("INFLUX_PORT").unwrap_or_else(|_| "8086".to_string());
    let db_name = std::env::var("INFLUX_DATABASE").unwrap_or_else(|_| "test_db".to_string());

    println!("Connecting to InfluxDB at {}:{}", host, port);
    let mut connection = adbc_influx::open(&format!("http://{}:{}/{}", host, port, db_name))?;

    // Create database
    println!("\n1. Creating database '{}'", db_name);
    {
        let mut stmt = connection.new_statement()?;
        stmt.set_sql_query(format!("CREATE DATABASE {}", db_name))?;
        let result = stmt.execute_update()?;
        println!("   Done. Result blocks: {:?}", result);
    }

    // Insert through a statement
    println!("\n2. Inserting with INSERT INTO");
    {
        let mut stmt = connection.new_statement()?;
        stmt.set_sql_query(format!(
            "INSERT INTO {}.sensor_data,device_id=device_001 temperature=25.5,humidity=60.2,pressure=1013i",
            db_name
        ))?;
        stmt.execute_update()?;
        println!("   Done.");
    }

    // Insert a batch in one write
    println!("\n3. Inserting a batch through a transaction");
    connection.begin()?;
    let now = SystemTime::now();
    for (device, temperature) in [("device_001", 25.8), ("device_002", 24.5), ("device_003", 26.2)] {
        connection.add_point(Point::at(
            "sensor_data",
            [("device_id", device)],
            [
                ("temperature", FieldValue::Float(temperature)),
                ("online", FieldValue::Boolean(true)),
            ],
            now,
        )?)?;
    }
    connection.commit()?;
    println!("   Done.");

    // Fire-and-forget over UDP
    if let Ok(udp_port) = std::env::var("INFLUX_UDP_PORT") {
        println!("\n4. Writing over UDP port {}", udp_port);
        let mut udp = adbc_influx::open(&format!("udp://{}:{}", host, udp_port))?;
        udp.begin()?;
        udp.add_point(Point::at("udp_point", [("src", "demo")], [("value", 1i64)], now)?)?;
        udp.commit()?;
        udp.close()?;
        println!("   Sent.");
    }

    println!("\nExample completed successfully!");

    Ok(())
}
