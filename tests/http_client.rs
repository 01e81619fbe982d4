//! HTTP transport tests against a local stub server.

mod common;

use std::time::Duration;

use adbc_core::options::{InfoCode, OptionConnection, OptionValue};
use adbc_core::{Connection, Optionable, Statement};
use adbc_core::error::Status;
use arrow_array::{Array, RecordBatch, StringArray};
use std::collections::HashSet;

use adbc_influx::{Client, HttpClient, HttpConfig, Point, Precision, Query, WriteOptions};
use common::{StubResponse, StubServer};

fn client_for(server: &StubServer) -> HttpClient {
    HttpClient::new(HttpConfig::new(server.url())).expect("client")
}

#[test]
fn test_ping_reads_version_and_wait_for_leader() {
    let server = StubServer::always(
        StubResponse::no_content().with_header("X-Influxdb-Version", "1.8.10"),
    );
    let client = client_for(&server);

    let pong = client.ping(Duration::from_secs(2)).unwrap();
    assert_eq!(pong.version, "1.8.10");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
    assert_eq!(requests[0].path, "/ping");
    assert_eq!(requests[0].param("wait_for_leader"), Some("2s"));

    client.ping(Duration::ZERO).unwrap();
    assert_eq!(server.requests()[1].param("wait_for_leader"), None);
}

#[tokio::test]
async fn test_client_inside_current_thread_runtime() {
    let server = StubServer::always(
        StubResponse::no_content().with_header("X-Influxdb-Version", "1.8.10"),
    );
    let client = client_for(&server);

    assert_eq!(client.ping(Duration::ZERO).unwrap().version, "1.8.10");
    client.write(b"m v=1\n", &WriteOptions::new("db")).unwrap();
    assert_eq!(server.requests().len(), 2);
}

#[test]
fn test_ping_requires_no_content() {
    let server = StubServer::always(StubResponse::new(200, "pong"));
    let err = client_for(&server).ping(Duration::ZERO).unwrap_err();
    assert!(err.is_transport());
    assert!(err.message().contains("200"));
}

#[test]
fn test_write_sends_payload_and_parameters() {
    let server = StubServer::always(StubResponse::no_content());
    let mut config = HttpConfig::new(server.url());
    config.username = Some("admin".to_string());
    config.password = Some("secret".to_string());
    let client = HttpClient::new(config).unwrap();

    let options = WriteOptions::new("telemetry")
        .with_precision(Precision::Second)
        .with_retention_policy("autogen")
        .with_consistency("one");
    client.write(b"cpu,host=a value=1 100\n", &options).unwrap();

    let req = &server.requests()[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/write");
    assert_eq!(req.param("db"), Some("telemetry"));
    assert_eq!(req.param("rp"), Some("autogen"));
    assert_eq!(req.param("precision"), Some("s"));
    assert_eq!(req.param("consistency"), Some("one"));
    assert_eq!(req.body, b"cpu,host=a value=1 100\n");
    assert_eq!(req.header("authorization"), Some("Basic YWRtaW46c2VjcmV0"));
    assert_eq!(req.header("user-agent"), Some("InfluxDBClient"));
}

#[test]
fn test_write_omits_unset_parameters() {
    let server = StubServer::always(StubResponse::new(200, ""));
    let client = client_for(&server);
    client.write(b"m v=1", &WriteOptions::new("db")).unwrap();

    let req = &server.requests()[0];
    assert_eq!(req.param("db"), Some("db"));
    assert_eq!(req.param("rp"), None);
    assert_eq!(req.param("precision"), None);
    assert_eq!(req.param("consistency"), None);
    assert_eq!(req.header("authorization"), None);
}

#[test]
fn test_write_error_keeps_body() {
    let server = StubServer::always(StubResponse::new(
        400,
        r#"{"error":"unable to parse 'bad line': missing fields"}"#,
    ));
    let err = client_for(&server)
        .write(b"bad line", &WriteOptions::new("db"))
        .unwrap_err();
    assert!(err.is_transport());
    assert!(err.message().contains("400"));
    assert!(err.message().contains("missing fields"));
}

#[test]
fn test_query_parameters_and_decoding() {
    let server = StubServer::always(StubResponse::new(
        200,
        r#"{"results":[{"statement_id":0,"series":[{"name":"cpu","columns":["time","value"],"values":[[1500000000000,0.5]]}]}]}"#,
    ));
    let client = client_for(&server);

    let resp = client
        .query(&Query::new("SELECT value FROM cpu", "telemetry").with_precision(Precision::Millisecond))
        .unwrap();
    assert!(resp.error().is_none());
    assert_eq!(resp.results[0].series[0].values[0][0].to_string(), "1500000000000");

    let req = &server.requests()[0];
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "/query");
    assert_eq!(req.param("q"), Some("SELECT value FROM cpu"));
    assert_eq!(req.param("db"), Some("telemetry"));
    assert_eq!(req.param("epoch"), Some("ms"));
}

#[test]
fn test_query_unparseable_error_body_surfaces_status_and_body() {
    let server = StubServer::always(StubResponse::new(500, "<html>Internal Server Error</html>"));
    let err = client_for(&server)
        .query(&Query::new("SHOW DATABASES", ""))
        .unwrap_err();
    assert!(err.is_transport());
    assert!(err.message().contains("500"));
    assert!(err.message().contains("<html>Internal Server Error</html>"));
}

#[test]
fn test_query_error_payload_is_returned() {
    let server = StubServer::always(StubResponse::new(
        400,
        r#"{"error":"error parsing query: found EOF, expected FROM"}"#,
    ));
    let resp = client_for(&server)
        .query(&Query::new("SELECT", "db"))
        .unwrap();
    let err = resp.error().unwrap();
    assert!(err.is_protocol());
    assert_eq!(err.message(), "error parsing query: found EOF, expected FROM");
}

#[test]
fn test_timeout_is_a_transport_error() {
    let server = StubServer::start(|_| {
        std::thread::sleep(Duration::from_millis(500));
        StubResponse::no_content()
    });
    let mut config = HttpConfig::new(server.url());
    config.timeout = Duration::from_millis(50);
    let client = HttpClient::new(config).unwrap();

    let err = client.write(b"m v=1", &WriteOptions::new("db")).unwrap_err();
    assert!(err.is_transport());
}

#[test]
fn test_connection_routes_statements() {
    let server = StubServer::start(|req| match req.path.as_str() {
        "/write" => StubResponse::no_content(),
        "/query" => StubResponse::new(200, r#"{"results":[{"statement_id":0}]}"#),
        _ => StubResponse::no_content().with_header("X-Influxdb-Version", "1.8.10"),
    });
    let uri = format!(
        "http://admin:secret@{}/telemetry?precision=ms&ua=adbc-test",
        server.addr()
    );
    let mut conn = adbc_influx::open(&uri).unwrap();

    let mut stmt = conn.new_statement().unwrap();
    stmt.set_sql_query("insert into archive.cpu,host=a value=1 100").unwrap();
    assert_eq!(stmt.execute_update().unwrap(), Some(0));

    stmt.set_sql_query("CREATE DATABASE archive").unwrap();
    assert_eq!(stmt.execute_update().unwrap(), Some(1));

    let requests = server.requests();
    assert_eq!(requests[0].path, "/write");
    assert_eq!(requests[0].param("db"), Some("archive"));
    assert_eq!(requests[0].body, b"cpu,host=a value=1 100");
    assert_eq!(requests[0].header("user-agent"), Some("adbc-test"));

    assert_eq!(requests[1].path, "/query");
    assert_eq!(requests[1].param("db"), Some("telemetry"));
    assert_eq!(requests[1].param("epoch"), Some("ms"));
    assert_eq!(requests[1].header("authorization"), Some("Basic YWRtaW46c2VjcmV0"));
}

#[test]
fn test_statement_level_error_becomes_protocol_error() {
    let server = StubServer::always(StubResponse::new(
        200,
        r#"{"results":[{"statement_id":0,"error":"database not found: missing"}]}"#,
    ));
    let mut conn = adbc_influx::open(&format!("{}/missing", server.url())).unwrap();
    let mut stmt = conn.new_statement().unwrap();
    stmt.set_sql_query("SHOW MEASUREMENTS").unwrap();

    let err = stmt.execute_update().unwrap_err();
    assert_eq!(err.status, Status::Internal);
    assert!(err.message.contains("database not found: missing"));
}

#[test]
fn test_transaction_commit_is_one_write() {
    let server = StubServer::always(StubResponse::no_content());
    let mut conn = adbc_influx::open(&format!("{}/telemetry", server.url())).unwrap();

    conn.set_option(OptionConnection::AutoCommit, OptionValue::String("false".to_string()))
        .unwrap();
    conn.add_points([
        Point::new("cpu", [("host", "a")], [("value", 0.5)], Some(1_000)).unwrap(),
        Point::new("cpu", [("host", "b")], [("value", 0.7)], Some(2_000)).unwrap(),
    ])
    .unwrap();
    assert!(server.requests().is_empty());

    conn.commit().unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].param("db"), Some("telemetry"));
    assert_eq!(requests[0].param("precision"), Some("ns"));
    assert_eq!(
        requests[0].body,
        b"cpu,host=a value=0.5 1000\ncpu,host=b value=0.7 2000\n"
    );
}

#[test]
fn test_get_info_reports_server_version() {
    let server = StubServer::always(
        StubResponse::no_content().with_header("X-Influxdb-Version", "1.8.10"),
    );
    let conn = adbc_influx::open(&server.url()).unwrap();

    let reader = conn
        .get_info(Some(HashSet::from([InfoCode::VendorVersion])))
        .unwrap();
    let batches: Vec<RecordBatch> = reader.collect::<Result<_, _>>().unwrap();
    let values = batches[0]
        .column(1)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    assert_eq!(values.len(), 1);
    assert_eq!(values.value(0), "1.8.10");
}
