//! Line-protocol points and batches.
//!
//! A [`Point`] renders to one line of the database's text write format:
//!
//! ```text
//! measurement[,tag=value...] field=value[,field=value...] [timestamp]
//! ```
//!
//! A [`Batch`] is an ordered list of points that serializes to
//! newline-terminated lines at a chosen [`Precision`].

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{InfluxError, Result};

/// Time unit used to emit and interpret timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    #[default]
    Nanosecond,
    Microsecond,
    Millisecond,
    Second,
    Minute,
    Hour,
}

impl Precision {
    /// Returns the wire string used for the `precision` and `epoch` parameters.
    pub fn as_str(&self) -> &'static str {
        match self {
            Precision::Nanosecond => "ns",
            Precision::Microsecond => "u",
            Precision::Millisecond => "ms",
            Precision::Second => "s",
            Precision::Minute => "m",
            Precision::Hour => "h",
        }
    }

    /// Number of nanoseconds in one unit of this precision.
    pub fn multiplier(&self) -> i64 {
        match self {
            Precision::Nanosecond => 1,
            Precision::Microsecond => 1_000,
            Precision::Millisecond => 1_000_000,
            Precision::Second => 1_000_000_000,
            Precision::Minute => 60_000_000_000,
            Precision::Hour => 3_600_000_000_000,
        }
    }
}

impl FromStr for Precision {
    type Err = InfluxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "n" | "ns" => Ok(Precision::Nanosecond),
            "u" | "us" | "µ" | "µs" => Ok(Precision::Microsecond),
            "ms" => Ok(Precision::Millisecond),
            "s" => Ok(Precision::Second),
            "m" => Ok(Precision::Minute),
            "h" => Ok(Precision::Hour),
            other => Err(InfluxError::config(format!("unknown precision {:?}", other))),
        }
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters accompanying a write request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Precision of the timestamps in the payload. Server default is nanoseconds.
    pub precision: Option<Precision>,
    /// Target database.
    pub database: String,
    /// Retention policy the points are written to.
    pub retention_policy: Option<String>,
    /// Write consistency level (`any`, `one`, `quorum`, `all`).
    pub consistency: Option<String>,
}

impl WriteOptions {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn with_retention_policy(mut self, rp: impl Into<String>) -> Self {
        self.retention_policy = Some(rp.into());
        self
    }

    pub fn with_consistency(mut self, consistency: impl Into<String>) -> Self {
        self.consistency = Some(consistency.into());
        self
    }
}

/// A single field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Integer(i64),
    UInteger(u64),
    String(String),
    Boolean(bool),
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<u64> for FieldValue {
    fn from(v: u64) -> Self {
        FieldValue::UInteger(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::String(v)
    }
}

/// One data point.
///
/// Tags and fields are kept sorted by key so the rendered line is stable.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    measurement: String,
    tags: BTreeMap<String, String>,
    fields: BTreeMap<String, FieldValue>,
    timestamp: Option<i64>,
}

impl Point {
    /// Builds a validated point.
    ///
    /// Tags with an empty key or value are dropped. A point needs a
    /// measurement name and at least one finite field. Without a timestamp
    /// the server assigns its local time on reception.
    ///
    /// # Example
    /// ```
    /// use adbc_influx::line_protocol::{Point, Precision};
    ///
    /// let p = Point::new("cpu", [("host", "a")], [("value", 1.5)], Some(100)).unwrap();
    /// assert_eq!(p.line(Precision::Nanosecond), "cpu,host=a value=1.5 100");
    /// ```
    pub fn new<K, V, F, FV>(
        measurement: impl Into<String>,
        tags: impl IntoIterator<Item = (K, V)>,
        fields: impl IntoIterator<Item = (F, FV)>,
        timestamp: Option<i64>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        F: Into<String>,
        FV: Into<FieldValue>,
    {
        let measurement: String = measurement.into();
        if measurement.is_empty() {
            return Err(InfluxError::config("point measurement must not be empty"));
        }
        check_single_line("measurement", &measurement)?;

        let tags: BTreeMap<String, String> = tags
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(k, v): &(String, String)| !k.is_empty() && !v.is_empty())
            .collect();
        for (k, v) in &tags {
            check_single_line("tag key", k)?;
            check_single_line("tag value", v)?;
        }

        let mut checked = BTreeMap::new();
        for (key, value) in fields {
            let key: String = key.into();
            let value: FieldValue = value.into();
            if key.is_empty() {
                return Err(InfluxError::config("field key must not be empty"));
            }
            check_single_line("field key", &key)?;
            if let FieldValue::String(text) = &value {
                check_single_line("field value", text)?;
            }
            if let FieldValue::Float(f) = &value
                && !f.is_finite()
            {
                return Err(InfluxError::config(format!(
                    "field {} has unsupported value {}",
                    key, f
                )));
            }
            checked.insert(key, value);
        }
        if checked.is_empty() {
            return Err(InfluxError::config(format!(
                "point {} must have at least one field",
                measurement
            )));
        }

        Ok(Self {
            measurement,
            tags,
            fields: checked,
            timestamp,
        })
    }

    /// Same as [`Point::new`], stamping the point with a wall-clock time.
    pub fn at<K, V, F, FV>(
        measurement: impl Into<String>,
        tags: impl IntoIterator<Item = (K, V)>,
        fields: impl IntoIterator<Item = (F, FV)>,
        time: SystemTime,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
        F: Into<String>,
        FV: Into<FieldValue>,
    {
        let nanos = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => i64::try_from(d.as_nanos()),
            Err(e) => i64::try_from(e.duration().as_nanos()).map(|n| -n),
        }
        .map_err(|_| InfluxError::config("timestamp out of range"))?;
        Self::new(measurement, tags, fields, Some(nanos))
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// Timestamp in Unix nanoseconds, if any.
    pub fn timestamp(&self) -> Option<i64> {
        self.timestamp
    }

    /// Renders the point as one line, timestamp truncated to `precision`.
    pub fn line(&self, precision: Precision) -> String {
        let mut out = String::with_capacity(64);
        self.write_line(&mut out, precision);
        out
    }

    fn write_line(&self, out: &mut String, precision: Precision) {
        escape_into(out, &self.measurement, &[',', ' ']);
        for (k, v) in &self.tags {
            out.push(',');
            escape_into(out, k, &[',', '=', ' ']);
            out.push('=');
            escape_into(out, v, &[',', '=', ' ']);
        }

        let mut sep = ' ';
        for (k, v) in &self.fields {
            out.push(sep);
            sep = ',';
            escape_into(out, k, &[',', '=', ' ']);
            out.push('=');
            match v {
                FieldValue::Float(f) => {
                    let _ = write!(out, "{}", f);
                }
                FieldValue::Integer(i) => {
                    let _ = write!(out, "{}i", i);
                }
                FieldValue::UInteger(u) => {
                    let _ = write!(out, "{}u", u);
                }
                FieldValue::Boolean(b) => out.push_str(if *b { "true" } else { "false" }),
                FieldValue::String(s) => {
                    out.push('"');
                    escape_into(out, s, &['"', '\\']);
                    out.push('"');
                }
            }
        }

        if let Some(ts) = self.timestamp {
            let _ = write!(out, " {}", ts / precision.multiplier());
        }
    }
}

/// Line breaks end a point on the wire and cannot be escaped.
fn check_single_line(what: &str, s: &str) -> Result<()> {
    if s.contains(['\n', '\r']) {
        return Err(InfluxError::config(format!(
            "{} {:?} contains a line break",
            what, s
        )));
    }
    Ok(())
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}

/// Ordered collection of points written together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    points: Vec<Point>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    pub fn add_points(&mut self, points: impl IntoIterator<Item = Point>) {
        self.points.extend(points);
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Serializes every point as a newline-terminated line.
    pub fn to_bytes(&self, precision: Precision) -> Vec<u8> {
        let mut out = String::with_capacity(self.points.len() * 64);
        for p in &self.points {
            p.write_line(&mut out, precision);
            out.push('\n');
        }
        out.into_bytes()
    }
}
