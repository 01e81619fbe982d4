//! Type mapping between the database and Apache Arrow.
//!
//! Field types come from `SHOW FIELD KEYS`; tags are always strings and the
//! `time` column is a timestamp at the connection's precision.

use arrow_schema::{DataType, Field, Schema, TimeUnit};

use crate::line_protocol::Precision;

/// Name of the implicit timestamp column of every measurement.
pub const TIME_COLUMN: &str = "time";

/// Field type as reported in the `fieldType` column of `SHOW FIELD KEYS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Float,
    Integer,
    Unsigned,
    String,
    Boolean,
}

impl FieldType {
    /// Parses a `fieldType` value; unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "float" => Some(FieldType::Float),
            "integer" => Some(FieldType::Integer),
            "unsigned" => Some(FieldType::Unsigned),
            "string" => Some(FieldType::String),
            "boolean" => Some(FieldType::Boolean),
            _ => None,
        }
    }

    pub fn to_arrow(self) -> DataType {
        match self {
            FieldType::Float => DataType::Float64,
            FieldType::Integer => DataType::Int64,
            FieldType::Unsigned => DataType::UInt64,
            FieldType::String => DataType::Utf8,
            FieldType::Boolean => DataType::Boolean,
        }
    }
}

/// Arrow time unit for results returned at `precision`.
///
/// Minute and hour epochs have no Arrow unit and are reported as seconds.
pub fn precision_time_unit(precision: Precision) -> TimeUnit {
    match precision {
        Precision::Nanosecond => TimeUnit::Nanosecond,
        Precision::Microsecond => TimeUnit::Microsecond,
        Precision::Millisecond => TimeUnit::Millisecond,
        Precision::Second | Precision::Minute | Precision::Hour => TimeUnit::Second,
    }
}

/// Builds the Arrow schema of a measurement.
///
/// Column order is `time`, then tags, then fields, each group in the order
/// given. A field whose type is unknown maps to `Utf8`.
pub fn measurement_schema(
    precision: Precision,
    tags: &[String],
    fields: &[(String, String)],
) -> Schema {
    let mut columns = Vec::with_capacity(1 + tags.len() + fields.len());
    columns.push(Field::new(
        TIME_COLUMN,
        DataType::Timestamp(precision_time_unit(precision), None),
        false,
    ));
    columns.extend(tags.iter().map(|t| Field::new(t, DataType::Utf8, true)));
    columns.extend(fields.iter().map(|(name, ty)| {
        let dt = FieldType::from_name(ty)
            .map(FieldType::to_arrow)
            .unwrap_or(DataType::Utf8);
        Field::new(name, dt, true)
    }));
    Schema::new(columns)
}
