// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log table layout.
//!
//! | column       | kind      | type        |
//! |--------------|-----------|-------------|
//! | `project`    | tag       | string      |
//! | `profile`    | tag       | string      |
//! | `node`       | tag       | string      |
//! | `level`      | field     | string      |
//! | `level_code` | field     | int64       |
//! | `body`       | field     | string      |
//! | `fields`     | field     | string/JSON |
//! | `time`       | timestamp | nanosecond  |

use crate::error::{Result, SinkError};
use crate::fields::encode_fields;
use crate::line_protocol::{FieldValue, LineProtocolWriter};
use crate::record::LogRecord;

/// Role of a column in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Tag,
    Field,
    Timestamp,
}

/// Column data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    String,
    Int64,
    TimestampNanosecond,
}

/// A column definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub data_type: ColumnType,
}

const fn column(name: &'static str, kind: ColumnKind, data_type: ColumnType) -> Column {
    Column {
        name,
        kind,
        data_type,
    }
}

/// Columns of the log table, in row order.
pub const LOG_COLUMNS: [Column; 8] = [
    column("project", ColumnKind::Tag, ColumnType::String),
    column("profile", ColumnKind::Tag, ColumnType::String),
    column("node", ColumnKind::Tag, ColumnType::String),
    column("level", ColumnKind::Field, ColumnType::String),
    column("level_code", ColumnKind::Field, ColumnType::Int64),
    column("body", ColumnKind::Field, ColumnType::String),
    column("fields", ColumnKind::Field, ColumnType::String),
    column("time", ColumnKind::Timestamp, ColumnType::TimestampNanosecond),
];

/// One log row, ready to encode.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub project: String,
    pub profile: String,
    pub node: String,
    pub level: String,
    pub level_code: i64,
    pub body: String,
    pub fields: String,
    /// Issued timestamp in nanoseconds.
    pub time: i64,
}

/// Log table with a fixed column layout and a configurable name.
///
/// The table name is written as given; it is not sanitized.
#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
}

impl TableSchema {
    /// Create the schema for table `name`.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SinkError::Schema("table name is empty".to_string()));
        }
        Ok(Self { name })
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Column definitions.
    pub fn columns(&self) -> &'static [Column] {
        &LOG_COLUMNS
    }

    /// Build the row for `record` with its resolved level name and issued timestamp.
    pub fn row(&self, record: &LogRecord, level_name: &str, time: i64) -> Row {
        Row {
            project: record.project.clone(),
            profile: record.profile.clone(),
            node: record.node.clone(),
            level: level_name.to_string(),
            level_code: record.level.code(),
            body: record.body.clone(),
            fields: encode_fields(&record.fields),
            time,
        }
    }

    /// Append `row` to a Line Protocol batch.
    pub fn encode(&self, writer: &mut LineProtocolWriter, row: &Row) -> Result<()> {
        writer.write_point(
            &self.name,
            &[
                ("project", row.project.as_str()),
                ("profile", row.profile.as_str()),
                ("node", row.node.as_str()),
            ],
            &[
                ("level", FieldValue::String(row.level.clone())),
                ("level_code", FieldValue::Integer(row.level_code)),
                ("body", FieldValue::String(row.body.clone())),
                ("fields", FieldValue::String(row.fields.clone())),
            ],
            row.time,
        )
    }
}
