// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Line Protocol encoding for GreptimeDB's InfluxDB-compatible write API.
//!
//! Line Protocol format:
//! ```text
//! measurement,tag1=val1,tag2=val2 field1=val1,field2=val2 timestamp_ns
//! ```
//!
//! See: <https://docs.greptime.com/user-guide/ingest-data/for-iot/influxdb-line-protocol>

use crate::error::{Result, SinkError};
use std::fmt;

/// A value that can be stored in a field column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// 64-bit signed integer.
    Integer(i64),
    /// UTF-8 string.
    String(String),
}

impl FieldValue {
    /// Format this value for Line Protocol.
    ///
    /// - Integer: suffixed with `i` (e.g., `42i`)
    /// - String: quoted with double quotes, inner quotes and backslashes escaped
    pub fn to_line_protocol(&self) -> String {
        match self {
            FieldValue::Integer(v) => format!("{}i", v),
            FieldValue::String(v) => {
                let escaped = v.replace('\\', "\\\\").replace('"', "\\\"");
                format!("\"{}\"", escaped)
            }
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_line_protocol())
    }
}

/// Accumulates points and renders a newline-separated write body.
#[derive(Debug, Default)]
pub struct LineProtocolWriter {
    lines: Vec<String>,
}

impl LineProtocolWriter {
    /// Create a new empty writer.
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Append a single point.
    ///
    /// Tags are written in the order given; tags with an empty value are
    /// left out, since Line Protocol cannot express them. A newline in the
    /// measurement, a tag or a field key is an error and nothing is written.
    pub fn write_point(
        &mut self,
        measurement: &str,
        tags: &[(&str, &str)],
        fields: &[(&str, FieldValue)],
        timestamp_ns: i64,
    ) -> Result<()> {
        if measurement.is_empty() {
            return Err(SinkError::Schema("measurement name is empty".to_string()));
        }
        if fields.is_empty() {
            return Err(SinkError::Schema(format!(
                "point for '{}' has no fields",
                measurement
            )));
        }

        check_no_newline("measurement", measurement)?;
        for (key, value) in tags {
            check_no_newline("tag key", key)?;
            check_no_newline("tag value", value)?;
        }
        for (key, _) in fields {
            check_no_newline("field key", key)?;
        }

        let mut line = escape_measurement(measurement);

        for (key, value) in tags.iter().filter(|(_, v)| !v.is_empty()) {
            line.push(',');
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&escape_key(value));
        }

        line.push(' ');

        for (i, (key, value)) in fields.iter().enumerate() {
            if i > 0 {
                line.push(',');
            }
            line.push_str(&escape_key(key));
            line.push('=');
            line.push_str(&value.to_line_protocol());
        }

        line.push(' ');
        line.push_str(&timestamp_ns.to_string());

        self.lines.push(line);
        Ok(())
    }

    /// Take all accumulated lines as one request body.
    pub fn finish(&mut self) -> String {
        std::mem::take(&mut self.lines).join("\n")
    }

    /// Get the current number of buffered lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Line Protocol has no escape for a newline outside string field values.
fn check_no_newline(what: &str, s: &str) -> Result<()> {
    if s.contains('\n') {
        return Err(SinkError::Schema(format!("{} {:?} contains a newline", what, s)));
    }
    Ok(())
}

/// Measurement names escape commas and spaces.
fn escape_measurement(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace(' ', "\\ ")
}

/// Tag keys, tag values and field keys also escape equals signs.
fn escape_key(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}
