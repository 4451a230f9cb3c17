// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log records as handed over by the host logger.

use chrono::{DateTime, Utc};
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Free-form structured fields attached to a record.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Log severity levels (syslog ordering, most severe first).
///
/// Deserializes from any name [`LogLevel::parse`] accepts, in any case, or
/// from a numeric code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum LogLevel {
    Panic = 0,
    Fatal = 1,
    Error = 2,
    Warning = 3,
    Notice = 4,
    #[default]
    Info = 5,
    Trace = 6,
    Debug = 7,
}

impl LogLevel {
    /// All levels, most severe first.
    pub const ALL: [LogLevel; 8] = [
        Self::Panic,
        Self::Fatal,
        Self::Error,
        Self::Warning,
        Self::Notice,
        Self::Info,
        Self::Trace,
        Self::Debug,
    ];

    /// Numeric level code, stored in the `level_code` column.
    pub fn code(&self) -> i64 {
        *self as u8 as i64
    }

    /// Get level name as string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Panic => "PANIC",
            Self::Fatal => "FATAL",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Info => "INFO",
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
        }
    }

    /// Parse level from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PANIC" => Some(Self::Panic),
            "FATAL" | "CRITICAL" => Some(Self::Fatal),
            "ERROR" | "ERR" => Some(Self::Error),
            "WARNING" | "WARN" => Some(Self::Warning),
            "NOTICE" => Some(Self::Notice),
            "INFO" => Some(Self::Info),
            "TRACE" => Some(Self::Trace),
            "DEBUG" => Some(Self::Debug),
            _ => None,
        }
    }

    /// Level for a numeric code.
    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.code() == code)
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

struct LogLevelVisitor;

impl<'de> Visitor<'de> for LogLevelVisitor {
    type Value = LogLevel;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a log level name or a code from 0 to 7")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<LogLevel, E> {
        LogLevel::parse(v).ok_or_else(|| E::invalid_value(Unexpected::Str(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<LogLevel, E> {
        LogLevel::from_code(v).ok_or_else(|| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<LogLevel, E> {
        i64::try_from(v)
            .ok()
            .and_then(LogLevel::from_code)
            .ok_or_else(|| E::invalid_value(Unexpected::Unsigned(v), &self))
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(LogLevelVisitor)
    }
}

/// Name written to the `level` column when a level has no entry.
pub const UNKNOWN_LEVEL: &str = "UNKNOWN";

/// Level name table supplied by the host.
#[derive(Debug, Clone)]
pub struct LevelNames {
    names: HashMap<LogLevel, String>,
}

impl LevelNames {
    /// Empty table; every level resolves to [`UNKNOWN_LEVEL`].
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Override or add the name for a level.
    pub fn with(mut self, level: LogLevel, name: impl Into<String>) -> Self {
        self.names.insert(level, name.into());
        self
    }

    /// Name for `level`, or [`UNKNOWN_LEVEL`] if the table has none.
    pub fn name(&self, level: LogLevel) -> &str {
        match self.names.get(&level) {
            Some(name) if !name.is_empty() => name,
            _ => UNKNOWN_LEVEL,
        }
    }
}

impl Default for LevelNames {
    fn default() -> Self {
        let names = LogLevel::ALL
            .into_iter()
            .map(|l| (l, l.as_str().to_string()))
            .collect();
        Self { names }
    }
}

/// A structured log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    /// Time the record was emitted.
    pub time: DateTime<Utc>,
    /// Severity.
    #[serde(default)]
    pub level: LogLevel,
    /// Project the emitting process belongs to.
    #[serde(default)]
    pub project: String,
    /// Deployment profile (e.g. `prod`, `dev`).
    #[serde(default)]
    pub profile: String,
    /// Node name.
    #[serde(default)]
    pub node: String,
    /// Log message.
    #[serde(default)]
    pub body: String,
    /// Extra structured fields.
    #[serde(default)]
    pub fields: Fields,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    pub fn new(level: LogLevel, body: impl Into<String>) -> Self {
        Self {
            time: Utc::now(),
            level,
            project: String::new(),
            profile: String::new(),
            node: String::new(),
            body: body.into(),
            fields: Fields::new(),
        }
    }

    /// Set the record time.
    pub fn at(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// Set project, profile and node.
    pub fn with_origin(
        mut self,
        project: impl Into<String>,
        profile: impl Into<String>,
        node: impl Into<String>,
    ) -> Self {
        self.project = project.into();
        self.profile = profile.into();
        self.node = node.into();
        self
    }

    /// Attach a structured field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_codes_roundtrip() {
        for level in LogLevel::ALL {
            assert_eq!(LogLevel::from_code(level.code()), Some(level));
        }
        assert_eq!(LogLevel::from_code(99), None);
        assert_eq!(LogLevel::Error.code(), 2);
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(LogLevel::parse("warn"), Some(LogLevel::Warning));
        assert_eq!(LogLevel::parse("Debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_level_names_fallback() {
        let names = LevelNames::empty().with(LogLevel::Error, "ERR");
        assert_eq!(names.name(LogLevel::Error), "ERR");
        assert_eq!(names.name(LogLevel::Info), UNKNOWN_LEVEL);

        let names = LevelNames::default().with(LogLevel::Info, "");
        assert_eq!(names.name(LogLevel::Info), UNKNOWN_LEVEL);
        assert_eq!(names.name(LogLevel::Debug), "DEBUG");
    }

    #[test]
    fn test_record_deserialize_defaults() {
        let rec: LogRecord = serde_json::from_str(
            r#"{"time":"2026-01-02T03:04:05Z","level":"error","body":"boom"}"#,
        )
        .expect("parse record");
        assert_eq!(rec.level, LogLevel::Error);
        assert_eq!(rec.body, "boom");
        assert!(rec.project.is_empty());
        assert!(rec.fields.is_empty());
    }

    #[test]
    fn test_record_deserialize_warn_alias() {
        let rec: LogRecord =
            serde_json::from_str(r#"{"time":"2026-01-02T03:04:05Z","level":"warn"}"#)
                .expect("parse warn record");
        assert_eq!(rec.level, LogLevel::Warning);
    }

    #[test]
    fn test_level_defaults_to_info() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        let rec: LogRecord =
            serde_json::from_str(r#"{"time":"2026-01-02T03:04:05Z"}"#).expect("parse record");
        assert_eq!(rec.level, LogLevel::Info);
    }

    #[test]
    fn test_level_deserialize_any_case_and_code() {
        let parse = |json: &str| serde_json::from_str::<LogLevel>(json);
        assert_eq!(parse(r#""ERROR""#).expect("upper"), LogLevel::Error);
        assert_eq!(parse(r#""Warn""#).expect("mixed"), LogLevel::Warning);
        assert_eq!(parse(r#""critical""#).expect("alias"), LogLevel::Fatal);
        assert_eq!(parse("2").expect("code"), LogLevel::Error);
        assert_eq!(parse("7").expect("code"), LogLevel::Debug);

        assert!(parse(r#""verbose""#).is_err());
        assert!(parse("99").is_err());
        assert!(parse("-1").is_err());
        assert!(parse("true").is_err());
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&LogLevel::Warning).expect("serialize");
        assert_eq!(json, r#""warning""#);
        let back: LogLevel = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, LogLevel::Warning);
    }

    #[test]
    fn test_record_builder() {
        let rec = LogRecord::new(LogLevel::Notice, "hello")
            .with_origin("shop", "prod", "node-1")
            .with_field("user", 7);

        assert_eq!(rec.project, "shop");
        assert_eq!(rec.node, "node-1");
        assert_eq!(rec.fields.get("user"), Some(&serde_json::json!(7)));
    }
}
