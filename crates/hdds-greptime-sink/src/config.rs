// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GreptimeDB connection settings.
//!
//! The host passes driver settings as a loosely typed map. Keys are read
//! leniently: a value of the wrong type is ignored and the default stays.
//!
//! ```yaml
//! host: greptime.internal
//! port: 4000
//! user: writer
//! pass: secret
//! db: public
//! table: logs
//! timeout: 500ms
//! tls: true
//! ```

use crate::error::{Result, SinkError};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Driver settings map handed over by the host.
pub type Settings = serde_json::Map<String, Value>;

/// Default GreptimeDB HTTP port.
pub const DEFAULT_PORT: u16 = 4000;

/// Default write timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolved connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreptimeSetting {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub table: String,
    pub timeout: Duration,
    /// Plain HTTP when true, HTTPS otherwise.
    pub insecure: bool,
}

impl Default for GreptimeSetting {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            username: String::new(),
            password: String::new(),
            database: "public".to_string(),
            table: "logs".to_string(),
            timeout: DEFAULT_TIMEOUT,
            insecure: true,
        }
    }
}

impl GreptimeSetting {
    /// Resolve settings from a host settings map, falling back to defaults.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut s = Self::default();

        if let Some(v) = get_string(settings, "host").filter(|v| !v.is_empty()) {
            s.host = v.to_string();
        }
        if let Some(v) = get_string(settings, "server").filter(|v| !v.is_empty()) {
            s.host = v.to_string();
        }
        if let Some(v) = get_int(settings, "port").filter(|v| *v > 0) {
            // Out of range ports keep the default
            if let Ok(port) = u16::try_from(v) {
                s.port = port;
            }
        }
        if let Some(v) = get_string(settings, "username") {
            s.username = v.to_string();
        }
        if let Some(v) = get_string(settings, "user") {
            if s.username.is_empty() {
                s.username = v.to_string();
            }
        }
        if let Some(v) = get_string(settings, "password") {
            s.password = v.to_string();
        }
        if let Some(v) = get_string(settings, "pass") {
            if s.password.is_empty() {
                s.password = v.to_string();
            }
        }
        if let Some(v) = get_string(settings, "database").filter(|v| !v.is_empty()) {
            s.database = v.to_string();
        }
        if let Some(v) = get_string(settings, "db").filter(|v| !v.is_empty()) {
            s.database = v.to_string();
        }
        if let Some(v) = get_string(settings, "table").filter(|v| !v.is_empty()) {
            s.table = v.to_string();
        }
        if let Some(v) = get_duration(settings, "timeout").filter(|v| !v.is_zero()) {
            s.timeout = v;
        }
        if let Some(v) = get_bool(settings, "insecure") {
            s.insecure = v;
        }
        if let Some(v) = get_bool(settings, "tls") {
            s.insecure = !v;
        }

        s
    }

    /// Parse settings from a YAML mapping.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings = parse_settings_yaml(yaml)?;
        Ok(Self::from_settings(&settings))
    }

    /// Parse settings from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// URL scheme implied by `insecure`.
    pub fn scheme(&self) -> &'static str {
        if self.insecure {
            "http"
        } else {
            "https"
        }
    }

    /// InfluxDB-compatible write endpoint for this database.
    pub fn endpoint(&self) -> String {
        format!(
            "{}://{}:{}/v1/influxdb/api/v2/write?db={}&precision=ns",
            self.scheme(),
            self.host,
            self.port,
            self.database
        )
    }
}

/// Parse a YAML document into a host settings map.
///
/// An empty document yields an empty map.
pub fn parse_settings_yaml(yaml: &str) -> Result<Settings> {
    let value: Option<Value> = serde_yaml::from_str(yaml)?;
    match value {
        Some(Value::Object(map)) => Ok(map),
        Some(Value::Null) | None => Ok(Settings::new()),
        Some(_) => Err(SinkError::Config(
            "settings must be a YAML mapping".to_string(),
        )),
    }
}

fn get_string<'a>(m: &'a Settings, key: &str) -> Option<&'a str> {
    m.get(key)?.as_str()
}

fn get_bool(m: &Settings, key: &str) -> Option<bool> {
    m.get(key)?.as_bool()
}

fn get_int(m: &Settings, key: &str) -> Option<i64> {
    match m.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Numbers are seconds, strings are durations like `"1m30s"`.
fn get_duration(m: &Settings, key: &str) -> Option<Duration> {
    match m.get(key)? {
        Value::Number(n) => {
            let secs = n.as_f64()?;
            Duration::try_from_secs_f64(secs).ok()
        }
        Value::String(s) => parse_duration(s),
        _ => None,
    }
}

/// Parse a duration string like `"500ms"`, `"5s"`, `"1m30s"`, `"1.5h"`.
///
/// Units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. Every number needs a unit,
/// except a bare `"0"`.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s == "0" {
        return Some(Duration::ZERO);
    }
    if s.is_empty() {
        return None;
    }

    let mut total = 0f64;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if num_len == 0 {
            return None;
        }
        let value: f64 = rest[..num_len].parse().ok()?;
        rest = &rest[num_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let nanos_per_unit = match &rest[..unit_len] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return None,
        };
        rest = &rest[unit_len..];
        total += value * nanos_per_unit;
    }

    if !total.is_finite() || total >= u64::MAX as f64 {
        return None;
    }
    Some(Duration::from_nanos(total.round() as u64))
}
