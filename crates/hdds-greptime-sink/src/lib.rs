// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS GreptimeDB Log Sink
//!
//! Persists structured log records into a GreptimeDB table.
//!
//! This crate provides:
//! - Lenient settings resolution from the host's key/value map or YAML
//! - A fixed log table layout (3 tags, 4 fields, nanosecond time index)
//! - Line Protocol encoding and a blocking HTTP write path
//! - Per-connection monotonic timestamps, so rows never collide on the
//!   time index even when many threads log in the same nanosecond
//!
//! # Overview
//!
//! ```text
//! LogRecord --> TimestampAllocator --> TableSchema::row --> LineProtocolWriter --> Transport
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use hdds_greptime_sink::{DriverRegistry, Instance, LogLevel, LogRecord, GREPTIME_DRIVER};
//!
//! let registry = DriverRegistry::with_defaults();
//! let conn = registry.connect(GREPTIME_DRIVER, &Instance::new("app", settings))?;
//! conn.open()?;
//! conn.write(&[LogRecord::new(LogLevel::Info, "service started")])?;
//! conn.close()?;
//! ```

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod fields;
pub mod line_protocol;
pub mod record;
pub mod schema;
pub mod timestamp;
pub mod transport;

pub use config::{GreptimeSetting, Settings};
pub use connection::{ConnectionStats, GreptimeConnection};
pub use driver::{Connection, Driver, DriverRegistry, GreptimeDriver, Instance, GREPTIME_DRIVER};
pub use error::{Result, SinkError};
pub use record::{LevelNames, LogLevel, LogRecord};
pub use timestamp::TimestampAllocator;
pub use transport::{HttpTransport, StdoutTransport, Transport};
