// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! GreptimeDB connection: turns batches of log records into rows and
//! writes them through a [`Transport`].

use crate::config::GreptimeSetting;
use crate::error::{Result, SinkError};
use crate::line_protocol::LineProtocolWriter;
use crate::record::{LevelNames, LogRecord};
use crate::schema::TableSchema;
use crate::timestamp::{unix_nanos, TimestampAllocator};
use crate::transport::{HttpTransport, Transport};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Connection statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Rows accepted by the database.
    pub rows_written: u64,
    /// Batches accepted by the database.
    pub batches_written: u64,
    /// Batches that failed to encode or send.
    pub write_errors: u64,
}

#[derive(Debug, Default)]
struct Counters {
    rows_written: AtomicU64,
    batches_written: AtomicU64,
    write_errors: AtomicU64,
}

/// A log sink connection to one GreptimeDB table.
///
/// `write` may be called from many threads at once; every row gets a
/// timestamp from the connection's own [`TimestampAllocator`], so rows
/// written through one connection never share a timestamp.
pub struct GreptimeConnection {
    setting: GreptimeSetting,
    levels: LevelNames,
    allocator: TimestampAllocator,
    transport: RwLock<Option<Arc<dyn Transport>>>,
    counters: Counters,
}

impl GreptimeConnection {
    /// Create an unopened connection.
    pub fn new(setting: GreptimeSetting, levels: LevelNames) -> Self {
        Self {
            setting,
            levels,
            allocator: TimestampAllocator::new(),
            transport: RwLock::new(None),
            counters: Counters::default(),
        }
    }

    /// Resolved settings.
    pub fn setting(&self) -> &GreptimeSetting {
        &self.setting
    }

    /// Open the HTTP write path.
    pub fn open(&self) -> Result<()> {
        let transport = HttpTransport::new(&self.setting)?;
        tracing::info!(
            endpoint = %transport.endpoint(),
            table = %self.setting.table,
            "Opened GreptimeDB connection"
        );
        self.open_with(Arc::new(transport));
        Ok(())
    }

    /// Open with a caller-supplied transport.
    pub fn open_with(&self, transport: Arc<dyn Transport>) {
        *self.transport.write() = Some(transport);
    }

    /// Release the transport. Later writes are no-ops.
    pub fn close(&self) -> Result<()> {
        if self.transport.write().take().is_some() {
            tracing::debug!(table = %self.setting.table, "Closed GreptimeDB connection");
        }
        Ok(())
    }

    /// Check whether the connection is open.
    pub fn is_open(&self) -> bool {
        self.transport.read().is_some()
    }

    /// Write a batch of records as one request.
    ///
    /// Does nothing when the connection is closed or `logs` is empty. The
    /// batch is fully encoded before anything is sent, so an encoding error
    /// writes no rows.
    pub fn write(&self, logs: &[LogRecord]) -> Result<()> {
        if logs.is_empty() {
            return Ok(());
        }
        let Some(transport) = self.transport.read().clone() else {
            return Ok(());
        };

        let body = match self.encode(logs) {
            Ok(body) => body,
            Err(e) => {
                self.counters.write_errors.fetch_add(1, Ordering::Relaxed);
                return Err(e);
            }
        };

        match transport.write(&body) {
            Ok(()) => {
                self.counters
                    .rows_written
                    .fetch_add(logs.len() as u64, Ordering::Relaxed);
                self.counters.batches_written.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    rows = logs.len(),
                    table = %self.setting.table,
                    "Wrote log batch"
                );
                Ok(())
            }
            Err(e) => {
                self.counters.write_errors.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    rows = logs.len(),
                    table = %self.setting.table,
                    "GreptimeDB write failed: {}",
                    e
                );
                Err(e)
            }
        }
    }

    /// Get connection statistics.
    pub fn stats(&self) -> ConnectionStats {
        ConnectionStats {
            rows_written: self.counters.rows_written.load(Ordering::Relaxed),
            batches_written: self.counters.batches_written.load(Ordering::Relaxed),
            write_errors: self.counters.write_errors.load(Ordering::Relaxed),
        }
    }

    /// Last timestamp issued to a row.
    pub fn last_timestamp(&self) -> i64 {
        self.allocator.last_issued()
    }

    fn encode(&self, logs: &[LogRecord]) -> Result<String> {
        let schema = TableSchema::new(self.setting.table.as_str())?;
        // Reject the whole batch before any timestamp is issued
        let candidates = logs
            .iter()
            .map(|record| {
                unix_nanos(record.time).ok_or_else(|| {
                    SinkError::Schema(format!(
                        "record time {} is outside the nanosecond range",
                        record.time
                    ))
                })
            })
            .collect::<Result<Vec<i64>>>()?;

        let mut writer = LineProtocolWriter::new();
        for (record, candidate) in logs.iter().zip(candidates) {
            let time = self.allocator.allocate(candidate);
            let row = schema.row(record, self.levels.name(record.level), time);
            schema.encode(&mut writer, &row)?;
        }
        Ok(writer.finish())
    }
}
