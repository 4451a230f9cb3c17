// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HDDS GreptimeDB Log Sink CLI
//!
//! Streams JSON-lines log records into a GreptimeDB table.
//!
//! # Usage
//!
//! ```bash
//! # Ship a log file using a settings file
//! hdds-greptime-sink --config sink.yaml --input app.jsonl
//!
//! # Pipe from another process, overriding the target table
//! tail -F app.jsonl | hdds-greptime-sink --host 10.0.0.5 --table app_logs
//!
//! # Print the Line Protocol instead of sending it
//! hdds-greptime-sink --input app.jsonl --dry-run
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use hdds_greptime_sink::config::parse_settings_yaml;
use hdds_greptime_sink::{
    Connection, DriverRegistry, GreptimeConnection, GreptimeSetting, Instance, LevelNames,
    LogRecord, Settings, StdoutTransport, GREPTIME_DRIVER,
};
use serde_json::Value;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "hdds-greptime-sink")]
#[command(author = "naskel.com")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Persist HDDS log records into GreptimeDB")]
#[command(long_about = None)]
struct Cli {
    /// YAML settings file (host, port, user, pass, db, table, timeout, tls)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSON-lines input file (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// GreptimeDB host
    #[arg(long)]
    host: Option<String>,

    /// GreptimeDB HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Target database
    #[arg(long)]
    database: Option<String>,

    /// Target table
    #[arg(long)]
    table: Option<String>,

    /// Records per write request
    #[arg(short, long, default_value = "100")]
    batch: usize,

    /// Print Line Protocol to stdout instead of writing to GreptimeDB
    #[arg(long)]
    dry_run: bool,

    /// Verbose mode (show internal logs)
    #[arg(short, long)]
    verbose: bool,
}

/// Counters reported on exit.
#[derive(Debug, Default)]
struct RunStats {
    records_written: u64,
    lines_skipped: u64,
    failed_batches: u64,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("hdds_greptime_sink=debug")
    } else {
        EnvFilter::new("hdds_greptime_sink=info")
    };
    // Internal logs go to stderr so --dry-run output stays clean
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    if cli.batch == 0 {
        bail!("--batch must be at least 1");
    }

    let settings = build_settings(&cli)?;
    let setting = GreptimeSetting::from_settings(&settings);

    tracing::info!(
        host = %setting.host,
        port = setting.port,
        database = %setting.database,
        table = %setting.table,
        dry_run = cli.dry_run,
        "Starting GreptimeDB log sink"
    );

    let conn: Box<dyn Connection> = if cli.dry_run {
        let conn = GreptimeConnection::new(setting, LevelNames::default());
        conn.open_with(Arc::new(StdoutTransport));
        Box::new(conn)
    } else {
        let registry = DriverRegistry::with_defaults();
        let conn = registry
            .connect(GREPTIME_DRIVER, &Instance::new("cli", settings))
            .context("Failed to create GreptimeDB connection")?;
        conn.open().context("Failed to open GreptimeDB connection")?;
        conn
    };

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let stats = pump(reader, conn.as_ref(), cli.batch)?;
    conn.close().context("Failed to close GreptimeDB connection")?;

    tracing::info!(
        records_written = stats.records_written,
        lines_skipped = stats.lines_skipped,
        failed_batches = stats.failed_batches,
        "Log sink finished"
    );

    if stats.failed_batches > 0 {
        bail!("{} batch(es) failed to write", stats.failed_batches);
    }
    Ok(())
}

/// Merge the settings file with command-line overrides.
fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_settings_yaml(&yaml)
                .with_context(|| format!("Invalid settings in {}", path.display()))?
        }
        None => Settings::new(),
    };

    if let Some(host) = &cli.host {
        // "server" takes precedence over "host" when both are set
        settings.remove("server");
        settings.insert("host".to_string(), Value::from(host.as_str()));
    }
    if let Some(port) = cli.port {
        settings.insert("port".to_string(), Value::from(port));
    }
    if let Some(database) = &cli.database {
        settings.remove("db");
        settings.insert("database".to_string(), Value::from(database.as_str()));
    }
    if let Some(table) = &cli.table {
        settings.insert("table".to_string(), Value::from(table.as_str()));
    }

    Ok(settings)
}

/// Read records line by line and write them in batches.
fn pump(reader: impl BufRead, conn: &dyn Connection, batch_size: usize) -> Result<RunStats> {
    let mut stats = RunStats::default();
    let mut batch = Vec::with_capacity(batch_size);

    for (idx, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<LogRecord>(line) {
            Ok(record) => batch.push(record),
            Err(e) => {
                tracing::warn!("Skipping line {}: {}", idx + 1, e);
                stats.lines_skipped += 1;
                continue;
            }
        }

        if batch.len() >= batch_size {
            flush(conn, &mut batch, &mut stats);
        }
    }
    flush(conn, &mut batch, &mut stats);

    Ok(stats)
}

fn flush(conn: &dyn Connection, batch: &mut Vec<LogRecord>, stats: &mut RunStats) {
    if batch.is_empty() {
        return;
    }
    match conn.write(batch) {
        Ok(()) => stats.records_written += batch.len() as u64,
        Err(e) => {
            tracing::warn!(rows = batch.len(), "Dropping batch: {}", e);
            stats.failed_batches += 1;
        }
    }
    batch.clear();
}
