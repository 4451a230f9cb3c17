// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Log driver plumbing: the seam between a host logger and its sinks.
//!
//! The host owns a [`DriverRegistry`], looks drivers up by name and hands
//! each one an [`Instance`] describing the configured sink.

use crate::config::{GreptimeSetting, Settings};
use crate::connection::GreptimeConnection;
use crate::error::{Result, SinkError};
use crate::record::{LevelNames, LogRecord};
use std::collections::HashMap;
use std::sync::Arc;

/// Name the GreptimeDB driver registers under.
pub const GREPTIME_DRIVER: &str = "greptime";

/// A configured sink instance, as handed over by the host.
#[derive(Debug, Clone, Default)]
pub struct Instance {
    /// Instance name (for diagnostics).
    pub name: String,
    /// Driver settings.
    pub settings: Settings,
    /// Level name table.
    pub levels: LevelNames,
}

impl Instance {
    /// Create an instance with default level names.
    pub fn new(name: impl Into<String>, settings: Settings) -> Self {
        Self {
            name: name.into(),
            settings,
            levels: LevelNames::default(),
        }
    }
}

/// An open-able log sink connection.
pub trait Connection: Send + Sync {
    /// Acquire resources needed for writing.
    fn open(&self) -> Result<()>;
    /// Release resources. Writes after close are no-ops.
    fn close(&self) -> Result<()>;
    /// Persist a batch of log records.
    fn write(&self, logs: &[LogRecord]) -> Result<()>;
}

/// Factory for connections.
pub trait Driver: Send + Sync {
    /// Build an unopened connection for `instance`.
    fn connect(&self, instance: &Instance) -> Result<Box<dyn Connection>>;
}

/// GreptimeDB driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreptimeDriver;

impl Driver for GreptimeDriver {
    fn connect(&self, instance: &Instance) -> Result<Box<dyn Connection>> {
        let setting = GreptimeSetting::from_settings(&instance.settings);
        tracing::debug!(
            instance = %instance.name,
            host = %setting.host,
            port = setting.port,
            database = %setting.database,
            table = %setting.table,
            "Resolved GreptimeDB settings"
        );
        Ok(Box::new(GreptimeConnection::new(
            setting,
            instance.levels.clone(),
        )))
    }
}

impl Connection for GreptimeConnection {
    fn open(&self) -> Result<()> {
        GreptimeConnection::open(self)
    }

    fn close(&self) -> Result<()> {
        GreptimeConnection::close(self)
    }

    fn write(&self, logs: &[LogRecord]) -> Result<()> {
        GreptimeConnection::write(self, logs)
    }
}

/// Name to driver map.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn Driver>>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in drivers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_default();
        registry
    }

    /// Register the GreptimeDB driver.
    pub fn register_default(&mut self) {
        self.register(GREPTIME_DRIVER, GreptimeDriver);
    }

    /// Register (or replace) a driver.
    pub fn register(&mut self, name: impl Into<String>, driver: impl Driver + 'static) {
        let name = name.into();
        if self.drivers.insert(name.clone(), Arc::new(driver)).is_some() {
            tracing::warn!("Replaced log driver '{}'", name);
        }
    }

    /// Look up a driver.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers.get(name).cloned()
    }

    /// Registered driver names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a connection with the named driver.
    pub fn connect(&self, name: &str, instance: &Instance) -> Result<Box<dyn Connection>> {
        let driver = self
            .get(name)
            .ok_or_else(|| SinkError::UnknownDriver(name.to_string()))?;
        driver.connect(instance)
    }
}
