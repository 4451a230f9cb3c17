// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sink errors.

use thiserror::Error;

/// Errors raised while configuring the sink or writing rows.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("GreptimeDB rejected write ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Write timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Unknown driver: {0}")]
    UnknownDriver(String),
}

/// Sink result type.
pub type Result<T> = std::result::Result<T, SinkError>;
