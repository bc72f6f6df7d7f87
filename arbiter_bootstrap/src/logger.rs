// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Logger
//!
//! Logging for the bootstrap phase, before and after the tracing
//! subscriber exists. `init_tracing` installs the global subscriber
//! once; the [`BootstrapLogger`] trait gives bootstrap code a minimal,
//! testable logging seam that routes through tracing.

use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `level` is the default
/// directive; `RUST_LOG` still wins when set. Calling this twice is an
/// error surfaced as a plain message, not a panic.
pub fn init_tracing(level: &str) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| format!("bad log filter '{}': {}", level, e))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| format!("tracing init: {}", e))
}

/// Minimal logging abstraction for bootstrap operations.
pub trait BootstrapLogger: Send + Sync {
    /// Fatal bootstrap errors, about to terminate.
    fn error(&self, message: &str);

    /// Non-fatal issues (missing optional config and the like).
    fn warn(&self, message: &str);

    /// Normal bootstrap progress.
    fn info(&self, message: &str);

    /// Detailed diagnostics.
    fn debug(&self, message: &str);
}

/// Console logger routing through the tracing crate.
pub struct ConsoleLogger {
    prefix: String,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::with_prefix("bootstrap")
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl BootstrapLogger for ConsoleLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!(target: "bootstrap", "[{}] {}", self.prefix, message);
    }
}
