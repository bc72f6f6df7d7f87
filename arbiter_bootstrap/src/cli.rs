// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Daemon Command Line
//!
//! Argument parsing for the arbiter daemon. Parsing and validation are
//! split: clap produces the raw arguments, `validate` checks that the
//! referenced files exist before the daemon starts wiring services.

use std::path::PathBuf;

use clap::Parser;

/// Run-time resource arbiter daemon.
#[derive(Debug, Clone, Parser)]
#[command(name = "resource_arbiter", version, about)]
pub struct DaemonArgs {
    /// Platform description file (TOML).
    #[arg(long, short = 'p')]
    pub platform: PathBuf,

    /// Daemon configuration file (TOML). Defaults apply when omitted.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Workload manifest registering applications at startup (TOML).
    #[arg(long, short = 'w')]
    pub workload: Option<PathBuf>,

    /// Run this many scheduling cycles, print the plan, and exit.
    /// Without it the daemon runs until SIGINT/SIGTERM.
    #[arg(long)]
    pub cycles: Option<u32>,

    /// Default log filter when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl DaemonArgs {
    /// Check that every referenced file exists.
    pub fn validate(&self) -> Result<(), String> {
        for (label, path) in [
            ("platform", Some(&self.platform)),
            ("config", self.config.as_ref()),
            ("workload", self.workload.as_ref()),
        ] {
            if let Some(path) = path {
                if !path.is_file() {
                    return Err(format!("{} file '{}' not found", label, path.display()));
                }
            }
        }
        Ok(())
    }
}
