// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Bootstrap Module
//!
//! The bootstrap crate sits outside the application layers (domain,
//! application, infrastructure) and owns entry-point concerns:
//!
//! - **Argument parsing** - the daemon CLI
//! - **Logging initialization** - tracing subscriber setup and the
//!   pre-init [`BootstrapLogger`] abstraction
//! - **Signal handling** - SIGTERM/SIGINT to a cooperative
//!   [`CancellationToken`], with a bounded grace period
//!
//! Nothing in here knows about scheduling; the daemon binary wires the
//! pieces together as its composition root.
//!
//! [`BootstrapLogger`]: logger::BootstrapLogger
//! [`CancellationToken`]: shutdown::CancellationToken

pub mod cli;
pub mod logger;
pub mod shutdown;

pub use cli::DaemonArgs;
pub use logger::{init_tracing, BootstrapLogger, ConsoleLogger};
pub use shutdown::{CancellationToken, ShutdownCoordinator};
