// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Resource Arbiter
//!
//! Run-time resource arbiter for heterogeneous multi-core platforms.
//! Applications register a catalogue of working modes (operating points
//! declaring resource requests and a relative value); the arbiter
//! decides, cycle after cycle, which working mode each application runs
//! in and which binding domain (CPU socket, accelerator) hosts it.
//!
//! ## Architecture Overview
//!
//! The crate follows Clean Architecture and Domain-Driven Design:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Application Layer                          │
//! │  (SchedulerCore cycle protocol, ArbiterControl surface)     │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Domain Layer                             │
//! │  (resource-arbiter-domain: paths, applications, working     │
//! │   modes, contributions, aggregation)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                                │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                Infrastructure Layer                         │
//! │  (ResourceAccountant, ApplicationRegistry, configuration,   │
//! │   platform/recipe documents, Prometheus metrics)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Scheduling Cycle
//!
//! 1. freeze the registry, open an accounting transaction
//! 2. per priority level (0 first): init contributions, enumerate
//!    `(application, working mode, binding domain)` candidates, score
//!    them in parallel, reserve the winners greedily
//! 3. commit the transaction atomically; winners synchronize into their
//!    new working modes, losers are blocked until a later cycle frees
//!    capacity

pub mod application;
pub mod infrastructure;

pub use application::services::{
    build_aggregator, ArbiterControl, CycleOutcome, RegistrationRequest, SchedulerCore,
    CONTROL_PROTOCOL_VERSION,
};
pub use infrastructure::config::ArbiterConfig;
pub use infrastructure::metrics::MetricsService;
pub use infrastructure::platform::PlatformDescription;
pub use infrastructure::recipe::{load_recipe, parse_recipe};
pub use infrastructure::runtime::{ApplicationRegistry, ResourceAccountant, TransactionToken};
