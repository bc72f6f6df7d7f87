// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Infrastructure Layer
//!
//! Everything the domain stays ignorant of: configuration loading, the
//! platform and recipe document formats, Prometheus metrics, and the
//! long-lived runtime services (accountant, registry, scoring pool).

pub mod config;
pub mod metrics;
pub mod platform;
pub mod recipe;
pub mod runtime;
