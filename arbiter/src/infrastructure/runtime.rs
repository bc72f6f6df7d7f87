// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Runtime Services
//!
//! Long-lived, shared-mutable services owned by the daemon: the resource
//! accountant, the application registry, and the bounded scoring pool.
//! They are created once at startup and passed around as explicit
//! `Arc` context, never reached through globals.

pub mod accountant;
pub mod registry;
pub mod scoring_pool;

pub use accountant::{AccountantView, ResourceAccountant, TransactionToken};
pub use registry::ApplicationRegistry;
pub use scoring_pool::build_scoring_pool;
