// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Domain Error System
//!
//! A single, hierarchical error enumeration for the arbiter domain. Every
//! failure crossing a service boundary is a first-class value of this
//! type; nothing in the scheduling core unwinds.
//!
//! ## Error Categories
//!
//! - **Input errors** - malformed recipes, unknown resource paths,
//!   invalid configuration. Surfaced to the caller, never fatal to the
//!   daemon.
//! - **Scheduling errors** - capacity rejections (local to a candidate),
//!   policy exhaustion (local to an application), cycle aborts and
//!   timeouts (local to a cycle).
//! - **Life-cycle errors** - invalid application state transitions,
//!   duplicate or missing registrations, refused synchronizations.
//! - **Fatal errors** - accounting corruption detected by the invariant
//!   audit. The daemon refuses further cycles once one is seen.

use thiserror::Error;

/// Domain-specific errors for the resource arbiter.
///
/// Each variant carries a descriptive message. Variants are grouped by
/// how the scheduler reacts to them: skipped candidate, blocked
/// application, aborted cycle, or poisoned daemon.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArbiterError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid recipe: {0}")]
    InvalidRecipe(String),

    #[error("Invalid resource path: {0}")]
    InvalidPath(String),

    #[error("Unknown resource path: {0}")]
    UnknownPath(String),

    #[error("Over capacity: {0}")]
    OverCapacity(String),

    #[error("Invalid state transition: {0}")]
    InvalidTransition(String),

    #[error("Application not registered: {0}")]
    NotRegistered(String),

    #[error("Application already registered: {0}")]
    DuplicateApplication(String),

    #[error("No working mode declared: {0}")]
    NoWorkingMode(String),

    #[error("No valid placement: {0}")]
    PolicyExhaustion(String),

    #[error("Scheduling cycle failed: {0}")]
    ScheduleFailed(String),

    #[error("Cycle budget exceeded: {0}")]
    Timeout(String),

    #[error("Protocol version mismatch: {0}")]
    VersionMismatch(String),

    #[error("Synchronization refused: {0}")]
    SyncRefused(String),

    #[error("Transaction token unavailable: {0}")]
    TokenInUse(String),

    #[error("Resource accounting corrupted: {0}")]
    Corrupted(String),

    #[error("Metrics error: {0}")]
    MetricsError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ArbiterError {
    /// Convenience constructor for metrics registration failures.
    pub fn metrics_error(message: impl Into<String>) -> Self {
        ArbiterError::MetricsError(message.into())
    }

    /// Convenience constructor for internal invariant breaks that are not
    /// accounting corruption.
    pub fn internal(message: impl Into<String>) -> Self {
        ArbiterError::InternalError(message.into())
    }

    /// True when the error must stop the daemon from running any further
    /// scheduling cycles.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ArbiterError::Corrupted(_))
    }

    /// True when the error is local to a single candidate evaluation and
    /// the selection loop may simply move on to the next candidate.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            ArbiterError::OverCapacity(_) | ArbiterError::UnknownPath(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_context() {
        let err = ArbiterError::OverCapacity("sys0.cpu0.pe requires 4, 2 free".to_string());
        assert!(err.to_string().contains("Over capacity"));
        assert!(err.to_string().contains("sys0.cpu0.pe"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(ArbiterError::Corrupted("node sys0.mem0".into()).is_fatal());
        assert!(!ArbiterError::Timeout("budget 500ms".into()).is_fatal());
    }

    #[test]
    fn test_local_classification() {
        assert!(ArbiterError::OverCapacity("pe".into()).is_local());
        assert!(!ArbiterError::ScheduleFailed("audit".into()).is_local());
    }
}
