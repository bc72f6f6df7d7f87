// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Value Object
//!
//! The closed result enumeration reported by the daemon control surface.
//! Internally the arbiter works with [`ArbiterError`] values; at the
//! control boundary every outcome collapses into one of these codes so
//! host integrations never see an open-ended error type.

use serde::{Deserialize, Serialize};

use crate::error::ArbiterError;

/// Control-surface result codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitCode {
    /// Operation completed.
    Ok,
    /// The application declared no working mode.
    NoWorkingMode,
    /// The application is not registered.
    NotRegistered,
    /// An application with the same id is already registered.
    Duplicate,
    /// No working-mode grant could be produced for the application.
    GrantFailed,
    /// The synchronization acknowledgement was refused.
    SyncFailed,
    /// The scheduling cycle exceeded its budget.
    Timeout,
    /// Client and daemon speak different protocol versions.
    VersionMismatch,
    /// A reservation would exceed resource capacity.
    OverCapacity,
}

impl From<&ArbiterError> for ExitCode {
    fn from(error: &ArbiterError) -> Self {
        match error {
            ArbiterError::NoWorkingMode(_) => ExitCode::NoWorkingMode,
            ArbiterError::NotRegistered(_) => ExitCode::NotRegistered,
            ArbiterError::DuplicateApplication(_) => ExitCode::Duplicate,
            ArbiterError::PolicyExhaustion(_) | ArbiterError::ScheduleFailed(_) => {
                ExitCode::GrantFailed
            }
            ArbiterError::SyncRefused(_) | ArbiterError::InvalidTransition(_) => {
                ExitCode::SyncFailed
            }
            ArbiterError::Timeout(_) => ExitCode::Timeout,
            ArbiterError::VersionMismatch(_) => ExitCode::VersionMismatch,
            ArbiterError::OverCapacity(_) => ExitCode::OverCapacity,
            _ => ExitCode::GrantFailed,
        }
    }
}

impl ExitCode {
    pub fn is_ok(&self) -> bool {
        matches!(self, ExitCode::Ok)
    }
}
