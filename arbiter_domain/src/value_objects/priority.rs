// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Priority Value Object
//!
//! Scheduling priority level. Zero is the most important level and the
//! scheduler walks levels in ascending numeric order, so an application
//! at level 0 is always served before one at level 1.

use serde::{Deserialize, Serialize};

use crate::error::ArbiterError;

/// Number of distinct priority levels the scheduler iterates.
pub const PRIORITY_LEVELS: u8 = 16;

/// Validated priority level, `0` (highest) to `PRIORITY_LEVELS - 1`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Priority(u8);

impl Priority {
    /// The most important level.
    pub fn highest() -> Self {
        Priority(0)
    }

    pub fn new(level: u8) -> Result<Self, ArbiterError> {
        if level >= PRIORITY_LEVELS {
            return Err(ArbiterError::InvalidConfiguration(format!(
                "priority {} out of range 0..{}",
                level, PRIORITY_LEVELS
            )));
        }
        Ok(Priority(level))
    }

    pub fn level(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Priority {
    type Error = ArbiterError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Priority::new(level)
    }
}

impl From<Priority> for u8 {
    fn from(priority: Priority) -> u8 {
        priority.0
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
