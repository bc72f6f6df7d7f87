// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Goal Gap Value Object
//!
//! Signed percentage distance of an application from its performance
//! goal, as reported by the application itself. Positive means
//! under-performing (the application wants more resources), negative
//! means over-performing (it could give some back), zero means on goal.

use serde::{Deserialize, Serialize};

use crate::error::ArbiterError;

/// Validated goal gap in `[-100, +100]` percent.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "i8", into = "i8")]
pub struct GoalGap(i8);

impl GoalGap {
    pub fn new(percent: i8) -> Result<Self, ArbiterError> {
        if !(-100..=100).contains(&percent) {
            return Err(ArbiterError::InvalidConfiguration(format!(
                "goal gap {} out of range [-100, 100]",
                percent
            )));
        }
        Ok(GoalGap(percent))
    }

    /// The application is on its goal.
    pub fn on_goal() -> Self {
        GoalGap(0)
    }

    pub fn percent(&self) -> i8 {
        self.0
    }

    /// Gap as a signed fraction in `[-1.0, 1.0]`.
    pub fn as_fraction(&self) -> f32 {
        f32::from(self.0) / 100.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Positive gap, the application is under-performing.
    pub fn is_under_performing(&self) -> bool {
        self.0 > 0
    }
}

impl TryFrom<i8> for GoalGap {
    type Error = ArbiterError;

    fn try_from(percent: i8) -> Result<Self, Self::Error> {
        GoalGap::new(percent)
    }
}

impl From<GoalGap> for i8 {
    fn from(gap: GoalGap) -> i8 {
        gap.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(GoalGap::new(100).is_ok());
        assert!(GoalGap::new(-100).is_ok());
        assert!(GoalGap::new(101).is_err());
        assert!(GoalGap::new(-101).is_err());
    }

    #[test]
    fn test_fraction() {
        assert_eq!(GoalGap::new(50).unwrap().as_fraction(), 0.5);
        assert_eq!(GoalGap::new(-25).unwrap().as_fraction(), -0.25);
        assert!(GoalGap::on_goal().is_zero());
    }
}
