// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Value Contribution
//!
//! Scores how desirable the candidate working mode is relative to the
//! application's performance goal.
//!
//! Without a current working mode, or with the application exactly on
//! its goal, the index is simply the candidate's static value. Otherwise
//! an *ideal* value is derived by scaling the current working mode's
//! value with the goal gap, and candidates are rewarded for being close
//! to that ideal:
//!
//! ```text
//! weight = 1           when gap > 0 (under-performing, push up hard)
//! weight = nap_weight  when gap < 0 (over-performing, demote gently)
//! ideal  = v_current * (1 + weight / (1 + gap))
//! index  = 1 - min(1, |v_candidate - ideal|)
//! ```
//!
//! `nap_weight` tunes how aggressively over-performance pulls the
//! application down; it is configured as a percentage and clamped.

use crate::services::binding::Candidate;
use crate::services::contribution::Contribution;
use crate::services::resource_view::ResourceView;

/// Default goal-gap weight, in percent.
pub const DEFAULT_NAP_WEIGHT_PERCENT: u16 = 50;

/// Goal-gap driven working-mode value index.
#[derive(Debug, Clone)]
pub struct ValueContribution {
    nap_weight: f32,
}

impl ValueContribution {
    /// Build from a percentage input. Values above 100 fall back to the
    /// default, mirroring how the configuration layer treats them.
    pub fn new(nap_weight_percent: u16) -> Self {
        let percent = if nap_weight_percent > 100 {
            DEFAULT_NAP_WEIGHT_PERCENT
        } else {
            nap_weight_percent
        };
        Self {
            nap_weight: f32::from(percent) / 100.0,
        }
    }

    pub fn nap_weight(&self) -> f32 {
        self.nap_weight
    }
}

impl Default for ValueContribution {
    fn default() -> Self {
        Self::new(DEFAULT_NAP_WEIGHT_PERCENT)
    }
}

impl Contribution for ValueContribution {
    fn name(&self) -> &'static str {
        "value"
    }

    fn compute(&self, candidate: &Candidate, _view: &dyn ResourceView) -> f32 {
        let v_eval = candidate.wm_value;
        let gap = candidate.app.goal_gap.as_fraction();

        let Some(current) = &candidate.app.current else {
            return v_eval;
        };
        if gap == 0.0 {
            return v_eval;
        }

        let weight = if gap > 0.0 { 1.0 } else { self.nap_weight };
        let ideal = current.value * (1.0 + weight / (1.0 + gap));
        let delta = (v_eval - ideal).abs();
        1.0 - delta.min(1.0)
    }
}
