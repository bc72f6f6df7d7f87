// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Reconfiguration Contribution
//!
//! Penalizes working-mode changes and, more strongly, binding-domain
//! migrations. A candidate that keeps the application exactly where it
//! is costs nothing and scores 1.0. Otherwise the cost is the fraction
//! of each requested resource relative to its total, summed over the
//! request vector and normalized by the number of resource types; a
//! migration amplifies the cost through the migration factor:
//!
//! ```text
//! cost  = sum(amount / total(request))
//! index = 1 - (1 + migrating * factor) / (1 + factor) * cost / type_count
//! ```
//!
//! The request vector can span more leaves than there are resource
//! types, which lets the normalized cost exceed 1; the index is clamped
//! to `[0, 1]` rather than left to wrap.

use crate::services::binding::Candidate;
use crate::services::contribution::Contribution;
use crate::services::resource_view::ResourceView;

/// Default migration cost factor.
pub const DEFAULT_MIGRATION_FACTOR: u16 = 5;

/// Mode-change and migration cost index.
#[derive(Debug, Clone)]
pub struct ReconfigContribution {
    migration_factor: f32,
}

impl ReconfigContribution {
    pub fn new(migration_factor: u16) -> Self {
        Self {
            migration_factor: f32::from(migration_factor),
        }
    }
}

impl Default for ReconfigContribution {
    fn default() -> Self {
        Self::new(DEFAULT_MIGRATION_FACTOR)
    }
}

impl Contribution for ReconfigContribution {
    fn name(&self) -> &'static str {
        "reconfig"
    }

    fn compute(&self, candidate: &Candidate, view: &dyn ResourceView) -> f32 {
        let migrating = candidate.is_migrating();
        if !migrating && !candidate.is_reconfiguring() {
            // Also covers applications without a current mode: starting
            // fresh is not a reconfiguration.
            return 1.0;
        }

        let mut reconf_cost = 0.0f32;
        for request in &candidate.requests {
            let total = view.total_of(&request.resolved);
            if total == 0 {
                continue;
            }
            reconf_cost += request.amount as f32 / total as f32;
        }

        let type_count = view.resource_type_count().max(1) as f32;
        let migration = if migrating { 1.0 } else { 0.0 };
        let factor = self.migration_factor;
        let index =
            1.0 - (1.0 + migration * factor) / (1.0 + factor) * (reconf_cost / type_count);
        index.clamp(0.0, 1.0)
    }
}
