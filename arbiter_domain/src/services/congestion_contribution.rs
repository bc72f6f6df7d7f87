// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Congestion Contribution
//!
//! Penalizes candidates that push a resource close to saturation. For
//! every bound request the thresholds are taken on the post-reservation
//! level of the resolved node set:
//!
//! - `saturation_lack`: headroom left below the per-type saturation
//!   level once the request is granted
//! - `free`: capacity left once the request is granted
//! - `total`: hard capacity
//!
//! A request that does not fit the available amount at all rejects the
//! candidate outright (index 0). A request staying inside the
//! saturation headroom is free (index 1). Between headroom and the
//! remaining capacity the index degrades linearly down to
//! `1 - penalty`; beyond it the exponential branch collapses the index
//! into `(0, penalty]`, reaching `penalty` exactly when the request
//! swallows the full capacity. The most penalized request dominates the
//! candidate.
//!
//! Per-type penalties and saturation levels are percentage-configured;
//! processing elements saturate later (90%) than memory (70%) by
//! default.

use std::collections::BTreeMap;

use crate::services::binding::Candidate;
use crate::services::contribution::Contribution;
use crate::services::resource_view::ResourceView;
use crate::services::saturation::{region_index, ExponentialParams, LinearParams};
use crate::value_objects::ResourceType;

/// Default congestion penalty, in percent.
pub const DEFAULT_PENALTY_PERCENT: u16 = 10;
/// Default exponential base.
pub const DEFAULT_EXP_BASE: u16 = 2;
/// Default saturation level, in percent of the total.
pub const DEFAULT_SATURATION_PERCENT: u16 = 90;
/// Default saturation level for memory, in percent of the total.
pub const DEFAULT_MEMORY_SATURATION_PERCENT: u16 = 70;

/// Resource saturation index.
#[derive(Debug, Clone)]
pub struct CongestionContribution {
    penalties: BTreeMap<ResourceType, f32>,
    saturation_levels: BTreeMap<ResourceType, f32>,
    base: f32,
}

impl CongestionContribution {
    /// Build from percentage tables. Types missing from a table use the
    /// defaults; out-of-range entries fall back rather than error,
    /// matching the configuration layer's lenient treatment.
    pub fn new(
        penalties_percent: &BTreeMap<ResourceType, u16>,
        saturation_percent: &BTreeMap<ResourceType, u16>,
        exp_base: u16,
    ) -> Self {
        let mut penalties = BTreeMap::new();
        let mut saturation_levels = BTreeMap::new();
        for ty in ResourceType::ALL {
            let penalty = clamp_percent(
                penalties_percent.get(&ty).copied(),
                DEFAULT_PENALTY_PERCENT,
            );
            let default_saturation = if ty == ResourceType::Memory {
                DEFAULT_MEMORY_SATURATION_PERCENT
            } else {
                DEFAULT_SATURATION_PERCENT
            };
            let saturation = clamp_percent(
                saturation_percent.get(&ty).copied(),
                default_saturation,
            );
            penalties.insert(ty, penalty);
            saturation_levels.insert(ty, saturation);
        }
        Self {
            penalties,
            saturation_levels,
            base: f32::from(exp_base.max(2)),
        }
    }

    fn penalty(&self, ty: ResourceType) -> f32 {
        self.penalties
            .get(&ty)
            .copied()
            .unwrap_or(f32::from(DEFAULT_PENALTY_PERCENT) / 100.0)
    }

    fn saturation_level(&self, ty: ResourceType) -> f32 {
        self.saturation_levels
            .get(&ty)
            .copied()
            .unwrap_or(f32::from(DEFAULT_SATURATION_PERCENT) / 100.0)
    }
}

impl Default for CongestionContribution {
    fn default() -> Self {
        Self::new(&BTreeMap::new(), &BTreeMap::new(), DEFAULT_EXP_BASE)
    }
}

fn clamp_percent(value: Option<u16>, default: u16) -> f32 {
    let percent = match value {
        Some(v) if v <= 100 => v,
        _ => default,
    };
    f32::from(percent) / 100.0
}

impl Contribution for CongestionContribution {
    fn name(&self) -> &'static str {
        "congestion"
    }

    fn compute(&self, candidate: &Candidate, view: &dyn ResourceView) -> f32 {
        let mut index = 1.0f32;

        for request in &candidate.requests {
            let Some(leaf) = request.leaf_type() else {
                return 0.0;
            };
            let total = view.total_of(&request.resolved) as f32;
            let available =
                view.available_of(&request.resolved, Some(candidate.app.id)) as f32;
            let amount = request.amount as f32;

            // Requests that cannot fit reject the whole candidate.
            if total <= 0.0 || available < amount {
                return 0.0;
            }

            let used_after = (total - available) + amount;
            let free_after = total - used_after;
            let saturation_lack =
                (self.saturation_level(leaf) * total - used_after).max(0.0);
            let penalty = self.penalty(leaf);

            let linear = LinearParams {
                xoffset: saturation_lack,
                scale: penalty / (free_after - saturation_lack).max(f32::EPSILON),
            };
            let exponential = ExponentialParams {
                base: self.base,
                xoffset: total,
                xscale: used_after,
                yscale: (1.0 - penalty) / (self.base - 1.0),
                yoffset: penalty,
            };

            let request_index =
                region_index(amount, saturation_lack, free_after, &linear, &exponential);
            index = index.min(request_index);
        }

        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{ApplicationId, WorkingModeId};
    use crate::services::binding::{BoundRequest, CandidateApplication};
    use crate::value_objects::{BindingMask, GoalGap, Priority, ResourcePath};

    /// View with one pool of `total` units, `used` of them taken.
    struct PoolView {
        total: u64,
        used: u64,
    }

    impl ResourceView for PoolView {
        fn total_of(&self, _: &[ResourcePath]) -> u64 {
            self.total
        }
        fn available_of(&self, _: &[ResourcePath], _: Option<ApplicationId>) -> u64 {
            self.total - self.used
        }
        fn resource_type_count(&self) -> u16 {
            1
        }
        fn leaf_types(&self) -> Vec<ResourceType> {
            vec![ResourceType::Memory]
        }
        fn domain_ids(&self, _: ResourceType) -> Vec<u16> {
            vec![0]
        }
        fn leaves_of_type(&self, _: ResourceType) -> Vec<ResourcePath> {
            Vec::new()
        }
        fn leaves_in_domain(&self, _: ResourceType, _: u16, _: ResourceType) -> Vec<ResourcePath> {
            Vec::new()
        }
        fn resolve(&self, template: &ResourcePath) -> Vec<ResourcePath> {
            vec![template.clone()]
        }
    }

    fn mem_candidate(amount: u64) -> Candidate {
        let template: ResourcePath = "sys0.mem0".parse().unwrap();
        Candidate {
            app: CandidateApplication {
                id: ApplicationId(1),
                priority: Priority::highest(),
                goal_gap: GoalGap::on_goal(),
                current: None,
            },
            working_mode: WorkingModeId(0),
            wm_value: 0.5,
            binding: BindingMask::single(0).unwrap(),
            domain: ResourceType::Cpu,
            requests: vec![BoundRequest {
                resolved: vec![template.clone()],
                template,
                amount,
                divide: false,
            }],
        }
    }

    #[test]
    fn test_unfittable_request_scores_zero() {
        let contribution = CongestionContribution::default();
        let view = PoolView { total: 10, used: 8 };
        assert_eq!(contribution.compute(&mem_candidate(3), &view), 0.0);
    }

    #[test]
    fn test_comfortable_request_scores_one() {
        // 3 of 10 with memory saturating at 7: well inside the headroom.
        let contribution = CongestionContribution::default();
        let view = PoolView { total: 10, used: 0 };
        assert_eq!(contribution.compute(&mem_candidate(3), &view), 1.0);
    }

    #[test]
    fn test_linear_region_at_half_capacity() {
        // 5 of 10: post-grant headroom 2, post-grant free 5, linear
        // branch ends exactly at the request, index 1 - penalty.
        let contribution = CongestionContribution::default();
        let view = PoolView { total: 10, used: 0 };
        let index = contribution.compute(&mem_candidate(5), &view);
        assert!((index - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_near_capacity_lands_in_exponential_region() {
        // 9 of 10: the exponential branch, strictly between 0 and the
        // penalty.
        let contribution = CongestionContribution::default();
        let view = PoolView { total: 10, used: 0 };
        let index = contribution.compute(&mem_candidate(9), &view);
        assert!(index > 0.0);
        assert!(index < 0.1);
    }

    #[test]
    fn test_full_capacity_scores_penalty() {
        let contribution = CongestionContribution::default();
        let view = PoolView { total: 10, used: 0 };
        let index = contribution.compute(&mem_candidate(10), &view);
        assert!((index - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_most_constrained_request_dominates() {
        let contribution = CongestionContribution::default();
        let view = PoolView { total: 10, used: 0 };
        let mut candidate = mem_candidate(3);
        let tight: ResourcePath = "sys0.mem1".parse().unwrap();
        candidate.requests.push(BoundRequest {
            resolved: vec![tight.clone()],
            template: tight,
            amount: 9,
            divide: false,
        });
        let index = contribution.compute(&candidate, &view);
        assert!(index < 0.1);
    }
}
