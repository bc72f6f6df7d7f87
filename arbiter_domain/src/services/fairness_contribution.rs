// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Fairness Contribution
//!
//! Discourages any single application from grabbing more than its fair
//! share of what is available to its priority level. At level init the
//! contribution snapshots, for every leaf resource type:
//!
//! - the availability of the best and worst binding domains
//!   (`max_bd_avail`, `min_bd_avail`)
//! - the system-wide availability
//! - the fair partition `max_bd_avail / N` over the `N` applications
//!   competing at the level
//!
//! Scoring then derives the binding-domain fair share as
//! `max_bd_avail / ceil(max_bd_avail / fair_partition)`, floored by the
//! worst domain's availability when more than one domain exists, and
//! runs the saturation filter with the fair share as the linear
//! threshold: requests within the fair share lose at most `penalty`,
//! requests beyond it decay exponentially towards zero at the point
//! where they would swallow the best domain entirely.
//!
//! The `ceil(max_bd_avail / fair_partition)` fraction reduces to
//! `ceil(N)` in most states. This is deliberate fidelity to the policy
//! as deployed; do not "fix" it to aggregate over `system_avail`
//! without revisiting the filter parameters.

use std::collections::BTreeMap;

use crate::error::ArbiterError;
use crate::services::binding::Candidate;
use crate::services::contribution::{Contribution, LevelInfo};
use crate::services::resource_view::ResourceView;
use crate::services::saturation::{region_index, ExponentialParams, LinearParams};
use crate::value_objects::ResourceType;

/// Default fairness penalty, in percent.
pub const DEFAULT_PENALTY_PERCENT: u16 = 10;
/// Default exponential base.
pub const DEFAULT_EXP_BASE: u16 = 2;

/// Per-type level snapshot taken at `init`. The system-wide
/// availability seeds the worst-domain value and is the fallback pool
/// for types living outside the binding domains.
#[derive(Debug, Clone, Copy, Default)]
struct FairShare {
    max_bd_avail: u64,
    min_bd_avail: u64,
    fair_partition: u64,
}

/// Fair-share partitioning index.
#[derive(Debug, Clone)]
pub struct FairnessContribution {
    penalties: BTreeMap<ResourceType, f32>,
    base: f32,
    shares: BTreeMap<ResourceType, FairShare>,
    domain_count: usize,
}

impl FairnessContribution {
    pub fn new(penalties_percent: &BTreeMap<ResourceType, u16>, exp_base: u16) -> Self {
        let mut penalties = BTreeMap::new();
        for ty in ResourceType::ALL {
            let percent = match penalties_percent.get(&ty) {
                Some(v) if *v <= 100 => *v,
                _ => DEFAULT_PENALTY_PERCENT,
            };
            penalties.insert(ty, f32::from(percent) / 100.0);
        }
        Self {
            penalties,
            base: f32::from(exp_base.max(2)),
            shares: BTreeMap::new(),
            domain_count: 0,
        }
    }

    fn penalty(&self, ty: ResourceType) -> f32 {
        self.penalties
            .get(&ty)
            .copied()
            .unwrap_or(f32::from(DEFAULT_PENALTY_PERCENT) / 100.0)
    }
}

impl Default for FairnessContribution {
    fn default() -> Self {
        Self::new(&BTreeMap::new(), DEFAULT_EXP_BASE)
    }
}

impl Contribution for FairnessContribution {
    fn name(&self) -> &'static str {
        "fairness"
    }

    fn init(&mut self, level: &LevelInfo, view: &dyn ResourceView) -> Result<(), ArbiterError> {
        self.shares.clear();
        self.domain_count = level.domain_ids.len();
        let applications = level.application_count.max(1) as u64;

        for leaf in view.leaf_types() {
            let system_paths = view.leaves_of_type(leaf);
            let system_avail = view.available_of(&system_paths, None);

            let mut max_bd_avail = 0u64;
            let mut min_bd_avail = system_avail;
            for &domain_id in &level.domain_ids {
                let domain_paths = view.leaves_in_domain(level.domain, domain_id, leaf);
                if domain_paths.is_empty() {
                    continue;
                }
                let bd_avail = view.available_of(&domain_paths, None);
                max_bd_avail = max_bd_avail.max(bd_avail);
                min_bd_avail = min_bd_avail.min(bd_avail);
            }
            if max_bd_avail == 0 {
                // The type lives outside the binding domains (system-wide
                // memory banks); the whole availability is one pool.
                max_bd_avail = system_avail;
                min_bd_avail = system_avail;
            }

            self.shares.insert(
                leaf,
                FairShare {
                    max_bd_avail,
                    min_bd_avail,
                    fair_partition: max_bd_avail / applications,
                },
            );
        }
        Ok(())
    }

    fn compute(&self, candidate: &Candidate, _view: &dyn ResourceView) -> f32 {
        let mut index = 1.0f32;

        for request in &candidate.requests {
            let Some(leaf) = request.leaf_type() else {
                return 0.0;
            };
            let Some(share) = self.shares.get(&leaf) else {
                return 0.0;
            };
            if share.max_bd_avail == 0 {
                return 0.0;
            }

            // Binding-domain fraction, kept exactly as deployed.
            let fraction = if share.fair_partition == 0 {
                1
            } else {
                share.max_bd_avail.div_ceil(share.fair_partition).max(1)
            };
            let mut bd_fair = share.max_bd_avail / fraction;
            if self.domain_count > 1 {
                bd_fair = bd_fair.max(share.min_bd_avail);
            }
            if bd_fair == 0 {
                return 0.0;
            }

            let penalty = self.penalty(leaf);
            let max_avail = share.max_bd_avail as f32;
            let fair = bd_fair as f32;
            let linear = LinearParams {
                xoffset: 0.0,
                scale: penalty / fair,
            };
            let exponential = ExponentialParams {
                base: self.base,
                xoffset: max_avail,
                xscale: fair - max_avail,
                yscale: (1.0 - penalty) / (self.base - 1.0),
                yoffset: 0.0,
            };

            let request_index =
                region_index(request.amount as f32, 0.0, fair, &linear, &exponential);
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

    /// One binding domain holding `avail` free processing elements.
    struct DomainView {
        avail: u64,
    }

    impl ResourceView for DomainView {
        fn total_of(&self, _: &[ResourcePath]) -> u64 {
            self.avail
        }
        fn available_of(&self, _: &[ResourcePath], _: Option<ApplicationId>) -> u64 {
            self.avail
        }
        fn resource_type_count(&self) -> u16 {
            1
        }
        fn leaf_types(&self) -> Vec<ResourceType> {
            vec![ResourceType::ProcElement]
        }
        fn domain_ids(&self, _: ResourceType) -> Vec<u16> {
            vec![0]
        }
        fn leaves_of_type(&self, _: ResourceType) -> Vec<ResourcePath> {
            vec!["sys0.cpu0.pe0".parse().unwrap()]
        }
        fn leaves_in_domain(&self, _: ResourceType, _: u16, _: ResourceType) -> Vec<ResourcePath> {
            vec!["sys0.cpu0.pe0".parse().unwrap()]
        }
        fn resolve(&self, template: &ResourcePath) -> Vec<ResourcePath> {
            vec![template.clone()]
        }
    }

    fn level(applications: usize) -> LevelInfo {
        LevelInfo {
            priority: Priority::highest(),
            application_count: applications,
            domain: ResourceType::Cpu,
            domain_ids: vec![0],
        }
    }

    fn pe_candidate(amount: u64) -> Candidate {
        let template: ResourcePath = "sys0.cpu0.pe".parse().unwrap();
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
                resolved: vec!["sys0.cpu0.pe0".parse().unwrap()],
                template,
                amount,
                divide: false,
            }],
        }
    }

    #[test]
    fn test_within_fair_share_loses_at_most_penalty() {
        // 12 pe, 3 applications: fair partition 4, fraction 3, share 4.
        let mut contribution = FairnessContribution::default();
        let view = DomainView { avail: 12 };
        contribution.init(&level(3), &view).unwrap();

        let at_share = contribution.compute(&pe_candidate(4), &view);
        let small = contribution.compute(&pe_candidate(1), &view);
        assert!((at_share - 0.9).abs() < 1e-6);
        assert!(small > at_share);
    }

    #[test]
    fn test_beyond_fair_share_decays() {
        let mut contribution = FairnessContribution::default();
        let view = DomainView { avail: 12 };
        contribution.init(&level(3), &view).unwrap();

        // 6 of 12 against a fair share of 4 lands on the exponential
        // curve between 0 and 1 - penalty.
        let over = contribution.compute(&pe_candidate(6), &view);
        assert!(over > 0.0);
        assert!(over < 0.9);

        // Swallowing the whole domain scores zero.
        let all = contribution.compute(&pe_candidate(12), &view);
        assert!(all.abs() < 1e-6);
    }

    #[test]
    fn test_single_application_gets_everything() {
        let mut contribution = FairnessContribution::default();
        let view = DomainView { avail: 12 };
        contribution.init(&level(1), &view).unwrap();

        // Fair share equals the full availability; requests within it
        // stay on the linear branch.
        let index = contribution.compute(&pe_candidate(12), &view);
        assert!((index - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_unknown_type_scores_zero() {
        let mut contribution = FairnessContribution::default();
        let view = DomainView { avail: 12 };
        contribution.init(&level(2), &view).unwrap();

        let mut candidate = pe_candidate(1);
        candidate.requests[0].template = "sys0.gpu0".parse().unwrap();
        assert_eq!(contribution.compute(&candidate, &view), 0.0);
    }
}
