// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Binding Engine
//!
//! Turns an application's admissible working modes into concrete
//! scheduling candidates. For every binding domain of the configured
//! type (a CPU socket, an accelerator) the engine substitutes the
//! domain's id into the wildcard of each request template, resolves the
//! bound templates eagerly against the platform namespace, and emits one
//! [`Candidate`] per domain that can satisfy at least the shape of the
//! request vector. Requests that do not mention the domain type at all
//! (system-level memory, for instance) pass through unbound.
//!
//! Candidates reference applications and working modes by id; they own
//! nothing but the resolved path lists they carry for scoring.

use crate::entities::{Application, ApplicationId, ResourceRequest, WorkingModeId};
use crate::services::resource_view::ResourceView;
use crate::value_objects::{BindingMask, GoalGap, Priority, ResourcePath, ResourceType};

/// One request of a candidate, bound to its binding domain and eagerly
/// resolved. `amount` is drawn from the resolved set as a pool unless
/// `divide` asks for an even per-instance split.
#[derive(Debug, Clone)]
pub struct BoundRequest {
    pub template: ResourcePath,
    pub resolved: Vec<ResourcePath>,
    pub amount: u64,
    pub divide: bool,
}

impl BoundRequest {
    /// Leaf resource type of the request.
    pub fn leaf_type(&self) -> Option<ResourceType> {
        self.template.leaf_type()
    }
}

/// The placement an application currently holds, snapshotted for
/// scoring.
#[derive(Debug, Clone, Copy)]
pub struct CurrentSlot {
    pub working_mode: WorkingModeId,
    pub value: f32,
    pub binding: BindingMask,
}

/// Application descriptor carried by a candidate. A frozen copy of the
/// fields scoring needs; the registry keeps the real entity.
#[derive(Debug, Clone)]
pub struct CandidateApplication {
    pub id: ApplicationId,
    pub priority: Priority,
    pub goal_gap: GoalGap,
    pub current: Option<CurrentSlot>,
}

/// The evaluation entity: `(application, working mode, binding)` plus
/// the bound request vector the contributions score.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub app: CandidateApplication,
    pub working_mode: WorkingModeId,
    pub wm_value: f32,
    pub binding: BindingMask,
    pub domain: ResourceType,
    pub requests: Vec<BoundRequest>,
}

impl Candidate {
    /// True when the candidate neither changes the working mode nor
    /// moves the binding.
    pub fn keeps_current(&self) -> bool {
        match &self.app.current {
            Some(current) => {
                current.working_mode == self.working_mode && current.binding == self.binding
            }
            None => false,
        }
    }

    /// True when the application holds a placement on a different
    /// binding domain than the one under evaluation.
    pub fn is_migrating(&self) -> bool {
        match &self.app.current {
            Some(current) => !current.binding.intersects(&self.binding),
            None => false,
        }
    }

    /// True when the working mode differs from the current one.
    pub fn is_reconfiguring(&self) -> bool {
        match &self.app.current {
            Some(current) => current.working_mode != self.working_mode,
            None => false,
        }
    }
}

/// Enumerates candidates over the binding domains of one type.
#[derive(Debug, Clone, Copy)]
pub struct BindingEngine {
    domain: ResourceType,
}

impl BindingEngine {
    pub fn new(domain: ResourceType) -> Self {
        Self { domain }
    }

    pub fn domain(&self) -> ResourceType {
        self.domain
    }

    /// Candidates for one application: the cross-product of its
    /// admissible working modes and the binding domains that can host
    /// them. Domains where any bound request resolves to nothing are
    /// skipped.
    pub fn candidates_for(
        &self,
        application: &Application,
        view: &dyn ResourceView,
    ) -> Vec<Candidate> {
        let descriptor = CandidateApplication {
            id: application.id(),
            priority: application.priority(),
            goal_gap: application.goal_gap(),
            current: application.current().and_then(|assignment| {
                application.current_value().map(|value| CurrentSlot {
                    working_mode: assignment.working_mode,
                    value,
                    binding: assignment.binding,
                })
            }),
        };

        let mut candidates = Vec::new();
        for working_mode in application.admissible_working_modes() {
            for domain_id in view.domain_ids(self.domain) {
                let Ok(binding) = BindingMask::single(domain_id) else {
                    continue;
                };
                let Some(requests) =
                    self.bind_requests(working_mode.requests(), domain_id, view)
                else {
                    continue;
                };
                candidates.push(Candidate {
                    app: descriptor.clone(),
                    working_mode: working_mode.id(),
                    wm_value: working_mode.value(),
                    binding,
                    domain: self.domain,
                    requests,
                });
            }
        }
        candidates
    }

    /// Bind every template at the domain level and resolve. `None` when
    /// some request has no matching leaf under the domain.
    fn bind_requests(
        &self,
        requests: &[ResourceRequest],
        domain_id: u16,
        view: &dyn ResourceView,
    ) -> Option<Vec<BoundRequest>> {
        let mut bound = Vec::with_capacity(requests.len());
        for request in requests {
            let template = if request.template().contains_type(self.domain) {
                request.template().bind(self.domain, domain_id)
            } else {
                request.template().clone()
            };
            let resolved = view.resolve(&template);
            if resolved.is_empty() {
                return None;
            }
            bound.push(BoundRequest {
                template,
                resolved,
                amount: request.amount(),
                divide: request.divide_per_instance(),
            });
        }
        Some(bound)
    }
}
