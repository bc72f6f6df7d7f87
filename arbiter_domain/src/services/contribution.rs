// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Contribution Capability
//!
//! A contribution scores one dimension of a scheduling candidate with a
//! normalized index in `[0, 1]`. The aggregator calls `init` once per
//! priority level, before any candidate of that level is scored, so a
//! contribution may snapshot level-wide facts (the fairness contribution
//! records its fair-share partitioning there). `compute` must be pure
//! with respect to the resource view and is called from parallel scoring
//! workers, hence the `Send + Sync` bound.
//!
//! The set of contributions is closed and assembled from configuration;
//! there is no open plugin registry.

use crate::error::ArbiterError;
use crate::services::binding::Candidate;
use crate::services::resource_view::ResourceView;
use crate::value_objects::{Priority, ResourceType};

/// Level-wide facts handed to `init` at the start of a priority level.
#[derive(Debug, Clone)]
pub struct LevelInfo {
    /// The priority level about to be scheduled.
    pub priority: Priority,
    /// Number of applications competing at this level.
    pub application_count: usize,
    /// The binding-domain type candidates are mapped onto.
    pub domain: ResourceType,
    /// Ids of the binding domains, ascending.
    pub domain_ids: Vec<u16>,
}

/// One scoring dimension of the aggregation policy.
pub trait Contribution: Send + Sync {
    /// Short name used in logs and configuration keys.
    fn name(&self) -> &'static str;

    /// Called once per priority level before scoring starts. The default
    /// does nothing; stateful contributions snapshot level facts here.
    fn init(&mut self, _level: &LevelInfo, _view: &dyn ResourceView) -> Result<(), ArbiterError> {
        Ok(())
    }

    /// Index of the candidate along this dimension, in `[0, 1]`.
    fn compute(&self, candidate: &Candidate, view: &dyn ResourceView) -> f32;
}
