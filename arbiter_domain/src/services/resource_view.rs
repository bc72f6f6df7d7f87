// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Resource View Port
//!
//! The read-only window through which scheduling policy observes the
//! platform. The infrastructure layer implements it on top of the
//! resource accountant, scoped to the transaction token of the running
//! cycle: tentative reservations made earlier in the cycle are visible,
//! reservations of other (aborted) cycles never are.
//!
//! Contributions must stay pure with respect to a view: they may query
//! it as often as they like but never mutate anything through it.

use crate::entities::ApplicationId;
use crate::value_objects::{ResourcePath, ResourceType};

/// Read-only platform state, scoped to the current scheduling cycle.
pub trait ResourceView: Send + Sync {
    /// Sum of `total` over the given resolved paths. Unknown paths
    /// contribute zero.
    fn total_of(&self, paths: &[ResourcePath]) -> u64;

    /// Sum of the available amount over the given resolved paths:
    /// `total - used - tentative`, plus the committed share currently
    /// held by `application` so a re-evaluated application can see
    /// through its own allocation.
    fn available_of(&self, paths: &[ResourcePath], application: Option<ApplicationId>) -> u64;

    /// Number of distinct leaf resource types in the namespace. Used as
    /// the normalizer of the reconfiguration index.
    fn resource_type_count(&self) -> u16;

    /// Distinct leaf resource types present, in canonical order.
    fn leaf_types(&self) -> Vec<ResourceType>;

    /// Ids of the binding domains of the given type, ascending.
    fn domain_ids(&self, domain: ResourceType) -> Vec<u16>;

    /// All leaf paths of the given type, ascending.
    fn leaves_of_type(&self, leaf: ResourceType) -> Vec<ResourcePath>;

    /// Leaf paths of the given type under one binding domain, ascending.
    fn leaves_in_domain(&self, domain: ResourceType, id: u16, leaf: ResourceType)
        -> Vec<ResourcePath>;

    /// Expand a template to the matching resolved paths, ascending. The
    /// expansion is memoized for the lifetime of the cycle.
    fn resolve(&self, template: &ResourcePath) -> Vec<ResourcePath>;
}
