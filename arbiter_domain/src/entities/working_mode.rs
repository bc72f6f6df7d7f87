// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Working Mode Entity
//!
//! One admissible operating point of an application. A working mode
//! declares how much utility the application gets out of it (the static
//! value) and which resources it needs to run in it (the request
//! vector). Recipes list the working modes an application is willing to
//! accept; the scheduler picks at most one per application per cycle.
//!
//! ## Invariants
//!
//! - the static value lies in `[0, 1]`
//! - every request asks for a positive amount
//! - no two requests name the same resource class (templates are
//!   disjoint modulo wildcard equivalence)

use serde::{Deserialize, Serialize};

use crate::error::ArbiterError;
use crate::value_objects::ResourcePath;

/// Numeric working-mode identifier, unique within its owning application.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct WorkingModeId(pub u16);

impl std::fmt::Display for WorkingModeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "wm{}", self.0)
    }
}

/// One resource request of a working mode: a path template and the
/// amount drawn from the resources the template resolves to.
///
/// With `divide` unset the amount is drawn from the resolved set as a
/// pool. With `divide` set the amount is split evenly across the
/// resolved paths, one share per instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequest {
    template: ResourcePath,
    amount: u64,
    #[serde(default)]
    divide: bool,
}

impl ResourceRequest {
    pub fn new(template: ResourcePath, amount: u64) -> Result<Self, ArbiterError> {
        Self::with_divisor(template, amount, false)
    }

    pub fn with_divisor(
        template: ResourcePath,
        amount: u64,
        divide: bool,
    ) -> Result<Self, ArbiterError> {
        if amount == 0 {
            return Err(ArbiterError::InvalidRecipe(format!(
                "request for '{}' asks for a non-positive amount",
                template
            )));
        }
        Ok(Self {
            template,
            amount,
            divide,
        })
    }

    pub fn template(&self) -> &ResourcePath {
        &self.template
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }

    pub fn divide_per_instance(&self) -> bool {
        self.divide
    }
}

/// Kind of predicate a working-mode constraint applies to the requested
/// amount of a matching resource class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    /// Requested amount must be at least the constraint value.
    #[serde(rename = "lower")]
    LowerBound,
    /// Requested amount must not exceed the constraint value.
    #[serde(rename = "upper")]
    UpperBound,
    /// Requested amount must equal the constraint value.
    #[serde(rename = "exact")]
    ExactValue,
}

/// Amount predicate over a resource class. A working mode is admissible
/// only if every constraint matching one of its requests holds;
/// constraints naming classes the mode does not request are vacuous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingModeConstraint {
    path: ResourcePath,
    kind: ConstraintKind,
    value: u64,
}

impl WorkingModeConstraint {
    pub fn new(path: ResourcePath, kind: ConstraintKind, value: u64) -> Self {
        Self { path, kind, value }
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn kind(&self) -> ConstraintKind {
        self.kind
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    fn holds_for(&self, amount: u64) -> bool {
        match self.kind {
            ConstraintKind::LowerBound => amount >= self.value,
            ConstraintKind::UpperBound => amount <= self.value,
            ConstraintKind::ExactValue => amount == self.value,
        }
    }
}

/// A named operating point: static value plus request vector, with
/// optional admission constraints from the recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkingMode {
    id: WorkingModeId,
    value: f32,
    requests: Vec<ResourceRequest>,
    #[serde(default)]
    constraints: Vec<WorkingModeConstraint>,
}

impl WorkingMode {
    pub fn new(
        id: WorkingModeId,
        value: f32,
        requests: Vec<ResourceRequest>,
    ) -> Result<Self, ArbiterError> {
        Self::with_constraints(id, value, requests, Vec::new())
    }

    pub fn with_constraints(
        id: WorkingModeId,
        value: f32,
        requests: Vec<ResourceRequest>,
        constraints: Vec<WorkingModeConstraint>,
    ) -> Result<Self, ArbiterError> {
        if !(0.0..=1.0).contains(&value) {
            return Err(ArbiterError::InvalidRecipe(format!(
                "{}: value {} out of range [0, 1]",
                id, value
            )));
        }
        for (i, request) in requests.iter().enumerate() {
            if requests[..i]
                .iter()
                .any(|prev| prev.template().equivalent(request.template()))
            {
                return Err(ArbiterError::InvalidRecipe(format!(
                    "{}: requests '{}' twice",
                    id,
                    request.template()
                )));
            }
        }
        Ok(Self {
            id,
            value,
            requests,
            constraints,
        })
    }

    pub fn id(&self) -> WorkingModeId {
        self.id
    }

    /// Static value, relative utility of this mode in `[0, 1]`.
    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn requests(&self) -> &[ResourceRequest] {
        &self.requests
    }

    pub fn constraints(&self) -> &[WorkingModeConstraint] {
        &self.constraints
    }

    /// True when every constraint in `constraints` matching one of this
    /// mode's requests holds for the requested amount.
    pub fn admits(&self, constraints: &[WorkingModeConstraint]) -> bool {
        constraints.iter().all(|constraint| {
            self.requests
                .iter()
                .filter(|request| request.template().equivalent(constraint.path()))
                .all(|request| constraint.holds_for(request.amount()))
        })
    }

    /// Admissible under both the recipe constraints and the runtime ones.
    pub fn is_admissible(&self, runtime_constraints: &[WorkingModeConstraint]) -> bool {
        self.admits(&self.constraints) && self.admits(runtime_constraints)
    }
}
