// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

// Production code safety enforced via CI and `make lint-strict`
// (lib/bins checked separately from tests - tests may use unwrap/expect)

//! # Arbiter Domain
//!
//! The arbiter domain represents the core business logic of the run-time
//! resource arbiter: deciding, cycle after cycle, which working mode each
//! registered application should run in and onto which slice of the
//! platform that working mode should be mapped. It implements
//! Domain-Driven Design (DDD) patterns and is completely independent of
//! external concerns like the async runtime, configuration files, or the
//! daemon control surface.
//!
//! ## Domain Concepts
//!
//! ### Entities
//! Objects with identity that change state over time:
//!
//! - [`Application`] - a registered workload with a priority, a life-cycle
//!   state, a goal gap, and a catalogue of working modes it declared
//! - [`WorkingMode`] - one admissible operating point of an application,
//!   declaring its relative value and its resource requests
//!
//! ### Value Objects
//! Immutable, self-validating values compared by content:
//!
//! - [`ResourcePath`] - a typed, hierarchical path into the platform
//!   namespace, either a template (with wildcards) or fully resolved
//! - [`BindingMask`] - a bitset over binding-domain ids describing where a
//!   working mode is (or would be) placed
//! - [`Priority`] - scheduling level, zero is the most important
//! - [`GoalGap`] - signed percentage distance from the performance goal
//! - [`ExitCode`] - the closed result enumeration of the control surface
//!
//! ### Domain Services
//! Stateless (or level-scoped) policy logic operating on domain objects:
//!
//! - the [`Contribution`] capability and its four implementations (value,
//!   reconfiguration, congestion, fairness), each mapping a scheduling
//!   candidate to a normalized index in `[0, 1]`
//! - the [`MetricsAggregator`] combining contribution indices into a
//!   single candidate score through a normalized weight vector
//! - the [`BindingEngine`] enumerating candidate placements for an
//!   application over the binding domains of the platform
//!
//! ### Ports
//! The domain queries platform state through the [`ResourceView`] trait.
//! The infrastructure layer implements it on top of the resource
//! accountant; contributions stay pure with respect to that view.
//!
//! [`Application`]: entities::Application
//! [`WorkingMode`]: entities::WorkingMode
//! [`ResourcePath`]: value_objects::ResourcePath
//! [`BindingMask`]: value_objects::BindingMask
//! [`Priority`]: value_objects::Priority
//! [`GoalGap`]: value_objects::GoalGap
//! [`ExitCode`]: value_objects::ExitCode
//! [`Contribution`]: services::Contribution
//! [`MetricsAggregator`]: services::MetricsAggregator
//! [`BindingEngine`]: services::BindingEngine
//! [`ResourceView`]: services::ResourceView

pub mod entities;
pub mod error;
pub mod services;
pub mod value_objects;

pub use error::ArbiterError;

pub use entities::{
    Application, ApplicationId, ApplicationState, Assignment, ConstraintKind, ResourceRequest,
    WorkingMode, WorkingModeConstraint, WorkingModeId,
};
pub use services::{
    BindingEngine, BoundRequest, Candidate, CandidateApplication, CongestionContribution,
    Contribution, CurrentSlot, FairnessContribution, LevelInfo, MetricsAggregator,
    ReconfigContribution, ResourceView, ValueContribution,
};
pub use value_objects::{BindingMask, ExitCode, GoalGap, Priority, ResourcePath, ResourceType};
