// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Control Surface
//!
//! The synchronous operations the daemon host exposes to applications:
//! registration with a recipe, goal-gap and constraint updates,
//! synchronization acknowledgement, on-demand scheduling, and assignment
//! queries. Every operation is idempotent except `request_schedule`.
//!
//! Results are domain errors internally; `exit_code` collapses them to
//! the closed [`ExitCode`] enumeration at the host boundary.

use std::sync::Arc;

use tokio::sync::Notify;
use tracing::info;

use resource_arbiter_domain::entities::{
    Application, ApplicationId, Assignment, WorkingModeConstraint,
};
use resource_arbiter_domain::value_objects::{ExitCode, GoalGap, Priority};
use resource_arbiter_domain::ArbiterError;

use crate::infrastructure::recipe::parse_recipe;
use crate::infrastructure::runtime::{ApplicationRegistry, ResourceAccountant};

/// Version of the control protocol this daemon speaks. Clients built
/// against another version are refused at registration.
pub const CONTROL_PROTOCOL_VERSION: u16 = 1;

/// Registration payload.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    pub id: ApplicationId,
    pub name: String,
    pub priority: Priority,
    /// Recipe document (TOML text) declaring the working modes.
    pub recipe: String,
    pub client_version: u16,
}

/// The daemon control surface.
pub struct ArbiterControl {
    registry: Arc<ApplicationRegistry>,
    accountant: Arc<ResourceAccountant>,
    trigger: Arc<Notify>,
}

impl ArbiterControl {
    pub fn new(
        registry: Arc<ApplicationRegistry>,
        accountant: Arc<ResourceAccountant>,
        trigger: Arc<Notify>,
    ) -> Self {
        Self {
            registry,
            accountant,
            trigger,
        }
    }

    /// Register an application with its recipe. Re-registering the same
    /// `(id, name, priority)` is a no-op; a conflicting re-registration
    /// is a duplicate.
    pub fn register_application(&self, request: RegistrationRequest) -> Result<(), ArbiterError> {
        if request.client_version != CONTROL_PROTOCOL_VERSION {
            return Err(ArbiterError::VersionMismatch(format!(
                "client speaks v{}, daemon v{}",
                request.client_version, CONTROL_PROTOCOL_VERSION
            )));
        }
        let working_modes = parse_recipe(&request.recipe)?;
        let application = Application::new(
            request.id,
            request.name.clone(),
            request.priority,
            working_modes,
        )?;

        match self.registry.register(application) {
            Ok(()) => {
                info!(application = %request.id, name = %request.name, "application registered");
                Ok(())
            }
            Err(ArbiterError::DuplicateApplication(message)) => {
                let existing = self.registry.get(request.id);
                let identical = existing.map(|app| {
                    app.name() == request.name && app.priority() == request.priority
                });
                if identical == Some(true) {
                    Ok(())
                } else {
                    Err(ArbiterError::DuplicateApplication(message))
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Unregister and return any held resources to the pool. A no-op
    /// for unknown applications.
    pub fn unregister_application(&self, id: ApplicationId) -> Result<(), ArbiterError> {
        self.registry.unregister(id)?;
        self.accountant.release_application(id)?;
        info!(application = %id, "application unregistered");
        Ok(())
    }

    pub fn set_goal_gap(&self, id: ApplicationId, percent: i8) -> Result<(), ArbiterError> {
        self.registry.set_goal_gap(id, GoalGap::new(percent)?)
    }

    pub fn set_working_mode_constraints(
        &self,
        id: ApplicationId,
        constraints: Vec<WorkingModeConstraint>,
    ) -> Result<(), ArbiterError> {
        self.registry.set_constraints(id, constraints)
    }

    pub fn clear_working_mode_constraints(&self, id: ApplicationId) -> Result<(), ArbiterError> {
        self.registry.clear_constraints(id)
    }

    /// The application acknowledges the synchronization it was handed.
    pub fn acknowledge_sync(&self, id: ApplicationId) -> Result<(), ArbiterError> {
        self.registry.acknowledge_sync(id)
    }

    /// Ask for a scheduling cycle. The only non-idempotent operation:
    /// every call enqueues (at most) one additional cycle.
    pub fn request_schedule(&self) {
        self.trigger.notify_one();
    }

    /// Current `(working mode, binding)` of an application, `None` while
    /// it holds no placement.
    pub fn current_assignment(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Assignment>, ArbiterError> {
        self.registry.current_assignment(id)
    }

    /// Collapse an operation result to the control exit code.
    pub fn exit_code(result: &Result<(), ArbiterError>) -> ExitCode {
        match result {
            Ok(()) => ExitCode::Ok,
            Err(e) => ExitCode::from(e),
        }
    }
}
