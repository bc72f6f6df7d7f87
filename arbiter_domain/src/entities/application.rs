// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Entity
//!
//! A registered workload competing for platform resources. The entity
//! owns the working-mode catalogue the application declared at
//! registration and enforces the life-cycle state machine:
//!
//! ```text
//!   New ──▶ Ready ──▶ Sync ──▶ Running
//!            ▲  │       │         │
//!            │  ▼       ▼         ▼
//!            └ Blocked ◀──────────┘        (any state) ──▶ Finished
//! ```
//!
//! | From \ To | Ready | Sync | Running | Blocked | Finished |
//! |-----------|-------|------|---------|---------|----------|
//! | New       |  yes  |      |         |         |   yes    |
//! | Ready     |       | yes  |         |   yes   |   yes    |
//! | Sync      |       |      |   yes   |   yes   |   yes    |
//! | Running   |       | yes  |         |   yes   |   yes    |
//! | Blocked   |  yes  |      |         |         |   yes    |
//!
//! Only `Sync -> Running` is performed by the application itself when it
//! acknowledges a synchronization; every other transition is driven by
//! the scheduler or the registry.
//!
//! ## Invariant
//!
//! The current assignment is present exactly in the `Sync` and `Running`
//! states. All mutators below keep state and assignment in step, which
//! is why there is no public `set_state`.

use serde::{Deserialize, Serialize};

use crate::entities::working_mode::{WorkingMode, WorkingModeConstraint, WorkingModeId};
use crate::error::ArbiterError;
use crate::value_objects::{BindingMask, GoalGap, Priority};

/// Unique application identifier, assigned by the host at registration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ApplicationId(pub u32);

impl std::fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "app{}", self.0)
    }
}

/// Application life-cycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApplicationState {
    /// Registered, not yet admitted to scheduling.
    New,
    /// Waiting for a placement.
    Ready,
    /// Placed; waiting for the application to acknowledge.
    Sync,
    /// Running in its current working mode.
    Running,
    /// No valid placement at the last cycle.
    Blocked,
    /// Terminated; will be reaped by the registry.
    Finished,
}

impl ApplicationState {
    /// Transition table. `Finished` is absorbing.
    pub fn can_transition_to(self, next: ApplicationState) -> bool {
        use ApplicationState::*;
        match (self, next) {
            (New, Ready) | (New, Finished) => true,
            (Ready, Sync) | (Ready, Blocked) | (Ready, Finished) => true,
            (Sync, Running) | (Sync, Blocked) | (Sync, Finished) => true,
            (Running, Sync) | (Running, Blocked) | (Running, Finished) => true,
            (Blocked, Ready) | (Blocked, Finished) => true,
            _ => false,
        }
    }

    /// States in which the scheduler considers the application. A
    /// placement not yet acknowledged (`Sync`) is still re-evaluated;
    /// its assignment may be replaced before the acknowledgement.
    pub fn is_schedulable(self) -> bool {
        matches!(
            self,
            ApplicationState::Ready | ApplicationState::Running | ApplicationState::Sync
        )
    }
}

/// The placement an application holds: the selected working mode and the
/// binding domains it is mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub working_mode: WorkingModeId,
    pub binding: BindingMask,
}

/// A registered application with its declared working modes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    id: ApplicationId,
    name: String,
    priority: Priority,
    state: ApplicationState,
    goal_gap: GoalGap,
    current: Option<Assignment>,
    working_modes: Vec<WorkingMode>,
    runtime_constraints: Vec<WorkingModeConstraint>,
}

impl Application {
    /// Register a new application. At least one working mode is required
    /// and working-mode ids must be unique.
    pub fn new(
        id: ApplicationId,
        name: impl Into<String>,
        priority: Priority,
        working_modes: Vec<WorkingMode>,
    ) -> Result<Self, ArbiterError> {
        let name = name.into();
        if working_modes.is_empty() {
            return Err(ArbiterError::NoWorkingMode(format!(
                "{} ('{}') declares no working mode",
                id, name
            )));
        }
        for (i, wm) in working_modes.iter().enumerate() {
            if working_modes[..i].iter().any(|prev| prev.id() == wm.id()) {
                return Err(ArbiterError::InvalidRecipe(format!(
                    "{} ('{}') declares {} twice",
                    id,
                    name,
                    wm.id()
                )));
            }
        }
        Ok(Self {
            id,
            name,
            priority,
            state: ApplicationState::New,
            goal_gap: GoalGap::on_goal(),
            current: None,
            working_modes,
            runtime_constraints: Vec::new(),
        })
    }

    pub fn id(&self) -> ApplicationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    pub fn state(&self) -> ApplicationState {
        self.state
    }

    pub fn goal_gap(&self) -> GoalGap {
        self.goal_gap
    }

    pub fn set_goal_gap(&mut self, goal_gap: GoalGap) {
        self.goal_gap = goal_gap;
    }

    pub fn current(&self) -> Option<&Assignment> {
        self.current.as_ref()
    }

    pub fn working_modes(&self) -> &[WorkingMode] {
        &self.working_modes
    }

    pub fn working_mode(&self, id: WorkingModeId) -> Option<&WorkingMode> {
        self.working_modes.iter().find(|wm| wm.id() == id)
    }

    /// Value of the currently held working mode, if any.
    pub fn current_value(&self) -> Option<f32> {
        self.current
            .as_ref()
            .and_then(|assignment| self.working_mode(assignment.working_mode))
            .map(|wm| wm.value())
    }

    pub fn runtime_constraints(&self) -> &[WorkingModeConstraint] {
        &self.runtime_constraints
    }

    pub fn set_runtime_constraints(&mut self, constraints: Vec<WorkingModeConstraint>) {
        self.runtime_constraints = constraints;
    }

    pub fn clear_runtime_constraints(&mut self) {
        self.runtime_constraints.clear();
    }

    /// Working modes passing both the recipe constraints and the runtime
    /// ones, in declaration order.
    pub fn admissible_working_modes(&self) -> impl Iterator<Item = &WorkingMode> {
        self.working_modes
            .iter()
            .filter(|wm| wm.is_admissible(&self.runtime_constraints))
    }

    fn transition(&mut self, next: ApplicationState) -> Result<(), ArbiterError> {
        if !self.state.can_transition_to(next) {
            return Err(ArbiterError::InvalidTransition(format!(
                "{}: {:?} -> {:?}",
                self.id, self.state, next
            )));
        }
        self.state = next;
        Ok(())
    }

    /// Admit the application to scheduling (registry-driven).
    pub fn make_ready(&mut self) -> Result<(), ArbiterError> {
        self.transition(ApplicationState::Ready)
    }

    /// Install a new placement and move to `Sync` (scheduler-driven).
    ///
    /// An application already in `Sync` keeps that state and only its
    /// assignment is replaced; it will acknowledge the latest one.
    pub fn place(&mut self, assignment: Assignment) -> Result<(), ArbiterError> {
        if self.state != ApplicationState::Sync {
            self.transition(ApplicationState::Sync)?;
        }
        self.current = Some(assignment);
        Ok(())
    }

    /// The application acknowledges the synchronization (app-driven).
    pub fn acknowledge_sync(&mut self) -> Result<(), ArbiterError> {
        if self.state != ApplicationState::Sync {
            return Err(ArbiterError::SyncRefused(format!(
                "{} is {:?}, not Sync",
                self.id, self.state
            )));
        }
        self.transition(ApplicationState::Running)
    }

    /// No placement this cycle; resources are withdrawn.
    pub fn block(&mut self) -> Result<(), ArbiterError> {
        self.transition(ApplicationState::Blocked)?;
        self.current = None;
        Ok(())
    }

    /// Terminate the application.
    pub fn finish(&mut self) -> Result<(), ArbiterError> {
        self.transition(ApplicationState::Finished)?;
        self.current = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::working_mode::ResourceRequest;

    fn one_mode() -> Vec<WorkingMode> {
        vec![WorkingMode::new(
            WorkingModeId(0),
            0.5,
            vec![ResourceRequest::new("sys0.cpu.pe".parse().unwrap(), 2).unwrap()],
        )
        .unwrap()]
    }

    fn app() -> Application {
        Application::new(ApplicationId(7), "demo", Priority::highest(), one_mode()).unwrap()
    }

    #[test]
    fn test_rejects_empty_catalogue() {
        let result = Application::new(ApplicationId(1), "empty", Priority::highest(), vec![]);
        assert!(matches!(result, Err(ArbiterError::NoWorkingMode(_))));
    }

    #[test]
    fn test_rejects_duplicate_mode_ids() {
        let mut modes = one_mode();
        modes.push(modes[0].clone());
        let result = Application::new(ApplicationId(1), "dup", Priority::highest(), modes);
        assert!(matches!(result, Err(ArbiterError::InvalidRecipe(_))));
    }

    #[test]
    fn test_lifecycle_happy_path() {
        let mut app = app();
        assert_eq!(app.state(), ApplicationState::New);
        app.make_ready().unwrap();
        app.place(Assignment {
            working_mode: WorkingModeId(0),
            binding: BindingMask::single(0).unwrap(),
        })
        .unwrap();
        assert_eq!(app.state(), ApplicationState::Sync);
        assert!(app.current().is_some());
        app.acknowledge_sync().unwrap();
        assert_eq!(app.state(), ApplicationState::Running);
        app.block().unwrap();
        assert_eq!(app.state(), ApplicationState::Blocked);
        assert!(app.current().is_none());
        app.make_ready().unwrap();
        app.finish().unwrap();
        assert_eq!(app.state(), ApplicationState::Finished);
    }

    #[test]
    fn test_invalid_transitions_rejected() {
        let mut app = app();
        // New application cannot acknowledge a sync it never received.
        assert!(app.acknowledge_sync().is_err());
        // New -> Blocked is not in the table.
        assert!(app.block().is_err());
        app.finish().unwrap();
        // Finished is absorbing.
        assert!(app.make_ready().is_err());
    }

    #[test]
    fn test_assignment_follows_state_invariant() {
        let mut app = app();
        app.make_ready().unwrap();
        assert!(app.current().is_none());
        app.place(Assignment {
            working_mode: WorkingModeId(0),
            binding: BindingMask::single(1).unwrap(),
        })
        .unwrap();
        assert!(app.current().is_some());
        app.block().unwrap();
        assert!(app.current().is_none());
    }

    #[test]
    fn test_current_value_resolves_through_catalogue() {
        let mut app = app();
        app.make_ready().unwrap();
        app.place(Assignment {
            working_mode: WorkingModeId(0),
            binding: BindingMask::single(0).unwrap(),
        })
        .unwrap();
        assert_eq!(app.current_value(), Some(0.5));
    }
}
