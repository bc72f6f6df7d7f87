// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Application Registry
//!
//! The long-lived table of registered applications. Iteration order per
//! priority level is the registration order, which keeps candidate
//! enumeration (and with it whole plans) deterministic.
//!
//! ## Cycle freezing
//!
//! A scheduling cycle works on a frozen snapshot. While a cycle is
//! running (`freeze` .. `thaw`), mutations arriving from the control
//! surface are validated against the live table immediately but applied
//! only at `thaw`, so a cycle never observes a half-updated registry.
//! State transitions driven by the scheduler itself go through
//! `apply_outcome` right before thawing.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::warn;

use resource_arbiter_domain::entities::{
    Application, ApplicationId, ApplicationState, Assignment, WorkingModeConstraint,
};
use resource_arbiter_domain::value_objects::{GoalGap, Priority};
use resource_arbiter_domain::ArbiterError;

/// Deferred mutation recorded while a cycle is running.
#[derive(Debug)]
enum PendingOp {
    SetGoalGap(ApplicationId, GoalGap),
    SetPriority(ApplicationId, Priority),
    SetConstraints(ApplicationId, Vec<WorkingModeConstraint>),
    ClearConstraints(ApplicationId),
    Unregister(ApplicationId),
}

#[derive(Default)]
struct Table {
    apps: BTreeMap<ApplicationId, Application>,
    /// Registration order; drives deterministic per-level iteration.
    order: Vec<ApplicationId>,
    pending: Vec<PendingOp>,
    frozen: bool,
}

/// Insertion-ordered application table with cycle freezing.
#[derive(Default)]
pub struct ApplicationRegistry {
    table: Mutex<Table>,
}

impl ApplicationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new application (already validated by the entity).
    /// Registrations are never deferred: an application arriving during
    /// a cycle simply becomes visible at the next snapshot.
    pub fn register(&self, application: Application) -> Result<(), ArbiterError> {
        let mut table = self.table.lock();
        let id = application.id();
        if table.apps.contains_key(&id) {
            return Err(ArbiterError::DuplicateApplication(id.to_string()));
        }
        table.order.push(id);
        table.apps.insert(id, application);
        Ok(())
    }

    pub fn contains(&self, id: ApplicationId) -> bool {
        self.table.lock().apps.contains_key(&id)
    }

    pub fn get(&self, id: ApplicationId) -> Option<Application> {
        self.table.lock().apps.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.table.lock().apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.lock().apps.is_empty()
    }

    pub fn unregister(&self, id: ApplicationId) -> Result<(), ArbiterError> {
        let mut table = self.table.lock();
        if !table.apps.contains_key(&id) {
            // Idempotent: unregistering an absent application is a no-op.
            return Ok(());
        }
        if table.frozen {
            table.pending.push(PendingOp::Unregister(id));
            return Ok(());
        }
        remove_app(&mut table, id);
        Ok(())
    }

    pub fn set_goal_gap(&self, id: ApplicationId, gap: GoalGap) -> Result<(), ArbiterError> {
        self.mutate(id, PendingOp::SetGoalGap(id, gap))
    }

    pub fn set_priority(&self, id: ApplicationId, priority: Priority) -> Result<(), ArbiterError> {
        self.mutate(id, PendingOp::SetPriority(id, priority))
    }

    pub fn set_constraints(
        &self,
        id: ApplicationId,
        constraints: Vec<WorkingModeConstraint>,
    ) -> Result<(), ArbiterError> {
        self.mutate(id, PendingOp::SetConstraints(id, constraints))
    }

    pub fn clear_constraints(&self, id: ApplicationId) -> Result<(), ArbiterError> {
        self.mutate(id, PendingOp::ClearConstraints(id))
    }

    /// The application acknowledges its synchronization. Never deferred:
    /// the transition is app-driven and the state machine guards it.
    pub fn acknowledge_sync(&self, id: ApplicationId) -> Result<(), ArbiterError> {
        let mut table = self.table.lock();
        let app = table
            .apps
            .get_mut(&id)
            .ok_or_else(|| ArbiterError::NotRegistered(id.to_string()))?;
        app.acknowledge_sync()
    }

    /// Current `(working mode, binding)` of an application.
    pub fn current_assignment(
        &self,
        id: ApplicationId,
    ) -> Result<Option<Assignment>, ArbiterError> {
        let table = self.table.lock();
        let app = table
            .apps
            .get(&id)
            .ok_or_else(|| ArbiterError::NotRegistered(id.to_string()))?;
        Ok(app.current().copied())
    }

    fn mutate(&self, id: ApplicationId, op: PendingOp) -> Result<(), ArbiterError> {
        let mut table = self.table.lock();
        if !table.apps.contains_key(&id) {
            return Err(ArbiterError::NotRegistered(id.to_string()));
        }
        if table.frozen {
            table.pending.push(op);
            return Ok(());
        }
        apply_op(&mut table, op);
        Ok(())
    }

    /// Freeze the registry and return the cycle snapshot. Applications
    /// enter the snapshot in registration order; blocked applications
    /// are re-admitted to `Ready` first so they compete again.
    pub fn freeze(&self) -> Vec<Application> {
        let mut table = self.table.lock();
        table.frozen = true;
        let order = table.order.clone();
        for id in &order {
            if let Some(app) = table.apps.get_mut(id) {
                if app.state() == ApplicationState::New
                    || app.state() == ApplicationState::Blocked
                {
                    // Both transitions are in the table; errors here
                    // would mean the table itself changed.
                    let _ = app.make_ready();
                }
            }
        }
        order
            .iter()
            .filter_map(|id| table.apps.get(id).cloned())
            .collect()
    }

    /// Install the outcome of a committed cycle: placements move (or
    /// keep) applications in `Sync`/`Running`, losers get `Blocked`.
    /// Unchanged placements cause no transition at all.
    pub fn apply_outcome(
        &self,
        placed: &[(ApplicationId, Assignment)],
        blocked: &[ApplicationId],
    ) -> Result<(), ArbiterError> {
        let mut table = self.table.lock();
        for (id, assignment) in placed {
            let Some(app) = table.apps.get_mut(id) else {
                continue;
            };
            let unchanged = app.current() == Some(assignment)
                && matches!(
                    app.state(),
                    ApplicationState::Running | ApplicationState::Sync
                );
            if unchanged {
                continue;
            }
            app.place(*assignment)?;
        }
        for id in blocked {
            let Some(app) = table.apps.get_mut(id) else {
                continue;
            };
            if app.state() != ApplicationState::Blocked {
                app.block()?;
            }
        }
        Ok(())
    }

    /// Unfreeze and apply the mutations deferred during the cycle.
    pub fn thaw(&self) {
        let mut table = self.table.lock();
        table.frozen = false;
        let pending = std::mem::take(&mut table.pending);
        for op in pending {
            apply_op(&mut table, op);
        }
    }

    /// Applications in the given priority level, registration order.
    pub fn applications_at(snapshot: &[Application], priority: Priority) -> Vec<&Application> {
        snapshot
            .iter()
            .filter(|app| app.priority() == priority && app.state().is_schedulable())
            .collect()
    }

    /// Highest priority level number present plus one.
    pub fn level_count(snapshot: &[Application]) -> u8 {
        snapshot
            .iter()
            .map(|app| app.priority().level() + 1)
            .max()
            .unwrap_or(0)
    }
}

fn apply_op(table: &mut Table, op: PendingOp) {
    match op {
        PendingOp::SetGoalGap(id, gap) => {
            if let Some(app) = table.apps.get_mut(&id) {
                app.set_goal_gap(gap);
            } else {
                warn!(%id, "deferred goal-gap update for unregistered application");
            }
        }
        PendingOp::SetPriority(id, priority) => {
            if let Some(app) = table.apps.get_mut(&id) {
                app.set_priority(priority);
            } else {
                warn!(%id, "deferred priority update for unregistered application");
            }
        }
        PendingOp::SetConstraints(id, constraints) => {
            if let Some(app) = table.apps.get_mut(&id) {
                app.set_runtime_constraints(constraints);
            } else {
                warn!(%id, "deferred constraint update for unregistered application");
            }
        }
        PendingOp::ClearConstraints(id) => {
            if let Some(app) = table.apps.get_mut(&id) {
                app.clear_runtime_constraints();
            }
        }
        PendingOp::Unregister(id) => {
            remove_app(table, id);
        }
    }
}

fn remove_app(table: &mut Table, id: ApplicationId) {
    table.apps.remove(&id);
    table.order.retain(|other| *other != id);
}
