// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Control Surface Integration Tests
//!
//! The host-facing operations driven against a fully wired daemon:
//! registration, assignment queries, synchronization acknowledgement,
//! runtime constraints, and unregistration returning resources.

use std::sync::Arc;

use tokio::sync::Notify;

use crate::common::{pe_recipe, scheduler, single_socket_platform};
use resource_arbiter::{
    ApplicationRegistry, ArbiterControl, RegistrationRequest, CONTROL_PROTOCOL_VERSION,
};
use resource_arbiter_domain::entities::{
    ApplicationId, ApplicationState, ConstraintKind, WorkingModeConstraint, WorkingModeId,
};
use resource_arbiter_domain::value_objects::Priority;

fn wired() -> (
    Arc<resource_arbiter::ResourceAccountant>,
    Arc<ApplicationRegistry>,
    ArbiterControl,
) {
    let accountant = single_socket_platform(4, 0);
    let registry = Arc::new(ApplicationRegistry::new());
    let control = ArbiterControl::new(
        Arc::clone(&registry),
        Arc::clone(&accountant),
        Arc::new(Notify::new()),
    );
    (accountant, registry, control)
}

fn register(control: &ArbiterControl, id: u32, modes: &[(f32, u64)]) {
    control
        .register_application(RegistrationRequest {
            id: ApplicationId(id),
            name: format!("app-{}", id),
            priority: Priority::highest(),
            recipe: pe_recipe(modes),
            client_version: CONTROL_PROTOCOL_VERSION,
        })
        .unwrap();
}

#[test]
fn test_assignment_lifecycle_through_control() {
    let (accountant, registry, control) = wired();
    register(&control, 1, &[(0.5, 2)]);

    assert_eq!(control.current_assignment(ApplicationId(1)).unwrap(), None);

    let core = scheduler(&accountant, &registry);
    core.run_cycle().unwrap();

    let assignment = control
        .current_assignment(ApplicationId(1))
        .unwrap()
        .expect("placed application has an assignment");
    assert_eq!(assignment.working_mode, WorkingModeId(0));

    control.acknowledge_sync(ApplicationId(1)).unwrap();
    assert_eq!(
        registry.get(ApplicationId(1)).unwrap().state(),
        ApplicationState::Running
    );
}

#[test]
fn test_runtime_constraints_steer_selection() {
    let (accountant, registry, control) = wired();
    register(&control, 1, &[(0.3, 2), (0.9, 4)]);

    // Unconstrained, the high-value mode wins the empty platform.
    let core = scheduler(&accountant, &registry);
    core.run_cycle().unwrap();
    assert_eq!(
        control
            .current_assignment(ApplicationId(1))
            .unwrap()
            .unwrap()
            .working_mode,
        WorkingModeId(1)
    );

    // An upper bound on the element request rules that mode out.
    control
        .set_working_mode_constraints(
            ApplicationId(1),
            vec![WorkingModeConstraint::new(
                "sys0.cpu.pe".parse().unwrap(),
                ConstraintKind::UpperBound,
                2,
            )],
        )
        .unwrap();
    core.run_cycle().unwrap();
    assert_eq!(
        control
            .current_assignment(ApplicationId(1))
            .unwrap()
            .unwrap()
            .working_mode,
        WorkingModeId(0)
    );

    // Clearing the constraints restores the richer mode.
    control
        .clear_working_mode_constraints(ApplicationId(1))
        .unwrap();
    core.run_cycle().unwrap();
    assert_eq!(
        control
            .current_assignment(ApplicationId(1))
            .unwrap()
            .unwrap()
            .working_mode,
        WorkingModeId(1)
    );
    accountant.audit().unwrap();
}

#[test]
fn test_unregistration_frees_capacity_for_others() {
    let (accountant, registry, control) = wired();
    register(&control, 1, &[(0.5, 4)]);
    register(&control, 2, &[(0.5, 4)]);

    let core = scheduler(&accountant, &registry);
    core.run_cycle().unwrap();
    assert_eq!(
        registry.get(ApplicationId(2)).unwrap().state(),
        ApplicationState::Blocked
    );

    control.unregister_application(ApplicationId(1)).unwrap();
    core.run_cycle().unwrap();
    assert_eq!(
        control
            .current_assignment(ApplicationId(2))
            .unwrap()
            .unwrap()
            .working_mode,
        WorkingModeId(0)
    );
    accountant.audit().unwrap();
}

#[test]
fn test_goal_gap_update_changes_next_plan() {
    let (accountant, registry, control) = wired();
    register(&control, 1, &[(0.3, 2), (0.9, 4)]);

    let core = scheduler(&accountant, &registry);
    core.run_cycle().unwrap();
    control.acknowledge_sync(ApplicationId(1)).unwrap();
    let first = control
        .current_assignment(ApplicationId(1))
        .unwrap()
        .unwrap();
    assert_eq!(first.working_mode, WorkingModeId(1));

    // Heavy over-performance steers the value index toward demotion.
    control.set_goal_gap(ApplicationId(1), -100).unwrap();
    core.run_cycle().unwrap();
    let second = control
        .current_assignment(ApplicationId(1))
        .unwrap()
        .unwrap();
    assert_eq!(second.working_mode, WorkingModeId(0));
    accountant.audit().unwrap();
}
