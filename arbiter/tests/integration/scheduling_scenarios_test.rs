// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scheduling Scenario Tests
//!
//! End-to-end cycles over wired platforms: priority eviction, goal-gap
//! promotion, migration avoidance, fair-share saturation, congestion
//! near capacity, and budget exhaustion. Each scenario also re-checks
//! the accounting invariants after the cycle.

use std::sync::Arc;

use crate::common::{
    multi_socket_platform, pe_application, scheduler, scheduler_with_config,
    single_socket_platform,
};
use resource_arbiter::{ArbiterConfig, ApplicationRegistry};
use resource_arbiter_domain::entities::{ApplicationId, ApplicationState, WorkingModeId};
use resource_arbiter_domain::services::{BindingEngine, Contribution, CongestionContribution};
use resource_arbiter_domain::value_objects::{ExitCode, ResourceType};
use resource_arbiter_domain::ArbiterError;

#[test]
fn test_higher_priority_wins_scarce_platform() {
    let accountant = single_socket_platform(4, 0);
    let registry = Arc::new(ApplicationRegistry::new());
    registry.register(pe_application(1, 0, &[(0.5, 4)])).unwrap();
    registry.register(pe_application(2, 1, &[(0.5, 4)])).unwrap();

    let core = scheduler(&accountant, &registry);
    let outcome = core.run_cycle().unwrap();

    assert_eq!(outcome.exit, ExitCode::Ok);
    assert_eq!(outcome.placed.len(), 1);
    assert_eq!(outcome.placed[0].0, ApplicationId(1));
    assert_eq!(outcome.blocked, vec![ApplicationId(2)]);
    assert_eq!(
        registry.get(ApplicationId(1)).unwrap().state(),
        ApplicationState::Sync
    );
    assert_eq!(
        registry.get(ApplicationId(2)).unwrap().state(),
        ApplicationState::Blocked
    );
    accountant.audit().unwrap();
}

#[test]
fn test_under_performing_application_promoted() {
    let accountant = single_socket_platform(4, 0);
    let registry = Arc::new(ApplicationRegistry::new());
    registry
        .register(pe_application(1, 0, &[(0.3, 2), (0.9, 4)]))
        .unwrap();
    registry
        .set_goal_gap(
            ApplicationId(1),
            resource_arbiter_domain::value_objects::GoalGap::new(50).unwrap(),
        )
        .unwrap();

    let core = scheduler(&accountant, &registry);
    let outcome = core.run_cycle().unwrap();

    assert_eq!(outcome.placed.len(), 1);
    assert_eq!(outcome.placed[0].1.working_mode, WorkingModeId(1));
    accountant.audit().unwrap();
}

#[test]
fn test_migration_avoided_when_placement_unchanged() {
    let accountant = multi_socket_platform(2, 2);
    let registry = Arc::new(ApplicationRegistry::new());
    registry.register(pe_application(1, 0, &[(0.5, 2)])).unwrap();

    let core = scheduler(&accountant, &registry);
    let first = core.run_cycle().unwrap();
    assert_eq!(first.placed.len(), 1);
    // Ties break toward the lowest binding id.
    assert_eq!(first.placed[0].1.binding.lowest(), Some(0));
    registry.acknowledge_sync(ApplicationId(1)).unwrap();

    // Re-evaluation sees candidates on both sockets; the
    // reconfiguration index keeps the application where it runs.
    let second = core.run_cycle().unwrap();
    assert_eq!(second.placed.len(), 1);
    assert_eq!(second.placed[0].1.binding.lowest(), Some(0));
    assert_eq!(
        registry.get(ApplicationId(1)).unwrap().state(),
        ApplicationState::Running,
        "an unchanged placement must not re-synchronize"
    );
    accountant.audit().unwrap();
}

#[test]
fn test_fair_share_stops_third_placement() {
    let accountant = single_socket_platform(12, 0);
    let registry = Arc::new(ApplicationRegistry::new());
    for id in 1..=3 {
        registry.register(pe_application(id, 0, &[(0.5, 6)])).unwrap();
    }

    let core = scheduler(&accountant, &registry);
    let outcome = core.run_cycle().unwrap();

    // 3 x 6 pe cannot fit into 12; exactly two placements survive and
    // determinism picks the lowest application ids.
    assert_eq!(outcome.placed.len(), 2);
    assert_eq!(outcome.placed[0].0, ApplicationId(1));
    assert_eq!(outcome.placed[1].0, ApplicationId(2));
    assert_eq!(outcome.blocked, vec![ApplicationId(3)]);
    accountant.audit().unwrap();
}

#[test]
fn test_congestion_index_near_capacity() {
    let accountant = single_socket_platform(1, 10);
    let registry = Arc::new(ApplicationRegistry::new());

    // One mode asking for 9 of the 10 memory units.
    let recipe = r#"
[[working_mode]]
id = 0
value = 0.5

[[working_mode.request]]
path = "sys0.cpu.pe"
amount = 1

[[working_mode.request]]
path = "sys0.mem0"
amount = 9
"#;
    let catalogue = resource_arbiter::parse_recipe(recipe).unwrap();
    let app = resource_arbiter_domain::entities::Application::new(
        ApplicationId(1),
        "mem-hog",
        resource_arbiter_domain::value_objects::Priority::highest(),
        catalogue,
    )
    .unwrap();
    registry.register(app.clone()).unwrap();

    // The congestion index of the candidate lands in the exponential
    // region: positive but below the default penalty.
    let engine = BindingEngine::new(ResourceType::Cpu);
    let view = accountant.view();
    let mut probe = app;
    probe.make_ready().unwrap();
    let candidates = engine.candidates_for(&probe, &view);
    assert_eq!(candidates.len(), 1);
    let index = CongestionContribution::default().compute(&candidates[0], &view);
    assert!(index > 0.0, "index {} must stay positive", index);
    assert!(index < 0.1, "index {} must stay below the penalty", index);

    // The cycle still places the application.
    let core = scheduler(&accountant, &registry);
    let outcome = core.run_cycle().unwrap();
    assert_eq!(outcome.placed.len(), 1);
    accountant.audit().unwrap();
}

#[test]
fn test_budget_exhaustion_keeps_invariants() {
    let accountant = multi_socket_platform(4, 16);
    let registry = Arc::new(ApplicationRegistry::new());
    // A wide candidate space: 250 applications x 10 modes x 4 domains,
    // ten thousand candidates against a one-millisecond budget.
    let modes: Vec<(f32, u64)> = (1..=10).map(|i| (i as f32 / 10.0, i)).collect();
    for id in 1..=250 {
        registry.register(pe_application(id, 0, &modes)).unwrap();
    }

    let mut config = ArbiterConfig::default();
    config.cycle.budget_ms = 1;
    let core = scheduler_with_config(&accountant, &registry, config);

    match core.run_cycle() {
        // Budget ran out before any selection: nothing committed.
        Err(ArbiterError::Timeout(_)) => {
            let leaves = accountant.resolve(&"sys0.cpu0.pe".parse().unwrap());
            assert_eq!(accountant.available_of(&leaves, None, None), 16);
        }
        // Budget ran out mid-selection: the partial plan is committed.
        Ok(outcome) => {
            assert_eq!(outcome.exit, ExitCode::Timeout);
            for (id, _) in &outcome.placed {
                let app = registry.get(*id).unwrap();
                assert_eq!(app.state(), ApplicationState::Sync);
            }
        }
        Err(other) => panic!("unexpected cycle failure: {}", other),
    }
    accountant.audit().unwrap();
}

#[test]
fn test_identical_inputs_produce_identical_plans() {
    let build = || {
        let accountant = multi_socket_platform(2, 4);
        let registry = Arc::new(ApplicationRegistry::new());
        registry
            .register(pe_application(3, 0, &[(0.4, 2), (0.8, 4)]))
            .unwrap();
        registry
            .register(pe_application(1, 0, &[(0.4, 2), (0.8, 4)]))
            .unwrap();
        registry.register(pe_application(2, 1, &[(0.6, 3)])).unwrap();
        let core = scheduler(&accountant, &registry);
        core.run_cycle().unwrap()
    };

    let first = build();
    let second = build();
    assert_eq!(first.placed.len(), second.placed.len());
    for (a, b) in first.placed.iter().zip(second.placed.iter()) {
        assert_eq!(a.0, b.0);
        assert_eq!(a.1.working_mode, b.1.working_mode);
        assert_eq!(a.1.binding, b.1.binding);
    }
    assert_eq!(first.blocked, second.blocked);
}

#[test]
fn test_priority_never_loses_to_lower_level() {
    let accountant = single_socket_platform(4, 0);
    let registry = Arc::new(ApplicationRegistry::new());
    registry.register(pe_application(1, 1, &[(0.9, 2)])).unwrap();
    registry.register(pe_application(2, 0, &[(0.2, 3)])).unwrap();

    let core = scheduler(&accountant, &registry);
    let outcome = core.run_cycle().unwrap();

    // The level-0 application is served first regardless of value; the
    // level-1 application no longer fits.
    let placed_ids: Vec<ApplicationId> = outcome.placed.iter().map(|(id, _)| *id).collect();
    assert_eq!(placed_ids, vec![ApplicationId(2)]);
    assert_eq!(outcome.blocked, vec![ApplicationId(1)]);
    accountant.audit().unwrap();
}

#[test]
fn test_late_high_priority_arrival_displaces_holder() {
    let accountant = single_socket_platform(4, 0);
    let registry = Arc::new(ApplicationRegistry::new());
    registry.register(pe_application(1, 1, &[(0.5, 4)])).unwrap();

    let core = scheduler(&accountant, &registry);
    core.run_cycle().unwrap();
    registry.acknowledge_sync(ApplicationId(1)).unwrap();

    // A higher-priority application arrives wanting the same elements.
    // The next cycle re-plans from a clean slate, so the holder cannot
    // sit on capacity the new arrival is entitled to.
    registry.register(pe_application(2, 0, &[(0.5, 4)])).unwrap();
    let outcome = core.run_cycle().unwrap();

    assert_eq!(outcome.placed.len(), 1);
    assert_eq!(outcome.placed[0].0, ApplicationId(2));
    assert_eq!(outcome.blocked, vec![ApplicationId(1)]);
    assert_eq!(
        registry.get(ApplicationId(1)).unwrap().state(),
        ApplicationState::Blocked
    );
    accountant.audit().unwrap();
}

#[test]
fn test_blocked_application_returns_when_capacity_frees() {
    let accountant = single_socket_platform(4, 0);
    let registry = Arc::new(ApplicationRegistry::new());
    registry.register(pe_application(1, 0, &[(0.5, 4)])).unwrap();
    registry.register(pe_application(2, 1, &[(0.5, 4)])).unwrap();

    let core = scheduler(&accountant, &registry);
    core.run_cycle().unwrap();
    assert_eq!(
        registry.get(ApplicationId(2)).unwrap().state(),
        ApplicationState::Blocked
    );

    // The winner leaves; the blocked application is re-admitted and
    // takes the freed capacity on the next cycle.
    registry.unregister(ApplicationId(1)).unwrap();
    accountant.release_application(ApplicationId(1)).unwrap();
    let outcome = core.run_cycle().unwrap();
    assert_eq!(outcome.placed.len(), 1);
    assert_eq!(outcome.placed[0].0, ApplicationId(2));
    accountant.audit().unwrap();
}
