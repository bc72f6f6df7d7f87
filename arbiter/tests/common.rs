// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Common Test Helpers
//!
//! Shared fixtures for integration tests: canned platforms, recipe
//! builders, and a fully wired scheduler.

use std::sync::Arc;

use resource_arbiter::{
    ArbiterConfig, ApplicationRegistry, MetricsService, PlatformDescription, ResourceAccountant,
    SchedulerCore,
};
use resource_arbiter_domain::entities::{Application, ApplicationId};
use resource_arbiter_domain::value_objects::Priority;

/// Platform with one CPU socket of `pes` single-share processing
/// elements and one memory bank of `mem` units.
pub fn single_socket_platform(pes: u16, mem: u64) -> Arc<ResourceAccountant> {
    let accountant = Arc::new(ResourceAccountant::new());
    let mut text = String::new();
    if mem > 0 {
        text.push_str(&format!(
            "[[memory]]\nid = 0\nquantity = {}\nunit = \"B\"\n\n",
            mem
        ));
    }
    text.push_str("[[cpu]]\nid = 0\n");
    if mem > 0 {
        text.push_str("memory = 0\n");
    }
    for pe in 0..pes {
        text.push_str(&format!(
            "\n[[cpu.pe]]\nid = {}\npartition = \"mdev\"\nshare = 1\n",
            pe
        ));
    }
    let description = PlatformDescription::from_toml(&text).expect("platform fixture");
    description.install(&accountant).expect("install fixture");
    accountant
}

/// Platform with `sockets` CPU sockets of `pes_each` elements each.
pub fn multi_socket_platform(sockets: u16, pes_each: u16) -> Arc<ResourceAccountant> {
    let accountant = Arc::new(ResourceAccountant::new());
    let mut text = String::new();
    for socket in 0..sockets {
        text.push_str(&format!("[[cpu]]\nid = {}\n", socket));
        for pe in 0..pes_each {
            text.push_str(&format!(
                "\n[[cpu.pe]]\nid = {}\npartition = \"mdev\"\nshare = 1\n",
                pe
            ));
        }
        text.push('\n');
    }
    let description = PlatformDescription::from_toml(&text).expect("platform fixture");
    description.install(&accountant).expect("install fixture");
    accountant
}

/// Recipe with one working mode per `(value, pe_amount)` pair, ids in
/// order of appearance.
pub fn pe_recipe(modes: &[(f32, u64)]) -> String {
    let mut text = String::new();
    for (id, (value, amount)) in modes.iter().enumerate() {
        text.push_str(&format!(
            "[[working_mode]]\nid = {}\nvalue = {}\n\n[[working_mode.request]]\npath = \"sys0.cpu.pe\"\namount = {}\n\n",
            id, value, amount
        ));
    }
    text
}

/// Registered application built from a `pe_recipe`.
pub fn pe_application(
    id: u32,
    priority: u8,
    modes: &[(f32, u64)],
) -> Application {
    let catalogue = resource_arbiter::parse_recipe(&pe_recipe(modes)).expect("recipe fixture");
    Application::new(
        ApplicationId(id),
        format!("app-{}", id),
        Priority::new(priority).expect("priority fixture"),
        catalogue,
    )
    .expect("application fixture")
}

/// Scheduler wired against the given services with the default
/// configuration (single scoring worker for determinism in tests).
pub fn scheduler(
    accountant: &Arc<ResourceAccountant>,
    registry: &Arc<ApplicationRegistry>,
) -> SchedulerCore {
    scheduler_with_config(accountant, registry, ArbiterConfig::default())
}

pub fn scheduler_with_config(
    accountant: &Arc<ResourceAccountant>,
    registry: &Arc<ApplicationRegistry>,
    mut config: ArbiterConfig,
) -> SchedulerCore {
    // One scoring worker keeps fixture timing deterministic.
    config.scoring.workers = 1;
    SchedulerCore::new(
        Arc::clone(accountant),
        Arc::clone(registry),
        &config,
        MetricsService::new().expect("metrics fixture"),
    )
    .expect("scheduler fixture")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_socket_fixture_shape() {
        let accountant = single_socket_platform(4, 10);
        assert_eq!(
            accountant.query_total(&"sys0.cpu0.pe".parse().unwrap()),
            4
        );
        assert_eq!(accountant.query_total(&"sys0.mem0".parse().unwrap()), 10);
    }

    #[test]
    fn test_recipe_fixture_parses() {
        let catalogue =
            resource_arbiter::parse_recipe(&pe_recipe(&[(0.3, 2), (0.9, 4)])).unwrap();
        assert_eq!(catalogue.len(), 2);
    }
}
