// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Arbiter Daemon
//!
//! Composition root of the resource arbiter: parses the command line,
//! initializes logging, loads configuration and the platform
//! description, wires the long-lived services, optionally registers a
//! startup workload, and runs scheduling cycles until shutdown (or for
//! a fixed count with `--cycles`).

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use tokio::sync::Notify;
use tracing::info;

use resource_arbiter::{
    ArbiterConfig, ArbiterControl, ApplicationRegistry, MetricsService, PlatformDescription,
    RegistrationRequest, ResourceAccountant, SchedulerCore, CONTROL_PROTOCOL_VERSION,
};
use resource_arbiter_bootstrap::{
    init_tracing, BootstrapLogger, ConsoleLogger, DaemonArgs, ShutdownCoordinator,
};
use resource_arbiter_domain::entities::ApplicationId;
use resource_arbiter_domain::value_objects::Priority;

/// One entry of the startup workload manifest.
#[derive(Debug, Deserialize)]
struct WorkloadEntry {
    id: u32,
    name: String,
    priority: u8,
    /// Recipe file, relative to the manifest.
    recipe: String,
}

#[derive(Debug, Deserialize)]
struct WorkloadDoc {
    #[serde(default)]
    application: Vec<WorkloadEntry>,
}

fn register_workload(control: &ArbiterControl, manifest: &Path) -> anyhow::Result<usize> {
    let text = std::fs::read_to_string(manifest)
        .with_context(|| format!("workload '{}'", manifest.display()))?;
    let doc: WorkloadDoc = toml::from_str(&text)
        .with_context(|| format!("workload '{}'", manifest.display()))?;
    let base = manifest.parent().unwrap_or_else(|| Path::new("."));

    for entry in &doc.application {
        let recipe_path = base.join(&entry.recipe);
        let recipe = std::fs::read_to_string(&recipe_path)
            .with_context(|| format!("recipe '{}'", recipe_path.display()))?;
        control
            .register_application(RegistrationRequest {
                id: ApplicationId(entry.id),
                name: entry.name.clone(),
                priority: Priority::new(entry.priority)?,
                recipe,
                client_version: CONTROL_PROTOCOL_VERSION,
            })
            .with_context(|| format!("registering '{}'", entry.name))?;
    }
    Ok(doc.application.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = DaemonArgs::parse();
    init_tracing(&args.log_level).map_err(anyhow::Error::msg)?;
    let logger = ConsoleLogger::with_prefix("arbiterd");

    if let Err(message) = args.validate() {
        logger.error(&message);
        anyhow::bail!(message);
    }

    let config = ArbiterConfig::load(args.config.as_deref())?;
    let metrics = MetricsService::new()?;

    let accountant = Arc::new(ResourceAccountant::new());
    let platform = PlatformDescription::load(&args.platform)?;
    platform.install(&accountant)?;
    logger.info(&format!(
        "platform '{}' installed ({} resource types)",
        args.platform.display(),
        accountant.count_resource_types()
    ));

    let registry = Arc::new(ApplicationRegistry::new());
    let trigger = Arc::new(Notify::new());
    let control = ArbiterControl::new(
        Arc::clone(&registry),
        Arc::clone(&accountant),
        Arc::clone(&trigger),
    );

    if let Some(manifest) = &args.workload {
        let count = register_workload(&control, manifest)?;
        logger.info(&format!("registered {} workload applications", count));
    }

    let scheduler = Arc::new(SchedulerCore::new(
        Arc::clone(&accountant),
        Arc::clone(&registry),
        &config,
        metrics.clone(),
    )?);

    if let Some(cycles) = args.cycles {
        for _ in 0..cycles {
            let outcome = tokio::task::block_in_place(|| scheduler.run_cycle())?;
            for (id, assignment) in &outcome.placed {
                info!(
                    application = %id,
                    working_mode = %assignment.working_mode,
                    binding = %assignment.binding,
                    "placed"
                );
            }
            for id in &outcome.blocked {
                info!(application = %id, "blocked");
            }
        }
        print!("{}", metrics.encode()?);
        return Ok(());
    }

    let coordinator = ShutdownCoordinator::default();
    let loop_handle = tokio::spawn(
        Arc::clone(&scheduler).run_loop(Arc::clone(&trigger), coordinator.token()),
    );

    logger.info("arbiter daemon running");
    coordinator.listen_for_signals().await;
    logger.info("shutdown requested");
    coordinator.wait_for_grace_period().await;
    loop_handle.abort();
    let _ = loop_handle.await;
    logger.info("arbiter daemon stopped");
    Ok(())
}
