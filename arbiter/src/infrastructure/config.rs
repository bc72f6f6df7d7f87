// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Daemon Configuration
//!
//! Layered configuration for the arbiter daemon: built-in defaults, an
//! optional TOML file, and `ARBITER_`-prefixed environment overrides, in
//! that precedence order. Everything is validated once at load; the
//! rest of the daemon works with plain typed values.
//!
//! ## Example
//!
//! ```toml
//! # arbiter.toml
//! [cycle]
//! budget_ms = 500
//! period_ms = 1000
//!
//! [scoring]
//! workers = 4
//! zero_gate = false
//!
//! [binding]
//! domain = "cpu"
//!
//! [contributions]
//! nap_weight = 50
//! migration_factor = 5
//! exp_base = 2
//!
//! [contributions.weights]
//! value = 20
//! reconfig = 5
//! congestion = 5
//! fairness = 18
//!
//! [contributions.congestion.penalties]
//! pe = 10
//! mem = 10
//!
//! [contributions.congestion.saturation]
//! pe = 90
//! mem = 70
//!
//! [contributions.fairness.penalties]
//! pe = 10
//! ```
//!
//! Environment overrides use `__` as the section separator, e.g.
//! `ARBITER_CYCLE__BUDGET_MS=250`.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use resource_arbiter_domain::value_objects::ResourceType;
use resource_arbiter_domain::ArbiterError;

/// Scheduling-cycle timing and retry settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleSettings {
    /// Budget of one cycle in milliseconds.
    pub budget_ms: u64,
    /// Period of the timer trigger in milliseconds.
    pub period_ms: u64,
    /// First back-off delay after a failed cycle.
    pub backoff_base_ms: u64,
    /// Back-off ceiling.
    pub backoff_cap_ms: u64,
}

impl Default for CycleSettings {
    fn default() -> Self {
        Self {
            budget_ms: 500,
            period_ms: 1000,
            backoff_base_ms: 100,
            backoff_cap_ms: 5000,
        }
    }
}

/// Parallel-scoring settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ScoringSettings {
    /// Worker threads for candidate scoring; 0 = auto.
    pub workers: usize,
    /// Exclude candidates where any contribution scores exactly 0.
    pub zero_gate: bool,
}

/// Binding-domain selection.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BindingSettings {
    /// Resource type candidates are bound to.
    pub domain: ResourceType,
}

impl Default for BindingSettings {
    fn default() -> Self {
        Self {
            domain: ResourceType::Cpu,
        }
    }
}

/// Aggregation weights per contribution, in arbitrary positive units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WeightSettings {
    pub value: u16,
    pub reconfig: u16,
    pub congestion: u16,
    pub fairness: u16,
}

impl Default for WeightSettings {
    fn default() -> Self {
        Self {
            value: 20,
            reconfig: 5,
            congestion: 5,
            fairness: 18,
        }
    }
}

/// Congestion filter tables, percent per resource type.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct CongestionSettings {
    pub penalties: BTreeMap<ResourceType, u16>,
    pub saturation: BTreeMap<ResourceType, u16>,
}

/// Fairness filter table, percent per resource type.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct FairnessSettings {
    pub penalties: BTreeMap<ResourceType, u16>,
}

/// Scoring-policy parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContributionSettings {
    pub weights: WeightSettings,
    /// Goal-gap weight of the value contribution, percent.
    pub nap_weight: u16,
    /// Migration cost factor of the reconfiguration contribution.
    pub migration_factor: u16,
    /// Base of the exponential filter branch.
    pub exp_base: u16,
    pub congestion: CongestionSettings,
    pub fairness: FairnessSettings,
}

impl Default for ContributionSettings {
    fn default() -> Self {
        Self {
            weights: WeightSettings::default(),
            nap_weight: 50,
            migration_factor: 5,
            exp_base: 2,
            congestion: CongestionSettings::default(),
            fairness: FairnessSettings::default(),
        }
    }
}

/// Root daemon configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ArbiterConfig {
    pub cycle: CycleSettings,
    pub scoring: ScoringSettings,
    pub binding: BindingSettings,
    pub contributions: ContributionSettings,
}

impl ArbiterConfig {
    /// Load configuration: defaults, then the optional file, then
    /// environment overrides.
    pub fn load(file: Option<&Path>) -> Result<Self, ArbiterError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("ARBITER")
                .separator("__")
                .try_parsing(true),
        );
        let settings: ArbiterConfig = builder
            .build()
            .map_err(|e| ArbiterError::InvalidConfiguration(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ArbiterError::InvalidConfiguration(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Range checks beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), ArbiterError> {
        if self.cycle.budget_ms == 0 {
            return Err(ArbiterError::InvalidConfiguration(
                "cycle.budget_ms must be positive".to_string(),
            ));
        }
        if self.cycle.period_ms == 0 {
            return Err(ArbiterError::InvalidConfiguration(
                "cycle.period_ms must be positive".to_string(),
            ));
        }
        if self.cycle.backoff_base_ms == 0 || self.cycle.backoff_cap_ms < self.cycle.backoff_base_ms
        {
            return Err(ArbiterError::InvalidConfiguration(
                "back-off base must be positive and below the cap".to_string(),
            ));
        }
        if self.contributions.exp_base < 2 {
            return Err(ArbiterError::InvalidConfiguration(
                "contributions.exp_base must be at least 2".to_string(),
            ));
        }
        let weights = &self.contributions.weights;
        if weights.value == 0
            && weights.reconfig == 0
            && weights.congestion == 0
            && weights.fairness == 0
        {
            return Err(ArbiterError::InvalidConfiguration(
                "at least one contribution weight must be positive".to_string(),
            ));
        }
        for (name, table) in [
            ("congestion.penalties", &self.contributions.congestion.penalties),
            ("congestion.saturation", &self.contributions.congestion.saturation),
            ("fairness.penalties", &self.contributions.fairness.penalties),
        ] {
            if let Some((ty, value)) = table.iter().find(|(_, v)| **v > 100) {
                return Err(ArbiterError::InvalidConfiguration(format!(
                    "contributions.{}.{} = {} above 100 percent",
                    name, ty, value
                )));
            }
        }
        Ok(())
    }
}
