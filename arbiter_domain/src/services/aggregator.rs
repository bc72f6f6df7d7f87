// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Metrics Aggregator
//!
//! Collapses the contribution indices of a candidate into one score
//! through a weighted sum. Weights come from configuration and are
//! normalized to sum to 1 at construction, so the score stays in
//! `[0, 1]` like the indices feeding it.
//!
//! A contribution returning 0 is not special by itself; with the
//! optional zero gate enabled, however, such a candidate is excluded
//! from selection entirely (`score` returns `None`).

use crate::error::ArbiterError;
use crate::services::binding::Candidate;
use crate::services::contribution::{Contribution, LevelInfo};
use crate::services::resource_view::ResourceView;

struct Entry {
    contribution: Box<dyn Contribution>,
    weight: f32,
}

/// Weighted combination of scheduling contributions.
pub struct MetricsAggregator {
    entries: Vec<Entry>,
    zero_gate: bool,
}

impl MetricsAggregator {
    /// Build from `(contribution, weight)` pairs. Weights must be
    /// positive; they are normalized so that they sum to 1.
    pub fn new(
        contributions: Vec<(Box<dyn Contribution>, f32)>,
        zero_gate: bool,
    ) -> Result<Self, ArbiterError> {
        if contributions.is_empty() {
            return Err(ArbiterError::InvalidConfiguration(
                "aggregator needs at least one contribution".to_string(),
            ));
        }
        let sum: f32 = contributions.iter().map(|(_, w)| *w).sum();
        if sum <= 0.0 || contributions.iter().any(|(_, w)| *w < 0.0) {
            return Err(ArbiterError::InvalidConfiguration(
                "contribution weights must be positive".to_string(),
            ));
        }
        let entries = contributions
            .into_iter()
            .map(|(contribution, weight)| Entry {
                contribution,
                weight: weight / sum,
            })
            .collect();
        Ok(Self { entries, zero_gate })
    }

    /// Names and normalized weights, in aggregation order.
    pub fn weights(&self) -> Vec<(&'static str, f32)> {
        self.entries
            .iter()
            .map(|entry| (entry.contribution.name(), entry.weight))
            .collect()
    }

    /// Initialize every contribution for the given priority level. Must
    /// run before any candidate of the level is scored.
    pub fn init_level(
        &mut self,
        level: &LevelInfo,
        view: &dyn ResourceView,
    ) -> Result<(), ArbiterError> {
        for entry in &mut self.entries {
            entry.contribution.init(level, view)?;
        }
        Ok(())
    }

    /// Score a candidate. `None` when the zero gate excludes it.
    pub fn score(&self, candidate: &Candidate, view: &dyn ResourceView) -> Option<f32> {
        let mut score = 0.0f32;
        for entry in &self.entries {
            let index = entry.contribution.compute(candidate, view).clamp(0.0, 1.0);
            if index == 0.0 && self.zero_gate {
                return None;
            }
            score += entry.weight * index;
        }
        Some(score)
    }
}
