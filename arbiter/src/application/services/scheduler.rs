// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scheduler Core
//!
//! Drives the scheduling cycle over a frozen registry snapshot:
//!
//! 1. open one writing transaction on the accountant
//! 2. walk priority levels from 0 upward
//! 3. per level: initialize every contribution, enumerate candidates
//!    through the binding engine, score them in parallel on the bounded
//!    worker pool
//! 4. rank by score, ties broken by `(application, working mode, lowest
//!    binding id)` so identical inputs always produce identical plans
//! 5. greedily reserve winners under the token; capacity rejections are
//!    local and just skip the candidate
//! 6. commit the token once all levels are done; on any fatal failure
//!    the token is aborted and nothing becomes visible
//! 7. placed applications move to `Sync`, unplaced ones to `Blocked`
//!
//! ## Budget
//!
//! Each cycle has a wall-clock budget. Running out before anything was
//! selected cancels the cycle (`Timeout`, no commit). Running out
//! mid-selection finalizes what has been placed so far and commits it,
//! the one case where a partial plan becomes visible.
//!
//! The async `run_loop` wraps the synchronous cycle with the periodic
//! trigger, the on-demand trigger from the control surface, graceful
//! shutdown, and capped exponential back-off after failed cycles.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rayon::prelude::*;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use resource_arbiter_bootstrap::shutdown::CancellationToken;
use resource_arbiter_domain::entities::{Application, ApplicationId, Assignment};
use resource_arbiter_domain::services::{
    BindingEngine, Candidate, CongestionContribution, Contribution, FairnessContribution,
    LevelInfo, MetricsAggregator, ReconfigContribution, ValueContribution,
};
use resource_arbiter_domain::value_objects::{ExitCode, Priority};
use resource_arbiter_domain::ArbiterError;

use crate::infrastructure::config::ArbiterConfig;
use crate::infrastructure::metrics::MetricsService;
use crate::infrastructure::runtime::{
    build_scoring_pool, ApplicationRegistry, ResourceAccountant, TransactionToken,
};

/// Result of one scheduling cycle.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub exit: ExitCode,
    pub placed: Vec<(ApplicationId, Assignment)>,
    pub blocked: Vec<ApplicationId>,
    pub duration: Duration,
}

/// Build the aggregation policy from configuration. Contributions with
/// a zero weight are left out entirely.
pub fn build_aggregator(config: &ArbiterConfig) -> Result<MetricsAggregator, ArbiterError> {
    let c = &config.contributions;
    let mut contributions: Vec<(Box<dyn Contribution>, f32)> = Vec::new();
    if c.weights.value > 0 {
        contributions.push((
            Box::new(ValueContribution::new(c.nap_weight)),
            f32::from(c.weights.value),
        ));
    }
    if c.weights.reconfig > 0 {
        contributions.push((
            Box::new(ReconfigContribution::new(c.migration_factor)),
            f32::from(c.weights.reconfig),
        ));
    }
    if c.weights.congestion > 0 {
        contributions.push((
            Box::new(CongestionContribution::new(
                &c.congestion.penalties,
                &c.congestion.saturation,
                c.exp_base,
            )),
            f32::from(c.weights.congestion),
        ));
    }
    if c.weights.fairness > 0 {
        contributions.push((
            Box::new(FairnessContribution::new(&c.fairness.penalties, c.exp_base)),
            f32::from(c.weights.fairness),
        ));
    }
    MetricsAggregator::new(contributions, config.scoring.zero_gate)
}

/// The scheduling-cycle application service.
pub struct SchedulerCore {
    accountant: Arc<ResourceAccountant>,
    registry: Arc<ApplicationRegistry>,
    aggregator: Mutex<MetricsAggregator>,
    binding: BindingEngine,
    pool: rayon::ThreadPool,
    metrics: MetricsService,
    budget: Duration,
    period: Duration,
    backoff_base: Duration,
    backoff_cap: Duration,
    cancel_requested: AtomicBool,
}

impl SchedulerCore {
    pub fn new(
        accountant: Arc<ResourceAccountant>,
        registry: Arc<ApplicationRegistry>,
        config: &ArbiterConfig,
        metrics: MetricsService,
    ) -> Result<Self, ArbiterError> {
        Ok(Self {
            accountant,
            registry,
            aggregator: Mutex::new(build_aggregator(config)?),
            binding: BindingEngine::new(config.binding.domain),
            pool: build_scoring_pool(config.scoring.workers)?,
            metrics,
            budget: Duration::from_millis(config.cycle.budget_ms),
            period: Duration::from_millis(config.cycle.period_ms),
            backoff_base: Duration::from_millis(config.cycle.backoff_base_ms),
            backoff_cap: Duration::from_millis(config.cycle.backoff_cap_ms),
            cancel_requested: AtomicBool::new(false),
        })
    }

    /// Ask a cycle in progress to stop at the next level boundary. The
    /// token is aborted; no partial commit becomes visible.
    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, AtomicOrdering::SeqCst);
    }

    /// Run one full scheduling cycle against the current registry.
    pub fn run_cycle(&self) -> Result<CycleOutcome, ArbiterError> {
        if self.accountant.is_poisoned() {
            return Err(ArbiterError::Corrupted(
                "accounting poisoned; cycles disabled".to_string(),
            ));
        }
        let started = Instant::now();
        let snapshot = self.registry.freeze();
        let result = self.cycle_inner(&snapshot, started);

        let outcome = match result {
            Ok(outcome) => {
                self.registry
                    .apply_outcome(&outcome.placed, &outcome.blocked)
                    .and(Ok(outcome))
            }
            Err(e) => Err(e),
        };
        self.registry.thaw();

        match &outcome {
            Ok(outcome) => {
                self.metrics.record_cycle(outcome.duration);
                if outcome.exit == ExitCode::Timeout {
                    self.metrics.record_cycle_timeout();
                }
                self.metrics
                    .set_applications_registered(self.registry.len() as i64);
                self.metrics
                    .set_applications_blocked(outcome.blocked.len() as i64);
                info!(
                    placed = outcome.placed.len(),
                    blocked = outcome.blocked.len(),
                    duration_us = outcome.duration.as_micros() as u64,
                    exit = ?outcome.exit,
                    "scheduling cycle committed"
                );
            }
            Err(ArbiterError::Timeout(_)) => {
                self.metrics.record_cycle_timeout();
            }
            Err(e) => {
                self.metrics.record_cycle_failure();
                warn!(error = %e, "scheduling cycle failed");
            }
        }
        outcome
    }

    fn cycle_inner(
        &self,
        snapshot: &[Application],
        started: Instant,
    ) -> Result<CycleOutcome, ArbiterError> {
        let token = self.accountant.open_transaction()?;
        // The cycle rebuilds the allocation of every schedulable
        // application from a clean slate: current holdings count as
        // free under the token and fall away at commit unless won back.
        let replanning: Vec<ApplicationId> = snapshot
            .iter()
            .filter(|app| app.state().is_schedulable())
            .map(|app| app.id())
            .collect();
        if let Err(e) = self.accountant.begin_replanning(&token, &replanning) {
            let _ = self.accountant.release(&token);
            return Err(e);
        }
        match self.plan_levels(snapshot, started, &token) {
            Ok((placed, blocked, timed_out)) => {
                if let Err(e) = self.accountant.commit(&token, &blocked) {
                    // Commit either applied everything or poisoned the
                    // book; both ways nothing tentative survives.
                    error!(error = %e, "commit failed");
                    return Err(ArbiterError::ScheduleFailed(e.to_string()));
                }
                Ok(CycleOutcome {
                    exit: if timed_out {
                        ExitCode::Timeout
                    } else {
                        ExitCode::Ok
                    },
                    placed,
                    blocked,
                    duration: started.elapsed(),
                })
            }
            Err(e) => {
                if let Err(release_error) = self.accountant.release(&token) {
                    error!(error = %release_error, "token release failed after {}", e);
                }
                Err(e)
            }
        }
    }

    /// Walk the priority levels, filling `placed` and `blocked`.
    /// Returns the timeout flag for the partial-finalize case.
    #[allow(clippy::type_complexity)]
    fn plan_levels(
        &self,
        snapshot: &[Application],
        started: Instant,
        token: &TransactionToken,
    ) -> Result<(Vec<(ApplicationId, Assignment)>, Vec<ApplicationId>, bool), ArbiterError> {
        let view = self.accountant.token_view(token);
        let mut placed: Vec<(ApplicationId, Assignment)> = Vec::new();
        let mut blocked: Vec<ApplicationId> = Vec::new();
        let mut timed_out = false;

        let levels = ApplicationRegistry::level_count(snapshot);
        for level in 0..levels {
            if self.cancel_requested.swap(false, AtomicOrdering::SeqCst) {
                return Err(ArbiterError::ScheduleFailed("cycle cancelled".to_string()));
            }
            let priority = Priority::new(level)?;
            let applications = ApplicationRegistry::applications_at(snapshot, priority);
            if applications.is_empty() {
                continue;
            }

            if started.elapsed() > self.budget {
                if placed.is_empty() {
                    return Err(ArbiterError::Timeout(format!(
                        "budget {:?} exhausted before selection",
                        self.budget
                    )));
                }
                timed_out = true;
                break;
            }

            let level_info = LevelInfo {
                priority,
                application_count: applications.len(),
                domain: self.binding.domain(),
                domain_ids: self.accountant.domain_ids(self.binding.domain()),
            };
            {
                let mut aggregator = self.aggregator.lock();
                aggregator.init_level(&level_info, &view)?;
            }

            let mut candidates: Vec<Candidate> = Vec::new();
            for application in &applications {
                candidates.extend(self.binding.candidates_for(application, &view));
            }
            self.metrics.add_candidates_evaluated(candidates.len() as u64);
            debug!(
                priority = level,
                applications = applications.len(),
                candidates = candidates.len(),
                "scoring level"
            );

            // Parallel scoring; selection below stays serial.
            let aggregator = self.aggregator.lock();
            let scores: Vec<Option<f32>> = self.pool.install(|| {
                candidates
                    .par_iter()
                    .map(|candidate| aggregator.score(candidate, &view))
                    .collect()
            });
            drop(aggregator);

            let mut ranked: Vec<(f32, &Candidate)> = candidates
                .iter()
                .zip(scores)
                .filter_map(|(candidate, score)| score.map(|s| (s, candidate)))
                .collect();
            ranked.sort_by(|a, b| rank_order(a, b));

            let mut placed_here: BTreeSet<ApplicationId> = BTreeSet::new();
            for (score, candidate) in &ranked {
                if started.elapsed() > self.budget {
                    timed_out = true;
                    break;
                }
                let app_id = candidate.app.id;
                if placed_here.contains(&app_id) {
                    continue;
                }
                match self.try_reserve(token, candidate) {
                    Ok(()) => {
                        debug!(
                            application = %app_id,
                            working_mode = %candidate.working_mode,
                            binding = %candidate.binding,
                            score,
                            "candidate selected"
                        );
                        placed_here.insert(app_id);
                        placed.push((
                            app_id,
                            Assignment {
                                working_mode: candidate.working_mode,
                                binding: candidate.binding,
                            },
                        ));
                    }
                    Err(e) if e.is_local() => {
                        self.accountant.withdraw(token, app_id)?;
                        self.metrics.record_reservation_rejected();
                        debug!(application = %app_id, error = %e, "candidate skipped");
                    }
                    Err(e) => return Err(e),
                }
            }

            for application in &applications {
                if !placed_here.contains(&application.id()) {
                    blocked.push(application.id());
                }
            }
            if timed_out {
                break;
            }
        }

        // Every re-planned application must leave the cycle placed or
        // blocked; levels skipped by a timeout forfeit their holdings.
        for application in snapshot {
            let id = application.id();
            if application.state().is_schedulable()
                && !placed.iter().any(|(placed_id, _)| *placed_id == id)
                && !blocked.contains(&id)
            {
                blocked.push(id);
            }
        }

        Ok((placed, blocked, timed_out))
    }

    /// Reserve every request of a candidate under the token.
    fn try_reserve(
        &self,
        token: &TransactionToken,
        candidate: &Candidate,
    ) -> Result<(), ArbiterError> {
        for request in &candidate.requests {
            self.accountant.reserve(
                token,
                candidate.app.id,
                &request.resolved,
                request.amount,
                request.divide,
            )?;
        }
        Ok(())
    }

    /// Daemon loop: run cycles on the period timer and on explicit
    /// triggers until shutdown, backing off after failed cycles.
    pub async fn run_loop(self: Arc<Self>, trigger: Arc<Notify>, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut backoff = self.backoff_base;

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    self.request_cancel();
                    break;
                }
                _ = interval.tick() => {}
                _ = trigger.notified() => {}
            }

            let core = Arc::clone(&self);
            let result = tokio::task::block_in_place(move || core.run_cycle());
            match result {
                Ok(_) => {
                    backoff = self.backoff_base;
                }
                Err(e) if e.is_fatal() => {
                    error!(error = %e, "scheduler stopped on fatal accounting failure");
                    break;
                }
                Err(ArbiterError::Timeout(_)) => {
                    // Over-budget cycles are retried at the next trigger
                    // without escalation.
                }
                Err(e) => {
                    warn!(error = %e, backoff_ms = backoff.as_millis() as u64, "cycle retry");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(self.backoff_cap);
                }
            }
        }
        info!("scheduler loop stopped");
    }
}

/// Descending score; ties by application id, then working-mode id, then
/// lowest binding id.
fn rank_order(a: &(f32, &Candidate), b: &(f32, &Candidate)) -> Ordering {
    b.0.partial_cmp(&a.0)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.1.app.id.cmp(&b.1.app.id))
        .then_with(|| a.1.working_mode.cmp(&b.1.working_mode))
        .then_with(|| a.1.binding.lowest().cmp(&b.1.binding.lowest()))
}
