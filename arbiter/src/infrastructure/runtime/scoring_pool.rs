// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Scoring Worker Pool
//!
//! A dedicated, bounded rayon pool for parallel candidate scoring. The
//! scheduler fans the independent candidates of one priority level out
//! over this pool and joins before selection, which stays serial. A
//! dedicated pool (instead of the rayon global) keeps scoring isolated
//! from any other data-parallel work in the process and makes the bound
//! explicit.

use rayon::{ThreadPool, ThreadPoolBuilder};

use resource_arbiter_domain::ArbiterError;

/// Upper bound on scoring workers; more buys nothing on one cycle.
pub const MAX_SCORING_WORKERS: usize = 64;

/// Build the bounded scoring pool. `workers == 0` picks the available
/// parallelism minus one, leaving a core for the daemon itself.
pub fn build_scoring_pool(workers: usize) -> Result<ThreadPool, ArbiterError> {
    if workers > MAX_SCORING_WORKERS {
        return Err(ArbiterError::InvalidConfiguration(format!(
            "scoring workers {} above maximum {}",
            workers, MAX_SCORING_WORKERS
        )));
    }
    let workers = if workers == 0 {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        (cores - 1).max(1)
    } else {
        workers
    };
    ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("arbiter-score-{}", i))
        .build()
        .map_err(|e| ArbiterError::InvalidConfiguration(format!("scoring pool: {}", e)))
}
