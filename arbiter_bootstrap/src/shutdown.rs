// /////////////////////////////////////////////////////////////////////////////
// Adaptive Resource Arbiter
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Shutdown Coordination
//!
//! Graceful shutdown for the daemon: a clonable [`CancellationToken`]
//! that long-running tasks poll or await, and a [`ShutdownCoordinator`]
//! that ties the token to process signals and a bounded grace period.
//! A scheduling cycle observing the token aborts its transaction, so
//! shutdown never leaves a partial commit behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

/// Default grace period before shutdown stops waiting for tasks.
pub const DEFAULT_GRACE_PERIOD_SECS: u64 = 5;

/// Clonable cancellation flag with async notification.
#[derive(Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel this token and wake every waiter.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Non-blocking check.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Wait until the token is cancelled.
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            let notified = self.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Couples the cancellation token to signals and a grace period.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    grace_period: Duration,
}

impl ShutdownCoordinator {
    pub fn new(grace_period: Duration) -> Self {
        Self {
            token: CancellationToken::new(),
            grace_period,
        }
    }

    /// The token tasks should observe.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Begin shutdown now.
    pub fn initiate(&self) {
        self.token.cancel();
    }

    /// Wait for SIGINT or SIGTERM, then cancel the token. Returns once
    /// cancellation is signalled (by a signal or by `initiate`).
    pub async fn listen_for_signals(&self) {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm = match tokio::signal::unix::signal(
                tokio::signal::unix::SignalKind::terminate(),
            ) {
                Ok(stream) => stream,
                Err(_) => {
                    // Signal registration failing leaves ctrl-c only.
                    tokio::select! {
                        _ = ctrl_c => {}
                        _ = self.token.cancelled() => {}
                    }
                    self.token.cancel();
                    return;
                }
            };
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
                _ = self.token.cancelled() => {}
            }
        }

        #[cfg(not(unix))]
        {
            tokio::select! {
                _ = ctrl_c => {}
                _ = self.token.cancelled() => {}
            }
        }

        self.token.cancel();
    }

    /// Give in-flight work up to the grace period to observe the token.
    pub async fn wait_for_grace_period(&self) {
        tokio::time::sleep(self.grace_period).await;
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_GRACE_PERIOD_SECS))
    }
}
