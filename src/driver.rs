// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Periodic scheduler for leader or follower ticks.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::{Result, SyncError};
use crate::sync::{Tick, TickStats};

/// Runs one [`Tick`] implementation, chosen at startup, either once or every `period`.
/// Ticks never overlap.
pub struct TickDriver {
    tick: Arc<dyn Tick>,
    period: Duration,
    timeout: Option<Duration>,
}

impl TickDriver {
    pub fn new(tick: Arc<dyn Tick>, period: Duration) -> Self {
        Self {
            tick,
            period,
            timeout: None,
        }
    }

    /// Fail any tick that runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run a single tick and return its outcome
    pub async fn run_once(&self, shutdown: &CancellationToken) -> Result<TickStats> {
        warn!(
            role = %self.tick.role(),
            "Running locally, triggering tick once then exiting"
        );
        let started = Instant::now();
        let stats = self.run_tick(shutdown).await?;
        info!(elapsed = ?started.elapsed(), %stats, "Tick complete");
        Ok(stats)
    }

    /// Tick every period until `shutdown` is cancelled. Tick errors are logged and
    /// the next tick is scheduled as usual.
    pub async fn run_forever(&self, shutdown: &CancellationToken) {
        info!(
            role = %self.tick.role(),
            period = ?self.period,
            "Starting tick loop"
        );
        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    info!("Received shutdown, stopping tick loop");
                    return;
                }
                _ = interval.tick() => {
                    let started = Instant::now();
                    match self.run_tick(shutdown).await {
                        Ok(stats) => debug!(elapsed = ?started.elapsed(), %stats, "Ticked"),
                        Err(SyncError::Cancelled) if shutdown.is_cancelled() => {
                            info!("Tick interrupted by shutdown");
                        }
                        Err(e) => error!(elapsed = ?started.elapsed(), "Tick failed: {}", e),
                    }
                }
            }
        }
    }

    /// One tick under its own cancellation scope, cancelled when the tick returns
    async fn run_tick(&self, shutdown: &CancellationToken) -> Result<TickStats> {
        let scope = shutdown.child_token();
        let _guard = scope.clone().drop_guard();

        match self.timeout {
            Some(limit) => time::timeout(limit, self.tick.tick(&scope))
                .await
                .map_err(|_| SyncError::Timeout(limit))?,
            None => self.tick.tick(&scope).await,
        }
    }
}

/// Cancel `shutdown` once `signal` fires. If listening fails the token is left alone
/// and the process keeps running.
pub async fn cancel_on_signal<F>(signal: F, shutdown: CancellationToken)
where
    F: Future<Output = io::Result<()>>,
{
    match signal.await {
        Ok(()) => {
            info!("Got exit signal, cleaning up");
            shutdown.cancel();
        }
        Err(e) => error!("Failed to listen for exit signal, continuing without it: {}", e),
    }
}
