// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Leader and follower reconciliation passes.

pub mod follower;
pub mod leader;
pub mod manifest;

#[cfg(test)]
mod scenarios;

pub use follower::FollowerTick;
pub use leader::LeaderTick;

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use tokio_util::sync::CancellationToken;

use crate::config::Role;
use crate::error::{Result, SyncError};

/// What a single tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Source secrets (leader) or stored records (follower) looked at
    pub examined: usize,
    /// Secrets created on the follower
    pub created: usize,
    /// Rows written by the leader, or secrets patched by the follower
    pub updated: usize,
    /// No-op upserts, or follower secrets already up to date
    pub unchanged: usize,
}

impl fmt::Display for TickStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "examined={} created={} updated={} unchanged={}",
            self.examined, self.created, self.updated, self.unchanged
        )
    }
}

/// One reconciliation pass. The driver only depends on this.
#[async_trait]
pub trait Tick: Send + Sync {
    fn role(&self) -> Role;

    /// Run one pass. Must return promptly with [`SyncError::Cancelled`] once `cancel` fires.
    async fn tick(&self, cancel: &CancellationToken) -> Result<TickStats>;
}

/// Race `fut` against the tick's cancellation scope
pub(crate) async fn cancellable<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(SyncError::Cancelled),
        res = fut => res,
    }
}
