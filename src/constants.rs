// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Label that marks a source secret for replication
pub mod labels {
    pub const SYNC: &str = "kube-secret-sync";
    /// Selector used by the leader when listing source secrets
    pub const SELECTOR: &str = "kube-secret-sync=true";
}

/// Kubernetes annotation keys used by kube-secret-sync
pub mod annotations {
    /// RFC-3339 UTC rendering of the record's `updated_at` last applied on a follower
    pub const LAST_UPDATED: &str = "kube-secret-sync-last-updated";
    /// Written by `kubectl apply`; may hold a base64 copy of the plaintext data
    pub const LAST_APPLIED_CONFIGURATION: &str = "kubectl.kubernetes.io/last-applied-configuration";
}

/// Datastore pool configuration
pub mod pool {
    pub const MAX_CONNECTIONS: u32 = 10;
    pub const MIN_CONNECTIONS: u32 = 1;
    pub const ACQUIRE_TIMEOUT_SECS: u64 = 10;
    pub const MAX_LIFETIME_SECS: u64 = 30 * 60;
    pub const IDLE_TIMEOUT_SECS: u64 = 30 * 60;
}

pub const DEFAULT_TICK_SECONDS: u64 = 20;
