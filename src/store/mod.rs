// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Durable storage of encrypted secret manifests, keyed by (namespace, name).

pub mod postgres;

pub use postgres::PgManifestStore;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;

/// A persisted row of `kss_secrets`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct SecretRecord {
    #[sqlx(rename = "ns")]
    pub namespace: String,
    pub secret_name: String,
    /// Source secret with its data values replaced by ciphertext
    pub manifest: serde_json::Value,
    /// Hex SHA-256 of the source secret before encryption
    pub manifest_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SecretRecord {
    /// `updated_at` in the freshness annotation format
    pub fn last_updated(&self) -> String {
        format_last_updated(&self.updated_at)
    }
}

/// RFC-3339 UTC with second precision and a `Z` suffix, e.g. `2024-05-01T12:00:00Z`.
/// Strings in this format sort chronologically.
pub fn format_last_updated(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
pub trait ManifestStore: Send + Sync {
    /// Insert the manifest, or replace it when `manifest_hash` differs from the stored one.
    /// Returns the number of rows written; 0 means the stored row already had this hash.
    async fn upsert(
        &self,
        namespace: &str,
        name: &str,
        manifest: &serde_json::Value,
        manifest_hash: &str,
    ) -> Result<u64>;

    /// Every stored record, in no particular order
    async fn list_all(&self) -> Result<Vec<SecretRecord>>;

    async fn get(&self, namespace: &str, name: &str) -> Result<SecretRecord>;
}
