// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use std::time::Duration;

use thiserror::Error;

use crate::crypto::CipherError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigError(String),

    #[error("Secret {namespace}/{name} not found")]
    SecretNotFound { namespace: String, name: String },

    #[error("No stored manifest for {namespace}/{name}")]
    RecordNotFound { namespace: String, name: String },

    #[error("Datastore error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Cipher error: {0}")]
    CipherError(#[from] CipherError),

    #[error("Manifest (de)serialization failed: {0}")]
    ManifestError(#[from] serde_json::Error),

    #[error("Invalid secret: {0}")]
    InvalidSecret(String),

    #[error("Tick cancelled")]
    Cancelled,

    #[error("Tick exceeded its deadline of {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, SyncError>;
