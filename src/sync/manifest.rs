// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Sealing source secrets into stored manifests and opening them again on followers.

use k8s_openapi::api::core::v1::Secret;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::constants::annotations;
use crate::crypto::PayloadCipher;
use crate::error::{Result, SyncError};
use crate::store::SecretRecord;

/// A source secret ready to be upserted
#[derive(Debug, Clone, PartialEq)]
pub struct SealedManifest {
    pub namespace: String,
    pub name: String,
    /// The secret with ciphertext data and without the last-applied annotation
    pub manifest: Value,
    pub manifest_hash: String,
}

/// Hex SHA-256 over the JSON serialization of `secret`
pub fn manifest_hash(secret: &Secret) -> Result<String> {
    let bytes = serde_json::to_vec(secret)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Hash the source secret, then encrypt its data values and drop
/// `kubectl.kubernetes.io/last-applied-configuration`, which can embed the plaintext.
///
/// The hash is taken before encryption because every seal uses fresh nonces.
pub fn seal_secret(mut secret: Secret, cipher: &PayloadCipher) -> Result<SealedManifest> {
    let namespace = secret
        .metadata
        .namespace
        .clone()
        .filter(|ns| !ns.is_empty())
        .ok_or_else(|| SyncError::InvalidSecret("source secret has no namespace".to_string()))?;
    let name = secret
        .metadata
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            SyncError::InvalidSecret(format!("source secret in {} has no name", namespace))
        })?;

    let manifest_hash = manifest_hash(&secret)?;

    if let Some(data) = secret.data.as_mut() {
        for value in data.values_mut() {
            value.0 = cipher.encrypt(&value.0)?;
        }
    }

    if let Some(annotations) = secret.metadata.annotations.as_mut() {
        annotations.remove(annotations::LAST_APPLIED_CONFIGURATION);
    }

    Ok(SealedManifest {
        namespace,
        name,
        manifest: serde_json::to_value(&secret)?,
        manifest_hash,
    })
}

/// Decode a stored manifest and decrypt its data values.
/// The resource version is cleared; the follower cluster assigns its own.
pub fn open_manifest(record: &SecretRecord, cipher: &PayloadCipher) -> Result<Secret> {
    let mut secret: Secret = serde_json::from_value(record.manifest.clone())?;

    if let Some(data) = secret.data.as_mut() {
        for value in data.values_mut() {
            value.0 = cipher.decrypt(&value.0)?;
        }
    }

    secret.metadata.resource_version = None;
    Ok(secret)
}

/// The secret to create on a follower that does not have it yet
pub fn secret_for_create(record: &SecretRecord, cipher: &PayloadCipher) -> Result<Secret> {
    let mut secret = open_manifest(record, cipher)?;
    secret
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(annotations::LAST_UPDATED.to_string(), record.last_updated());
    Ok(secret)
}

/// Merge-patch refreshing an existing follower secret.
///
/// Carries only name, namespace, labels, annotations (with a fresh
/// `kube-secret-sync-last-updated`) and data. Absent fields are left out rather
/// than sent as `null`, which would delete them on the target.
pub fn patch_document(record: &SecretRecord, cipher: &PayloadCipher) -> Result<Value> {
    let secret = open_manifest(record, cipher)?;

    let mut metadata = Map::new();
    if let Some(name) = secret.metadata.name {
        metadata.insert("name".to_string(), Value::String(name));
    }
    if let Some(namespace) = secret.metadata.namespace {
        metadata.insert("namespace".to_string(), Value::String(namespace));
    }
    if let Some(labels) = secret.metadata.labels {
        metadata.insert("labels".to_string(), serde_json::to_value(labels)?);
    }
    let mut annotations = secret.metadata.annotations.unwrap_or_default();
    annotations.insert(annotations::LAST_UPDATED.to_string(), record.last_updated());
    metadata.insert("annotations".to_string(), serde_json::to_value(annotations)?);

    let mut patch = Map::new();
    patch.insert("metadata".to_string(), Value::Object(metadata));
    if let Some(data) = secret.data {
        patch.insert("data".to_string(), serde_json::to_value(data)?);
    }
    Ok(Value::Object(patch))
}

/// How a follower secret compares to its stored record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// No freshness annotation; replace
    Unannotated,
    /// Annotation older than the record; patch
    Stale,
    UpToDate,
}

/// Compare the follower's annotation with the record's `last_updated` rendering.
/// Both are RFC-3339 UTC, so string order is time order.
pub fn freshness(existing: &Secret, last_updated: &str) -> Freshness {
    match existing
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(annotations::LAST_UPDATED))
    {
        None => Freshness::Unannotated,
        Some(local) if local.as_str() < last_updated => Freshness::Stale,
        Some(_) => Freshness::UpToDate,
    }
}
