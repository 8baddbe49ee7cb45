// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Leader and follower running against the same store, source cluster to follower cluster.

use std::sync::Arc;

use k8s_openapi::ByteString;
use tokio_util::sync::CancellationToken;

use crate::constants::annotations;
use crate::crypto::{CipherError, PayloadCipher};
use crate::error::SyncError;
use crate::sync::manifest::manifest_hash;
use crate::sync::{FollowerTick, LeaderTick, Tick, TickStats};
use crate::test_utils::{make_secret, FakeCluster, MemoryManifestStore};

const KEY: &[u8] = b"0123456789abcdef01234567";

struct Harness {
    source: FakeCluster,
    follower_cluster: FakeCluster,
    store: Arc<MemoryManifestStore>,
    leader: LeaderTick,
    follower: FollowerTick,
}

impl Harness {
    fn new() -> Self {
        let source = FakeCluster::new();
        let follower_cluster = FakeCluster::new();
        let store = Arc::new(MemoryManifestStore::new());
        let cipher = PayloadCipher::new(KEY).unwrap();
        Self {
            leader: LeaderTick::new(Arc::new(source.clone()), store.clone(), cipher.clone()),
            follower: FollowerTick::new(Arc::new(follower_cluster.clone()), store.clone(), cipher),
            source,
            follower_cluster,
            store,
        }
    }

    async fn lead(&self) -> TickStats {
        self.leader.tick(&CancellationToken::new()).await.unwrap()
    }

    async fn follow(&self) -> TickStats {
        self.follower.tick(&CancellationToken::new()).await.unwrap()
    }

    fn local_password(&self) -> Vec<u8> {
        self.follower_cluster
            .secret("app", "db-creds")
            .unwrap()
            .data
            .unwrap()["password"]
            .0
            .clone()
    }

    fn local_annotation(&self) -> Option<String> {
        self.follower_cluster
            .secret("app", "db-creds")
            .unwrap()
            .metadata
            .annotations
            .and_then(|mut a| a.remove(annotations::LAST_UPDATED))
    }

    fn stored_last_updated(&self) -> String {
        self.store.record("app", "db-creds").unwrap().last_updated()
    }
}

fn db_creds(password: &str) -> k8s_openapi::api::core::v1::Secret {
    make_secret("app", "db-creds", &[("password", password)])
}

#[tokio::test]
async fn leader_stores_once_then_idles() {
    let h = Harness::new();
    h.source.insert(db_creds("p@ss"));

    let first = h.lead().await;
    assert_eq!(first.updated, 1);
    let record = h.store.record("app", "db-creds").unwrap();
    let source = h.source.secret("app", "db-creds").unwrap();
    assert_eq!(record.manifest_hash, manifest_hash(&source).unwrap());

    let second = h.lead().await;
    assert_eq!(second.updated, 0);
    assert_eq!(second.unchanged, 1);
    assert_eq!(h.store.writes(), 1);
    assert_eq!(h.store.record("app", "db-creds").unwrap(), record);
}

#[tokio::test]
async fn follower_creates_then_idles() {
    let h = Harness::new();
    h.source.insert(db_creds("p@ss"));
    h.lead().await;

    let first = h.follow().await;
    assert_eq!(first.created, 1);
    assert_eq!(h.local_password(), b"p@ss");
    assert_eq!(h.local_annotation(), Some(h.stored_last_updated()));

    let second = h.follow().await;
    assert_eq!(second.unchanged, 1);
    assert_eq!(h.follower_cluster.patches(), 0);
}

#[tokio::test]
async fn source_change_reaches_follower() {
    let h = Harness::new();
    h.source.insert(db_creds("p@ss"));
    h.lead().await;
    h.follow().await;
    let before = h.store.record("app", "db-creds").unwrap().updated_at;

    h.source.insert(db_creds("new"));
    let leader = h.lead().await;
    assert_eq!(leader.updated, 1);
    assert!(h.store.record("app", "db-creds").unwrap().updated_at > before);

    let follower = h.follow().await;
    assert_eq!(follower.updated, 1);
    assert_eq!(h.follower_cluster.patches(), 1);
    assert_eq!(h.local_password(), b"new");
    assert_eq!(h.local_annotation(), Some(h.stored_last_updated()));

    assert_eq!(h.follow().await.unchanged, 1);
}

#[tokio::test]
async fn deleted_follower_secret_is_recreated() {
    let h = Harness::new();
    h.source.insert(db_creds("p@ss"));
    h.lead().await;
    h.follow().await;

    h.follower_cluster.remove("app", "db-creds");
    let stats = h.follow().await;

    assert_eq!(stats.created, 1);
    assert_eq!(h.follower_cluster.creates(), 2);
    assert_eq!(h.local_password(), b"p@ss");
}

#[tokio::test]
async fn wrong_key_fails_without_writes() {
    let h = Harness::new();
    h.source.insert(db_creds("p@ss"));
    h.lead().await;
    let misconfigured = FollowerTick::new(
        Arc::new(h.follower_cluster.clone()),
        h.store.clone(),
        PayloadCipher::new(b"fedcba9876543210fedcba98").unwrap(),
    );

    let err = misconfigured
        .tick(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::CipherError(CipherError::AuthFailed)));
    assert!(h.follower_cluster.secret("app", "db-creds").is_none());
    assert_eq!(h.follower_cluster.creates() + h.follower_cluster.patches(), 0);
}

#[tokio::test]
async fn unlabelled_source_keeps_last_stored_state() {
    let h = Harness::new();
    h.source.insert(db_creds("p@ss"));
    h.lead().await;
    h.follow().await;
    let stored = h.store.record("app", "db-creds").unwrap();

    let mut unlabelled = db_creds("changed-after-unlabel");
    unlabelled.metadata.labels = None;
    h.source.insert(unlabelled);
    let leader = h.lead().await;

    assert_eq!(leader.examined, 0);
    assert_eq!(h.store.record("app", "db-creds").unwrap(), stored);
    assert_eq!(h.follow().await.unchanged, 1);
    assert_eq!(h.local_password(), b"p@ss");
}

#[tokio::test]
async fn stored_manifests_never_contain_plaintext() {
    let marker = "kss-plaintext-marker-91c2";
    let h = Harness::new();
    h.source.insert(make_secret(
        "app",
        "db-creds",
        &[("password", marker), ("username", marker)],
    ));
    let encoded = serde_json::to_value(ByteString(marker.as_bytes().to_vec())).unwrap();
    let encoded = encoded.as_str().unwrap();

    h.lead().await;

    for record in h.store.records() {
        let stored = record.manifest.to_string();
        assert!(!stored.contains(marker));
        assert!(!stored.contains(encoded));
    }
}

#[tokio::test]
async fn follower_catches_up_over_several_versions() {
    let h = Harness::new();
    h.source.insert(db_creds("v1"));
    h.lead().await;
    h.follow().await;

    h.source.insert(db_creds("v2"));
    h.lead().await;
    h.source.insert(db_creds("v3"));
    h.lead().await;

    h.follow().await;
    assert_eq!(h.local_password(), b"v3");
    assert_eq!(h.local_annotation(), Some(h.stored_last_updated()));
    assert_eq!(h.follower_cluster.patches(), 1);
}
