// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes utilities for client creation and secret access.

pub mod client;
pub mod secrets;

pub use client::create_client;
pub use secrets::{KubeSecretApi, SecretApi};
