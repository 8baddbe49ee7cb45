// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{bail, Context, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::DEFAULT_TICK_SECONDS;

/// Process role, fixed for the lifetime of the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Leader,
    Follower,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Leader => write!(f, "leader"),
            Role::Follower => write!(f, "follower"),
        }
    }
}

/// Raw symmetric key bytes. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey(Vec<u8>);

impl EncryptionKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptionKey(<{} bytes redacted>)", self.0.len())
    }
}

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub role: Role,
    pub encryption_key: EncryptionKey,
    /// Datastore connection string
    pub dsn: String,
    pub tick_interval: Duration,
    /// Hard deadline per tick, if any
    pub tick_timeout: Option<Duration>,
    /// External kubeconfig; in-cluster credentials are used when unset
    pub kube_context_path: Option<PathBuf>,
    /// Run a single tick and exit
    pub local: bool,
}

/// Log switches, read before anything else so startup failures are logged in the configured format
#[derive(Debug, Clone, Copy, Default)]
pub struct LogConfig {
    pub debug: bool,
    pub pretty: bool,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        LogConfig {
            debug: is_enabled(&lookup, "DEBUG"),
            pretty: is_enabled(&lookup, "PRETTY"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let role = if is_enabled(&lookup, "LEADER") {
            Role::Leader
        } else {
            Role::Follower
        };

        let encryption_key = required(&lookup, "ENCRYPTION_KEY")?.into_bytes();
        if !matches!(encryption_key.len(), 16 | 24 | 32) {
            bail!(
                "ENCRYPTION_KEY must be 16, 24 or 32 bytes long, got {}",
                encryption_key.len()
            );
        }

        let dsn = required(&lookup, "DSN")?;

        let tick_seconds = match optional(&lookup, "TICK_SECONDS") {
            Some(v) => parse_seconds("TICK_SECONDS", &v)?,
            None => DEFAULT_TICK_SECONDS,
        };

        let tick_timeout = optional(&lookup, "TICK_TIMEOUT_SECONDS")
            .map(|v| parse_seconds("TICK_TIMEOUT_SECONDS", &v))
            .transpose()?
            .map(Duration::from_secs);

        let kube_context_path = optional(&lookup, "KUBE_CONTEXT_PATH").map(PathBuf::from);

        Ok(Config {
            role,
            encryption_key: EncryptionKey(encryption_key),
            dsn,
            tick_interval: Duration::from_secs(tick_seconds),
            tick_timeout,
            kube_context_path,
            local: is_enabled(&lookup, "LOCAL"),
        })
    }
}

/// Empty values count as unset
fn optional(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    optional(lookup, name).with_context(|| format!("{} environment variable not set", name))
}

fn is_enabled(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> bool {
    lookup(name).as_deref() == Some("1")
}

fn parse_seconds(name: &str, value: &str) -> Result<u64> {
    let secs: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("{} must be an integer number of seconds, got '{}'", name, value))?;
    if secs == 0 {
        bail!("{} must be greater than zero", name);
    }
    Ok(secs)
}
