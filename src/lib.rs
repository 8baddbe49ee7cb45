// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod constants;
pub mod crypto;
pub mod driver;
pub mod error;
pub mod kubernetes;
pub mod store;
pub mod sync;
