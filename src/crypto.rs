// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Authenticated encryption of secret payloads.
//!
//! Every value is sealed with AES-GCM under a fresh random nonce. The output blob is
//! self-contained:
//! ```text
//! [nonce: 12 bytes][ciphertext: len(plaintext)][tag: 16 bytes]
//! ```
//! The key is used as raw bytes; its length picks AES-128, AES-192 or AES-256.

use std::fmt;

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm, Nonce};
use thiserror::Error;

/// Size of the AES-GCM nonce in bytes.
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

type Aes192Gcm = AesGcm<Aes192, U12>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("invalid key length {len}, expected 16, 24 or 32 bytes")]
    CipherInit { len: usize },

    #[error("failed to read random nonce: {0}")]
    Entropy(String),

    #[error("failed to encrypt {len} byte payload")]
    Seal { len: usize },

    #[error("authentication failed (wrong key, tampered or truncated data)")]
    AuthFailed,
}

#[derive(Clone)]
enum Engine {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

/// AES-GCM cipher bound to a single symmetric key.
#[derive(Clone)]
pub struct PayloadCipher {
    engine: Engine,
}

impl PayloadCipher {
    pub fn new(key: &[u8]) -> Result<Self, CipherError> {
        let init_err = |_| CipherError::CipherInit { len: key.len() };
        let engine = match key.len() {
            16 => Engine::Aes128(Aes128Gcm::new_from_slice(key).map_err(init_err)?),
            24 => Engine::Aes192(Aes192Gcm::new_from_slice(key).map_err(init_err)?),
            32 => Engine::Aes256(Aes256Gcm::new_from_slice(key).map_err(init_err)?),
            len => return Err(CipherError::CipherInit { len }),
        };
        Ok(Self { engine })
    }

    /// Seal `plaintext` and return `nonce || ciphertext || tag`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| CipherError::Entropy(e.to_string()))?;
        let nonce = Nonce::<U12>::from_slice(&nonce_bytes);

        let sealed = match &self.engine {
            Engine::Aes128(c) => c.encrypt(nonce, plaintext),
            Engine::Aes192(c) => c.encrypt(nonce, plaintext),
            Engine::Aes256(c) => c.encrypt(nonce, plaintext),
        }
        // Sealing only fails for inputs beyond the GCM length limit
        .map_err(|_| CipherError::Seal {
            len: plaintext.len(),
        })?;

        let mut blob = Vec::with_capacity(NONCE_SIZE + sealed.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&sealed);
        Ok(blob)
    }

    /// Split the leading nonce off `blob`, then authenticate and decrypt the rest.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>, CipherError> {
        if blob.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CipherError::AuthFailed);
        }

        let (nonce_bytes, sealed) = blob.split_at(NONCE_SIZE);
        let nonce = Nonce::<U12>::from_slice(nonce_bytes);

        let opened = match &self.engine {
            Engine::Aes128(c) => c.decrypt(nonce, sealed),
            Engine::Aes192(c) => c.decrypt(nonce, sealed),
            Engine::Aes256(c) => c.decrypt(nonce, sealed),
        };
        opened.map_err(|_| CipherError::AuthFailed)
    }

    pub fn key_bits(&self) -> usize {
        match self.engine {
            Engine::Aes128(_) => 128,
            Engine::Aes192(_) => 192,
            Engine::Aes256(_) => 256,
        }
    }
}

impl fmt::Debug for PayloadCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PayloadCipher(AES-{}-GCM)", self.key_bits())
    }
}

/// Encrypt `plaintext` under `key`.
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    PayloadCipher::new(key)?.encrypt(plaintext)
}

/// Decrypt a blob produced by [`encrypt`] under `key`.
pub fn decrypt(blob: &[u8], key: &[u8]) -> Result<Vec<u8>, CipherError> {
    PayloadCipher::new(key)?.decrypt(blob)
}
