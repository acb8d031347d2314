// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential box: AES-256-GCM over a key derived from the master key

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("ORCH_MASTER_KEY must be set for credential encryption")]
    MissingKey,
    #[error("sealed value is not valid base64")]
    Encoding,
    #[error("sealed value is truncated")]
    Truncated,
    #[error("decryption failed")]
    Decrypt,
    #[error("encryption failed")]
    Encrypt,
    #[error("plaintext is not valid UTF-8")]
    Utf8,
}

/// Symmetric box for credential values. The key is `sha256(master_key)`,
/// so any non-empty string configures a usable vault. Sealed tokens are
/// `base64(nonce || ciphertext)` with a random 96-bit nonce per seal.
#[derive(Clone)]
pub struct Vault {
    key: Key<Aes256Gcm>,
    configured: bool,
}

impl Vault {
    pub fn new(master_key: &str) -> Self {
        let digest = Sha256::digest(master_key.as_bytes());
        Self {
            key: Key::<Aes256Gcm>::clone_from_slice(&digest),
            configured: !master_key.is_empty(),
        }
    }

    fn cipher(&self) -> Result<Aes256Gcm, VaultError> {
        if !self.configured {
            return Err(VaultError::MissingKey);
        }
        Ok(Aes256Gcm::new(&self.key))
    }

    /// Encrypt a plaintext credential value into a transport token.
    pub fn seal(&self, plaintext: &str) -> Result<String, VaultError> {
        let cipher = self.cipher()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext =
            cipher.encrypt(&nonce, plaintext.as_bytes()).map_err(|_| VaultError::Encrypt)?;
        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(sealed))
    }

    /// Decrypt a sealed token back to plaintext.
    pub fn open(&self, sealed: &str) -> Result<String, VaultError> {
        let cipher = self.cipher()?;
        let raw = BASE64.decode(sealed).map_err(|_| VaultError::Encoding)?;
        if raw.len() < NONCE_LEN {
            return Err(VaultError::Truncated);
        }
        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| VaultError::Decrypt)?;
        String::from_utf8(plaintext).map_err(|_| VaultError::Utf8)
    }
}

#[cfg(test)]
#[path = "vault_tests.rs"]
mod tests;
