//! API key encryption at rest.
//!
//! The key material is a 32-byte file local to this machine
//! (`$XDG_DATA_HOME/lightbucket/credential.key`). Without it the stored
//! API key cannot be recovered from the config file.
//!
//! Stored form: `base64(nonce || ciphertext)` using ChaCha20-Poly1305.
//! The empty string is stored as the empty string.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};

use crate::error::{Error, Result};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Symmetric codec for the stored API key
#[derive(Clone)]
pub struct CredentialCodec {
    key: Key,
}

impl fmt::Debug for CredentialCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialCodec").finish_non_exhaustive()
    }
}

impl CredentialCodec {
    /// Create a codec from raw key bytes
    pub fn from_key_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_LEN {
            return Err(Error::Credential(format!(
                "key material must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        Ok(Self {
            key: Key::clone_from_slice(bytes),
        })
    }

    /// Create a codec with fresh random key material (not persisted)
    pub fn generate() -> Self {
        Self {
            key: ChaCha20Poly1305::generate_key(&mut OsRng),
        }
    }

    /// Load key material from `path`, creating it on first use
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let bytes = std::fs::read(path)?;
            return Self::from_key_bytes(&bytes);
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let codec = Self::generate();
        let mut file = create_key_file(path)?;
        file.write_all(codec.key.as_slice())?;
        file.sync_all()?;

        tracing::info!(path = %path.display(), "Created credential key");
        Ok(codec)
    }

    /// Encrypt a plaintext credential for storage
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        if plaintext.is_empty() {
            return Ok(String::new());
        }

        let cipher = ChaCha20Poly1305::new(&self.key);
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| Error::Credential("encryption failed".to_string()))?;

        let mut stored = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        stored.extend_from_slice(&nonce);
        stored.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(stored))
    }

    /// Decrypt a stored credential
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        if stored.is_empty() {
            return Ok(String::new());
        }

        let bytes = STANDARD
            .decode(stored.trim())
            .map_err(|e| Error::Credential(format!("stored key is not base64: {}", e)))?;

        if bytes.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::Credential("stored key is truncated".to_string()));
        }

        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let cipher = ChaCha20Poly1305::new(&self.key);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                Error::Credential("decryption failed (wrong key material?)".to_string())
            })?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Credential("decrypted key is not UTF-8".to_string()))
    }
}

/// Create the key file, owner-only on Unix from the start
#[cfg(unix)]
fn create_key_file(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn create_key_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().write(true).create_new(true).open(path)
}
