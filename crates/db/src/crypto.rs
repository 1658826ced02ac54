//! Credential sealing for stored portal passwords.
//!
//! Passwords must be recoverable to re-login after a session expires, so
//! they are sealed with ChaCha20-Poly1305 AEAD under a deployment-wide key
//! rather than hashed. The sealed form is `nonce || ciphertext`, hex encoded.

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use eyre::{eyre, Result};
use rand::rngs::OsRng;
use rand::RngCore;

/// Nonce size for ChaCha20-Poly1305.
const NONCE_SIZE: usize = 12;

#[derive(Clone)]
pub struct CredentialSealer {
    cipher: ChaCha20Poly1305,
}

impl CredentialSealer {
    /// Build a sealer from a 32-byte key in hex (64 hex characters), as
    /// supplied via the `REBOOK_ENCRYPTION_KEY` environment variable.
    pub fn from_hex_key(hex_key: &str) -> Result<Self> {
        let key_bytes = hex::decode(hex_key).map_err(|e| eyre!("Invalid encryption key: {e}"))?;
        if key_bytes.len() != 32 {
            return Err(eyre!(
                "Encryption key must be 32 bytes, got {}",
                key_bytes.len()
            ));
        }

        let key = Key::from_slice(&key_bytes);
        Ok(Self {
            cipher: ChaCha20Poly1305::new(key),
        })
    }

    pub fn seal(&self, plaintext: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| eyre!("Encryption failed: {e}"))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(hex::encode(sealed))
    }

    pub fn open(&self, sealed: &str) -> Result<String> {
        let bytes = hex::decode(sealed).map_err(|e| eyre!("Invalid sealed credential: {e}"))?;
        if bytes.len() <= NONCE_SIZE {
            return Err(eyre!("Sealed credential too short"));
        }

        let (nonce_bytes, ciphertext) = bytes.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| eyre!("Decryption failed: {e}"))?;

        String::from_utf8(plaintext).map_err(|e| eyre!("Sealed credential is not UTF-8: {e}"))
    }
}
