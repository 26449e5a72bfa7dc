// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optional decryption pass for encrypted model artifacts.
//!
//! # Envelope
//! ```text
//! [ nonce: 16 bytes ][ ciphertext: N bytes ][ tag: 32 bytes ]
//! ```
//! The ciphertext is the plaintext XORed with a SHA-256 keystream
//! (`SHA256(key || nonce || block_index_le)`), and the tag is
//! `SHA256("tag" || key || nonce || plaintext)`. A wrong key or a damaged
//! envelope fails the tag check instead of producing garbage.
//!
//! This is an obfuscation envelope, not a vetted AEAD: the keystream and
//! the key-prefixed tag are hand-built from SHA-256 and have had no
//! cryptographic review. Do not rely on it to protect secrets.
//!
//! Without the `encryption` feature every entry point returns
//! [`ModelError::DecryptionUnavailable`].

use crate::{ModelError, ModelSource};

/// Whether this build can decrypt model artifacts.
pub const DECRYPTION_AVAILABLE: bool = cfg!(feature = "encryption");

#[cfg(feature = "encryption")]
const NONCE_LEN: usize = 16;
#[cfg(feature = "encryption")]
const TAG_LEN: usize = 32;

/// Decrypts `source` with `key` and returns the plaintext as an in-memory source.
pub fn decrypt_source(source: &ModelSource, key: &str) -> Result<ModelSource, ModelError> {
    let cipher = source.load()?;
    let plain = decrypt(&cipher, key)?;
    Ok(ModelSource::Memory(plain))
}

/// Decrypts an envelope produced by [`encrypt`].
#[cfg(feature = "encryption")]
pub fn decrypt(cipher: &[u8], key: &str) -> Result<Vec<u8>, ModelError> {
    if key.is_empty() {
        return Err(ModelError::DecryptionFailed("empty key".into()));
    }
    if cipher.len() < NONCE_LEN + TAG_LEN {
        return Err(ModelError::DecryptionFailed(format!(
            "input is {} bytes, shorter than the {}-byte envelope",
            cipher.len(),
            NONCE_LEN + TAG_LEN
        )));
    }

    let (nonce, rest) = cipher.split_at(NONCE_LEN);
    let (body, tag) = rest.split_at(rest.len() - TAG_LEN);

    let mut plain = body.to_vec();
    apply_keystream(key, nonce, &mut plain);

    if tag != integrity_tag(key, nonce, &plain).as_slice() {
        return Err(ModelError::DecryptionFailed(
            "integrity check failed (wrong key or corrupted input)".into(),
        ));
    }
    Ok(plain)
}

/// Encrypts `plain` into the envelope format read by [`decrypt`].
///
/// The nonce is derived from the key and plaintext, so identical inputs
/// produce identical envelopes.
#[cfg(feature = "encryption")]
pub fn encrypt(plain: &[u8], key: &str) -> Result<Vec<u8>, ModelError> {
    use sha2::{Digest, Sha256};

    if key.is_empty() {
        return Err(ModelError::DecryptionFailed("empty key".into()));
    }

    let mut hasher = Sha256::new();
    hasher.update(b"nonce");
    hasher.update(key.as_bytes());
    hasher.update(plain);
    let digest = hasher.finalize();
    let nonce = &digest[..NONCE_LEN];

    let mut out = Vec::with_capacity(NONCE_LEN + plain.len() + TAG_LEN);
    out.extend_from_slice(nonce);
    let body_start = out.len();
    out.extend_from_slice(plain);
    apply_keystream(key, nonce, &mut out[body_start..]);
    out.extend_from_slice(&integrity_tag(key, nonce, plain));
    Ok(out)
}

#[cfg(not(feature = "encryption"))]
pub fn decrypt(_cipher: &[u8], _key: &str) -> Result<Vec<u8>, ModelError> {
    Err(ModelError::DecryptionUnavailable)
}

#[cfg(not(feature = "encryption"))]
pub fn encrypt(_plain: &[u8], _key: &str) -> Result<Vec<u8>, ModelError> {
    Err(ModelError::DecryptionUnavailable)
}

#[cfg(feature = "encryption")]
fn apply_keystream(key: &str, nonce: &[u8], data: &mut [u8]) {
    use sha2::{Digest, Sha256};

    for (block_index, chunk) in data.chunks_mut(32).enumerate() {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(nonce);
        hasher.update((block_index as u64).to_le_bytes());
        let block = hasher.finalize();
        for (byte, k) in chunk.iter_mut().zip(block.iter()) {
            *byte ^= k;
        }
    }
}

#[cfg(feature = "encryption")]
fn integrity_tag(key: &str, nonce: &[u8], plain: &[u8]) -> [u8; TAG_LEN] {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(b"tag");
    hasher.update(key.as_bytes());
    hasher.update(nonce);
    hasher.update(plain);
    let mut tag = [0u8; TAG_LEN];
    tag.copy_from_slice(&hasher.finalize());
    tag
}

#[cfg(all(test, feature = "encryption"))]
mod tests {
    use super::*;

    #[test]
    fn test_decrypt_recovers_plaintext() {
        let plain: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
        let cipher = encrypt(&plain, "secret").unwrap();
        assert_eq!(cipher.len(), plain.len() + NONCE_LEN + TAG_LEN);
        assert_ne!(&cipher[NONCE_LEN..NONCE_LEN + plain.len()], plain.as_slice());
        assert_eq!(decrypt(&cipher, "secret").unwrap(), plain);
    }

    #[test]
    fn test_wrong_key_fails() {
        let cipher = encrypt(b"weights", "secret").unwrap();
        assert!(matches!(
            decrypt(&cipher, "not-the-key"),
            Err(ModelError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_truncated_input_fails() {
        assert!(matches!(
            decrypt(&[0u8; 20], "secret"),
            Err(ModelError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_empty_plaintext() {
        let cipher = encrypt(b"", "k").unwrap();
        assert!(decrypt(&cipher, "k").unwrap().is_empty());
    }

    #[test]
    fn test_decrypt_source_yields_memory() {
        let cipher = encrypt(b"model", "k").unwrap();
        let src = decrypt_source(&ModelSource::Memory(cipher), "k").unwrap();
        assert_eq!(src, ModelSource::Memory(b"model".to_vec()));
    }
}
