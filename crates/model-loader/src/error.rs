// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for model loading and decryption.

use std::path::PathBuf;

/// Errors that can occur while resolving model bytes.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// A model or parameter file could not be read.
    #[error("failed to read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory model bytes were already released after engine init.
    #[error("model buffer was released after engine initialization")]
    Released,

    /// An encryption key was configured but this build cannot decrypt.
    #[error("an encryption key is configured but decryption support is not compiled in (enable the `encryption` feature)")]
    DecryptionUnavailable,

    /// Decryption was attempted and failed (wrong key, truncated or tampered input).
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
}
