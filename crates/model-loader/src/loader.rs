// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Reading model artifacts from disk.
//!
//! Files are memory-mapped and copied once into an owned buffer, so the
//! caller never holds a mapping that outlives a file being replaced on
//! disk between inits.

use crate::ModelError;
use std::path::Path;

/// Reads model and parameter artifacts.
pub struct ModelLoader;

impl ModelLoader {
    /// Reads the whole file at `path`.
    pub fn read_binary(path: &Path) -> Result<Vec<u8>, ModelError> {
        let read_err = |source| ModelError::Read {
            path: path.to_path_buf(),
            source,
        };

        let file = std::fs::File::open(path).map_err(read_err)?;
        let len = file.metadata().map_err(read_err)?.len();

        // Zero-length files cannot be mapped on every platform.
        if len == 0 {
            return Ok(Vec::new());
        }

        // SAFETY: the mapping is read-only and dropped before returning;
        // concurrent truncation by another process is outside our control,
        // as with any mmap-based reader.
        let mmap = unsafe { memmap2::Mmap::map(&file) }.map_err(read_err)?;
        tracing::debug!("read {} bytes from '{}'", mmap.len(), path.display());
        Ok(mmap.to_vec())
    }
}
