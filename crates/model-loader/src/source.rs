// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Where model and parameter bytes come from.

use crate::{ModelError, ModelLoader};
use serde::de::Deserializer;
use serde::ser::{Error as _, Serializer};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// The origin of a model or parameter artifact.
///
/// A source moves from `File` to `Memory` when the decryption pass replaces
/// it with plaintext, and from `Memory` to `Released` once the engine no
/// longer needs the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Artifact on disk, read on demand.
    File(PathBuf),
    /// Artifact already resident in memory.
    Memory(Vec<u8>),
    /// In-memory bytes were handed to an engine and dropped.
    Released,
}

impl ModelSource {
    /// Returns `true` if the bytes are (or were) resident in memory.
    pub fn is_memory(&self) -> bool {
        matches!(self, ModelSource::Memory(_) | ModelSource::Released)
    }

    /// Returns `true` if the in-memory bytes were released.
    pub fn is_released(&self) -> bool {
        matches!(self, ModelSource::Released)
    }

    /// Returns the file path for file-backed sources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ModelSource::File(p) => Some(p),
            _ => None,
        }
    }

    /// Resolves the artifact's bytes, reading the file if necessary.
    pub fn load(&self) -> Result<Cow<'_, [u8]>, ModelError> {
        match self {
            ModelSource::File(p) => ModelLoader::read_binary(p).map(Cow::Owned),
            ModelSource::Memory(bytes) => Ok(Cow::Borrowed(bytes)),
            ModelSource::Released => Err(ModelError::Released),
        }
    }

    /// Drops in-memory bytes. File-backed sources are left untouched.
    pub fn release(&mut self) {
        if let ModelSource::Memory(_) = self {
            *self = ModelSource::Released;
        }
    }
}

impl Default for ModelSource {
    fn default() -> Self {
        ModelSource::File(PathBuf::new())
    }
}

impl From<PathBuf> for ModelSource {
    fn from(path: PathBuf) -> Self {
        ModelSource::File(path)
    }
}

impl From<Vec<u8>> for ModelSource {
    fn from(bytes: Vec<u8>) -> Self {
        ModelSource::Memory(bytes)
    }
}

/// Sources serialize as a plain path; in-memory buffers have no file form.
impl serde::Serialize for ModelSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ModelSource::File(p) => p.serialize(serializer),
            ModelSource::Memory(_) | ModelSource::Released => Err(S::Error::custom(
                "in-memory model sources cannot be serialized",
            )),
        }
    }
}

impl<'de> serde::Deserialize<'de> for ModelSource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        PathBuf::deserialize(deserializer).map(ModelSource::File)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_memory_release() {
        let mut src = ModelSource::from(vec![1u8, 2, 3]);
        assert!(src.is_memory());
        assert_eq!(src.load().unwrap().as_ref(), &[1, 2, 3]);

        src.release();
        assert!(src.is_released());
        assert!(src.is_memory());
        assert!(matches!(src.load(), Err(ModelError::Released)));
    }

    #[test]
    fn test_file_release_is_noop() {
        let mut src = ModelSource::from(PathBuf::from("model.onnx"));
        src.release();
        assert_eq!(src.path(), Some(Path::new("model.onnx")));
        assert!(!src.is_memory());
    }

    #[test]
    fn test_file_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"graph-bytes").unwrap();
        let src = ModelSource::File(file.path().to_path_buf());
        assert_eq!(src.load().unwrap().as_ref(), b"graph-bytes");
    }
}
