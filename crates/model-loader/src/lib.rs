// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-loader
//!
//! Resolves the bytes an engine adapter is initialized from.
//!
//! - [`ModelFormat`]: the serialization scheme of a model artifact.
//! - [`ModelSource`]: a file path, an in-memory buffer, or a released buffer.
//! - [`ModelLoader`]: memory-mapped reading of model/parameter files.
//! - [`decrypt_source`]: the optional decryption pass run before engine
//!   selection when an encryption key is configured.
//!
//! # Example
//! ```
//! use model_loader::ModelSource;
//!
//! let mut src = ModelSource::from(vec![0u8; 4]);
//! assert_eq!(src.load().unwrap().len(), 4);
//! src.release();
//! assert!(src.load().is_err());
//! ```

mod decrypt;
mod error;
mod format;
mod loader;
mod source;

pub use decrypt::{decrypt, decrypt_source, encrypt, DECRYPTION_AVAILABLE};
pub use error::ModelError;
pub use format::ModelFormat;
pub use loader::ModelLoader;
pub use source::ModelSource;
