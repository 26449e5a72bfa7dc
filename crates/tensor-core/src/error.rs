// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensor construction and access.

/// Errors that can occur when building or reading tensors.
#[derive(Debug, thiserror::Error)]
pub enum TensorError {
    /// The provided buffer size does not match the expected size for the given shape and dtype.
    #[error("buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// The requested data type is not supported for this access.
    #[error("unsupported dtype {dtype} for operation {op}")]
    UnsupportedDType {
        op: &'static str,
        dtype: crate::DType,
    },

    /// The tensor's data lives on a device the host cannot read directly.
    #[error("{op} on tensor '{name}': data lives on {device}, not host memory")]
    NotHostAccessible {
        op: &'static str,
        name: String,
        device: crate::Device,
    },

    /// Safe mutable access was requested on caller-owned memory.
    #[error("{op} on tensor '{name}': storage is an external buffer")]
    ExternalStorage { op: &'static str, name: String },
}
