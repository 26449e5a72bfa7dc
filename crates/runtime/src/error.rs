// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the inference runtime.

use crate::backend::join;
use crate::{Backend, RuntimeState};
use model_loader::{ModelError, ModelFormat};
use tensor_core::{Device, TensorError};

/// Errors reported by an engine adapter.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The engine rejected the model or its options.
    #[error("initialization failed: {0}")]
    Init(String),

    /// The engine failed while executing a forward pass.
    #[error("inference failed: {0}")]
    Inference(String),

    /// An input/output index past the end of the engine's tensor list.
    #[error("{kind} index {index} out of range ({len} available)")]
    IndexOutOfRange {
        kind: &'static str,
        index: usize,
        len: usize,
    },

    /// The engine cannot share its weights with a sibling.
    #[error("backend {0} does not support shared-weight cloning")]
    CloneUnsupported(Backend),

    /// The engine has no compile step.
    #[error("backend {0} is not a compiler backend")]
    CompileUnsupported(Backend),

    /// Reading model bytes failed.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A tensor operation failed.
    #[error(transparent)]
    Tensor(#[from] TensorError),
}

/// Errors that can occur while initializing or driving a [`Runtime`](crate::Runtime).
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// No default engine list exists for the model format.
    #[error("model format {0} has no default backends; set a backend explicitly")]
    UnsupportedFormat(ModelFormat),

    /// No default engine list exists for the device.
    #[error("device {0} has no default backends; set a backend explicitly")]
    UnsupportedDevice(Device),

    /// The format and device engine lists do not intersect.
    #[error("no backend supports both model format {format} and device {device}")]
    NoCompatibleEngine { format: ModelFormat, device: Device },

    /// Compatible engines exist but none is available in this build.
    #[error("none of the compatible backends [{}] is available in this build", join(.candidates))]
    EngineNotCompiled { candidates: Vec<Backend> },

    /// The chosen engine rejected the configuration before construction.
    #[error("backend {backend} {detail}")]
    EnginePreconditionViolation { backend: Backend, detail: String },

    /// The engine's own initialization routine failed.
    #[error("backend {backend} failed to initialize: {source}")]
    EngineInitializationFailure {
        backend: Backend,
        #[source]
        source: BackendError,
    },

    /// The engine failed during a forward pass.
    #[error("backend {backend} failed during inference: {source}")]
    InferenceFailure {
        backend: Backend,
        #[source]
        source: BackendError,
    },

    /// An input tensor is pinned to a device other than the runtime's.
    #[error(
        "input '{tensor}' is on device id {tensor_device_id} but the runtime uses device id {runtime_device_id}"
    )]
    DeviceIdMismatch {
        tensor: String,
        tensor_device_id: u32,
        runtime_device_id: u32,
    },

    /// No output tensor with the requested name exists.
    #[error("no output tensor named '{0}'")]
    OutputNotFound(String),

    /// `compile()` was requested for a non-compiler engine.
    #[error("backend {0} does not support compile(); use init()")]
    CompileUnsupported(Backend),

    /// An engine query other than inference failed.
    #[error("backend {backend}: {source}")]
    Backend {
        backend: Backend,
        #[source]
        source: BackendError,
    },

    /// Creating a sibling runtime failed.
    #[error("cloning runtime on backend {backend} failed: {source}")]
    CloneFailure {
        backend: Backend,
        #[source]
        source: BackendError,
    },

    /// The operation requires a ready runtime.
    #[error("runtime is not ready (state: {0})")]
    NotReady(RuntimeState),

    /// A previous initialization attempt failed; the runtime is terminal.
    #[error("runtime failed to initialize and cannot be reused; create a new runtime")]
    Unusable,

    /// The operation is not valid in the current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Model loading or decryption failed.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// A tensor operation failed.
    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_not_compiled_lists_candidates() {
        let err = RuntimeError::EngineNotCompiled {
            candidates: vec![Backend::PaddleInference, Backend::Ort],
        };
        assert_eq!(
            err.to_string(),
            "none of the compatible backends [paddle_inference/ort] is available in this build"
        );
    }

    #[test]
    fn test_init_failure_keeps_source() {
        use std::error::Error as _;
        let err = RuntimeError::EngineInitializationFailure {
            backend: Backend::Ort,
            source: BackendError::Init("bad graph".into()),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("bad graph"));
    }
}
