// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The uniform contract every compute engine implements, and the catalog of
//! engines compiled into this build.
//!
//! The runtime never talks to an engine directly. It asks the
//! [`EngineCatalog`] for a fresh [`EngineAdapter`] of the chosen
//! [`Backend`], hands it an [`EngineContext`] and then drives it through
//! the trait.

use crate::options::{BackendOption, BenchmarkOption, StreamHandle};
use crate::{Backend, BackendError, RuntimeOption};
use model_loader::ModelError;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use tensor_core::{Device, Tensor, TensorInfo};

/// What an adapter sees while initializing, compiling or cloning.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    option: &'a RuntimeOption,
    backend_option: &'a BackendOption,
}

impl<'a> EngineContext<'a> {
    pub fn new(option: &'a RuntimeOption, backend_option: &'a BackendOption) -> Self {
        Self {
            option,
            backend_option,
        }
    }

    /// The full runtime configuration.
    pub fn option(&self) -> &'a RuntimeOption {
        self.option
    }

    /// This engine's resolved options.
    pub fn backend_option(&self) -> &'a BackendOption {
        self.backend_option
    }

    pub fn device(&self) -> Device {
        self.option.device
    }

    pub fn device_id(&self) -> u32 {
        self.option.device_id
    }

    pub fn stream(&self) -> Option<StreamHandle> {
        self.option.external_stream
    }

    pub fn cpu_thread_num(&self) -> Option<usize> {
        self.option.cpu_thread_num
    }

    pub fn benchmark(&self) -> &'a BenchmarkOption {
        &self.option.benchmark
    }

    /// Model bytes, read from disk for file sources.
    pub fn model_bytes(&self) -> Result<Cow<'a, [u8]>, ModelError> {
        self.option.model.load()
    }

    /// Parameter bytes, if the model has a separate params artifact.
    pub fn params_bytes(&self) -> Result<Option<Cow<'a, [u8]>>, ModelError> {
        self.option.params.as_ref().map(|p| p.load()).transpose()
    }
}

/// A compute engine behind the runtime.
///
/// Adapters are created uninitialized by an [`EngineCatalog`] factory and
/// become usable once [`initialize`](EngineAdapter::initialize) (or, for
/// compiler engines, [`compile`](EngineAdapter::compile)) succeeds.
pub trait EngineAdapter: Send {
    /// The engine this adapter drives.
    fn backend(&self) -> Backend;

    /// Loads the model described by `ctx`.
    fn initialize(&mut self, ctx: &EngineContext<'_>) -> Result<(), BackendError>;

    /// Runs one forward pass.
    ///
    /// With `use_bound_tensors` set, the adapter may read inputs in place
    /// and write into the existing `outputs` entries instead of replacing
    /// them.
    fn infer(
        &mut self,
        inputs: &[Tensor],
        outputs: &mut Vec<Tensor>,
        use_bound_tensors: bool,
    ) -> Result<(), BackendError>;

    fn input_infos(&self) -> Vec<TensorInfo>;

    fn output_infos(&self) -> Vec<TensorInfo>;

    fn num_inputs(&self) -> usize {
        self.input_infos().len()
    }

    fn num_outputs(&self) -> usize {
        self.output_infos().len()
    }

    fn input_info(&self, index: usize) -> Result<TensorInfo, BackendError> {
        pick("input", self.input_infos(), index)
    }

    fn output_info(&self, index: usize) -> Result<TensorInfo, BackendError> {
        pick("output", self.output_infos(), index)
    }

    /// Whether [`shared_clone`](EngineAdapter::shared_clone) is implemented.
    fn supports_shared_clone(&self) -> bool {
        false
    }

    /// Creates a sibling that shares this adapter's loaded weights.
    fn shared_clone(
        &self,
        ctx: &EngineContext<'_>,
        stream: Option<StreamHandle>,
        device_id: u32,
    ) -> Result<Box<dyn EngineAdapter>, BackendError> {
        let _ = (ctx, stream, device_id);
        Err(BackendError::CloneUnsupported(self.backend()))
    }

    /// Builds the engine from prewarm input sets (compiler engines only).
    fn compile(
        &mut self,
        prewarm: &[Vec<Tensor>],
        ctx: &EngineContext<'_>,
    ) -> Result<(), BackendError> {
        let _ = (prewarm, ctx);
        Err(BackendError::CompileUnsupported(self.backend()))
    }

    /// Whether the adapter keeps reading the configuration's in-memory
    /// model buffer after init. When `false` and the adapter can share-clone,
    /// the runtime releases it.
    fn needs_model_buffer(&self) -> bool {
        false
    }
}

fn pick(kind: &'static str, infos: Vec<TensorInfo>, index: usize) -> Result<TensorInfo, BackendError> {
    let len = infos.len();
    infos
        .into_iter()
        .nth(index)
        .ok_or(BackendError::IndexOutOfRange { kind, index, len })
}

type AdapterFactory = Box<dyn Fn() -> Box<dyn EngineAdapter> + Send + Sync>;

/// The engines available in this build, keyed by backend.
///
/// An engine is "compiled in" exactly when a factory is registered for it.
#[derive(Default)]
pub struct EngineCatalog {
    factories: HashMap<Backend, AdapterFactory>,
}

impl EngineCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the factory for `backend`.
    pub fn register<F>(&mut self, backend: Backend, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn EngineAdapter> + Send + Sync + 'static,
    {
        if self.factories.insert(backend, Box::new(factory)).is_some() {
            tracing::debug!("replaced engine factory for {backend}");
        }
        self
    }

    /// Consuming variant of [`register`](Self::register).
    pub fn with<F>(mut self, backend: Backend, factory: F) -> Self
    where
        F: Fn() -> Box<dyn EngineAdapter> + Send + Sync + 'static,
    {
        self.register(backend, factory);
        self
    }

    pub fn is_available(&self, backend: Backend) -> bool {
        self.factories.contains_key(&backend)
    }

    /// Registered backends in declaration order.
    pub fn available(&self) -> Vec<Backend> {
        Backend::ALL
            .into_iter()
            .filter(|b| self.is_available(*b))
            .collect()
    }

    /// Constructs a fresh, uninitialized adapter.
    pub fn create(&self, backend: Backend) -> Option<Box<dyn EngineAdapter>> {
        self.factories.get(&backend).map(|factory| factory())
    }
}

impl fmt::Debug for EngineCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineCatalog")
            .field("available", &self.available())
            .finish()
    }
}
