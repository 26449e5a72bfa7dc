// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The runtime orchestrator and its initialization state machine.
//!
//! ```text
//! Unconfigured
//!     │  init() / compile()
//!     ▼
//! Decrypting          (only with an encryption key)
//!     ▼
//! SelectingEngine     (only when no backend is set)
//!     ▼
//! InitializingEngine
//!     ▼
//! Ready  ──  bind / infer / clone, repeatable
//!
//! any error before Ready ──► Failed (terminal)
//! ```
//!
//! Unlike a type-state builder, a failed runtime stays observable: callers
//! can inspect [`Runtime::state`] and the error, but every further
//! `init`/`compile` returns [`RuntimeError::Unusable`].

use crate::adapter::{EngineAdapter, EngineCatalog, EngineContext};
use crate::options::{BackendOption, StreamHandle};
use crate::registry::{CapabilityRegistry, DEFAULT_REGISTRY};
use crate::{selector, Backend, BackendError, InferenceMetrics, RuntimeError, RuntimeOption};
use model_loader::{decrypt_source, ModelError, DECRYPTION_AVAILABLE};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tensor_core::{Tensor, TensorInfo};

// ── States ─────────────────────────────────────────────────────

/// Where a runtime is in its initialization pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeState {
    Unconfigured,
    Decrypting,
    SelectingEngine,
    InitializingEngine,
    Ready,
    Failed,
}

impl fmt::Display for RuntimeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuntimeState::Unconfigured => "unconfigured",
            RuntimeState::Decrypting => "decrypting",
            RuntimeState::SelectingEngine => "selecting-engine",
            RuntimeState::InitializingEngine => "initializing-engine",
            RuntimeState::Ready => "ready",
            RuntimeState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How a runtime produced by [`Runtime::clone_runtime`] was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneMode {
    /// The sibling shares the source's loaded weights.
    SharedWeights,
    /// The engine could not share; the sibling loaded its own copy.
    Reinitialized,
}

// ── Runtime ────────────────────────────────────────────────────

/// A backend-agnostic inference session.
///
/// Owns its configuration, exactly one engine adapter once ready, and the
/// named input/output tensor tables.
///
/// # Example
/// ```no_run
/// use model_loader::ModelFormat;
/// use runtime::{EngineCatalog, Runtime, RuntimeOption};
/// use std::sync::Arc;
///
/// # fn example(catalog: EngineCatalog) -> Result<(), runtime::RuntimeError> {
/// let mut option = RuntimeOption::default();
/// option.set_model_path("model.onnx", None, ModelFormat::Onnx).use_cpu();
///
/// let mut rt = Runtime::new(Arc::new(catalog));
/// rt.init(option)?;
/// for info in rt.input_infos()? {
///     println!("{info}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Runtime {
    option: RuntimeOption,
    catalog: Arc<EngineCatalog>,
    registry: &'static CapabilityRegistry,
    state: RuntimeState,
    adapter: Option<Box<dyn EngineAdapter>>,
    backend_option: Option<BackendOption>,
    inputs: Vec<Tensor>,
    outputs: Vec<Tensor>,
    metrics: InferenceMetrics,
    infer_calls: usize,
    clone_mode: Option<CloneMode>,
}

impl Runtime {
    /// Creates an unconfigured runtime that selects engines from the
    /// built-in capability tables.
    pub fn new(catalog: Arc<EngineCatalog>) -> Self {
        Self::with_registry(catalog, &DEFAULT_REGISTRY)
    }

    /// Creates an unconfigured runtime with custom capability tables.
    pub fn with_registry(catalog: Arc<EngineCatalog>, registry: &'static CapabilityRegistry) -> Self {
        Self {
            option: RuntimeOption::default(),
            catalog,
            registry,
            state: RuntimeState::Unconfigured,
            adapter: None,
            backend_option: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            metrics: InferenceMetrics::new(),
            infer_calls: 0,
            clone_mode: None,
        }
    }

    // ── Initialization ─────────────────────────────────────────

    /// Runs the full pipeline: decrypt, select, check preconditions,
    /// initialize the engine.
    ///
    /// Calling `init` on a ready runtime drops the current engine and tensor
    /// tables and starts over. Any failure leaves the runtime `Failed`.
    pub fn init(&mut self, option: RuntimeOption) -> Result<(), RuntimeError> {
        self.begin(option)?;
        let result = self.run_init();
        self.finish(result)
    }

    /// Builds a compiler engine (Poros) from prewarm input sets.
    ///
    /// Replaces [`init`](Self::init) for compiler engines; a ready runtime
    /// rejects it.
    pub fn compile(
        &mut self,
        prewarm: &[Vec<Tensor>],
        option: RuntimeOption,
    ) -> Result<(), RuntimeError> {
        if self.state == RuntimeState::Ready {
            return Err(RuntimeError::InvalidState(
                "runtime is already initialized; compile() must be called on a fresh runtime"
                    .into(),
            ));
        }
        self.begin(option)?;
        let result = self.run_compile(prewarm);
        self.finish(result)
    }

    fn begin(&mut self, option: RuntimeOption) -> Result<(), RuntimeError> {
        if self.state == RuntimeState::Failed {
            return Err(RuntimeError::Unusable);
        }
        self.adapter = None;
        self.backend_option = None;
        self.inputs.clear();
        self.outputs.clear();
        self.metrics.reset();
        self.infer_calls = 0;
        self.clone_mode = None;
        self.option = option;
        self.state = RuntimeState::Unconfigured;
        Ok(())
    }

    fn finish(&mut self, result: Result<(), RuntimeError>) -> Result<(), RuntimeError> {
        match result {
            Ok(()) => {
                self.state = RuntimeState::Ready;
                Ok(())
            }
            Err(e) => {
                tracing::error!("runtime initialization failed in state {}: {e}", self.state);
                self.adapter = None;
                self.backend_option = None;
                self.state = RuntimeState::Failed;
                Err(e)
            }
        }
    }

    fn run_init(&mut self) -> Result<(), RuntimeError> {
        self.option.validate()?;
        self.decrypt_model()?;
        let backend = self.resolve_backend()?;
        if backend.is_compiler() {
            return Err(RuntimeError::EnginePreconditionViolation {
                backend,
                detail: "is a compiler backend; call compile() with prewarm inputs instead of init()"
                    .into(),
            });
        }
        self.construct(backend, |adapter, ctx| adapter.initialize(ctx))
    }

    fn run_compile(&mut self, prewarm: &[Vec<Tensor>]) -> Result<(), RuntimeError> {
        self.option.validate()?;
        self.decrypt_model()?;
        let backend = self.resolve_backend()?;
        if !backend.is_compiler() {
            return Err(RuntimeError::CompileUnsupported(backend));
        }
        tracing::info!("compiling {backend} engine with {} prewarm input sets", prewarm.len());
        self.construct(backend, |adapter, ctx| adapter.compile(prewarm, ctx))
    }

    /// Replaces encrypted model/params sources with decrypted in-memory ones.
    fn decrypt_model(&mut self) -> Result<(), RuntimeError> {
        let Some(key) = self.option.encryption_key.clone() else {
            return Ok(());
        };
        self.state = RuntimeState::Decrypting;
        if !DECRYPTION_AVAILABLE {
            return Err(ModelError::DecryptionUnavailable.into());
        }

        let model = decrypt_source(&self.option.model, &key)?;
        let params = match &self.option.params {
            Some(p) => Some(decrypt_source(p, &key)?),
            None => None,
        };
        self.option.model = model;
        self.option.params = params;
        // The sources now hold plaintext; a reinitializing clone must not
        // decrypt them a second time.
        self.option.encryption_key = None;
        tracing::debug!("decrypted model artifacts");
        Ok(())
    }

    fn resolve_backend(&mut self) -> Result<Backend, RuntimeError> {
        if let Some(backend) = self.option.backend {
            return Ok(backend);
        }
        self.state = RuntimeState::SelectingEngine;
        let catalog = &self.catalog;
        let backend = selector::select_backend(
            self.registry,
            self.option.format,
            self.option.device,
            |b| catalog.is_available(b),
        )?;
        self.option.backend = Some(backend);
        Ok(backend)
    }

    /// Looks up, checks, constructs and drives the chosen adapter.
    fn construct<F>(&mut self, backend: Backend, drive: F) -> Result<(), RuntimeError>
    where
        F: FnOnce(&mut dyn EngineAdapter, &EngineContext<'_>) -> Result<(), BackendError>,
    {
        self.state = RuntimeState::InitializingEngine;

        let not_compiled = || RuntimeError::EngineNotCompiled {
            candidates: vec![backend],
        };
        if !self.catalog.is_available(backend) {
            return Err(not_compiled());
        }
        backend.check_preconditions(
            self.option.format,
            self.option.device,
            self.option.model_from_memory(),
        )?;

        let mut adapter = self.catalog.create(backend).ok_or_else(not_compiled)?;
        let backend_option = self.option.resolve_backend_option(backend);
        {
            let ctx = EngineContext::new(&self.option, &backend_option);
            drive(adapter.as_mut(), &ctx)
                .map_err(|source| RuntimeError::EngineInitializationFailure { backend, source })?;
        }

        // A non-sharing engine clones by reinitializing from these bytes.
        if self.option.model_from_memory()
            && adapter.supports_shared_clone()
            && !adapter.needs_model_buffer()
        {
            self.release_model_memory_buffer();
        }
        tracing::info!(
            "runtime ready: backend {backend}, device {}:{}",
            self.option.device,
            self.option.device_id
        );
        self.adapter = Some(adapter);
        self.backend_option = Some(backend_option);
        Ok(())
    }

    // ── Tensors & inference ────────────────────────────────────

    /// Binds `tensor` as the input named `name`.
    ///
    /// An existing entry keeps its slot and takes over the new tensor's
    /// descriptor and storage; a new name is appended.
    pub fn bind_input_tensor(&mut self, name: &str, tensor: Tensor) {
        match self.inputs.iter_mut().find(|t| t.name() == name) {
            Some(slot) => {
                slot.rebind(tensor);
                tracing::debug!("rebound input '{name}'");
            }
            None => {
                let mut tensor = tensor;
                tensor.set_name(name);
                self.inputs.push(tensor);
                tracing::debug!("bound new input '{name}'");
            }
        }
    }

    /// The bound input table.
    pub fn input_tensors(&self) -> &[Tensor] {
        &self.inputs
    }

    /// The output table produced by the last stateful [`infer`](Self::infer).
    pub fn output_tensors(&self) -> &[Tensor] {
        &self.outputs
    }

    /// Looks up an output by name, logging a warning on a miss.
    pub fn output_tensor(&self, name: &str) -> Option<&Tensor> {
        let found = self.outputs.iter().find(|t| t.name() == name);
        if found.is_none() {
            tracing::warn!("no output tensor named '{name}'");
        }
        found
    }

    /// Like [`output_tensor`](Self::output_tensor) but reports a miss as
    /// [`RuntimeError::OutputNotFound`].
    pub fn require_output_tensor(&self, name: &str) -> Result<&Tensor, RuntimeError> {
        self.outputs
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| RuntimeError::OutputNotFound(name.to_string()))
    }

    /// Runs inference on caller-supplied tensors.
    pub fn infer_with(
        &mut self,
        inputs: &[Tensor],
        outputs: &mut Vec<Tensor>,
    ) -> Result<(), RuntimeError> {
        let state = self.state;
        let device_id = self.option.device_id;
        let adapter = match (state, self.adapter.as_mut()) {
            (RuntimeState::Ready, Some(adapter)) => adapter,
            _ => return Err(RuntimeError::NotReady(state)),
        };
        check_device_ids(inputs, device_id)?;

        let backend = adapter.backend();
        let start = Instant::now();
        adapter
            .infer(inputs, outputs, false)
            .map_err(|source| RuntimeError::InferenceFailure { backend, source })?;
        self.record_call(start);
        Ok(())
    }

    /// Runs inference on the bound input table, filling the output table.
    ///
    /// Every output is stamped with the runtime's device id afterwards, even
    /// when the engine reports an error.
    pub fn infer(&mut self) -> Result<(), RuntimeError> {
        let state = self.state;
        let device_id = self.option.device_id;
        let adapter = match (state, self.adapter.as_mut()) {
            (RuntimeState::Ready, Some(adapter)) => adapter,
            _ => return Err(RuntimeError::NotReady(state)),
        };
        check_device_ids(&self.inputs, device_id)?;

        let backend = adapter.backend();
        let start = Instant::now();
        let result = adapter.infer(&self.inputs, &mut self.outputs, true);
        for output in &mut self.outputs {
            output.set_device_id(Some(device_id));
        }
        result.map_err(|source| RuntimeError::InferenceFailure { backend, source })?;
        tracing::debug!("inference produced {} outputs", self.outputs.len());
        self.record_call(start);
        Ok(())
    }

    fn record_call(&mut self, start: Instant) {
        let elapsed = start.elapsed();
        let bench = &self.option.benchmark;
        if !bench.enable_profile {
            return;
        }
        self.infer_calls += 1;
        if self.infer_calls <= bench.warmup {
            self.metrics.record_warmup();
        } else {
            self.metrics.record(elapsed);
        }
    }

    // ── Introspection ──────────────────────────────────────────

    pub fn num_inputs(&self) -> Result<usize, RuntimeError> {
        Ok(self.ready_adapter()?.num_inputs())
    }

    pub fn num_outputs(&self) -> Result<usize, RuntimeError> {
        Ok(self.ready_adapter()?.num_outputs())
    }

    pub fn input_info(&self, index: usize) -> Result<TensorInfo, RuntimeError> {
        let adapter = self.ready_adapter()?;
        adapter.input_info(index).map_err(|source| RuntimeError::Backend {
            backend: adapter.backend(),
            source,
        })
    }

    pub fn output_info(&self, index: usize) -> Result<TensorInfo, RuntimeError> {
        let adapter = self.ready_adapter()?;
        adapter.output_info(index).map_err(|source| RuntimeError::Backend {
            backend: adapter.backend(),
            source,
        })
    }

    pub fn input_infos(&self) -> Result<Vec<TensorInfo>, RuntimeError> {
        Ok(self.ready_adapter()?.input_infos())
    }

    pub fn output_infos(&self) -> Result<Vec<TensorInfo>, RuntimeError> {
        Ok(self.ready_adapter()?.output_infos())
    }

    fn ready_adapter(&self) -> Result<&dyn EngineAdapter, RuntimeError> {
        match (self.state, self.adapter.as_deref()) {
            (RuntimeState::Ready, Some(adapter)) => Ok(adapter),
            (state, _) => Err(RuntimeError::NotReady(state)),
        }
    }

    // ── Cloning ────────────────────────────────────────────────

    /// Creates a sibling runtime bound to `stream` and `device_id`.
    ///
    /// Engines that can share weights produce a [`CloneMode::SharedWeights`]
    /// sibling; all others are fully reinitialized from a copy of the
    /// configuration. The source runtime is never modified.
    pub fn clone_runtime(
        &self,
        stream: Option<StreamHandle>,
        device_id: u32,
    ) -> Result<Runtime, RuntimeError> {
        let adapter = self.ready_adapter()?;
        let backend = adapter.backend();

        let mut option = self.option.clone();
        option.device_id = device_id;
        option.external_stream = stream;

        if adapter.supports_shared_clone() {
            let backend_option = option.resolve_backend_option(backend);
            let sibling = {
                let ctx = EngineContext::new(&option, &backend_option);
                adapter
                    .shared_clone(&ctx, stream, device_id)
                    .map_err(|source| RuntimeError::CloneFailure { backend, source })?
            };
            tracing::info!("cloned {backend} runtime sharing weights (device id {device_id})");
            return Ok(Runtime {
                option,
                catalog: Arc::clone(&self.catalog),
                registry: self.registry,
                state: RuntimeState::Ready,
                adapter: Some(sibling),
                backend_option: Some(backend_option),
                inputs: Vec::new(),
                outputs: Vec::new(),
                metrics: InferenceMetrics::new(),
                infer_calls: 0,
                clone_mode: Some(CloneMode::SharedWeights),
            });
        }

        tracing::warn!(
            "backend {backend} cannot share weights; the clone reinitializes \
             and does not share memory with its source"
        );
        let mut sibling = Runtime::with_registry(Arc::clone(&self.catalog), self.registry);
        sibling.init(option)?;
        sibling.clone_mode = Some(CloneMode::Reinitialized);
        Ok(sibling)
    }

    // ── Accessors ──────────────────────────────────────────────

    /// Drops in-memory model/params bytes held by the configuration.
    pub fn release_model_memory_buffer(&mut self) {
        if self.option.model_from_memory() {
            self.option.model.release();
            if let Some(params) = self.option.params.as_mut() {
                params.release();
            }
            tracing::debug!("released in-memory model buffer");
        }
    }

    pub fn state(&self) -> RuntimeState {
        self.state
    }

    pub fn option(&self) -> &RuntimeOption {
        &self.option
    }

    /// The active engine, once ready.
    pub fn backend(&self) -> Option<Backend> {
        self.adapter.as_ref().map(|a| a.backend())
    }

    /// The active engine's resolved options.
    pub fn backend_option(&self) -> Option<&BackendOption> {
        self.backend_option.as_ref()
    }

    pub fn metrics(&self) -> &InferenceMetrics {
        &self.metrics
    }

    /// How this runtime was produced, if it is a clone.
    pub fn clone_mode(&self) -> Option<CloneMode> {
        self.clone_mode
    }
}

fn check_device_ids(tensors: &[Tensor], runtime_device_id: u32) -> Result<(), RuntimeError> {
    for tensor in tensors {
        match tensor.device_id() {
            Some(id) if id != runtime_device_id => {
                return Err(RuntimeError::DeviceIdMismatch {
                    tensor: tensor.name().to_string(),
                    tensor_device_id: id,
                    runtime_device_id,
                });
            }
            _ => {}
        }
    }
    Ok(())
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("state", &self.state)
            .field("backend", &self.backend())
            .field("device", &self.option.device)
            .field("device_id", &self.option.device_id)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("clone_mode", &self.clone_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_loader::ModelFormat;
    use tensor_core::{DType, Device, Shape};

    struct Echo;

    impl EngineAdapter for Echo {
        fn backend(&self) -> Backend {
            Backend::Ort
        }
        fn initialize(&mut self, _ctx: &EngineContext<'_>) -> Result<(), BackendError> {
            Ok(())
        }
        fn infer(
            &mut self,
            inputs: &[Tensor],
            outputs: &mut Vec<Tensor>,
            _use_bound_tensors: bool,
        ) -> Result<(), BackendError> {
            *outputs = inputs.to_vec();
            Ok(())
        }
        fn input_infos(&self) -> Vec<TensorInfo> {
            vec![TensorInfo::new("x", vec![-1, 4], DType::F32)]
        }
        fn output_infos(&self) -> Vec<TensorInfo> {
            vec![TensorInfo::new("x", vec![-1, 4], DType::F32)]
        }
    }

    fn echo_runtime() -> Runtime {
        let catalog = EngineCatalog::new().with(Backend::Ort, || Box::new(Echo));
        Runtime::new(Arc::new(catalog))
    }

    fn onnx_option() -> RuntimeOption {
        let mut o = RuntimeOption::default();
        o.set_model_path("model.onnx", None, ModelFormat::Onnx);
        o
    }

    #[test]
    fn test_new_is_unconfigured() {
        let rt = echo_runtime();
        assert_eq!(rt.state(), RuntimeState::Unconfigured);
        assert!(rt.backend().is_none());
        assert!(matches!(
            rt.input_infos(),
            Err(RuntimeError::NotReady(RuntimeState::Unconfigured))
        ));
    }

    #[test]
    fn test_init_selects_and_readies() {
        let mut rt = echo_runtime();
        rt.init(onnx_option()).unwrap();
        assert_eq!(rt.state(), RuntimeState::Ready);
        assert_eq!(rt.backend(), Some(Backend::Ort));
        assert_eq!(rt.option().backend, Some(Backend::Ort));
        assert_eq!(rt.num_inputs().unwrap(), 1);
        assert!(matches!(rt.backend_option(), Some(BackendOption::Ort(_))));
    }

    #[test]
    fn test_failed_is_terminal() {
        let mut rt = echo_runtime();
        let mut bad = onnx_option();
        bad.use_device(Device::Rknpu, 0);
        assert!(matches!(
            rt.init(bad),
            Err(RuntimeError::NoCompatibleEngine { .. })
        ));
        assert_eq!(rt.state(), RuntimeState::Failed);
        assert!(matches!(rt.init(onnx_option()), Err(RuntimeError::Unusable)));
    }

    #[test]
    fn test_infer_before_init() {
        let mut rt = echo_runtime();
        assert!(matches!(
            rt.infer(),
            Err(RuntimeError::NotReady(RuntimeState::Unconfigured))
        ));
    }

    #[test]
    fn test_bind_rebinds_in_place() {
        let mut rt = echo_runtime();
        rt.bind_input_tensor("x", Tensor::zeros("ignored", Shape::new(vec![1, 4]), DType::F32));
        rt.bind_input_tensor("x", Tensor::zeros("x", Shape::new(vec![2, 4]), DType::F32));
        assert_eq!(rt.input_tensors().len(), 1);
        assert_eq!(rt.input_tensors()[0].name(), "x");
        assert_eq!(rt.input_tensors()[0].shape().dims(), &[2, 4]);

        rt.bind_input_tensor("y", Tensor::new("y"));
        assert_eq!(rt.input_tensors().len(), 2);
    }

    #[test]
    fn test_reinit_resets_tables() {
        let mut rt = echo_runtime();
        rt.init(onnx_option()).unwrap();
        rt.bind_input_tensor("x", Tensor::zeros("x", Shape::new(vec![1, 4]), DType::F32));
        rt.infer().unwrap();
        assert_eq!(rt.output_tensors().len(), 1);

        rt.init(onnx_option()).unwrap();
        assert!(rt.input_tensors().is_empty());
        assert!(rt.output_tensors().is_empty());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(RuntimeState::SelectingEngine.to_string(), "selecting-engine");
        assert_eq!(RuntimeState::Failed.to_string(), "failed");
    }

    #[test]
    fn test_debug_format() {
        let rt = echo_runtime();
        let s = format!("{rt:?}");
        assert!(s.contains("Runtime"));
        assert!(s.contains("Unconfigured"));
    }
}
