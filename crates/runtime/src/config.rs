// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Runtime configuration loaded from TOML files or constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! model = "./models/yolov8/model.pdmodel"
//! params = "./models/yolov8/model.pdiparams"
//! format = "paddle"
//! device = "gpu"
//! device_id = 0
//! backend = "tensorrt"      # omit to auto-select
//! cpu_thread_num = 4
//!
//! [benchmark]
//! enable_profile = true
//! warmup = 10
//!
//! [trt]
//! enable_fp16 = true
//! max_batch_size = 8
//! ```

use crate::options::{
    BackendOption, BenchmarkOption, LiteOption, OpenVinoOption, OrtOption, PaddleOption,
    PorosOption, Rknpu2Option, StreamHandle, TrtOption,
};
use crate::{Backend, RuntimeError};
use model_loader::{ModelError, ModelFormat, ModelSource};
use std::path::{Path, PathBuf};
use tensor_core::Device;

/// Everything needed to initialize a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeOption {
    /// Model graph (file path or in-memory buffer).
    pub model: ModelSource,
    /// Separate parameter file, for formats that split graph and weights.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<ModelSource>,
    pub format: ModelFormat,
    pub device: Device,
    pub device_id: u32,
    /// Explicit engine; `None` lets the selector choose.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Backend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_thread_num: Option<usize>,
    pub enable_pinned_memory: bool,
    /// Decrypt model and params with this key before engine init.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_key: Option<String>,
    /// Caller-owned accelerator stream. Never serialized.
    #[serde(skip)]
    pub external_stream: Option<StreamHandle>,
    pub benchmark: BenchmarkOption,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ort: Option<OrtOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trt: Option<TrtOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paddle: Option<PaddleOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openvino: Option<OpenVinoOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lite: Option<LiteOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poros: Option<PorosOption>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rknpu2: Option<Rknpu2Option>,
}

impl RuntimeOption {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, RuntimeError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RuntimeError::ConfigError(format!("cannot read config '{}': {e}", path.display()))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, RuntimeError> {
        toml::from_str(toml_str)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML parse error: {e}")))
    }

    /// Serialises configuration to TOML. In-memory models cannot be serialised.
    pub fn to_toml(&self) -> Result<String, RuntimeError> {
        toml::to_string_pretty(self)
            .map_err(|e| RuntimeError::ConfigError(format!("TOML serialise error: {e}")))
    }

    // ── Builder-style setters ──────────────────────────────────────

    /// Loads the model (and optional params) from files.
    pub fn set_model_path(
        &mut self,
        model: impl Into<PathBuf>,
        params: Option<PathBuf>,
        format: ModelFormat,
    ) -> &mut Self {
        self.model = ModelSource::File(model.into());
        self.params = params.map(ModelSource::File);
        self.format = format;
        self
    }

    /// Loads the model (and optional params) from memory.
    pub fn set_model_buffer(
        &mut self,
        model: Vec<u8>,
        params: Option<Vec<u8>>,
        format: ModelFormat,
    ) -> &mut Self {
        self.model = ModelSource::Memory(model);
        self.params = params.map(ModelSource::Memory);
        self.format = format;
        self
    }

    pub fn use_cpu(&mut self) -> &mut Self {
        self.use_device(Device::Cpu, 0)
    }

    pub fn use_gpu(&mut self, device_id: u32) -> &mut Self {
        self.use_device(Device::Gpu, device_id)
    }

    pub fn use_device(&mut self, device: Device, device_id: u32) -> &mut Self {
        self.device = device;
        self.device_id = device_id;
        self
    }

    /// Pins the engine instead of auto-selecting it.
    pub fn use_backend(&mut self, backend: Backend) -> &mut Self {
        self.backend = Some(backend);
        self
    }

    pub fn set_cpu_thread_num(&mut self, threads: usize) -> &mut Self {
        self.cpu_thread_num = Some(threads);
        self
    }

    pub fn set_encryption_key(&mut self, key: impl Into<String>) -> &mut Self {
        self.encryption_key = Some(key.into());
        self
    }

    pub fn set_external_stream(&mut self, stream: Option<StreamHandle>) -> &mut Self {
        self.external_stream = stream;
        self
    }

    pub fn enable_pinned_memory(&mut self) -> &mut Self {
        self.enable_pinned_memory = true;
        self
    }

    /// Records per-call latency, skipping the first `warmup` calls.
    pub fn enable_profiling(&mut self, warmup: usize, repeats: usize) -> &mut Self {
        self.benchmark.enable_profile = true;
        self.benchmark.warmup = warmup;
        self.benchmark.repeats = repeats;
        self
    }

    pub fn ort_mut(&mut self) -> &mut OrtOption {
        self.ort.get_or_insert_with(Default::default)
    }

    pub fn trt_mut(&mut self) -> &mut TrtOption {
        self.trt.get_or_insert_with(Default::default)
    }

    pub fn paddle_mut(&mut self) -> &mut PaddleOption {
        self.paddle.get_or_insert_with(Default::default)
    }

    pub fn openvino_mut(&mut self) -> &mut OpenVinoOption {
        self.openvino.get_or_insert_with(Default::default)
    }

    pub fn lite_mut(&mut self) -> &mut LiteOption {
        self.lite.get_or_insert_with(Default::default)
    }

    pub fn poros_mut(&mut self) -> &mut PorosOption {
        self.poros.get_or_insert_with(Default::default)
    }

    pub fn rknpu2_mut(&mut self) -> &mut Rknpu2Option {
        self.rknpu2.get_or_insert_with(Default::default)
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Returns `true` if the model bytes are (or were) held in memory.
    pub fn model_from_memory(&self) -> bool {
        self.model.is_memory()
    }

    /// Checks the configuration for values no engine could accept.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        check_source("model", &self.model)?;
        if let Some(params) = &self.params {
            check_source("params", params)?;
        }
        if matches!(&self.encryption_key, Some(k) if k.is_empty()) {
            return Err(RuntimeError::ConfigError("encryption key is empty".into()));
        }
        if self.cpu_thread_num == Some(0) {
            return Err(RuntimeError::ConfigError(
                "cpu_thread_num must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Builds the chosen engine's options, stamping the common placement
    /// fields (device id, stream, pinned memory) into them.
    pub fn resolve_backend_option(&self, backend: Backend) -> BackendOption {
        match backend {
            Backend::Ort => BackendOption::Ort(self.ort.clone().unwrap_or_default()),
            Backend::TensorRt => {
                let mut trt = self.trt.clone().unwrap_or_default();
                self.stamp_trt(&mut trt);
                BackendOption::TensorRt(trt)
            }
            Backend::PaddleInference => {
                let mut paddle = self.paddle.clone().unwrap_or_default();
                paddle.enable_pinned_memory = self.enable_pinned_memory;
                paddle.external_stream = self.external_stream;
                self.stamp_trt(&mut paddle.trt);
                BackendOption::PaddleInference(paddle)
            }
            Backend::OpenVino => {
                BackendOption::OpenVino(self.openvino.clone().unwrap_or_default())
            }
            Backend::Lite => BackendOption::Lite(self.lite.clone().unwrap_or_default()),
            Backend::Poros => {
                let mut poros = self.poros.clone().unwrap_or_default();
                let trt = self.trt.clone().unwrap_or_default();
                poros.enable_fp16 = trt.enable_fp16;
                poros.max_batch_size = trt.max_batch_size;
                poros.max_workspace_size = trt.max_workspace_size;
                BackendOption::Poros(poros)
            }
            Backend::Rknpu2 => BackendOption::Rknpu2(self.rknpu2.clone().unwrap_or_default()),
            Backend::SophgoTpu => BackendOption::SophgoTpu,
        }
    }

    fn stamp_trt(&self, trt: &mut TrtOption) {
        trt.gpu_id = self.device_id;
        trt.enable_pinned_memory = self.enable_pinned_memory;
        trt.external_stream = self.external_stream;
    }
}

fn check_source(what: &str, source: &ModelSource) -> Result<(), RuntimeError> {
    match source {
        ModelSource::File(p) if p.as_os_str().is_empty() => Err(RuntimeError::ConfigError(
            format!("{what} path is empty"),
        )),
        ModelSource::Released => Err(RuntimeError::Model(ModelError::Released)),
        _ => Ok(()),
    }
}
