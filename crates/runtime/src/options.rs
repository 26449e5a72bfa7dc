// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Engine-specific tuning options.
//!
//! A [`RuntimeOption`](crate::RuntimeOption) holds one optional sub-structure
//! per engine. Only the chosen engine's sub-structure is resolved into a
//! [`BackendOption`] at init time, with the common placement fields stamped
//! into it.

use crate::Backend;
use std::collections::BTreeMap;
use std::ffi::c_void;
use std::path::PathBuf;
use std::ptr::NonNull;

/// Opaque handle to an accelerator stream owned by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHandle(NonNull<c_void>);

impl StreamHandle {
    /// Wraps a raw stream pointer. Returns `None` for null.
    ///
    /// # Safety
    /// The stream must stay valid for as long as any runtime using it.
    pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Returns the raw stream pointer.
    pub fn as_ptr(&self) -> *mut c_void {
        self.0.as_ptr()
    }
}

// SAFETY: the handle is an opaque token; synchronisation on the stream is
// the engine's responsibility.
unsafe impl Send for StreamHandle {}
unsafe impl Sync for StreamHandle {}

/// Engine-side profiling controls.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BenchmarkOption {
    /// Record per-call latency in the runtime's metrics.
    pub enable_profile: bool,
    /// Include host/device copies in the measured time.
    pub include_h2d_d2h: bool,
    /// Calls excluded from metrics at the start of a session.
    pub warmup: usize,
    /// Calls an engine should repeat per measurement when it profiles itself.
    pub repeats: usize,
}

impl Default for BenchmarkOption {
    fn default() -> Self {
        Self {
            enable_profile: false,
            include_h2d_d2h: false,
            warmup: 50,
            repeats: 100,
        }
    }
}

// ── Per-engine options ─────────────────────────────────────────────

/// ONNX Runtime options.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OrtOption {
    /// Graph optimization level (engine default when unset).
    pub graph_optimization_level: Option<i32>,
    pub intra_op_num_threads: Option<usize>,
    pub inter_op_num_threads: Option<usize>,
    /// 0 = sequential, 1 = parallel.
    pub execution_mode: Option<i32>,
}

/// TensorRT options. Shape maps are keyed by input name.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TrtOption {
    pub max_batch_size: usize,
    pub max_workspace_size: usize,
    pub enable_fp16: bool,
    /// Where to cache the built engine.
    pub serialize_file: Option<PathBuf>,
    pub min_shape: BTreeMap<String, Vec<i64>>,
    pub opt_shape: BTreeMap<String, Vec<i64>>,
    pub max_shape: BTreeMap<String, Vec<i64>>,
    /// Stamped from the runtime's device id.
    #[serde(skip)]
    pub gpu_id: u32,
    /// Stamped from the runtime option.
    #[serde(skip)]
    pub enable_pinned_memory: bool,
    /// Stamped from the runtime option.
    #[serde(skip)]
    pub external_stream: Option<StreamHandle>,
}

impl Default for TrtOption {
    fn default() -> Self {
        Self {
            max_batch_size: 32,
            max_workspace_size: 1 << 30,
            enable_fp16: false,
            serialize_file: None,
            min_shape: BTreeMap::new(),
            opt_shape: BTreeMap::new(),
            max_shape: BTreeMap::new(),
            gpu_id: 0,
            enable_pinned_memory: false,
            external_stream: None,
        }
    }
}

/// Paddle Inference options.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PaddleOption {
    pub enable_mkldnn: bool,
    pub mkldnn_cache_size: Option<usize>,
    pub enable_log_info: bool,
    /// Run subgraphs through the TensorRT integration.
    pub enable_trt: bool,
    pub trt: TrtOption,
    /// Stamped from the runtime option.
    #[serde(skip)]
    pub enable_pinned_memory: bool,
    /// Stamped from the runtime option.
    #[serde(skip)]
    pub external_stream: Option<StreamHandle>,
}

impl Default for PaddleOption {
    fn default() -> Self {
        Self {
            enable_mkldnn: true,
            mkldnn_cache_size: None,
            enable_log_info: false,
            enable_trt: false,
            trt: TrtOption::default(),
            enable_pinned_memory: false,
            external_stream: None,
        }
    }
}

/// OpenVINO options.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OpenVinoOption {
    pub device_name: String,
    pub num_streams: Option<usize>,
}

impl Default for OpenVinoOption {
    fn default() -> Self {
        Self {
            device_name: "CPU".to_string(),
            num_streams: None,
        }
    }
}

/// Paddle Lite options.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LiteOption {
    pub power_mode: i32,
    pub enable_fp16: bool,
    pub optimized_model_dir: Option<PathBuf>,
    pub nnadapter_device_names: Vec<String>,
}

/// Poros options. Batch and workspace limits are copied from the TensorRT
/// options at resolve time.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PorosOption {
    pub is_dynamic: bool,
    pub long_to_int: bool,
    pub use_nvidia_tf32: bool,
    pub unconst_ops_thres: i32,
    #[serde(skip)]
    pub enable_fp16: bool,
    #[serde(skip)]
    pub max_batch_size: usize,
    #[serde(skip)]
    pub max_workspace_size: usize,
}

/// RKNPU2 options.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Rknpu2Option {
    pub cpu_name: String,
    /// NPU core mask; 0 lets the driver choose.
    pub core_mask: u32,
}

impl Default for Rknpu2Option {
    fn default() -> Self {
        Self {
            cpu_name: "rk3588".to_string(),
            core_mask: 0,
        }
    }
}

/// The chosen engine's fully resolved options.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOption {
    Ort(OrtOption),
    TensorRt(TrtOption),
    PaddleInference(PaddleOption),
    OpenVino(OpenVinoOption),
    Lite(LiteOption),
    Poros(PorosOption),
    Rknpu2(Rknpu2Option),
    SophgoTpu,
}

impl BackendOption {
    /// The engine these options belong to.
    pub fn backend(&self) -> Backend {
        match self {
            BackendOption::Ort(_) => Backend::Ort,
            BackendOption::TensorRt(_) => Backend::TensorRt,
            BackendOption::PaddleInference(_) => Backend::PaddleInference,
            BackendOption::OpenVino(_) => Backend::OpenVino,
            BackendOption::Lite(_) => Backend::Lite,
            BackendOption::Poros(_) => Backend::Poros,
            BackendOption::Rknpu2(_) => Backend::Rknpu2,
            BackendOption::SophgoTpu => Backend::SophgoTpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_stream_rejected() {
        assert!(unsafe { StreamHandle::from_raw(std::ptr::null_mut()) }.is_none());
    }

    #[test]
    fn test_stream_roundtrip() {
        let mut token = 0u8;
        let ptr = &mut token as *mut u8 as *mut c_void;
        let s = unsafe { StreamHandle::from_raw(ptr) }.unwrap();
        assert_eq!(s.as_ptr(), ptr);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TrtOption::default().max_batch_size, 32);
        assert!(PaddleOption::default().enable_mkldnn);
        assert_eq!(Rknpu2Option::default().cpu_name, "rk3588");
        assert_eq!(BenchmarkOption::default().warmup, 50);
    }

    #[test]
    fn test_backend_option_tag() {
        assert_eq!(
            BackendOption::Poros(PorosOption::default()).backend(),
            Backend::Poros
        );
        assert_eq!(BackendOption::SophgoTpu.backend(), Backend::SophgoTpu);
    }
}
