// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The closed set of compute engines and their own preconditions.
//!
//! The capability registry says which engines are *candidates* for a
//! format/device pair. Each engine is stricter than that: it checks its own
//! device list, accepted formats and whether it can load a model from memory.

use crate::RuntimeError;
use model_loader::ModelFormat;
use std::fmt;
use std::str::FromStr;
use tensor_core::Device;

/// Identifies one concrete compute engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// ONNX Runtime.
    Ort,
    /// NVIDIA TensorRT.
    TensorRt,
    /// Paddle Inference.
    PaddleInference,
    /// Intel OpenVINO.
    OpenVino,
    /// Paddle Lite (mobile and NPU targets).
    Lite,
    /// Poros TorchScript compiler.
    Poros,
    /// Rockchip RKNPU2 runtime.
    Rknpu2,
    /// Sophgo TPU runtime.
    SophgoTpu,
}

/// What an engine accepts, checked before its adapter is constructed.
#[derive(Debug, Clone, Copy)]
pub struct EngineRequirements {
    /// Devices the engine can run on.
    pub devices: &'static [Device],
    /// Model formats the engine can load.
    pub formats: &'static [ModelFormat],
    /// Whether the engine can take a model that is already in memory.
    pub accepts_memory_model: bool,
    /// Compiler engines are driven by `compile()` instead of `init()`.
    pub compiler: bool,
}

impl Backend {
    /// Every backend, in declaration order.
    pub const ALL: [Backend; 8] = [
        Backend::Ort,
        Backend::TensorRt,
        Backend::PaddleInference,
        Backend::OpenVino,
        Backend::Lite,
        Backend::Poros,
        Backend::Rknpu2,
        Backend::SophgoTpu,
    ];

    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Ort => "ort",
            Backend::TensorRt => "tensorrt",
            Backend::PaddleInference => "paddle_inference",
            Backend::OpenVino => "openvino",
            Backend::Lite => "lite",
            Backend::Poros => "poros",
            Backend::Rknpu2 => "rknpu2",
            Backend::SophgoTpu => "sophgo_tpu",
        }
    }

    /// Returns the engine's own device/format/residency requirements.
    pub const fn requirements(self) -> EngineRequirements {
        use Device::*;
        use ModelFormat::*;

        match self {
            Backend::Ort => EngineRequirements {
                devices: &[Cpu, Gpu],
                formats: &[Onnx, Paddle],
                accepts_memory_model: true,
                compiler: false,
            },
            Backend::TensorRt => EngineRequirements {
                devices: &[Gpu],
                formats: &[Onnx, Paddle],
                accepts_memory_model: true,
                compiler: false,
            },
            Backend::PaddleInference => EngineRequirements {
                devices: &[Cpu, Gpu, Ipu],
                formats: &[Paddle],
                accepts_memory_model: true,
                compiler: false,
            },
            Backend::OpenVino => EngineRequirements {
                devices: &[Cpu],
                formats: &[Onnx, Paddle],
                accepts_memory_model: true,
                compiler: false,
            },
            Backend::Lite => EngineRequirements {
                devices: &[Cpu, Timvx, Kunlunxin, Ascend],
                formats: &[Paddle],
                accepts_memory_model: true,
                compiler: false,
            },
            Backend::Poros => EngineRequirements {
                devices: &[Cpu, Gpu],
                formats: &[TorchScript],
                accepts_memory_model: true,
                compiler: true,
            },
            Backend::Rknpu2 => EngineRequirements {
                devices: &[Rknpu],
                formats: &[Rknn],
                accepts_memory_model: false,
                compiler: false,
            },
            Backend::SophgoTpu => EngineRequirements {
                devices: &[Device::SophgoTpu],
                formats: &[Sophgo],
                accepts_memory_model: true,
                compiler: false,
            },
        }
    }

    /// Returns `true` if this engine is driven by `compile()`.
    pub fn is_compiler(self) -> bool {
        self.requirements().compiler
    }

    /// Checks the engine's preconditions against a configuration.
    ///
    /// A violation is fatal for the initialization attempt.
    pub fn check_preconditions(
        self,
        format: ModelFormat,
        device: Device,
        model_in_memory: bool,
    ) -> Result<(), RuntimeError> {
        let req = self.requirements();
        let violation = |detail: String| RuntimeError::EnginePreconditionViolation {
            backend: self,
            detail,
        };

        if !req.devices.contains(&device) {
            return Err(violation(format!(
                "only supports devices {}, got {device}",
                join(req.devices)
            )));
        }
        if !req.formats.contains(&format) {
            return Err(violation(format!(
                "only supports model formats {}, got {format}",
                join(req.formats)
            )));
        }
        if model_in_memory && !req.accepts_memory_model {
            return Err(violation(
                "cannot load a model from memory; configure a model file".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ort" | "onnxruntime" => Ok(Backend::Ort),
            "tensorrt" | "trt" => Ok(Backend::TensorRt),
            "paddle_inference" | "pdinfer" | "paddle" => Ok(Backend::PaddleInference),
            "openvino" => Ok(Backend::OpenVino),
            "lite" | "paddle_lite" => Ok(Backend::Lite),
            "poros" => Ok(Backend::Poros),
            "rknpu2" => Ok(Backend::Rknpu2),
            "sophgo_tpu" | "sophgotpu" => Ok(Backend::SophgoTpu),
            other => Err(format!("unknown backend '{other}'")),
        }
    }
}

/// Formats a list as `a/b/c`.
pub(crate) fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("/")
}
