// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Automatic engine selection.

use crate::{Backend, CapabilityRegistry, RuntimeError};
use model_loader::ModelFormat;
use tensor_core::Device;

/// Engines that support both `format` and `device`, in the format list's order.
pub fn compatible_backends(
    registry: &CapabilityRegistry,
    format: ModelFormat,
    device: Device,
) -> Result<Vec<Backend>, RuntimeError> {
    let by_format = registry
        .backends_for_format(format)
        .ok_or(RuntimeError::UnsupportedFormat(format))?;
    let by_device = registry
        .backends_for_device(device)
        .ok_or(RuntimeError::UnsupportedDevice(device))?;

    let candidates: Vec<Backend> = by_format
        .iter()
        .copied()
        .filter(|b| by_device.contains(b))
        .collect();

    if candidates.is_empty() {
        return Err(RuntimeError::NoCompatibleEngine { format, device });
    }
    Ok(candidates)
}

/// Picks the first compatible engine for which `is_available` holds.
///
/// Any error aborts the current initialization; the caller may still set a
/// backend explicitly and retry on a fresh runtime.
pub fn select_backend(
    registry: &CapabilityRegistry,
    format: ModelFormat,
    device: Device,
    is_available: impl Fn(Backend) -> bool,
) -> Result<Backend, RuntimeError> {
    let candidates = compatible_backends(registry, format, device)?;

    match candidates.iter().copied().find(|b| is_available(*b)) {
        Some(backend) => {
            tracing::info!("auto-selected backend {backend} for {format} model on {device}");
            Ok(backend)
        }
        None => Err(RuntimeError::EngineNotCompiled { candidates }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static FORMATS: [(ModelFormat, &[Backend]); 2] = [
        (
            ModelFormat::Paddle,
            &[Backend::PaddleInference, Backend::Ort],
        ),
        (ModelFormat::Rknn, &[Backend::Rknpu2]),
    ];
    static DEVICES: [(Device, &[Backend]); 1] =
        [(Device::Cpu, &[Backend::Ort, Backend::PaddleInference])];
    static CUSTOM: CapabilityRegistry = CapabilityRegistry::new(&FORMATS, &DEVICES);

    #[test]
    fn test_format_order_wins() {
        let b = select_backend(&CUSTOM, ModelFormat::Paddle, Device::Cpu, |_| true).unwrap();
        assert_eq!(b, Backend::PaddleInference);
    }

    #[test]
    fn test_skips_unavailable() {
        let b = select_backend(&CUSTOM, ModelFormat::Paddle, Device::Cpu, |b| {
            b != Backend::PaddleInference
        })
        .unwrap();
        assert_eq!(b, Backend::Ort);
    }

    #[test]
    fn test_empty_intersection() {
        let err = select_backend(&CUSTOM, ModelFormat::Rknn, Device::Cpu, |_| true).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::NoCompatibleEngine {
                format: ModelFormat::Rknn,
                device: Device::Cpu
            }
        ));
    }

    #[test]
    fn test_unknown_format() {
        let err = select_backend(&CUSTOM, ModelFormat::Onnx, Device::Cpu, |_| true).unwrap_err();
        assert!(matches!(err, RuntimeError::UnsupportedFormat(ModelFormat::Onnx)));
    }

    #[test]
    fn test_unknown_device() {
        let err = select_backend(&CUSTOM, ModelFormat::Paddle, Device::Gpu, |_| true).unwrap_err();
        assert!(matches!(err, RuntimeError::UnsupportedDevice(Device::Gpu)));
    }

    #[test]
    fn test_nothing_available_lists_candidates() {
        let err = select_backend(&CUSTOM, ModelFormat::Paddle, Device::Cpu, |_| false).unwrap_err();
        match err {
            RuntimeError::EngineNotCompiled { candidates } => {
                assert_eq!(candidates, vec![Backend::PaddleInference, Backend::Ort])
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_onnx_on_gpu() {
        let b = select_backend(
            &CapabilityRegistry::DEFAULT,
            ModelFormat::Onnx,
            Device::Gpu,
            |_| true,
        )
        .unwrap();
        assert_eq!(b, Backend::Ort);
    }

    #[test]
    fn test_default_paddle_on_cpu_prefers_paddle_inference() {
        let candidates =
            compatible_backends(&CapabilityRegistry::DEFAULT, ModelFormat::Paddle, Device::Cpu)
                .unwrap();
        assert_eq!(
            candidates,
            vec![
                Backend::PaddleInference,
                Backend::Lite,
                Backend::Ort,
                Backend::OpenVino
            ]
        );
    }
}
