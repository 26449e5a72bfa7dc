// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Static capability tables: which engines can load a format, which can run
//! on a device.
//!
//! The tables are fixed at compile time. Each list is ordered by preference;
//! the selector keeps the format list's order when intersecting.

use crate::Backend;
use model_loader::ModelFormat;
use tensor_core::Device;

/// Preference-ordered engine lists keyed by model format and by device.
#[derive(Debug, Clone, Copy)]
pub struct CapabilityRegistry {
    by_format: &'static [(ModelFormat, &'static [Backend])],
    by_device: &'static [(Device, &'static [Backend])],
}

/// The registry used by [`Runtime::new`](crate::Runtime::new).
pub static DEFAULT_REGISTRY: CapabilityRegistry = CapabilityRegistry::DEFAULT;

impl CapabilityRegistry {
    /// The built-in tables.
    pub const DEFAULT: CapabilityRegistry = CapabilityRegistry {
        by_format: &[
            (
                ModelFormat::Paddle,
                &[
                    Backend::PaddleInference,
                    Backend::Lite,
                    Backend::Ort,
                    Backend::OpenVino,
                    Backend::TensorRt,
                ],
            ),
            (
                ModelFormat::Onnx,
                &[Backend::Ort, Backend::OpenVino, Backend::TensorRt],
            ),
            (ModelFormat::Rknn, &[Backend::Rknpu2]),
            (ModelFormat::TorchScript, &[Backend::Poros]),
            (ModelFormat::Sophgo, &[Backend::SophgoTpu]),
        ],
        by_device: &[
            (
                Device::Cpu,
                &[
                    Backend::Lite,
                    Backend::PaddleInference,
                    Backend::Ort,
                    Backend::OpenVino,
                    Backend::Poros,
                ],
            ),
            (
                Device::Gpu,
                &[
                    Backend::PaddleInference,
                    Backend::Ort,
                    Backend::TensorRt,
                    Backend::Poros,
                ],
            ),
            (Device::Ipu, &[Backend::PaddleInference]),
            (Device::Rknpu, &[Backend::Rknpu2]),
            (Device::Timvx, &[Backend::Lite]),
            (Device::Kunlunxin, &[Backend::Lite]),
            (Device::Ascend, &[Backend::Lite]),
            (Device::SophgoTpu, &[Backend::SophgoTpu]),
        ],
    };

    /// Builds a registry from custom tables.
    pub const fn new(
        by_format: &'static [(ModelFormat, &'static [Backend])],
        by_device: &'static [(Device, &'static [Backend])],
    ) -> Self {
        Self {
            by_format,
            by_device,
        }
    }

    /// Engines that can load `format`, most preferred first.
    pub fn backends_for_format(&self, format: ModelFormat) -> Option<&'static [Backend]> {
        self.by_format
            .iter()
            .find(|(f, _)| *f == format)
            .map(|(_, list)| *list)
    }

    /// Engines that can run on `device`, most preferred first.
    pub fn backends_for_device(&self, device: Device) -> Option<&'static [Backend]> {
        self.by_device
            .iter()
            .find(|(d, _)| *d == device)
            .map(|(_, list)| *list)
    }

    /// All format entries in table order.
    pub fn formats(&self) -> impl Iterator<Item = (ModelFormat, &'static [Backend])> + '_ {
        self.by_format.iter().copied()
    }

    /// All device entries in table order.
    pub fn devices(&self) -> impl Iterator<Item = (Device, &'static [Backend])> + '_ {
        self.by_device.iter().copied()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_tables() {
        let r = CapabilityRegistry::DEFAULT;
        assert_eq!(
            r.backends_for_format(ModelFormat::Onnx).unwrap(),
            &[Backend::Ort, Backend::OpenVino, Backend::TensorRt]
        );
        assert_eq!(
            r.backends_for_device(Device::Ipu).unwrap(),
            &[Backend::PaddleInference]
        );
        assert_eq!(r.formats().count(), ModelFormat::ALL.len());
        assert_eq!(r.devices().count(), Device::ALL.len());
    }

    #[test]
    fn test_missing_key() {
        static FORMATS: [(ModelFormat, &[Backend]); 1] = [(ModelFormat::Onnx, &[Backend::Ort])];
        let r = CapabilityRegistry::new(&FORMATS, &[]);
        assert!(r.backends_for_format(ModelFormat::Paddle).is_none());
        assert!(r.backends_for_device(Device::Cpu).is_none());
    }

    #[test]
    fn test_every_default_entry_satisfies_engine_preconditions() {
        let r = CapabilityRegistry::DEFAULT;
        for (format, backends) in r.formats() {
            for b in backends {
                assert!(b.requirements().formats.contains(&format), "{b} / {format}");
            }
        }
        for (device, backends) in r.devices() {
            for b in backends {
                assert!(b.requirements().devices.contains(&device), "{b} / {device}");
            }
        }
    }
}
