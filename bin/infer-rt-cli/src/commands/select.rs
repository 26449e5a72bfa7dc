// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `infer-rt select` command: show the automatic engine choice for a
//! format/device pair.

use super::{availability, banner, join, print_json};
use model_loader::ModelFormat;
use runtime::{selector, Backend, CapabilityRegistry};
use tensor_core::Device;

#[derive(Debug, serde::Serialize)]
pub(crate) struct Selection {
    pub format: ModelFormat,
    pub device: Device,
    pub candidates: Vec<Backend>,
    pub selected: Backend,
}

pub(crate) fn resolve(
    registry: &CapabilityRegistry,
    format: ModelFormat,
    device: Device,
    available: &[Backend],
) -> anyhow::Result<Selection> {
    let candidates = selector::compatible_backends(registry, format, device)?;
    let selected = selector::select_backend(registry, format, device, availability(available))?;
    Ok(Selection {
        format,
        device,
        candidates,
        selected,
    })
}

pub fn execute(
    format: ModelFormat,
    device: Device,
    available: Vec<Backend>,
    json: bool,
) -> anyhow::Result<()> {
    let selection = resolve(&CapabilityRegistry::DEFAULT, format, device, &available)?;
    if json {
        return print_json(&selection);
    }

    banner("Engine Selection");
    println!("  Format:     {}", selection.format);
    println!("  Device:     {}", selection.device);
    println!("  Candidates: {}", join(&selection.candidates, " > "));
    if !available.is_empty() {
        println!("  Available:  {}", join(&available, ", "));
    }
    println!("  Selected:   {}", selection.selected);
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_skips_unavailable() {
        let s = resolve(
            &CapabilityRegistry::DEFAULT,
            ModelFormat::Onnx,
            Device::Gpu,
            &[Backend::TensorRt],
        )
        .unwrap();
        assert_eq!(s.candidates, vec![Backend::Ort, Backend::TensorRt]);
        assert_eq!(s.selected, Backend::TensorRt);
    }

    #[test]
    fn test_resolve_incompatible_pair() {
        let err = resolve(
            &CapabilityRegistry::DEFAULT,
            ModelFormat::Rknn,
            Device::Cpu,
            &[],
        )
        .unwrap_err();
        assert!(err.to_string().contains("no backend supports"));
    }
}
