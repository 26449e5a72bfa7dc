// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Execution target classes.

use std::fmt;
use std::str::FromStr;

/// The class of hardware a tensor lives on or a model executes on.
///
/// Multiple units of the same class are told apart by a numeric device id
/// carried next to the `Device` (see [`crate::Tensor::device_id`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    /// General-purpose processor.
    #[default]
    Cpu,
    /// Graphics accelerator.
    Gpu,
    /// Graphcore intelligence processing unit.
    Ipu,
    /// Rockchip neural processing unit.
    Rknpu,
    /// Verisilicon TIM-VX NPU.
    Timvx,
    /// Kunlunxin XPU.
    Kunlunxin,
    /// Huawei Ascend NPU.
    Ascend,
    /// Sophgo tensor processing unit.
    SophgoTpu,
}

impl Device {
    /// Every device class, in declaration order.
    pub const ALL: [Device; 8] = [
        Device::Cpu,
        Device::Gpu,
        Device::Ipu,
        Device::Rknpu,
        Device::Timvx,
        Device::Kunlunxin,
        Device::Ascend,
        Device::SophgoTpu,
    ];

    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Device::Cpu => "cpu",
            Device::Gpu => "gpu",
            Device::Ipu => "ipu",
            Device::Rknpu => "rknpu",
            Device::Timvx => "timvx",
            Device::Kunlunxin => "kunlunxin",
            Device::Ascend => "ascend",
            Device::SophgoTpu => "sophgo_tpu",
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Device::ALL
            .into_iter()
            .find(|d| d.as_str() == lower || (lower == "sophgotpu" && *d == Device::SophgoTpu))
            .ok_or_else(|| format!("unknown device '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for d in Device::ALL {
            assert_eq!(d.as_str().parse::<Device>().unwrap(), d);
        }
        assert_eq!("GPU".parse::<Device>().unwrap(), Device::Gpu);
        assert_eq!("sophgotpu".parse::<Device>().unwrap(), Device::SophgoTpu);
    }

    #[test]
    fn test_parse_unknown() {
        assert!("tpu9000".parse::<Device>().is_err());
    }

    #[test]
    fn test_default_is_cpu() {
        assert_eq!(Device::default(), Device::Cpu);
    }
}
