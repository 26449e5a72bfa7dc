// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model serialization formats.

use std::fmt;
use std::str::FromStr;

/// The serialization scheme of a model artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelFormat {
    /// Paddle inference model (`.pdmodel` + `.pdiparams`).
    #[default]
    Paddle,
    /// ONNX interchange format.
    Onnx,
    /// TorchScript module, compiled ahead of time before use.
    #[serde(rename = "torchscript")]
    TorchScript,
    /// Rockchip RKNN compiled model.
    Rknn,
    /// Sophgo bmodel.
    Sophgo,
}

impl ModelFormat {
    /// Every format, in declaration order.
    pub const ALL: [ModelFormat; 5] = [
        ModelFormat::Paddle,
        ModelFormat::Onnx,
        ModelFormat::TorchScript,
        ModelFormat::Rknn,
        ModelFormat::Sophgo,
    ];

    /// Returns the canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            ModelFormat::Paddle => "paddle",
            ModelFormat::Onnx => "onnx",
            ModelFormat::TorchScript => "torchscript",
            ModelFormat::Rknn => "rknn",
            ModelFormat::Sophgo => "sophgo",
        }
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        ModelFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == lower)
            .ok_or_else(|| format!("unknown model format '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("ONNX".parse::<ModelFormat>().unwrap(), ModelFormat::Onnx);
        assert_eq!(
            "torchscript".parse::<ModelFormat>().unwrap(),
            ModelFormat::TorchScript
        );
        assert!("tflite".parse::<ModelFormat>().is_err());
    }

    #[test]
    fn test_display_matches_parse() {
        for f in ModelFormat::ALL {
            assert_eq!(f.to_string().parse::<ModelFormat>().unwrap(), f);
        }
    }
}
