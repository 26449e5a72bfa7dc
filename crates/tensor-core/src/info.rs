// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Shape/type descriptors reported by engines.

use crate::{DType, Tensor};
use std::fmt;

/// Describes one model input or output as the engine sees it.
///
/// Unlike [`crate::Shape`], dimensions may be dynamic: a negative value
/// (conventionally `-1`) marks a dimension resolved only at inference time.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TensorInfo {
    /// Tensor name as declared by the model.
    pub name: String,
    /// Dimensions; negative entries are dynamic.
    pub shape: Vec<i64>,
    /// Element type.
    pub dtype: DType,
}

impl TensorInfo {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, shape: Vec<i64>, dtype: DType) -> Self {
        Self {
            name: name.into(),
            shape,
            dtype,
        }
    }

    /// Builds a descriptor from a concrete tensor.
    pub fn from_tensor(tensor: &Tensor) -> Self {
        Self {
            name: tensor.name().to_string(),
            shape: tensor.shape().dims().iter().map(|&d| d as i64).collect(),
            dtype: tensor.dtype(),
        }
    }

    /// Returns `true` if any dimension is dynamic.
    pub fn is_dynamic(&self) -> bool {
        self.shape.iter().any(|&d| d < 0)
    }
}

impl fmt::Display for TensorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: [", self.name)?;
        for (i, d) in self.shape.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{d}")?;
        }
        write!(f, "] {}", self.dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shape;

    #[test]
    fn test_dynamic_dims() {
        let info = TensorInfo::new("image", vec![-1, 3, 640, 640], DType::F32);
        assert!(info.is_dynamic());
        assert_eq!(info.to_string(), "image: [-1, 3, 640, 640] f32");
    }

    #[test]
    fn test_from_tensor() {
        let t = Tensor::zeros("scale_factor", Shape::matrix(1, 2), DType::F32);
        let info = t.info();
        assert_eq!(info.name, "scale_factor");
        assert_eq!(info.shape, vec![1, 2]);
        assert!(!info.is_dynamic());
    }
}
