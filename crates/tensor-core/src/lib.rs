// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # tensor-core
//!
//! Tensor descriptors exchanged between callers, the runtime and engine
//! adapters.
//!
//! This crate provides:
//! - [`Tensor`]: a named buffer with shape, element type and device
//!   placement, backed either by owned memory or by a caller-owned
//!   [`ExternalBuffer`] (zero-copy binding).
//! - [`Shape`]: concrete dimensions.
//! - [`TensorInfo`]: engine-reported descriptors that may hold dynamic dims.
//! - [`DType`] and [`Device`]: element types and execution targets.
//!
//! # Ownership Model
//! ```text
//! TensorStorage::Owned(Vec<u8>)       freed when the tensor drops
//! TensorStorage::External(ptr, len)   never freed by this crate
//! ```
//! No math lives here; engines do the computing.

mod device;
mod dtype;
mod error;
mod info;
mod shape;
mod tensor;

pub use device::Device;
pub use dtype::DType;
pub use error::TensorError;
pub use info::TensorInfo;
pub use shape::Shape;
pub use tensor::{ExternalBuffer, Tensor, TensorStorage};
