// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Named tensors with owned or externally bound storage.

use crate::{DType, Device, Shape, TensorError, TensorInfo};
use std::ptr::NonNull;

/// A caller-owned buffer referenced by a tensor without taking ownership.
///
/// The runtime never frees an `ExternalBuffer`; dropping a tensor that holds
/// one leaves the memory untouched. The buffer may live on any device, so
/// host access is only granted for [`Device::Cpu`] tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalBuffer {
    ptr: NonNull<u8>,
    len: usize,
}

impl ExternalBuffer {
    /// Wraps a raw buffer. Returns `None` if `ptr` is null.
    ///
    /// # Safety
    /// `ptr` must be valid for reads and writes of `len` bytes on its device
    /// for as long as any tensor holding this buffer is handed to an engine.
    /// The caller keeps ownership and is responsible for freeing it after
    /// the last inference call that uses it returns. `ExternalBuffer` is
    /// `Copy` and tensors holding it clone shallowly, so every copy aliases
    /// the same memory; see [`Tensor::external_bytes_mut`] for writes.
    pub unsafe fn from_raw_parts(ptr: *mut u8, len: usize) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr, len })
    }

    /// Wraps a host slice.
    ///
    /// # Safety
    /// The slice must outlive every inference call the resulting tensor is
    /// passed to; the borrow checker cannot track this once the borrow is
    /// erased. The slice must not be written through its original borrow
    /// while a tensor built from this buffer is read or written.
    pub unsafe fn from_slice(data: &mut [u8]) -> Self {
        Self {
            // SAFETY: slice pointers are never null.
            ptr: NonNull::new_unchecked(data.as_mut_ptr()),
            len: data.len(),
        }
    }

    /// Returns the raw data pointer.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    /// Returns the buffer length in bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// The pointer is only dereferenced under the `from_raw_parts` contract,
// which already requires validity across the calls the tensor is used in.
unsafe impl Send for ExternalBuffer {}
unsafe impl Sync for ExternalBuffer {}

/// Where a tensor's bytes live and who releases them.
#[derive(Debug, Clone)]
pub enum TensorStorage {
    /// The tensor owns its buffer and frees it on drop.
    Owned(Vec<u8>),
    /// The tensor references caller memory and never frees it.
    External(ExternalBuffer),
}

/// A named, typed, shaped buffer with an explicit device placement.
///
/// Tensors are addressed by name in the runtime's input and output tables.
/// `device_id == None` means "inherit the runtime's device id".
///
/// # Memory Layout
/// Data is row-major (C order). Typed host access is provided via
/// [`to_f32_vec`](Tensor::to_f32_vec).
#[derive(Debug, Clone)]
pub struct Tensor {
    name: String,
    shape: Shape,
    dtype: DType,
    device: Device,
    device_id: Option<u32>,
    storage: TensorStorage,
}

impl Tensor {
    /// Creates an empty host tensor with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shape: Shape::vector(0),
            dtype: DType::F32,
            device: Device::Cpu,
            device_id: None,
            storage: TensorStorage::Owned(Vec::new()),
        }
    }

    /// Creates a host tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{DType, Shape, Tensor};
    /// let t = Tensor::zeros("x", Shape::matrix(2, 3), DType::F32);
    /// assert_eq!(t.size_bytes(), 24);
    /// assert!(!t.is_external());
    /// ```
    pub fn zeros(name: impl Into<String>, shape: Shape, dtype: DType) -> Self {
        let size = shape.size_bytes(dtype);
        Self {
            name: name.into(),
            shape,
            dtype,
            device: Device::Cpu,
            device_id: None,
            storage: TensorStorage::Owned(vec![0u8; size]),
        }
    }

    /// Creates an owned host tensor from raw bytes.
    ///
    /// Returns an error if the buffer size does not match `shape.size_bytes(dtype)`.
    pub fn from_bytes(
        name: impl Into<String>,
        shape: Shape,
        dtype: DType,
        data: Vec<u8>,
    ) -> Result<Self, TensorError> {
        let expected = shape.size_bytes(dtype);
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            shape,
            dtype,
            device: Device::Cpu,
            device_id: None,
            storage: TensorStorage::Owned(data),
        })
    }

    /// Creates an owned host tensor from `f32` values.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Shape, Tensor};
    /// let t = Tensor::from_f32("x", Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.to_f32_vec().unwrap(), vec![1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(
        name: impl Into<String>,
        shape: Shape,
        values: &[f32],
    ) -> Result<Self, TensorError> {
        let expected_elements = shape.num_elements();
        if values.len() != expected_elements {
            return Err(TensorError::BufferSizeMismatch {
                expected: expected_elements * DType::F32.size_bytes(),
                actual: values.len() * DType::F32.size_bytes(),
            });
        }
        let data = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::from_bytes(name, shape, DType::F32, data)
    }

    /// Creates a tensor that references caller memory (zero-copy).
    ///
    /// The buffer must be at least `shape.size_bytes(dtype)` bytes long.
    pub fn from_external(
        name: impl Into<String>,
        shape: Shape,
        dtype: DType,
        buffer: ExternalBuffer,
        device: Device,
        device_id: Option<u32>,
    ) -> Result<Self, TensorError> {
        let mut t = Self::new(name);
        t.set_external_data(shape, dtype, buffer, device, device_id)?;
        Ok(t)
    }

    /// Points this tensor at caller memory, replacing its descriptor.
    ///
    /// Any previously owned buffer is freed; a previously referenced
    /// external buffer is left alone.
    pub fn set_external_data(
        &mut self,
        shape: Shape,
        dtype: DType,
        buffer: ExternalBuffer,
        device: Device,
        device_id: Option<u32>,
    ) -> Result<(), TensorError> {
        let expected = shape.size_bytes(dtype);
        if buffer.len() < expected {
            return Err(TensorError::BufferSizeMismatch {
                expected,
                actual: buffer.len(),
            });
        }
        self.shape = shape;
        self.dtype = dtype;
        self.device = device;
        self.device_id = device_id;
        self.storage = TensorStorage::External(buffer);
        Ok(())
    }

    /// Sets the device placement, consuming and returning the tensor.
    pub fn with_device(mut self, device: Device, device_id: Option<u32>) -> Self {
        self.device = device;
        self.device_id = device_id;
        self
    }

    /// Takes over `other`'s descriptor and storage while keeping this
    /// tensor's name. Owned storage is moved, not copied.
    pub fn rebind(&mut self, other: Tensor) {
        self.shape = other.shape;
        self.dtype = other.dtype;
        self.device = other.device;
        self.device_id = other.device_id;
        self.storage = other.storage;
    }

    /// Returns the tensor's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the tensor.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's data type.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Returns the device class holding the data.
    pub fn device(&self) -> Device {
        self.device
    }

    /// Returns the device id, or `None` when it inherits the runtime's.
    pub fn device_id(&self) -> Option<u32> {
        self.device_id
    }

    /// Overrides the device id.
    pub fn set_device_id(&mut self, device_id: Option<u32>) {
        self.device_id = device_id;
    }

    /// Returns the storage mode and buffer.
    pub fn storage(&self) -> &TensorStorage {
        &self.storage
    }

    /// Returns `true` if the data is caller-owned.
    pub fn is_external(&self) -> bool {
        matches!(self.storage, TensorStorage::External(_))
    }

    /// Returns the raw data pointer, for engines that consume native handles.
    pub fn data_ptr(&self) -> *const u8 {
        match &self.storage {
            TensorStorage::Owned(v) => v.as_ptr(),
            TensorStorage::External(b) => b.as_ptr(),
        }
    }

    /// Returns the length of the backing buffer in bytes.
    pub fn size_bytes(&self) -> usize {
        match &self.storage {
            TensorStorage::Owned(v) => v.len(),
            TensorStorage::External(b) => b.len(),
        }
    }

    /// Returns the bytes backing this tensor if they are host-accessible.
    pub fn as_bytes(&self) -> Result<&[u8], TensorError> {
        match &self.storage {
            TensorStorage::Owned(v) => Ok(v),
            TensorStorage::External(b) => {
                self.ensure_host("as_bytes")?;
                // SAFETY: `ExternalBuffer::from_raw_parts` requires the buffer to
                // be valid for `len` bytes while the tensor is in use, and we
                // checked it lives in host memory.
                Ok(unsafe { std::slice::from_raw_parts(b.as_ptr(), b.len()) })
            }
        }
    }

    /// Returns the owned bytes backing this tensor mutably.
    ///
    /// Tensors bound to an [`ExternalBuffer`] are rejected: clones of such a
    /// tensor reference the same caller memory. Use
    /// [`external_bytes_mut`](Tensor::external_bytes_mut) for those.
    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8], TensorError> {
        match &mut self.storage {
            TensorStorage::Owned(v) => Ok(v),
            TensorStorage::External(_) => Err(TensorError::ExternalStorage {
                op: "as_bytes_mut",
                name: self.name.clone(),
            }),
        }
    }

    /// Returns the bytes backing this tensor mutably, including caller memory.
    ///
    /// # Safety
    /// For external storage, no other reference into the same buffer may be
    /// live while the returned slice is: not from a clone of this tensor, not
    /// from another tensor bound to the same [`ExternalBuffer`], and not from
    /// the caller's own handle to the memory.
    pub unsafe fn external_bytes_mut(&mut self) -> Result<&mut [u8], TensorError> {
        if let TensorStorage::External(_) = self.storage {
            self.ensure_host("external_bytes_mut")?;
        }
        match &mut self.storage {
            TensorStorage::Owned(v) => Ok(v),
            // SAFETY: validity comes from the `ExternalBuffer` contract and
            // exclusivity from this function's contract.
            TensorStorage::External(b) => Ok(std::slice::from_raw_parts_mut(b.as_ptr(), b.len())),
        }
    }

    /// Copies the data out as `f32` values.
    pub fn to_f32_vec(&self) -> Result<Vec<f32>, TensorError> {
        if self.dtype != DType::F32 {
            return Err(TensorError::UnsupportedDType {
                op: "to_f32_vec",
                dtype: self.dtype,
            });
        }
        let n = self.shape.num_elements();
        let bytes = self.as_bytes()?;
        Ok(bytes
            .chunks_exact(4)
            .take(n)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    /// Returns the shape/type descriptor for this tensor.
    pub fn info(&self) -> TensorInfo {
        TensorInfo::from_tensor(self)
    }

    fn ensure_host(&self, op: &'static str) -> Result<(), TensorError> {
        if self.device == Device::Cpu {
            Ok(())
        } else {
            Err(TensorError::NotHostAccessible {
                op,
                name: self.name.clone(),
                device: self.device,
            })
        }
    }
}
