// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! A scriptable engine adapter shared by the integration tests.
//!
//! The mock "loads" the model by copying its bytes into [`SharedWeights`]
//! and "infers" by doubling every f32 input into an output named
//! `<input>_out`. A [`Recorder`] records what the runtime asked it to do.

#![allow(dead_code)]

use runtime::{
    Backend, BackendError, EngineAdapter, EngineCatalog, EngineContext, SharedWeights,
    StreamHandle, WeakWeights,
};
use std::sync::{Arc, Mutex, MutexGuard};
use tensor_core::{DType, Tensor, TensorInfo};

/// What a mock engine should do when driven.
#[derive(Debug, Clone, Copy, Default)]
pub struct Behavior {
    pub shareable: bool,
    pub fail_init: bool,
    pub fail_infer: bool,
    pub needs_model_buffer: bool,
}

/// Observations recorded by every adapter built from one catalog.
#[derive(Debug, Default)]
pub struct RecorderState {
    pub created: usize,
    pub initialized: usize,
    pub compiled: usize,
    pub prewarm_sets: usize,
    pub infer_calls: usize,
    pub last_use_bound: Option<bool>,
    pub last_model: Option<Vec<u8>>,
    pub last_device_id: Option<u32>,
    pub last_stream: Option<StreamHandle>,
    pub weights: Vec<WeakWeights>,
}

#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<RecorderState>>);

impl Recorder {
    pub fn get(&self) -> MutexGuard<'_, RecorderState> {
        self.0.lock().unwrap()
    }
}

pub struct MockAdapter {
    backend: Backend,
    behavior: Behavior,
    recorder: Recorder,
    weights: Option<SharedWeights>,
}

impl MockAdapter {
    fn load(&mut self, ctx: &EngineContext<'_>) -> Result<(), BackendError> {
        let model = ctx.model_bytes()?.into_owned();
        let weights = SharedWeights::new(self.backend.as_str(), model.clone());
        let mut p = self.recorder.get();
        p.last_model = Some(model);
        p.last_device_id = Some(ctx.device_id());
        p.last_stream = ctx.stream();
        p.weights.push(weights.downgrade());
        drop(p);
        self.weights = Some(weights);
        Ok(())
    }
}

impl EngineAdapter for MockAdapter {
    fn backend(&self) -> Backend {
        self.backend
    }

    fn initialize(&mut self, ctx: &EngineContext<'_>) -> Result<(), BackendError> {
        self.recorder.get().initialized += 1;
        if self.behavior.fail_init {
            return Err(BackendError::Init("mock refused the model".into()));
        }
        self.load(ctx)
    }

    fn infer(
        &mut self,
        inputs: &[Tensor],
        outputs: &mut Vec<Tensor>,
        use_bound_tensors: bool,
    ) -> Result<(), BackendError> {
        {
            let mut p = self.recorder.get();
            p.infer_calls += 1;
            p.last_use_bound = Some(use_bound_tensors);
        }

        let mut produced = Vec::with_capacity(inputs.len());
        for input in inputs {
            let name = format!("{}_out", input.name());
            let out = if input.dtype() == DType::F32 {
                let doubled: Vec<f32> = input.to_f32_vec()?.iter().map(|v| v * 2.0).collect();
                Tensor::from_f32(name, input.shape().clone(), &doubled)?
            } else {
                Tensor::zeros(name, input.shape().clone(), input.dtype())
            };
            produced.push(out);
        }

        if self.behavior.fail_infer {
            // A partial result is left behind before the failure surfaces.
            outputs.clear();
            outputs.extend(produced.into_iter().take(1));
            return Err(BackendError::Inference("mock kernel fault".into()));
        }
        *outputs = produced;
        Ok(())
    }

    fn input_infos(&self) -> Vec<TensorInfo> {
        vec![TensorInfo::new("x", vec![-1, 3, 224, 224], DType::F32)]
    }

    fn output_infos(&self) -> Vec<TensorInfo> {
        vec![TensorInfo::new("x_out", vec![-1, 3, 224, 224], DType::F32)]
    }

    fn supports_shared_clone(&self) -> bool {
        self.behavior.shareable
    }

    fn shared_clone(
        &self,
        _ctx: &EngineContext<'_>,
        stream: Option<StreamHandle>,
        device_id: u32,
    ) -> Result<Box<dyn EngineAdapter>, BackendError> {
        let mut p = self.recorder.get();
        p.created += 1;
        p.last_device_id = Some(device_id);
        p.last_stream = stream;
        drop(p);
        Ok(Box::new(MockAdapter {
            backend: self.backend,
            behavior: self.behavior,
            recorder: self.recorder.clone(),
            weights: self.weights.clone(),
        }))
    }

    fn compile(
        &mut self,
        prewarm: &[Vec<Tensor>],
        ctx: &EngineContext<'_>,
    ) -> Result<(), BackendError> {
        if !self.backend.is_compiler() {
            return Err(BackendError::CompileUnsupported(self.backend));
        }
        {
            let mut p = self.recorder.get();
            p.compiled += 1;
            p.prewarm_sets = prewarm.len();
        }
        self.load(ctx)
    }

    fn needs_model_buffer(&self) -> bool {
        self.behavior.needs_model_buffer
    }
}

/// A catalog with a mock registered for each of `backends`.
pub fn catalog(backends: &[Backend], behavior: Behavior, recorder: &Recorder) -> Arc<EngineCatalog> {
    let mut catalog = EngineCatalog::new();
    for &backend in backends {
        let recorder = recorder.clone();
        catalog.register(backend, move || {
            recorder.get().created += 1;
            Box::new(MockAdapter {
                backend,
                behavior,
                recorder: recorder.clone(),
                weights: None,
            })
        });
    }
    Arc::new(catalog)
}

/// A catalog with every backend compiled in.
pub fn full_catalog(behavior: Behavior, recorder: &Recorder) -> Arc<EngineCatalog> {
    catalog(&Backend::ALL, behavior, recorder)
}
