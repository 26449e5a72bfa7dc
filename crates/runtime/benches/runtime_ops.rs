// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Benchmarks for engine selection and tensor binding.
//!
//! ```bash
//! cargo bench -p runtime
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use model_loader::ModelFormat;
use runtime::{
    selector, Backend, BackendError, CapabilityRegistry, EngineAdapter, EngineCatalog,
    EngineContext, Runtime, RuntimeOption,
};
use std::sync::Arc;
use tensor_core::{DType, Device, ExternalBuffer, Shape, Tensor, TensorInfo};

/// An engine that accepts everything and computes nothing.
struct Passthrough(Backend);

impl EngineAdapter for Passthrough {
    fn backend(&self) -> Backend {
        self.0
    }
    fn initialize(&mut self, _ctx: &EngineContext<'_>) -> Result<(), BackendError> {
        Ok(())
    }
    fn infer(
        &mut self,
        _inputs: &[Tensor],
        _outputs: &mut Vec<Tensor>,
        _use_bound_tensors: bool,
    ) -> Result<(), BackendError> {
        Ok(())
    }
    fn input_infos(&self) -> Vec<TensorInfo> {
        Vec::new()
    }
    fn output_infos(&self) -> Vec<TensorInfo> {
        Vec::new()
    }
}

fn passthrough_catalog() -> Arc<EngineCatalog> {
    let mut catalog = EngineCatalog::new();
    for backend in Backend::ALL {
        catalog.register(backend, move || Box::new(Passthrough(backend)));
    }
    Arc::new(catalog)
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");
    let registry = CapabilityRegistry::DEFAULT;
    let cases = [
        (ModelFormat::Paddle, Device::Cpu),
        (ModelFormat::Onnx, Device::Gpu),
        (ModelFormat::Rknn, Device::Rknpu),
    ];
    for (format, device) in cases {
        group.bench_with_input(
            BenchmarkId::new(format.as_str(), device.as_str()),
            &(format, device),
            |b, &(format, device)| {
                b.iter(|| {
                    selector::select_backend(&registry, black_box(format), black_box(device), |backend| {
                        backend != Backend::PaddleInference
                    })
                })
            },
        );
    }
    group.finish();
}

fn bench_init(c: &mut Criterion) {
    let catalog = passthrough_catalog();
    let mut option = RuntimeOption::default();
    option.set_model_path("model.onnx", None, ModelFormat::Onnx);

    c.bench_function("init/auto_select", |b| {
        b.iter(|| {
            let mut rt = Runtime::new(Arc::clone(&catalog));
            rt.init(option.clone()).map(|_| rt.backend())
        })
    });
}

fn bench_bind(c: &mut Criterion) {
    let mut group = c.benchmark_group("bind");
    let shape = Shape::new(vec![1, 3, 640, 640]);
    let mut rt = Runtime::new(passthrough_catalog());

    group.bench_function("owned_rebind", |b| {
        b.iter(|| {
            let t = Tensor::zeros("image", shape.clone(), DType::F32);
            rt.bind_input_tensor("image", black_box(t));
        })
    });

    let mut data = vec![0u8; shape.size_bytes(DType::F32)];
    group.bench_function("external_rebind", |b| {
        b.iter(|| {
            // SAFETY: `data` outlives every bound tensor in this benchmark.
            let buffer = unsafe { ExternalBuffer::from_slice(&mut data) };
            let t = Tensor::from_external("image", shape.clone(), DType::F32, buffer, Device::Cpu, None);
            if let Ok(t) = t {
                rt.bind_input_tensor("image", black_box(t));
            }
        })
    });
    group.finish();
}

criterion_group!(benches, bench_select, bench_init, bench_bind);
criterion_main!(benches);
