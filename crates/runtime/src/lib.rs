// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # runtime
//!
//! A backend-agnostic inference runtime: one API over many compute engines.
//!
//! The runtime takes:
//! - A [`RuntimeOption`] describing the model (file or memory), its format,
//!   the target device and optionally an explicit [`Backend`].
//! - An [`EngineCatalog`] listing the engines compiled into this build, each
//!   behind the [`EngineAdapter`] trait.
//!
//! And from those it selects an engine via the [`CapabilityRegistry`],
//! checks the engine's own preconditions, initializes it, and then binds
//! tensors and runs inference through it.
//!
//! # Initialization Pipeline
//! ```text
//! Unconfigured → Decrypting → SelectingEngine → InitializingEngine → Ready
//!                          (any failure) → Failed
//! ```
//! State is checked at runtime so a failed runtime can still be inspected.
//!
//! # Threading
//! A runtime is synchronous and mutated through `&mut self`. It is `Send`,
//! so clones made with [`Runtime::clone_runtime`] can move to worker threads.

mod adapter;
mod backend;
mod config;
mod engine;
mod error;
mod metrics;
pub mod options;
mod registry;
pub mod selector;
mod weights;

pub use adapter::{EngineAdapter, EngineCatalog, EngineContext};
pub use backend::{Backend, EngineRequirements};
pub use config::RuntimeOption;
pub use engine::{CloneMode, Runtime, RuntimeState};
pub use error::{BackendError, RuntimeError};
pub use metrics::InferenceMetrics;
pub use options::{BackendOption, StreamHandle};
pub use registry::{CapabilityRegistry, DEFAULT_REGISTRY};
pub use weights::{SharedWeights, WeakWeights};
