// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `infer-rt check` command: dry-run a configuration.
//!
//! Runs every step of runtime initialization that does not need an engine:
//! validation, decryption (when a key is set), engine selection and the
//! chosen engine's preconditions. Nothing is loaded into an engine.

use super::{availability, banner, print_json};
use anyhow::Context;
use model_loader::{decrypt_source, ModelFormat};
use runtime::{selector, Backend, CapabilityRegistry, RuntimeError, RuntimeOption};
use std::path::PathBuf;
use tensor_core::Device;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub model: Option<PathBuf>,
    pub params: Option<PathBuf>,
    pub format: Option<ModelFormat>,
    pub device: Option<Device>,
    pub device_id: Option<u32>,
    pub backend: Option<Backend>,
}

impl Overrides {
    fn apply(self, option: &mut RuntimeOption) {
        if let Some(model) = self.model {
            option.model = model.into();
        }
        if let Some(params) = self.params {
            option.params = Some(params.into());
        }
        if let Some(format) = self.format {
            option.format = format;
        }
        if let Some(device) = self.device {
            option.device = device;
        }
        if let Some(id) = self.device_id {
            option.device_id = id;
        }
        if self.backend.is_some() {
            option.backend = self.backend;
        }
    }
}

#[derive(Debug, serde::Serialize)]
struct Report {
    format: ModelFormat,
    device: Device,
    device_id: u32,
    backend: Backend,
    auto_selected: bool,
    /// `"init"` or `"compile"`.
    mode: &'static str,
    encrypted: bool,
    backend_option: String,
}

fn check(option: RuntimeOption, available: &[Backend]) -> anyhow::Result<Report> {
    option.validate()?;

    let encrypted = option.encryption_key.is_some();
    if let Some(key) = &option.encryption_key {
        decrypt_source(&option.model, key).context("model does not decrypt with the configured key")?;
        if let Some(params) = &option.params {
            decrypt_source(params, key)
                .context("params do not decrypt with the configured key")?;
        }
    } else if let Some(path) = option.model.path() {
        anyhow::ensure!(path.exists(), "model file '{}' does not exist", path.display());
    }

    let (backend, auto_selected) = match option.backend {
        Some(b) if !availability(available)(b) => {
            return Err(RuntimeError::EngineNotCompiled { candidates: vec![b] }.into());
        }
        Some(b) => (b, false),
        None => {
            let b = selector::select_backend(
                &CapabilityRegistry::DEFAULT,
                option.format,
                option.device,
                availability(available),
            )?;
            (b, true)
        }
    };
    // Decryption hands the engine an in-memory model.
    backend.check_preconditions(
        option.format,
        option.device,
        encrypted || option.model_from_memory(),
    )?;

    Ok(Report {
        format: option.format,
        device: option.device,
        device_id: option.device_id,
        backend,
        auto_selected,
        mode: if backend.is_compiler() { "compile" } else { "init" },
        encrypted,
        backend_option: format!("{:?}", option.resolve_backend_option(backend)),
    })
}

pub fn execute(
    config: Option<PathBuf>,
    overrides: Overrides,
    available: Vec<Backend>,
    json: bool,
) -> anyhow::Result<()> {
    let mut option = match &config {
        Some(path) => RuntimeOption::from_file(path)?,
        None => RuntimeOption::default(),
    };
    overrides.apply(&mut option);

    let report = check(option, &available)?;
    if json {
        return print_json(&report);
    }

    banner("Configuration Check");
    if let Some(path) = &config {
        println!("  Config:    {}", path.display());
    }
    println!("  Model:     {} on {}:{}", report.format, report.device, report.device_id);
    println!(
        "  Backend:   {}{}",
        report.backend,
        if report.auto_selected { " (auto-selected)" } else { "" }
    );
    println!("  Mode:      {}()", report.mode);
    println!("  Encrypted: {}", if report.encrypted { "yes (key verified)" } else { "no" });
    println!("  Options:   {}", report.backend_option);
    println!();
    println!("  OK: configuration is ready for {}.", report.mode);
    Ok(())
}
