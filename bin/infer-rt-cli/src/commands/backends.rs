// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `infer-rt backends` command: engine requirements and capability tables.

use super::{banner, join, print_json};
use model_loader::ModelFormat;
use runtime::{Backend, CapabilityRegistry};
use tensor_core::Device;

#[derive(serde::Serialize)]
struct BackendRow {
    backend: Backend,
    compiler: bool,
    devices: &'static [Device],
    formats: &'static [ModelFormat],
    accepts_memory_model: bool,
}

#[derive(serde::Serialize)]
struct TableRow {
    key: String,
    backends: &'static [Backend],
}

#[derive(serde::Serialize)]
struct Report {
    backends: Vec<BackendRow>,
    by_format: Vec<TableRow>,
    by_device: Vec<TableRow>,
}

fn report(registry: &CapabilityRegistry) -> Report {
    let backends = Backend::ALL
        .into_iter()
        .map(|backend| {
            let req = backend.requirements();
            BackendRow {
                backend,
                compiler: req.compiler,
                devices: req.devices,
                formats: req.formats,
                accepts_memory_model: req.accepts_memory_model,
            }
        })
        .collect();
    let by_format = registry
        .formats()
        .map(|(f, backends)| TableRow {
            key: f.to_string(),
            backends,
        })
        .collect();
    let by_device = registry
        .devices()
        .map(|(d, backends)| TableRow {
            key: d.to_string(),
            backends,
        })
        .collect();
    Report {
        backends,
        by_format,
        by_device,
    }
}

pub fn execute(json: bool) -> anyhow::Result<()> {
    let report = report(&CapabilityRegistry::DEFAULT);
    if json {
        return print_json(&report);
    }

    banner("Backends");

    // ── Engine requirements ────────────────────────────────────
    println!(
        "  {:<18} {:<30} {:<20} {:>6} {:>8}",
        "Backend", "Devices", "Formats", "Memory", "Mode",
    );
    println!("  {}", "-".repeat(86));
    for row in &report.backends {
        println!(
            "  {:<18} {:<30} {:<20} {:>6} {:>8}",
            row.backend.as_str(),
            join(row.devices, ","),
            join(row.formats, ","),
            if row.accepts_memory_model { "yes" } else { "no" },
            if row.compiler { "compile" } else { "init" },
        );
    }
    println!();

    // ── Selection preference ───────────────────────────────────
    println!("  Preference by model format:");
    for row in &report.by_format {
        println!("   {:<12} {}", row.key, join(row.backends, " > "));
    }
    println!();
    println!("  Preference by device:");
    for row in &report.by_device {
        println!("   {:<12} {}", row.key, join(row.backends, " > "));
    }
    println!();
    Ok(())
}
