// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # infer-rt
//!
//! Command-line interface for the infer-rt runtime.
//!
//! ## Usage
//! ```bash
//! # List engines, their requirements and the default capability tables
//! infer-rt backends
//!
//! # Show which engine would run an ONNX model on GPU if only ORT and TensorRT are built
//! infer-rt select --format onnx --device gpu --available ort,tensorrt
//!
//! # Dry-run a configuration file up to (not including) engine init
//! infer-rt -c runtime.toml check
//!
//! # Encrypt a model for use with `encryption_key`
//! infer-rt encrypt --input model.onnx --output model.onnx.enc --key s3cret
//! ```

mod commands;

use clap::{Parser, Subcommand};
use model_loader::ModelFormat;
use runtime::Backend;
use std::path::PathBuf;
use tensor_core::Device;

#[derive(Parser)]
#[command(
    name = "infer-rt",
    about = "Backend-agnostic inference runtime: engine selection and model tooling",
    version,
    author
)]
struct Cli {
    /// Path to a TOML runtime configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print machine-readable JSON instead of tables.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every engine with its requirements and the default capability tables.
    Backends,

    /// Run automatic engine selection for a format/device pair.
    Select {
        /// Model format: paddle, onnx, torchscript, rknn, sophgo.
        #[arg(short, long)]
        format: ModelFormat,

        /// Target device: cpu, gpu, ipu, rknpu, timvx, kunlunxin, ascend, sophgo_tpu.
        #[arg(short, long, default_value = "cpu")]
        device: Device,

        /// Engines to treat as compiled in (comma-separated; default: all).
        #[arg(long, value_delimiter = ',')]
        available: Vec<Backend>,
    },

    /// Validate a configuration and resolve its engine without initializing it.
    Check {
        /// Model path (overrides the config file).
        #[arg(short, long)]
        model: Option<PathBuf>,

        /// Params path (overrides the config file).
        #[arg(short, long)]
        params: Option<PathBuf>,

        /// Model format (overrides the config file).
        #[arg(short, long)]
        format: Option<ModelFormat>,

        /// Target device (overrides the config file).
        #[arg(short, long)]
        device: Option<Device>,

        /// Device id (overrides the config file).
        #[arg(long)]
        device_id: Option<u32>,

        /// Explicit engine (overrides the config file).
        #[arg(short, long)]
        backend: Option<Backend>,

        /// Engines to treat as compiled in (comma-separated; default: all).
        #[arg(long, value_delimiter = ',')]
        available: Vec<Backend>,
    },

    /// Encrypt a model or params file for use with `encryption_key`.
    Encrypt {
        /// Plaintext artifact.
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the encrypted envelope.
        #[arg(short, long)]
        output: PathBuf,

        /// Encryption key.
        #[arg(short, long, env = "INFER_RT_KEY")]
        key: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging based on verbosity.
    commands::init_tracing(cli.verbose);

    match cli.command {
        Commands::Backends => commands::backends::execute(cli.json),
        Commands::Select {
            format,
            device,
            available,
        } => commands::select::execute(format, device, available, cli.json),
        Commands::Check {
            model,
            params,
            format,
            device,
            device_id,
            backend,
            available,
        } => {
            let overrides = commands::check::Overrides {
                model,
                params,
                format,
                device,
                device_id,
                backend,
            };
            commands::check::execute(cli.config, overrides, available, cli.json)
        }
        Commands::Encrypt { input, output, key } => {
            commands::encrypt::execute(&input, &output, &key, cli.json)
        }
    }
}
