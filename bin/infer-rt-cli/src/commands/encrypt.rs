// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `infer-rt encrypt` command: wrap a model artifact in the envelope read by
//! the runtime's decryption pass.

use super::print_json;
use anyhow::Context;
use model_loader::ModelLoader;
use std::path::Path;

#[derive(serde::Serialize)]
struct Summary<'a> {
    input: &'a Path,
    output: &'a Path,
    plain_bytes: usize,
    encrypted_bytes: usize,
}

pub fn execute(input: &Path, output: &Path, key: &str, json: bool) -> anyhow::Result<()> {
    let plain = ModelLoader::read_binary(input)?;
    let cipher = model_loader::encrypt(&plain, key)?;
    std::fs::write(output, &cipher)
        .with_context(|| format!("cannot write '{}'", output.display()))?;
    tracing::info!("encrypted '{}' -> '{}'", input.display(), output.display());

    let summary = Summary {
        input,
        output,
        plain_bytes: plain.len(),
        encrypted_bytes: cipher.len(),
    };
    if json {
        return print_json(&summary);
    }
    println!(
        "  Encrypted {} ({} bytes) -> {} ({} bytes)",
        input.display(),
        summary.plain_bytes,
        output.display(),
        summary.encrypted_bytes,
    );
    Ok(())
}
