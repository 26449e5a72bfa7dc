// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod backends;
pub mod check;
pub mod encrypt;
pub mod select;

use runtime::Backend;
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the `-v` count.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A subscriber may already be installed when commands run under tests.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose >= 2)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The engines a command should treat as compiled in.
///
/// An empty list means every engine.
pub(crate) fn availability(available: &[Backend]) -> impl Fn(Backend) -> bool + '_ {
    move |b| available.is_empty() || available.contains(&b)
}

/// Prints `value` as pretty JSON on stdout.
pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints the boxed banner used at the top of every table report.
pub(crate) fn banner(title: &str) {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║ {:^52} ║", format!("infer-rt · {title}"));
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
}

/// Joins displayable items with `sep`.
pub(crate) fn join<T: std::fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_availability_means_all() {
        let all = availability(&[]);
        assert!(Backend::ALL.into_iter().all(|b| all(b)));

        let list = [Backend::Ort];
        let only_ort = availability(&list);
        assert!(only_ort(Backend::Ort));
        assert!(!only_ort(Backend::TensorRt));
    }

    #[test]
    fn test_join() {
        assert_eq!(join(&[Backend::Ort, Backend::Lite], ", "), "ort, lite");
        assert_eq!(join::<Backend>(&[], ", "), "");
    }
}
