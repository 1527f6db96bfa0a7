//! Command implementations for Helix CLI

pub mod genomes;
pub mod chromosomes;
pub mod search;
pub mod view;
pub mod sequence;
pub mod config;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

/// How results are written to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

impl OutputOptions {
    /// Spinner on stderr while a remote call runs; hidden in quiet or JSON mode.
    pub fn spinner(&self, message: impl Into<String>) -> ProgressBar {
        if self.quiet || self.json {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.into());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
        println!("{}", text);
        Ok(())
    }
}

/// Break a sequence into fixed-width lines prefixed with their coordinate.
pub fn format_sequence(sequence: &str, first_position: i64, width: usize) -> String {
    let width = width.max(1);
    let bytes = sequence.as_bytes();
    let pad = (first_position + sequence.len() as i64).to_string().len();
    bytes
        .chunks(width)
        .enumerate()
        .map(|(i, chunk)| {
            let position = first_position + (i * width) as i64;
            format!("{:>pad$}  {}", position, String::from_utf8_lossy(chunk), pad = pad)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
