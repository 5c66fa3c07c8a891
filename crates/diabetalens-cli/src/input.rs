//! Step history arguments

use anyhow::{bail, Context, Result};
use clap::Args;
use std::path::PathBuf;

/// Daily step counts, inline or from a file
#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct StepsArgs {
    /// Comma-separated daily step counts, oldest first
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    steps: Vec<u32>,

    /// File holding a JSON array or comma/whitespace separated counts
    #[arg(long, value_name = "FILE")]
    steps_file: Option<PathBuf>,
}

impl StepsArgs {
    pub fn read(&self) -> Result<Vec<u32>> {
        match &self.steps_file {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                parse_steps(&content).with_context(|| format!("Invalid steps in {}", path.display()))
            }
            None => Ok(self.steps.clone()),
        }
    }
}

pub fn parse_steps(content: &str) -> Result<Vec<u32>> {
    let trimmed = content.trim();
    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let steps = trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u32>()
                .with_context(|| format!("'{}' is not a step count", token))
        })
        .collect::<Result<Vec<_>>>()?;

    if steps.is_empty() {
        bail!("no step counts found");
    }
    Ok(steps)
}
