//! File loading and JSON output shared by the commands.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use concord_core::{EngagementPlanDraft, ProtocolDocument};

/// Read and parse a protocol document.
pub fn load_protocol(path: &Path) -> Result<ProtocolDocument> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read protocol {}", path.display()))?;
    ProtocolDocument::from_json_str(&contents)
        .with_context(|| format!("failed to parse protocol {}", path.display()))
}

/// Read a plan draft.
///
/// Plan files come from a text generator, so anything that is not plain JSON
/// goes through [`EngagementPlanDraft::from_generated_text`]. Only a file that
/// cannot be read is an error.
pub fn load_plan(path: &Path) -> Result<EngagementPlanDraft> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read plan {}", path.display()))?;
    Ok(parse_plan(&contents))
}

pub fn parse_plan(contents: &str) -> EngagementPlanDraft {
    match serde_json::from_str::<serde_json::Value>(contents) {
        Ok(value) => EngagementPlanDraft::from(value),
        Err(e) => {
            tracing::debug!(error = %e, "plan is not plain JSON; reading as generated text");
            EngagementPlanDraft::from_generated_text(contents)
        }
    }
}

/// Pretty-print `value` as JSON to `output`, or to stdout when `None`.
pub fn write_json<T: Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    match output {
        Some(path) => std::fs::write(path, format!("{rendered}\n"))
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{rendered}");
            Ok(())
        }
    }
}
