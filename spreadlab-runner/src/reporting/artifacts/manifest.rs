//! Run manifest export (JSON): the full `BacktestResult`.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::runner::{BacktestResult, SCHEMA_VERSION};

pub fn write_manifest(path: &Path, result: &BacktestResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize run manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}

/// Read a manifest back, rejecting schema versions newer than this build.
pub fn read_manifest(path: &Path) -> Result<BacktestResult> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let result: BacktestResult =
        serde_json::from_str(&json).context("Failed to deserialize run manifest")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}
