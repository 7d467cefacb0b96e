//! Flags shared by project and script commands: `--reset` and `--temp`.

use std::path::PathBuf;

use anyhow::{Context, Result};

use envscope_core::PROJECT_NAME;
use envscope_modules::ProjectOrchestrator;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFlags {
    /// Wipe project storage before activation.
    pub reset: bool,
    /// Use a fresh storage dir under the system temp dir.
    pub temp: bool,
}

/// Fresh, exclusively created directory for a `--temp` session. Kept after
/// exit: the sourced scripts keep pointing into it.
fn temp_storage_dir(project: &str) -> Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix(&format!("{}-{}-", PROJECT_NAME, project))
        .tempdir()
        .context("failed to create temp storage dir")?;
    Ok(dir.keep())
}

pub fn prepare(orchestrator: &mut ProjectOrchestrator, flags: SessionFlags) -> Result<()> {
    if flags.reset {
        orchestrator
            .reset_storage()
            .context("failed to reset project storage")?;
        tracing::debug!("reset storage for project {}", orchestrator.project_name());
    }
    if flags.temp {
        let dir = temp_storage_dir(orchestrator.project_name())?;
        orchestrator.use_storage_dir(&dir)?;
        tracing::debug!("using temp dir {} for project storage", dir.display());
    }
    Ok(())
}
