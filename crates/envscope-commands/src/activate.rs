//! Activation: write both scripts to the paths handed over by the shell wrapper.

use std::fs;

use anyhow::{Context, Result};

use envscope_core::config::ShellHandoff;
use envscope_modules::ProjectOrchestrator;

/// Statements are chained so the first failure stops the rest.
pub const LINE_JOINER: &str = " && \\\n";

pub fn render_sourced(lines: &[String]) -> String {
    lines.join(LINE_JOINER)
}

/// Generate both scripts first; nothing is written unless both succeed.
pub fn issue_activate(orchestrator: &ProjectOrchestrator, handoff: &ShellHandoff) -> Result<()> {
    let activation = render_sourced(&orchestrator.activate()?);
    let deactivation = render_sourced(&orchestrator.deactivate()?);

    fs::write(&handoff.activate_file, &activation).with_context(|| {
        format!("failed to write activation script {}", handoff.activate_file.display())
    })?;
    tracing::debug!(
        "wrote activation file to {} with contents:\n\n{}\n",
        handoff.activate_file.display(),
        activation
    );
    fs::write(&handoff.deactivate_file, &deactivation).with_context(|| {
        format!("failed to write deactivation script {}", handoff.deactivate_file.display())
    })?;
    tracing::debug!(
        "wrote deactivation file to {} with contents:\n\n{}\n",
        handoff.deactivate_file.display(),
        deactivation
    );
    Ok(())
}
