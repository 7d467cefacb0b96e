//! Exec: run a command inside the project's environment in a child shell.

use std::io::Write;

use anyhow::{Context, Result};

use envscope_core::PROJECT_NAME;
use envscope_modules::units::exec::ExecConfig;
use envscope_modules::ProjectOrchestrator;

use crate::runner;

/// Name of the one-shot module that carries the command.
pub const EXEC_MODULE: &str = "exec_subcommand";

/// `set -e`, activation lines, then deactivation lines.
pub fn render_exec_script(activation: &[String], deactivation: &[String]) -> String {
    [
        "set -e".to_string(),
        activation.join("\n"),
        deactivation.join("\n"),
    ]
    .join("\n")
}

/// Append `command` as the last module, then run the whole wrapper in a child
/// shell. Returns the child's exit code.
pub fn issue_exec(orchestrator: &mut ProjectOrchestrator, command: &str) -> Result<i32> {
    orchestrator.append_modules(vec![ExecConfig::one_shot_module(EXEC_MODULE, command)?]);
    let activation = orchestrator.activate()?;
    let deactivation = orchestrator.deactivate()?;
    let body = render_exec_script(&activation, &deactivation);

    let mut file = tempfile::Builder::new()
        .prefix(&format!("{}-exec-", PROJECT_NAME))
        .suffix(".sh")
        .tempfile()
        .context("failed to create exec script")?;
    file.write_all(body.as_bytes())
        .and_then(|_| file.flush())
        .context("failed to write exec script")?;
    tracing::debug!("wrote exec file to {}", file.path().display());

    runner::run_script(file.path())
}
