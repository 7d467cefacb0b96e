//! `<project>`: activate through the shell wrapper, or exec a command.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::FromArgMatches;

use envscope_commands::{activate, exec, session, shell_init};
use envscope_core::config::ShellHandoff;
use envscope_modules::ModuleRegistry;

use super::DispatchContext;
use crate::catalog::ProjectEntry;
use crate::cli::ProjectArgs;
use crate::command_registry::CommandRegistry;

pub fn register(reg: &mut CommandRegistry, ctx: &DispatchContext) {
    let ctx = ctx.clone();
    reg.register(move |inv| {
        let entry = ctx.catalog.project(inv.name)?;
        Some(
            ProjectArgs::from_arg_matches(inv.matches)
                .map_err(anyhow::Error::from)
                .and_then(|args| run(entry, Arc::clone(&ctx.modules), &args)),
        )
    });
}

fn run(entry: &ProjectEntry, modules: Arc<ModuleRegistry>, args: &ProjectArgs) -> Result<i32> {
    let mut orch = entry.orchestrator(modules)?;
    if args.print_root {
        println!("{}", orch.root_dir().display());
        return Ok(0);
    }
    session::prepare(&mut orch, args.session())?;
    orch.with_builtins();

    if !args.command.is_empty() {
        return exec::issue_exec(&mut orch, &args.command.join(" "));
    }
    let handoff = ShellHandoff::from_env().ok_or_else(|| {
        anyhow!(
            "please add `{}` to your .bashrc/.zshrc to enable shell support",
            shell_init::eval_helper()
        )
    })?;
    activate::issue_activate(&orch, &handoff)?;
    Ok(0)
}
