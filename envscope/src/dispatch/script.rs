//! `<project>.<script>`: run a discovered script inside the project environment.

use std::sync::Arc;

use anyhow::Result;
use clap::FromArgMatches;

use envscope_commands::{exec, session};
use envscope_core::scripts::FoundScript;
use envscope_modules::ModuleRegistry;

use super::DispatchContext;
use crate::catalog::ProjectEntry;
use crate::cli::ScriptArgs;
use crate::command_registry::CommandRegistry;

pub fn register(reg: &mut CommandRegistry, ctx: &DispatchContext) {
    let ctx = ctx.clone();
    reg.register(move |inv| {
        let (entry, script) = ctx.catalog.script(inv.name)?;
        Some(
            ScriptArgs::from_arg_matches(inv.matches)
                .map_err(anyhow::Error::from)
                .and_then(|args| run(entry, script, Arc::clone(&ctx.modules), &args)),
        )
    });
}

fn run(
    entry: &ProjectEntry,
    script: &FoundScript,
    modules: Arc<ModuleRegistry>,
    args: &ScriptArgs,
) -> Result<i32> {
    if args.print_path {
        println!("{}", script.file_path.display());
        return Ok(0);
    }
    let mut orch = entry.orchestrator(modules)?;
    session::prepare(&mut orch, args.session())?;
    exec::issue_exec(&mut orch, &script.command_line(&args.args))
}
