//! envscope: per-project shell environments.
//!
//! `run_cli` discovers configs, builds one subcommand per project and script,
//! and dispatches the parsed invocation.

mod catalog;
mod cli;
mod command_registry;
mod dispatch;

use std::sync::Arc;

use anyhow::{Context, Result};

use envscope_core::discovery::{discover, DiscoveryOptions};
use envscope_core::observability::{init_tracing, TracingMode};
use envscope_modules::ModuleRegistry;

use catalog::Catalog;
use command_registry::{CommandRegistry, Invocation};
use dispatch::DispatchContext;

/// Entry point for the binary. Returns the process exit code.
pub fn run_cli() -> Result<i32> {
    let mode = if cli::verbose_requested(std::env::args_os()) {
        TracingMode::Verbose
    } else {
        TracingMode::Default
    };
    init_tracing(mode);

    let opts = DiscoveryOptions::from_env(true).context("failed to read current directory")?;
    let found = discover(&opts);
    let catalog = Arc::new(Catalog::from_found(&found));
    tracing::debug!("{} projects available", catalog.entries().len());

    let matches = cli::build_cli(&catalog).get_matches();
    let Some((name, sub)) = matches.subcommand() else {
        return Ok(0);
    };

    let ctx = DispatchContext {
        catalog,
        modules: Arc::new(ModuleRegistry::builtin()),
    };
    let mut reg = CommandRegistry::new();
    dispatch::register_all(&mut reg, &ctx);
    reg.dispatch(&Invocation { name, matches: sub })
}
