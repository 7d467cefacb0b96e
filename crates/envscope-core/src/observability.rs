//! Observability: tracing init.
//!
//! Uses config::ObservabilityConfig for ENVSCOPE_LOG_LEVEL / ENVSCOPE_LOG_JSON.
//! All log output goes to stderr; stdout is reserved for `--print-root`,
//! `shell-init` and child processes.

use tracing_subscriber::{prelude::*, EnvFilter};

/// Tracing initialization mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TracingMode {
    /// Default: ENVSCOPE_LOG_LEVEL, errors only when unset
    Default,
    /// `-v/--verbose` was passed: debug for every envscope crate
    Verbose,
}

/// Filter directive for the given mode, before `RUST_LOG` is consulted.
pub fn filter_directive(mode: TracingMode) -> String {
    match mode {
        TracingMode::Verbose => {
            "envscope=debug,envscope_core=debug,envscope_modules=debug,envscope_commands=debug"
                .to_string()
        }
        TracingMode::Default => {
            let level = &crate::config::ObservabilityConfig::from_env().log_level;
            // "envscope=warn" style directives should cover the library crates too
            match level.strip_prefix("envscope=") {
                Some(lvl) if !lvl.contains(',') => format!(
                    "envscope={lvl},envscope_core={lvl},envscope_modules={lvl},envscope_commands={lvl}"
                ),
                _ => level.clone(),
            }
        }
    }
}

/// Initialize tracing. Call at process startup, before any config is discovered.
pub fn init_tracing(mode: TracingMode) {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let directive = filter_directive(mode);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .without_time(),
            )
            .try_init()
    };
}
