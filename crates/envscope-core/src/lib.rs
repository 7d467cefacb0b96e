//! envscope core: config schema, config discovery, script cache, key/value store.
//!
//! Everything here is synchronous and shell-agnostic; the capability units and the
//! project orchestrator live in `envscope-modules`.

pub mod config;
pub mod discovery;
pub mod observability;
pub mod paths;
pub mod project;
pub mod scripts;
pub mod store;

/// Product name. Drives the config file name, dot dirs and env var prefixes.
pub const PROJECT_NAME: &str = "envscope";

/// Reported by `envscope version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
