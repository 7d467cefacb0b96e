//! Capability units and the project orchestrator.
//!
//! A project lists module names; each module has a type tag resolved through a
//! [`ModuleRegistry`] into a [`Unit`] that contributes activation and deactivation
//! shell lines. [`ProjectOrchestrator`] concatenates them forward on activation and
//! in reverse on deactivation.

pub mod context;
pub mod orchestrator;
pub mod registry;
pub mod units;

pub use context::ProjectContext;
pub use orchestrator::{NamedUnit, ProjectOrchestrator, ResolveError};
pub use registry::{ModuleRegistry, ModuleRegistryBuilder, UnitConstructor};
pub use units::Unit;

use envscope_core::project::Module;

/// Prompt decoration injected ahead of a project's own modules.
pub const PS1_BUILTIN: &str = "ps1_builtin";
/// Directory jump injected right after [`PS1_BUILTIN`].
pub const JUMP_BUILTIN: &str = "jump_builtin";

/// The implicit modules, outermost first.
pub fn builtin_modules() -> Vec<Module> {
    vec![
        Module::new(PS1_BUILTIN, units::prompt::TYPE_TAG),
        Module::new(JUMP_BUILTIN, units::jump::TYPE_TAG),
    ]
}
