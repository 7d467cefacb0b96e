//! ModuleRegistry: type tag → unit constructor.
//!
//! Built once at startup and handed to every orchestrator; there is no global map.
//! ```ignore
//! let registry = ModuleRegistry::builder()
//!     .register("python", units::python::construct)
//!     .build();
//! ```

use std::collections::BTreeMap;

use envscope_core::project::Module;

use crate::context::ProjectContext;
use crate::units::{self, Unit};

/// Builds a unit from its project context and module declaration.
pub type UnitConstructor = fn(&ProjectContext, &Module) -> anyhow::Result<Box<dyn Unit>>;

#[derive(Clone)]
pub struct ModuleRegistry {
    constructors: BTreeMap<String, UnitConstructor>,
}

#[derive(Default)]
pub struct ModuleRegistryBuilder {
    constructors: BTreeMap<String, UnitConstructor>,
}

impl ModuleRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor. A later registration for the same tag replaces the earlier one.
    #[must_use]
    pub fn register(mut self, tag: &str, constructor: UnitConstructor) -> Self {
        self.constructors.insert(tag.to_string(), constructor);
        self
    }

    pub fn build(self) -> ModuleRegistry {
        ModuleRegistry {
            constructors: self.constructors,
        }
    }
}

impl ModuleRegistry {
    pub fn builder() -> ModuleRegistryBuilder {
        ModuleRegistryBuilder::new()
    }

    /// Registry with every built-in unit type.
    pub fn builtin() -> Self {
        Self::builder()
            .register(units::python::TYPE_TAG, units::python::construct)
            .register(units::jump::TYPE_TAG, units::jump::construct)
            .register(units::prompt::TYPE_TAG, units::prompt::construct)
            .register(units::debug::TYPE_TAG, units::debug::construct)
            .register(units::exec::TYPE_TAG, units::exec::construct)
            .register(units::envvar::TYPE_TAG, units::envvar::construct)
            .register(units::tmux::TYPE_TAG, units::tmux::construct)
            .build()
    }

    pub fn get(&self, tag: &str) -> Option<UnitConstructor> {
        self.constructors.get(tag).copied()
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("tags", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tags() {
        let reg = ModuleRegistry::builtin();
        let tags: Vec<_> = reg.tags().collect();
        assert_eq!(
            tags,
            vec!["debug", "env", "exec", "jump", "ps1", "python", "tmux-window"]
        );
        assert!(reg.get("nope").is_none());
    }

    #[test]
    fn test_builder_registers_custom_tag() {
        let reg = ModuleRegistry::builder()
            .register("noop", units::debug::construct)
            .build();
        assert!(reg.get("noop").is_some());
        assert!(reg.get("python").is_none());
    }
}
