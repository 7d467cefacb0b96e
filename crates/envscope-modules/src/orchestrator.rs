//! ProjectOrchestrator: resolve a project's module list into units and
//! concatenate their lines.
//!
//! Activation walks the units in declared order; deactivation walks them in reverse,
//! so the last unit layered on is the first one undone.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use thiserror::Error;

use envscope_core::project::Module;
use envscope_core::store::StoreError;

use crate::context::ProjectContext;
use crate::registry::ModuleRegistry;
use crate::units::Unit;

/// Resolution and generation failures. Cloneable so a failed resolution can be cached.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("module {module} not found which is needed for project {project}")]
    MissingModule { module: String, project: String },

    #[error("module {module} for project {project} has unknown type {kind}")]
    UnknownType {
        module: String,
        project: String,
        kind: String,
    },

    #[error("module {module} for project {project} could not be initialized: {reason}")]
    Construction {
        module: String,
        project: String,
        reason: String,
    },

    #[error("module {module} for project {project} could not generate {phase} lines: {reason}")]
    Generation {
        module: String,
        project: String,
        phase: &'static str,
        reason: String,
    },
}

pub struct NamedUnit {
    pub name: String,
    pub unit: Box<dyn Unit>,
}

pub struct ProjectOrchestrator {
    context: ProjectContext,
    order: Vec<String>,
    modules: HashMap<String, Module>,
    registry: Arc<ModuleRegistry>,
    units: OnceLock<Result<Vec<NamedUnit>, ResolveError>>,
}

impl ProjectOrchestrator {
    /// `declared` is every module in the project's config file; only the ones the
    /// project names are kept.
    pub fn new(
        context: ProjectContext,
        declared: &[Module],
        registry: Arc<ModuleRegistry>,
    ) -> Self {
        let order = context.project.modules.clone();
        let modules = declared
            .iter()
            .filter(|m| order.contains(&m.name))
            .map(|m| (m.name.clone(), m.clone()))
            .collect();
        Self {
            context,
            order,
            modules,
            registry,
            units: OnceLock::new(),
        }
    }

    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub fn project_name(&self) -> &str {
        self.context.name()
    }

    /// Module names in activation order.
    pub fn module_names(&self) -> &[String] {
        &self.order
    }

    pub fn root_dir(&self) -> PathBuf {
        self.context.root_dir()
    }

    fn invalidate(&mut self) {
        self.units = OnceLock::new();
    }

    /// Insert modules at the front, keeping their given order.
    pub fn prepend_modules(&mut self, modules: Vec<Module>) {
        let names: Vec<String> = modules.iter().map(|m| m.name.clone()).collect();
        self.order.splice(0..0, names);
        for module in modules {
            self.modules.insert(module.name.clone(), module);
        }
        self.invalidate();
    }

    pub fn append_modules(&mut self, modules: Vec<Module>) {
        for module in modules {
            self.order.push(module.name.clone());
            self.modules.insert(module.name.clone(), module);
        }
        self.invalidate();
    }

    /// Prepend the prompt and jump builtins unless the project opts out.
    pub fn with_builtins(&mut self) {
        if !self.context.project.disable_builtin_modules {
            self.prepend_modules(crate::builtin_modules());
        }
    }

    /// Wipe the project's storage before activation.
    pub fn reset_storage(&mut self) -> Result<(), StoreError> {
        self.context.store.erase_all()?;
        self.invalidate();
        Ok(())
    }

    /// Point storage at a throwaway directory for this session.
    pub fn use_storage_dir(&mut self, dir: impl Into<PathBuf>) -> Result<(), StoreError> {
        self.context.store.relocate(dir)?;
        self.invalidate();
        Ok(())
    }

    fn resolve(&self) -> Result<Vec<NamedUnit>, ResolveError> {
        let project = self.project_name().to_string();
        let mut resolved = Vec::with_capacity(self.order.len());
        for name in &self.order {
            let module = self
                .modules
                .get(name)
                .ok_or_else(|| ResolveError::MissingModule {
                    module: name.clone(),
                    project: project.clone(),
                })?;
            let constructor =
                self.registry
                    .get(&module.kind)
                    .ok_or_else(|| ResolveError::UnknownType {
                        module: name.clone(),
                        project: project.clone(),
                        kind: module.kind.clone(),
                    })?;
            let unit = constructor(&self.context, module).map_err(|e| ResolveError::Construction {
                module: name.clone(),
                project: project.clone(),
                reason: format!("{:#}", e),
            })?;
            resolved.push(NamedUnit {
                name: name.clone(),
                unit,
            });
        }
        tracing::debug!(project = %project, "resolved {} modules", resolved.len());
        Ok(resolved)
    }

    /// Units in declared order. Built once; later calls return the cached result or error.
    pub fn units(&self) -> Result<&[NamedUnit], ResolveError> {
        self.units
            .get_or_init(|| self.resolve())
            .as_deref()
            .map_err(Clone::clone)
    }

    fn generation_error(
        &self,
        module: &str,
        phase: &'static str,
        e: anyhow::Error,
    ) -> ResolveError {
        ResolveError::Generation {
            module: module.to_string(),
            project: self.project_name().to_string(),
            phase,
            reason: format!("{:#}", e),
        }
    }

    /// Activation lines, forward order. Any unit failure fails the whole script.
    pub fn activate(&self) -> Result<Vec<String>, ResolveError> {
        let mut lines = Vec::new();
        for named in self.units()? {
            let unit_lines = named
                .unit
                .activate()
                .map_err(|e| self.generation_error(&named.name, "activation", e))?;
            lines.extend(unit_lines);
        }
        Ok(lines)
    }

    /// Deactivation lines, reverse order.
    pub fn deactivate(&self) -> Result<Vec<String>, ResolveError> {
        let mut lines = Vec::new();
        for named in self.units()?.iter().rev() {
            let unit_lines = named
                .unit
                .deactivate()
                .map_err(|e| self.generation_error(&named.name, "deactivation", e))?;
            lines.extend(unit_lines);
        }
        Ok(lines)
    }
}
