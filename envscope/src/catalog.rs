//! Projects and scripts visible to this invocation, merged across discovered configs.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use envscope_core::discovery::FoundConfig;
use envscope_core::project::{Module, Project};
use envscope_core::scripts::FoundScript;
use envscope_core::store::Store;
use envscope_modules::{ModuleRegistry, ProjectContext, ProjectOrchestrator};

use crate::cli::RESERVED_COMMANDS;

/// One project together with the config it came from.
#[derive(Debug)]
pub struct ProjectEntry {
    pub found: Arc<FoundConfig>,
    pub project: Project,
    /// All modules declared in the same config file.
    pub modules: Vec<Module>,
}

impl ProjectEntry {
    pub fn name(&self) -> &str {
        &self.project.name
    }

    pub fn scripts(&self) -> &[FoundScript] {
        self.found
            .scripts()
            .get(&self.project.name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn storage_dir(&self) -> PathBuf {
        self.found.storage_dir.join(&self.project.name)
    }

    /// Open the project's store and build an orchestrator over its modules.
    pub fn orchestrator(&self, registry: Arc<ModuleRegistry>) -> Result<ProjectOrchestrator> {
        let dir = self.storage_dir();
        let store = Store::open(&dir)
            .with_context(|| format!("failed to open storage at {}", dir.display()))?;
        let ctx = ProjectContext::new(self.project.clone(), self.found.path.clone(), store);
        Ok(ProjectOrchestrator::new(ctx, &self.modules, registry))
    }
}

#[derive(Debug, Default)]
pub struct Catalog {
    entries: Vec<ProjectEntry>,
}

impl Catalog {
    /// First config to declare a project name wins; later ones are skipped with a warning.
    pub fn from_found(found: &[Arc<FoundConfig>]) -> Self {
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut entries = Vec::new();
        for config_file in found {
            let Some(config) = config_file.config() else {
                continue;
            };
            for project in &config.projects {
                if RESERVED_COMMANDS.contains(&project.name.as_str()) {
                    tracing::warn!(
                        "project name {} in file {} is a reserved command, skipping it; please rename it",
                        project.name,
                        config_file.path.display()
                    );
                    continue;
                }
                if let Some(existing) = seen.get(&project.name) {
                    tracing::warn!(
                        "project {} already exists in file {}, skipping the one from file {}; please resolve the conflict",
                        project.name,
                        existing.display(),
                        config_file.path.display()
                    );
                    continue;
                }
                seen.insert(project.name.clone(), config_file.path.clone());
                entries.push(ProjectEntry {
                    found: Arc::clone(config_file),
                    project: project.clone(),
                    modules: config.modules.clone(),
                });
            }
        }
        Self { entries }
    }

    pub fn entries(&self) -> &[ProjectEntry] {
        &self.entries
    }

    pub fn project(&self, name: &str) -> Option<&ProjectEntry> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// Look up a `<project>.<script>` subcommand.
    pub fn script(&self, command: &str) -> Option<(&ProjectEntry, &FoundScript)> {
        let (project, script) = command.split_once('.')?;
        let entry = self.project(project)?;
        let found = entry.scripts().iter().find(|s| s.subcommand == script)?;
        Some((entry, found))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    pub(crate) fn write_config(dir: &Path, text: &str) -> Arc<FoundConfig> {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join("envscope.yaml");
        fs::write(&path, text).unwrap();
        Arc::new(FoundConfig::new(path, dir.join(".envscope")))
    }

    #[test]
    fn test_first_project_wins() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write_config(
            &tmp.path().join("a"),
            "projects:\n  - {name: web, modules: [m]}\nmodules:\n  - {name: m, type: debug}\n",
        );
        let b = write_config(
            &tmp.path().join("b"),
            "projects:\n  - {name: web}\n  - {name: api}\n",
        );
        let catalog = Catalog::from_found(&[a.clone(), b]);
        let names: Vec<&str> = catalog.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["web", "api"]);
        let web = catalog.project("web").unwrap();
        assert_eq!(web.found.path, a.path);
        assert_eq!(web.modules.len(), 1);
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let found = write_config(
            tmp.path(),
            "projects:\n  - {name: version}\n  - {name: shell-init}\n  - {name: help}\n  - {name: web}\n",
        );
        let catalog = Catalog::from_found(&[found]);
        let names: Vec<&str> = catalog.entries().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["web"]);
    }

    #[test]
    fn test_invalid_config_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let bad = write_config(&tmp.path().join("bad"), "projects:\n  - {name: Bad}\n");
        let good = write_config(&tmp.path().join("good"), "projects:\n  - {name: ok}\n");
        let catalog = Catalog::from_found(&[bad, good]);
        assert_eq!(catalog.entries().len(), 1);
        assert!(catalog.project("ok").is_some());
    }

    #[test]
    fn test_script_lookup_and_orchestrator() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("proj");
        let found = write_config(
            &dir,
            "projects:\n  - {name: web, script_subcommands: [scripts]}\n",
        );
        fs::create_dir_all(dir.join("scripts")).unwrap();
        fs::write(dir.join("scripts/build.sh"), "#!/bin/sh\n# 'Build it'\necho hi\n").unwrap();

        let catalog = Catalog::from_found(&[found]);
        let (entry, script) = catalog.script("web.build").unwrap();
        assert_eq!(entry.name(), "web");
        assert_eq!(script.docstring, "Build it");
        assert!(catalog.script("web.missing").is_none());
        assert!(catalog.script("web").is_none());

        let orch = entry.orchestrator(Arc::new(ModuleRegistry::builtin())).unwrap();
        assert_eq!(orch.context().store.dir(), dir.join(".envscope/web"));
    }
}
