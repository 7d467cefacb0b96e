//! What a capability unit can see of its owning project.

use std::path::{Path, PathBuf};

use envscope_core::paths::expand_home;
use envscope_core::project::Project;
use envscope_core::store::Store;

#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub project: Project,
    pub config_path: PathBuf,
    pub store: Store,
}

impl ProjectContext {
    pub fn new(project: Project, config_path: impl Into<PathBuf>, store: Store) -> Self {
        Self {
            project,
            config_path: config_path.into(),
            store,
        }
    }

    pub fn name(&self) -> &str {
        &self.project.name
    }

    fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// Project root: `root` from the config (home-expanded, relative to the config
    /// file), or the config file's directory.
    pub fn root_dir(&self) -> PathBuf {
        match self.project.root.as_deref().filter(|r| !r.trim().is_empty()) {
            None => self.config_dir().to_path_buf(),
            Some(root) => {
                let root = expand_home(root);
                if root.is_absolute() {
                    root
                } else {
                    self.config_dir().join(root)
                }
            }
        }
    }

    /// Resolve a path against the project root. Absolute and `~` paths pass through.
    pub fn root_path(&self, path: &str) -> PathBuf {
        let expanded = expand_home(path);
        if expanded.is_absolute() {
            expanded
        } else if path.is_empty() {
            self.root_dir()
        } else {
            self.root_dir().join(expanded)
        }
    }

    pub fn storage_path<I, S>(&self, parts: I) -> PathBuf
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        self.store.path(parts)
    }
}

#[cfg(test)]
pub(crate) fn test_context(dir: &Path, name: &str) -> ProjectContext {
    let project = Project {
        name: name.to_string(),
        ..Default::default()
    };
    let store = Store::open(dir.join(".envscope").join(name)).unwrap();
    ProjectContext::new(project, dir.join("envscope.yaml"), store)
}
