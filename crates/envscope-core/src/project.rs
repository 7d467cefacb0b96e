//! Project config schema: `envscope.yaml`.
//!
//! The file is parsed into a generic JSON tree first, then into typed structs.
//! A module's `config` stays a raw [`serde_json::Value`] until its capability
//! unit decodes it.
//!
//! ```yaml
//! projects:
//!   - name: web
//!     modules: [env1, venv1]
//!     script_subcommands: [scripts]
//! modules:
//!   - name: env1
//!     type: env
//!     config:
//!       vars: { FOO: bar }
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::is_clean_name;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Syntax(#[from] serde_yaml::Error),

    #[error("config does not match schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("{kind} name '{name}' must match [a-z0-9_-]+")]
    InvalidName { kind: &'static str, name: String },

    #[error("module '{0}' has an empty type")]
    MissingType(String),

    #[error("duplicate {kind} name '{name}'")]
    Duplicate { kind: &'static str, name: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub projects: Vec<Project>,
    pub modules: Vec<Module>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    /// Present in the schema, not consumed by activation.
    #[serde(default)]
    pub generation: u32,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub script_subcommands: Vec<String>,
    #[serde(default)]
    pub disable_builtin_modules: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

impl Module {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            config: serde_json::Value::Null,
        }
    }

    pub fn with_config(mut self, config: serde_json::Value) -> Self {
        self.config = config;
        self
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse and validate config text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let tree: serde_json::Value = serde_yaml::from_str(text)?;
        // An empty document parses to null
        let tree = if tree.is_null() {
            serde_json::Value::Object(Default::default())
        } else {
            tree
        };
        let config: Config = serde_json::from_value(tree)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for project in &self.projects {
            if !is_clean_name(&project.name) {
                return Err(ConfigError::InvalidName {
                    kind: "project",
                    name: project.name.clone(),
                });
            }
            if !seen.insert(project.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "project",
                    name: project.name.clone(),
                });
            }
        }
        let mut seen = HashSet::new();
        for module in &self.modules {
            if !is_clean_name(&module.name) {
                return Err(ConfigError::InvalidName {
                    kind: "module",
                    name: module.name.clone(),
                });
            }
            if module.kind.trim().is_empty() {
                return Err(ConfigError::MissingType(module.name.clone()));
            }
            if !seen.insert(module.name.as_str()) {
                return Err(ConfigError::Duplicate {
                    kind: "module",
                    name: module.name.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }
}
