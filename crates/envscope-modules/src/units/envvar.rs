//! `env`: export and unset environment variables, restoring prior values on deactivation.
//!
//! Prior values are snapshotted when the unit is constructed, which happens in the
//! same process that writes both scripts, so they reflect the invoking shell.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use envscope_core::config::parse_dotenv;
use envscope_core::project::Module;

use super::{decode_config, double_quote_escape, Unit};
use crate::context::ProjectContext;

pub const TYPE_TAG: &str = "env";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvVarConfig {
    pub vars: BTreeMap<String, String>,
    /// dotenv files, resolved against the project root.
    pub files: Vec<String>,
    pub unset_vars: Vec<String>,
}

pub struct EnvVarUnit {
    /// Exports in activation order: dotenv files first, then `vars` by key.
    exports: Vec<(String, String)>,
    unset_vars: Vec<String>,
    previous: HashMap<String, Option<String>>,
}

impl EnvVarUnit {
    /// Build from already-loaded exports, snapshotting prior values through `lookup`.
    pub fn new<F>(exports: Vec<(String, String)>, unset_vars: Vec<String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let previous = exports
            .iter()
            .map(|(k, _)| k)
            .chain(unset_vars.iter())
            .map(|k| (k.clone(), lookup(k)))
            .collect();
        Self {
            exports,
            unset_vars,
            previous,
        }
    }

    /// Snapshot against the current process environment.
    pub fn from_process_env(exports: Vec<(String, String)>, unset_vars: Vec<String>) -> Self {
        Self::new(exports, unset_vars, |k| std::env::var(k).ok())
    }

    pub fn from_config(ctx: &ProjectContext, config: EnvVarConfig) -> anyhow::Result<Self> {
        let mut exports = Vec::new();
        for file in &config.files {
            let full = ctx.root_path(file);
            let content = fs::read_to_string(&full)
                .with_context(|| format!("unable to find file {} at {}", file, full.display()))?;
            exports.extend(parse_dotenv(&content));
        }
        exports.extend(config.vars);
        Ok(Self::from_process_env(exports, config.unset_vars))
    }
}

impl Unit for EnvVarUnit {
    fn activate(&self) -> anyhow::Result<Vec<String>> {
        let mut lines: Vec<String> = self
            .exports
            .iter()
            .map(|(k, v)| format!(r#"export {}="{}""#, k, v))
            .collect();
        lines.extend(self.unset_vars.iter().map(|k| format!("unset {}", k)));
        Ok(lines)
    }

    fn deactivate(&self) -> anyhow::Result<Vec<String>> {
        let mut lines = Vec::new();
        let mut seen = HashSet::new();
        for (key, _) in &self.exports {
            if !seen.insert(key.as_str()) {
                continue;
            }
            match self.previous.get(key).and_then(Option::as_ref) {
                Some(old) => {
                    lines.push(format!(r#"export {}="{}""#, key, double_quote_escape(old)))
                }
                None => lines.push(format!("unset {}", key)),
            }
        }
        for key in &self.unset_vars {
            if let Some(old) = self.previous.get(key).and_then(Option::as_ref) {
                lines.push(format!(r#"export {}="{}""#, key, double_quote_escape(old)));
            }
        }
        Ok(lines)
    }
}

pub fn construct(ctx: &ProjectContext, module: &Module) -> anyhow::Result<Box<dyn Unit>> {
    let config: EnvVarConfig = decode_config(module)?;
    Ok(Box::new(EnvVarUnit::from_config(ctx, config)?))
}
