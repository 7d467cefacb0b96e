//! Script subcommands: scan a project's script sources and cache what was found.
//!
//! Cache file: `<storage_dir>/<project>/script_cache_<project>.json`, a JSON object
//! keyed by absolute script path. An entry is reused only while its stored
//! `last_modified` equals the file's current mtime.

use std::collections::HashMap;
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::paths::is_clean_name;
use crate::project::Project;

/// Leading lines searched for a docstring.
pub const DOCSTRING_WINDOW: usize = 5;
pub const NO_DOCSTRING: &str = "No docstring";

const EXEC_PREFIXES: &[(&str, &str)] = &[
    ("py", "/usr/bin/env python"),
    ("js", "/usr/bin/env node"),
    ("rb", "/usr/bin/env ruby"),
    ("bash", "/usr/bin/env bash"),
    ("sh", "/usr/bin/env sh"),
];

fn docstring_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^[\-;#/\s}{]+["']([^"']+)["']$"#).expect("docstring pattern is valid")
    })
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("script name '{0}' must match [a-z0-9_-]+ (extension excluded)")]
    InvalidName(String),

    #[error("script {0} is not executable and has no known extension; chmod +x the file and add a shebang")]
    NotExecutable(PathBuf),

    #[error("failed to read script {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundScript {
    /// RFC3339, second precision, UTC.
    pub last_modified: String,
    pub file_path: PathBuf,
    pub subcommand: String,
    pub docstring: String,
    /// Empty when the file is executable on its own.
    #[serde(default)]
    pub exec_prefix: String,
}

impl FoundScript {
    /// Command line that runs this script with extra args appended.
    pub fn command_line(&self, args: &[String]) -> String {
        let mut cmd = crate::paths::shell_quote(&self.file_path.to_string_lossy());
        if !self.exec_prefix.trim().is_empty() {
            cmd = format!("{} {}", self.exec_prefix, cmd);
        }
        if !args.is_empty() {
            cmd.push(' ');
            cmd.push_str(&args.join(" "));
        }
        cmd
    }
}

pub fn format_mtime(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
    false
}

fn exec_prefix_for(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    EXEC_PREFIXES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, prefix)| *prefix)
}

fn read_docstring(path: &Path) -> Result<String, ScriptError> {
    let file = fs::File::open(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let re = docstring_re();
    for line in BufReader::new(file).lines().take(DOCSTRING_WINDOW) {
        // binary content: no docstring to find
        let Ok(line) = line else { break };
        if let Some(caps) = re.captures(&line) {
            return Ok(caps[1].to_string());
        }
    }
    Ok(NO_DOCSTRING.to_string())
}

/// Build a [`FoundScript`] from a file on disk.
pub fn extract_script(path: &Path) -> Result<FoundScript, ScriptError> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    if !is_clean_name(&name) {
        return Err(ScriptError::InvalidName(name));
    }
    let meta = fs::metadata(path).map_err(|source| ScriptError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let exec_prefix = if is_executable(&meta) {
        String::new()
    } else {
        exec_prefix_for(path)
            .ok_or_else(|| ScriptError::NotExecutable(path.to_path_buf()))?
            .to_string()
    };
    let last_modified = meta
        .modified()
        .map(format_mtime)
        .map_err(|source| ScriptError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(FoundScript {
        last_modified,
        file_path: path.to_path_buf(),
        subcommand: name,
        docstring: read_docstring(path)?,
        exec_prefix,
    })
}

pub fn cache_path(storage_dir: &Path, project: &str) -> PathBuf {
    storage_dir
        .join(project)
        .join(format!("script_cache_{}.json", project))
}

fn load_cache(path: &Path, project: &str) -> HashMap<PathBuf, FoundScript> {
    let Ok(content) = fs::read_to_string(path) else {
        return HashMap::new();
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        tracing::debug!("unable to load script cache for project {}: {}", project, e);
        HashMap::new()
    })
}

fn save_cache(path: &Path, project: &str, cache: &HashMap<PathBuf, FoundScript>) {
    let result = (|| -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(cache)?)?;
        Ok(())
    })();
    if let Err(e) = result {
        tracing::warn!("unable to save script cache for project {}: {}", project, e);
    }
}

/// Regular files a source contributes, sorted by name.
fn source_members(source: &Path) -> std::io::Result<Vec<PathBuf>> {
    let meta = fs::metadata(source)?;
    if !meta.is_dir() {
        return Ok(vec![source.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = fs::read_dir(source)?
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Scan one project's script sources.
///
/// Sources are resolved against `config_dir` unless absolute. Failures on a single
/// file or source are logged and skipped.
pub fn scan_project(config_dir: &Path, storage_dir: &Path, project: &Project) -> Vec<FoundScript> {
    let mut found = Vec::new();
    if project.script_subcommands.is_empty() {
        return found;
    }
    let cache_file = cache_path(storage_dir, &project.name);
    let mut cache = load_cache(&cache_file, &project.name);

    for source in &project.script_subcommands {
        let source = crate::paths::expand_home(source);
        let source = if source.is_absolute() {
            source
        } else {
            config_dir.join(source)
        };
        let members = match source_members(&source) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(
                    "unable to load scripts from {} for project {}: {}",
                    source.display(),
                    project.name,
                    e
                );
                continue;
            }
        };
        for file in members {
            let mtime = match fs::metadata(&file).and_then(|m| m.modified()) {
                Ok(t) => format_mtime(t),
                Err(e) => {
                    tracing::warn!("unable to stat script {}: {}", file.display(), e);
                    continue;
                }
            };
            if let Some(cached) = cache.get(&file).filter(|c| c.last_modified == mtime) {
                found.push(cached.clone());
                continue;
            }
            match extract_script(&file) {
                Ok(script) => {
                    cache.insert(file.clone(), script.clone());
                    found.push(script);
                }
                Err(e) => {
                    tracing::warn!(
                        project = %project.name,
                        "skipping script {}: {}",
                        file.display(),
                        e
                    );
                }
            }
        }
    }

    if !cache.is_empty() {
        save_cache(&cache_file, &project.name, &cache);
    }
    tracing::debug!("found {} scripts for project {}", found.len(), project.name);
    found
}
