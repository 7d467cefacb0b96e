//! `python`: a virtualenv under project storage with hash-gated dependency installs.
//!
//! The venv lives at `<storage>/pyvenvs/<module name>`. Dependencies are reinstalled
//! only when the SHA-256 over the dependency list and every tracked file changes;
//! the last installed hash is kept in `<venv>/autoinstall_dep_sha.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use envscope_core::paths::shell_quote;
use envscope_core::project::Module;

use super::envvar::EnvVarUnit;
use super::{decode_config, Unit};
use crate::context::ProjectContext;

pub const TYPE_TAG: &str = "python";

pub const DEFAULT_PYTHON: &str = "python3";
pub const DEFAULT_VIRTUALENV: &str = "virtualenv";
const PIP_INSTALL: &str = "pip install";
const HASH_FILENAME: &str = "autoinstall_dep_sha.txt";
const REQUIREMENTS_SUFFIX: &str = ".txt";
/// Dependency entries starting with this are raw shell commands.
const RAW_COMMAND_PREFIX: char = '!';

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    pub python: Option<String>,
    pub dependencies: Vec<String>,
    pub additional_track_files: Vec<String>,
    pub virtualenv_command: Option<String>,
}

pub struct PythonUnit {
    venv_dir: PathBuf,
    python: String,
    virtualenv_command: String,
    dependencies: Vec<String>,
    /// Requirement files then additional tracked files, resolved against the root.
    tracked_files: Vec<PathBuf>,
    install_commands: Vec<String>,
    env: EnvVarUnit,
}

/// SHA-256 over the JSON dependency list followed by each tracked file's bytes.
/// Empty when there are no dependencies.
pub fn dependency_hash(
    dependencies: &[String],
    tracked_files: &[PathBuf],
) -> anyhow::Result<String> {
    if dependencies.is_empty() {
        return Ok(String::new());
    }
    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(dependencies)?);
    for file in tracked_files {
        let data = fs::read(file)
            .with_context(|| format!("unable to read tracked file {}", file.display()))?;
        hasher.update(&data);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn venv_env(venv_dir: &Path) -> EnvVarUnit {
    let venv = venv_dir.to_string_lossy().into_owned();
    EnvVarUnit::from_process_env(
        vec![
            ("VIRTUAL_ENV".to_string(), venv.clone()),
            ("PATH".to_string(), format!("{}/bin:${{PATH}}", venv)),
        ],
        vec!["PYTHONHOME".to_string()],
    )
}

impl PythonUnit {
    pub fn new(ctx: &ProjectContext, name: &str, config: PythonConfig) -> Self {
        let venv_dir = ctx.storage_path(["pyvenvs", name]);
        let mut tracked_files = Vec::new();
        let mut install_commands = Vec::new();
        for dep in &config.dependencies {
            if let Some(raw) = dep.strip_prefix(RAW_COMMAND_PREFIX) {
                install_commands.push(raw.to_string());
            } else if dep.ends_with(REQUIREMENTS_SUFFIX) {
                let path = ctx.root_path(dep);
                install_commands.push(format!(
                    "{} -r {}",
                    PIP_INSTALL,
                    shell_quote(&path.to_string_lossy())
                ));
                tracked_files.push(path);
            } else {
                install_commands.push(format!("{} {}", PIP_INSTALL, dep));
            }
        }
        tracked_files.extend(config.additional_track_files.iter().map(|f| ctx.root_path(f)));

        Self {
            env: venv_env(&venv_dir),
            venv_dir,
            python: config.python.unwrap_or_else(|| DEFAULT_PYTHON.to_string()),
            virtualenv_command: config
                .virtualenv_command
                .unwrap_or_else(|| DEFAULT_VIRTUALENV.to_string()),
            dependencies: config.dependencies,
            tracked_files,
            install_commands,
        }
    }

    pub fn venv_dir(&self) -> &Path {
        &self.venv_dir
    }

    fn venv_exists(&self) -> bool {
        self.venv_dir.join("bin").exists()
    }

    fn hash_path(&self) -> PathBuf {
        self.venv_dir.join(HASH_FILENAME)
    }

    fn last_hash(&self) -> String {
        fs::read_to_string(self.hash_path())
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    }
}

impl Unit for PythonUnit {
    fn activate(&self) -> anyhow::Result<Vec<String>> {
        let current = dependency_hash(&self.dependencies, &self.tracked_files)?;
        let mut lines = Vec::new();
        if !self.venv_exists() {
            lines.push(format!(
                "{} -p {} {}",
                self.virtualenv_command,
                self.python,
                shell_quote(&self.venv_dir.to_string_lossy())
            ));
        }
        lines.extend(self.env.activate()?);
        if current != self.last_hash() && !self.dependencies.is_empty() {
            tracing::debug!(
                venv = %self.venv_dir.display(),
                "dependency hash changed, reinstalling"
            );
            lines.extend(self.install_commands.iter().cloned());
            lines.push(format!(
                "echo {} > {}",
                current,
                shell_quote(&self.hash_path().to_string_lossy())
            ));
        }
        Ok(lines)
    }

    fn deactivate(&self) -> anyhow::Result<Vec<String>> {
        self.env.deactivate()
    }
}

pub fn construct(ctx: &ProjectContext, module: &Module) -> anyhow::Result<Box<dyn Unit>> {
    let config: PythonConfig = decode_config(module)?;
    Ok(Box::new(PythonUnit::new(ctx, &module.name, config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_hash_is_stable_and_tracks_file_bytes() {
        let tmp = tempfile::tempdir().unwrap();
        let req = tmp.path().join("requirements.txt");
        fs::write(&req, "requests==2.31\n").unwrap();
        let d = deps(&["requirements.txt", "flask"]);

        let h1 = dependency_hash(&d, &[req.clone()]).unwrap();
        let h2 = dependency_hash(&d, &[req.clone()]).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        fs::write(&req, "requests==2.32\n").unwrap();
        assert_ne!(dependency_hash(&d, &[req.clone()]).unwrap(), h1);
        assert_ne!(
            dependency_hash(&deps(&["flask"]), &[]).unwrap(),
            dependency_hash(&deps(&["django"]), &[]).unwrap()
        );
    }

    #[test]
    fn test_no_dependencies_hash_is_empty() {
        assert_eq!(dependency_hash(&[], &[PathBuf::from("/does/not/matter")]).unwrap(), "");
    }

    #[test]
    fn test_fresh_venv_activation() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("requirements.txt"), "six\n").unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let config = PythonConfig {
            dependencies: deps(&["requests", "requirements.txt", "!make deps"]),
            ..Default::default()
        };
        let unit = PythonUnit::new(&ctx, "venv1", config);
        let venv = ctx.storage_path(["pyvenvs", "venv1"]);
        let venv_s = venv.to_string_lossy();
        let lines = unit.activate().unwrap();

        assert_eq!(lines[0], format!("virtualenv -p python3 {}", venv_s));
        assert_eq!(lines[1], format!(r#"export VIRTUAL_ENV="{}""#, venv_s));
        assert_eq!(lines[2], format!(r#"export PATH="{}/bin:${{PATH}}""#, venv_s));
        assert_eq!(lines[3], "unset PYTHONHOME");
        assert_eq!(lines[4], "pip install requests");
        assert_eq!(
            lines[5],
            format!("pip install -r {}", tmp.path().join("requirements.txt").display())
        );
        assert_eq!(lines[6], "make deps");
        assert!(lines[7].starts_with("echo "));
        assert!(lines[7].ends_with(&format!("> {}/autoinstall_dep_sha.txt", venv_s)));
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn test_existing_venv_with_matching_hash_skips_install() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let config = PythonConfig {
            python: Some("python3.12".to_string()),
            dependencies: deps(&["requests"]),
            ..Default::default()
        };
        let unit = PythonUnit::new(&ctx, "venv1", config);
        fs::create_dir_all(unit.venv_dir().join("bin")).unwrap();
        let hash = dependency_hash(&deps(&["requests"]), &[]).unwrap();
        fs::write(unit.venv_dir().join(HASH_FILENAME), format!("{}\n", hash)).unwrap();

        let lines = unit.activate().unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("export VIRTUAL_ENV="));
    }

    #[test]
    fn test_missing_tracked_file_fails_activation() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let config = PythonConfig {
            dependencies: deps(&["requests"]),
            additional_track_files: deps(&["setup.cfg"]),
            ..Default::default()
        };
        let unit = PythonUnit::new(&ctx, "venv1", config);
        assert!(unit.activate().is_err());
    }

    #[test]
    fn test_deactivation_unsets_virtual_env() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let unit = PythonUnit::new(&ctx, "venv1", PythonConfig::default());
        let lines = unit.deactivate().unwrap();
        assert_eq!(lines.len(), 2 + usize::from(std::env::var("PYTHONHOME").is_ok()));
        assert!(lines[1].starts_with("export PATH=") || lines[1] == "unset PATH");
    }
}
