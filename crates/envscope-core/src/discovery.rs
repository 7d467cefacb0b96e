//! Config discovery: find `envscope.yaml` files from git, the working directory
//! and the history of previously seen configs.
//!
//! Sources are merged in that order and deduplicated by path. Discovery never fails;
//! a source that cannot be queried contributes nothing.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

use crate::paths::{default_config_filename, dot_dir, find_in_ancestors};
use crate::project::Config;
use crate::scripts::{scan_project, FoundScript};

pub const HISTORY_FILENAME: &str = "seen_configs.json";

/// Untracked files that are not ignored.
const GIT_UNTRACKED_ARGS: &[&str] = &[
    "ls-files",
    "--others",
    "--exclude-standard",
    "--full-name",
];

/// Tracked files. The first variant that succeeds wins; the second covers git
/// versions without `--recurse-submodules`.
const GIT_TRACKED_ARGS: &[&[&str]] = &[
    &["ls-files", "--recurse-submodules", "--full-name"],
    &["ls-files", "--full-name"],
];

/// A config file found on disk. Loading and script scanning each run at most once.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct FoundConfig {
    pub path: PathBuf,
    pub storage_dir: PathBuf,
    #[serde(skip)]
    config: OnceLock<Option<Config>>,
    #[serde(skip)]
    scripts: OnceLock<HashMap<String, Vec<FoundScript>>>,
}

impl FoundConfig {
    pub fn new(path: impl Into<PathBuf>, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            storage_dir: storage_dir.into(),
            ..Default::default()
        }
    }

    /// Directory holding the config file.
    pub fn config_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// The parsed config, or `None` if it could not be read or validated.
    pub fn config(&self) -> Option<&Config> {
        self.config.get_or_init(|| self.load_config()).as_ref()
    }

    fn load_config(&self) -> Option<Config> {
        match Config::load(&self.path) {
            Ok(config) => {
                tracing::debug!(
                    "loaded {} modules and {} projects from config {}",
                    config.modules.len(),
                    config.projects.len(),
                    self.path.display()
                );
                Some(config)
            }
            Err(crate::project::ConfigError::Read { source, .. }) => {
                tracing::debug!("unable to read config {}: {}", self.path.display(), source);
                None
            }
            Err(e) => {
                tracing::warn!("skipping config {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Scripts per project name. Concurrent callers wait for the single scan.
    pub fn scripts(&self) -> &HashMap<String, Vec<FoundScript>> {
        self.scripts.get_or_init(|| {
            let mut all = HashMap::new();
            let Some(config) = self.config() else {
                return all;
            };
            for project in &config.projects {
                if project.script_subcommands.is_empty() {
                    continue;
                }
                let found = scan_project(self.config_dir(), &self.storage_dir, project);
                all.insert(project.name.clone(), found);
            }
            all
        })
    }
}

/// Where and how to discover.
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub cwd: PathBuf,
    /// Warm each new config's script cache on a background thread.
    pub prefetch: bool,
    /// History file to read and rewrite; `None` disables history.
    pub history_path: Option<PathBuf>,
}

impl DiscoveryOptions {
    /// Current directory plus history settings from the environment.
    pub fn from_env(prefetch: bool) -> std::io::Result<Self> {
        let cfg = crate::config::DiscoveryConfig::from_env();
        Ok(Self {
            cwd: std::env::current_dir()?,
            prefetch,
            history_path: cfg.use_history.then(|| cfg.history_path()),
        })
    }
}

fn git_output(root: &Path, args: &[&str]) -> Option<String> {
    let git_dir = root.join(".git");
    tracing::debug!("running command: git {}", args.join(" "));
    let output = Command::new("git")
        .arg("--git-dir")
        .arg(&git_dir)
        .arg("--work-tree")
        .arg(root)
        .args(args)
        .output();
    match output {
        Ok(out) if out.status.success() => Some(String::from_utf8_lossy(&out.stdout).into_owned()),
        Ok(out) => {
            tracing::debug!(
                "git ls-files failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            );
            None
        }
        Err(e) => {
            tracing::debug!("unable to run git: {}", e);
            None
        }
    }
}

/// Configs tracked (or untracked but not ignored) in the enclosing git tree.
pub fn configs_from_git(cwd: &Path) -> Vec<FoundConfig> {
    let mut found = Vec::new();
    let Some(root) = find_in_ancestors(cwd, ".git") else {
        tracing::debug!("no git root above {}", cwd.display());
        return found;
    };
    let filename = default_config_filename();
    let storage_dir = dot_dir(&root);
    let mut seen = HashSet::new();
    let untracked = git_output(&root, GIT_UNTRACKED_ARGS);
    let tracked = GIT_TRACKED_ARGS.iter().find_map(|args| git_output(&root, args));
    for stdout in [untracked, tracked].into_iter().flatten() {
        for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            if Path::new(line).file_name().and_then(|n| n.to_str()) != Some(filename.as_str()) {
                continue;
            }
            let path = root.join(line);
            if seen.insert(path.clone()) {
                found.push(FoundConfig::new(path, storage_dir.clone()));
            }
        }
    }
    tracing::debug!("found {} configs in git dir", found.len());
    found
}

/// `<cwd>/envscope.yaml` if present.
pub fn configs_from_cwd(cwd: &Path) -> Vec<FoundConfig> {
    let path = cwd.join(default_config_filename());
    if !path.is_file() {
        tracing::debug!("no config found in current directory");
        return Vec::new();
    }
    vec![FoundConfig::new(path, dot_dir(cwd))]
}

pub fn configs_from_history(history: &Path) -> Vec<FoundConfig> {
    let data = match fs::read_to_string(history) {
        Ok(d) => d,
        Err(e) => {
            tracing::debug!("unable to read seen configs {}: {}", history.display(), e);
            return Vec::new();
        }
    };
    match serde_json::from_str::<Vec<FoundConfig>>(&data) {
        Ok(found) => {
            tracing::debug!("found {} configs in history", found.len());
            found
        }
        Err(e) => {
            tracing::debug!("unable to parse seen configs {}: {}", history.display(), e);
            Vec::new()
        }
    }
}

fn write_history(history: &Path, configs: &[Arc<FoundConfig>]) {
    let entries: Vec<&FoundConfig> = configs.iter().map(Arc::as_ref).collect();
    let result = (|| -> anyhow::Result<()> {
        if let Some(parent) = history.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(history, serde_json::to_string(&entries)?)?;
        Ok(())
    })();
    if let Err(e) = result {
        tracing::debug!("unable to save history file {}: {}", history.display(), e);
    }
}

fn prefetch_scripts(config: Arc<FoundConfig>) {
    let spawned = std::thread::Builder::new()
        .name("envscope-prefetch".to_string())
        .spawn(move || {
            config.scripts();
        });
    if let Err(e) = spawned {
        tracing::debug!("unable to start script prefetch: {}", e);
    }
}

/// Merge all sources, first-seen wins, deduplicated by path.
pub fn discover(opts: &DiscoveryOptions) -> Vec<Arc<FoundConfig>> {
    let mut sources = vec![configs_from_git(&opts.cwd), configs_from_cwd(&opts.cwd)];
    if let Some(history) = &opts.history_path {
        sources.push(configs_from_history(history));
    }

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for found in sources.into_iter().flatten() {
        if !seen.insert(found.path.clone()) {
            continue;
        }
        let found = Arc::new(found);
        if opts.prefetch {
            prefetch_scripts(Arc::clone(&found));
        }
        unique.push(found);
    }

    if let Some(history) = &opts.history_path {
        write_history(history, &unique);
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = "projects:\n  - name: web\n    script_subcommands: [scripts]\n";

    fn options(cwd: &Path, history: Option<PathBuf>) -> DiscoveryOptions {
        DiscoveryOptions {
            cwd: cwd.to_path_buf(),
            prefetch: false,
            history_path: history,
        }
    }

    #[test]
    fn test_cwd_source() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(configs_from_cwd(tmp.path()).is_empty());
        fs::write(tmp.path().join("envscope.yaml"), CONFIG).unwrap();
        let found = configs_from_cwd(tmp.path());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].storage_dir, tmp.path().join(".envscope"));
        assert_eq!(found[0].config().unwrap().projects[0].name, "web");
    }

    #[test]
    fn test_same_path_from_two_sources_is_deduplicated() {
        let tmp = tempfile::tempdir().unwrap();
        let cwd = tmp.path().join("proj");
        fs::create_dir_all(&cwd).unwrap();
        let config_path = cwd.join("envscope.yaml");
        fs::write(&config_path, CONFIG).unwrap();

        let history = tmp.path().join("home").join(HISTORY_FILENAME);
        fs::create_dir_all(history.parent().unwrap()).unwrap();
        let entries = serde_json::json!([
            {"path": config_path, "storage_dir": "/elsewhere"},
            {"path": "/other/envscope.yaml", "storage_dir": "/other/.envscope"}
        ]);
        fs::write(&history, entries.to_string()).unwrap();

        let found = discover(&options(&cwd, Some(history.clone())));
        let paths: Vec<_> = found.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![config_path.clone(), PathBuf::from("/other/envscope.yaml")]);
        // cwd source came first, so its storage dir wins
        assert_eq!(found[0].storage_dir, cwd.join(".envscope"));

        let rewritten = configs_from_history(&history);
        assert_eq!(rewritten.len(), 2);
        assert_eq!(rewritten[0].path, config_path);
    }

    #[test]
    fn test_history_disabled_is_not_read_or_written() {
        let tmp = tempfile::tempdir().unwrap();
        let found = discover(&options(tmp.path(), None));
        assert!(found.is_empty());
        assert!(!tmp.path().join(HISTORY_FILENAME).exists());
    }

    #[test]
    fn test_corrupt_history_yields_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let history = tmp.path().join(HISTORY_FILENAME);
        fs::write(&history, "[{broken").unwrap();
        assert!(configs_from_history(&history).is_empty());
        let found = discover(&options(tmp.path(), Some(history.clone())));
        assert!(found.is_empty());
        assert_eq!(fs::read_to_string(&history).unwrap(), "[]");
    }

    #[test]
    fn test_invalid_config_is_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("envscope.yaml");
        fs::write(&path, "projects:\n  - name: Bad Name\n").unwrap();
        let found = FoundConfig::new(&path, tmp.path().join(".envscope"));
        assert!(found.config().is_none());
        assert!(found.scripts().is_empty());
    }

    #[test]
    fn test_scripts_scanned_once_across_threads() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir_all(tmp.path().join("scripts")).unwrap();
        fs::write(tmp.path().join("scripts").join("hello.sh"), "# 'Say hi'\n").unwrap();
        let path = tmp.path().join("envscope.yaml");
        fs::write(&path, CONFIG).unwrap();
        let found = Arc::new(FoundConfig::new(&path, tmp.path().join(".envscope")));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let f = Arc::clone(&found);
                std::thread::spawn(move || f.scripts()["web"].len())
            })
            .collect();
        for h in handles {
            assert_eq!(h.join().unwrap(), 1);
        }
        assert!(std::ptr::eq(found.scripts(), found.scripts()));
        assert_eq!(found.scripts()["web"][0].docstring, "Say hi");
    }

    #[test]
    fn test_git_source_finds_nested_configs() {
        let has_git = Command::new("git").arg("--version").output().map(|o| o.status.success());
        if !matches!(has_git, Ok(true)) {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let init = Command::new("git").arg("init").arg("-q").arg(root).status().unwrap();
        assert!(init.success());
        fs::create_dir_all(root.join("svc")).unwrap();
        fs::write(root.join("svc").join("envscope.yaml"), CONFIG).unwrap();
        fs::write(root.join("svc").join("not-envscope.yaml"), CONFIG).unwrap();

        let found = configs_from_git(&root.join("svc"));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].path, root.join("svc").join("envscope.yaml"));
        assert_eq!(found[0].storage_dir, root.join(".envscope"));
    }

    #[test]
    fn test_git_source_merges_tracked_and_untracked() {
        let has_git = Command::new("git").arg("--version").output().map(|o| o.status.success());
        if !matches!(has_git, Ok(true)) {
            return;
        }
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        let git = |args: &[&str]| {
            Command::new("git")
                .arg("-C")
                .arg(root)
                .args(args)
                .status()
                .unwrap()
        };
        assert!(git(&["init", "-q"]).success());
        for dir in ["tracked", "untracked"] {
            fs::create_dir_all(root.join(dir)).unwrap();
            fs::write(root.join(dir).join("envscope.yaml"), CONFIG).unwrap();
        }
        assert!(git(&["add", "tracked/envscope.yaml"]).success());

        let mut paths: Vec<PathBuf> = configs_from_git(root)
            .into_iter()
            .map(|f| f.path)
            .collect();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                root.join("tracked").join("envscope.yaml"),
                root.join("untracked").join("envscope.yaml"),
            ]
        );
    }
}
