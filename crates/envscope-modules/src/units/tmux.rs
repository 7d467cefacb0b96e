//! `tmux-window`: (re)build a tmux window named `<project>-<name>` with its panes.
//!
//! Deactivation leaves the window alone.

use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use envscope_core::paths::shell_quote;
use envscope_core::project::Module;

use super::{decode_config, Unit};
use crate::context::ProjectContext;

pub const TYPE_TAG: &str = "tmux-window";
pub const DEFAULT_LAYOUT: &str = "tiled";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmuxPane {
    /// Resolved against the project root; empty means the root itself.
    pub root: String,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TmuxWindowConfig {
    pub name: String,
    pub panes: Vec<TmuxPane>,
    /// even-horizontal, even-vertical, main-horizontal, main-vertical, tiled
    pub layout: Option<String>,
    pub disable_destroy_existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxWindow {
    pub id: String,
    pub name: String,
}

/// The tmux queries the unit needs while generating its lines.
pub trait TmuxClient: Send + Sync {
    /// Name of the attached session; empty when there is none.
    fn current_session(&self) -> anyhow::Result<String>;
    fn current_window(&self) -> Option<String>;
    fn list_windows(&self) -> anyhow::Result<Vec<TmuxWindow>>;
}

/// Queries the real `tmux` binary.
pub struct SystemTmux;

fn tmux_output(args: &[&str]) -> anyhow::Result<String> {
    let output = Command::new("tmux")
        .args(args)
        .output()
        .context("failed to run tmux")?;
    if !output.status.success() {
        bail!(
            "tmux {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

pub fn parse_window_list(output: &str) -> Vec<TmuxWindow> {
    output
        .lines()
        .filter_map(|line| line.split_once('|'))
        .map(|(id, name)| TmuxWindow {
            id: id.to_string(),
            name: name.to_string(),
        })
        .collect()
}

impl TmuxClient for SystemTmux {
    fn current_session(&self) -> anyhow::Result<String> {
        tmux_output(&["display-message", "-p", "#S"])
    }

    fn current_window(&self) -> Option<String> {
        tmux_output(&["display-message", "-p", "#W"]).ok()
    }

    fn list_windows(&self) -> anyhow::Result<Vec<TmuxWindow>> {
        Ok(parse_window_list(&tmux_output(&["list-windows", "-F", "#I|#W"])?))
    }
}

struct ResolvedPane {
    dir: PathBuf,
    commands: Vec<String>,
}

pub struct TmuxWindowUnit {
    target: String,
    panes: Vec<ResolvedPane>,
    layout: String,
    disable_destroy_existing: bool,
    client: Box<dyn TmuxClient>,
}

impl TmuxWindowUnit {
    pub fn new(
        ctx: &ProjectContext,
        config: TmuxWindowConfig,
        client: Box<dyn TmuxClient>,
    ) -> anyhow::Result<Self> {
        if config.name.trim().is_empty() {
            bail!("tmux-window requires a window name");
        }
        let mut panes = config.panes;
        if panes.is_empty() {
            panes.push(TmuxPane::default());
        }
        Ok(Self {
            target: format!("{}-{}", ctx.name(), config.name),
            panes: panes
                .into_iter()
                .map(|p| ResolvedPane {
                    dir: ctx.root_path(&p.root),
                    commands: p.commands,
                })
                .collect(),
            layout: config
                .layout
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
            disable_destroy_existing: config.disable_destroy_existing,
            client,
        })
    }
}

impl Unit for TmuxWindowUnit {
    fn activate(&self) -> anyhow::Result<Vec<String>> {
        let session = self.client.current_session()?;
        if session.is_empty() {
            bail!("no tmux session found; start tmux before activating {}", self.target);
        }
        // Killing the focused window would abort the rest of the activation
        if self.client.current_window().as_deref() == Some(self.target.as_str()) {
            tracing::warn!(
                "window {} is currently active, not reactivating it; switch windows first to rebuild it",
                self.target
            );
            return Ok(Vec::new());
        }
        let windows = self
            .client
            .list_windows()
            .context("could not list current tmux windows")?;

        let mut lines = Vec::new();
        for window in windows.iter().filter(|w| w.name == self.target) {
            if self.disable_destroy_existing {
                bail!(
                    "window {} already exists and disable_destroy_existing is set",
                    self.target
                );
            }
            lines.push(format!("tmux kill-window -t {}", window.id));
        }
        for (i, pane) in self.panes.iter().enumerate() {
            let dir = shell_quote(&pane.dir.to_string_lossy());
            if i == 0 {
                lines.push(format!(
                    "lastWindow=$(tmux new-window -P -c {} -n {})",
                    dir,
                    shell_quote(&self.target)
                ));
            } else {
                lines.push(format!(
                    r#"lastWindow=$(tmux split-window -P -c {} -t "${{lastWindow}}")"#,
                    dir
                ));
            }
            if !pane.commands.is_empty() {
                let joined = pane.commands.join(";");
                lines.push(format!(
                    r#"tmux send-keys -t "${{lastWindow}}" '{}' Enter"#,
                    joined.replace('\'', r"'\''")
                ));
            }
            // Re-apply every time; tmux refuses a split when panes get too small
            lines.push(format!(
                r#"tmux select-layout -t "${{lastWindow}}" {}"#,
                self.layout
            ));
        }
        Ok(lines)
    }

    fn deactivate(&self) -> anyhow::Result<Vec<String>> {
        Ok(Vec::new())
    }
}

pub fn construct(ctx: &ProjectContext, module: &Module) -> anyhow::Result<Box<dyn Unit>> {
    let config: TmuxWindowConfig = decode_config(module)?;
    Ok(Box::new(TmuxWindowUnit::new(ctx, config, Box::new(SystemTmux))?))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeTmux {
        session: String,
        current: Option<String>,
        windows: Vec<TmuxWindow>,
    }

    impl TmuxClient for FakeTmux {
        fn current_session(&self) -> anyhow::Result<String> {
            Ok(self.session.clone())
        }

        fn current_window(&self) -> Option<String> {
            self.current.clone()
        }

        fn list_windows(&self) -> anyhow::Result<Vec<TmuxWindow>> {
            Ok(self.windows.clone())
        }
    }

    fn fake(current: &str, windows: &[(&str, &str)]) -> Box<FakeTmux> {
        Box::new(FakeTmux {
            session: "main".to_string(),
            current: Some(current.to_string()),
            windows: windows
                .iter()
                .map(|(id, name)| TmuxWindow {
                    id: id.to_string(),
                    name: name.to_string(),
                })
                .collect(),
        })
    }

    fn two_pane_config() -> TmuxWindowConfig {
        TmuxWindowConfig {
            name: "dev".to_string(),
            panes: vec![
                TmuxPane {
                    root: String::new(),
                    commands: vec!["make watch".to_string(), "echo 'ok'".to_string()],
                },
                TmuxPane {
                    root: "logs".to_string(),
                    commands: Vec::new(),
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_builds_window_and_kills_existing() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let client = fake("zsh", &[("1", "zsh"), ("4", "web-dev")]);
        let unit = TmuxWindowUnit::new(&ctx, two_pane_config(), client).unwrap();
        let root = tmp.path().display().to_string();
        assert_eq!(
            unit.activate().unwrap(),
            vec![
                "tmux kill-window -t 4".to_string(),
                format!("lastWindow=$(tmux new-window -P -c {} -n web-dev)", root),
                r#"tmux send-keys -t "${lastWindow}" 'make watch;echo '\''ok'\''' Enter"#.to_string(),
                r#"tmux select-layout -t "${lastWindow}" tiled"#.to_string(),
                format!(
                    r#"lastWindow=$(tmux split-window -P -c {}/logs -t "${{lastWindow}}")"#,
                    root
                ),
                r#"tmux select-layout -t "${lastWindow}" tiled"#.to_string(),
            ]
        );
        assert!(unit.deactivate().unwrap().is_empty());
    }

    #[test]
    fn test_existing_window_with_reconciliation_disabled_errors() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let config = TmuxWindowConfig {
            disable_destroy_existing: true,
            ..two_pane_config()
        };
        let unit = TmuxWindowUnit::new(&ctx, config, fake("zsh", &[("4", "web-dev")])).unwrap();
        let err = unit.activate().unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_current_window_is_left_alone() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let client = fake("web-dev", &[("4", "web-dev")]);
        let unit = TmuxWindowUnit::new(&ctx, two_pane_config(), client).unwrap();
        assert!(unit.activate().unwrap().is_empty());
    }

    #[test]
    fn test_requires_session() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let client = Box::new(FakeTmux {
            session: String::new(),
            current: None,
            windows: Vec::new(),
        });
        let unit = TmuxWindowUnit::new(&ctx, two_pane_config(), client).unwrap();
        assert!(unit.activate().is_err());
    }

    #[test]
    fn test_default_pane_and_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let config = TmuxWindowConfig {
            name: "solo".to_string(),
            layout: Some("main-vertical".to_string()),
            ..Default::default()
        };
        let unit = TmuxWindowUnit::new(&ctx, config, fake("zsh", &[])).unwrap();
        let lines = unit.activate().unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("-n web-solo)"));
        assert!(lines[1].ends_with("main-vertical"));
    }

    #[test]
    fn test_name_is_required() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let module = Module::new("win", TYPE_TAG);
        assert!(construct(&ctx, &module).is_err());
    }

    #[test]
    fn test_parse_window_list() {
        let windows = parse_window_list("1|zsh\n2|web-dev\nbroken\n");
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[1], TmuxWindow { id: "2".to_string(), name: "web-dev".to_string() });
    }
}
