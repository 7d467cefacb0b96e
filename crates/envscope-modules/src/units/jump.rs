//! `jump`: cd into the project on activation, back to where we came from on deactivation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use envscope_core::paths::shell_quote;
use envscope_core::project::Module;

use super::{decode_config, Unit};
use crate::context::ProjectContext;

pub const TYPE_TAG: &str = "jump";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Defaults to the project root; relative paths resolve against it.
    pub to_dir: Option<String>,
    pub disable_jump_back: bool,
}

pub struct JumpUnit {
    to_dir: PathBuf,
    last_dir: Option<PathBuf>,
    disable_jump_back: bool,
}

impl JumpUnit {
    pub fn new(ctx: &ProjectContext, config: JumpConfig, last_dir: Option<PathBuf>) -> Self {
        let to_dir = match config.to_dir.as_deref().filter(|d| !d.is_empty()) {
            Some(dir) => ctx.root_path(dir),
            None => ctx.root_dir(),
        };
        Self {
            to_dir,
            last_dir,
            disable_jump_back: config.disable_jump_back,
        }
    }
}

impl Unit for JumpUnit {
    fn activate(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec![format!("cd {}", shell_quote(&self.to_dir.to_string_lossy()))])
    }

    fn deactivate(&self) -> anyhow::Result<Vec<String>> {
        match &self.last_dir {
            Some(dir) if !self.disable_jump_back => {
                Ok(vec![format!("cd {}", shell_quote(&dir.to_string_lossy()))])
            }
            _ => Ok(Vec::new()),
        }
    }
}

pub fn construct(ctx: &ProjectContext, module: &Module) -> anyhow::Result<Box<dyn Unit>> {
    let config: JumpConfig = decode_config(module)?;
    let last_dir = std::env::current_dir().ok();
    Ok(Box::new(JumpUnit::new(ctx, config, last_dir)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jumps_to_root_and_back() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let unit = JumpUnit::new(&ctx, JumpConfig::default(), Some(PathBuf::from("/home/me/src")));
        assert_eq!(unit.activate().unwrap(), vec![format!("cd {}", tmp.path().display())]);
        assert_eq!(unit.deactivate().unwrap(), vec!["cd /home/me/src"]);
    }

    #[test]
    fn test_to_dir_relative_to_root() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let config = JumpConfig {
            to_dir: Some("my app".to_string()),
            ..Default::default()
        };
        let unit = JumpUnit::new(&ctx, config, None);
        assert_eq!(
            unit.activate().unwrap(),
            vec![format!("cd '{}'", tmp.path().join("my app").display())]
        );
        assert!(unit.deactivate().unwrap().is_empty());
    }

    #[test]
    fn test_jump_back_disabled() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let config = JumpConfig {
            disable_jump_back: true,
            ..Default::default()
        };
        let unit = JumpUnit::new(&ctx, config, Some(PathBuf::from("/somewhere")));
        assert!(unit.deactivate().unwrap().is_empty());
    }
}
