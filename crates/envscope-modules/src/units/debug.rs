//! `debug`: trace every command while the environment is active.

use envscope_core::project::Module;

use super::Unit;
use crate::context::ProjectContext;

pub const TYPE_TAG: &str = "debug";

pub struct DebugUnit;

impl Unit for DebugUnit {
    fn activate(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec!["set -x".to_string()])
    }

    fn deactivate(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec!["set +x".to_string()])
    }
}

pub fn construct(_ctx: &ProjectContext, _module: &Module) -> anyhow::Result<Box<dyn Unit>> {
    Ok(Box::new(DebugUnit))
}
