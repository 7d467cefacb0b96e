//! `exec`: replay literal commands. Also carries one-shot commands and script
//! subcommands run through the exec wrapper.

use serde::{Deserialize, Serialize};

use envscope_core::project::Module;

use super::{decode_config, Unit};
use crate::context::ProjectContext;

pub const TYPE_TAG: &str = "exec";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    pub activation_commands: Vec<String>,
    pub deactivation_commands: Vec<String>,
}

impl ExecConfig {
    /// Module declaration that runs a single command on activation.
    pub fn one_shot_module(name: &str, command: &str) -> anyhow::Result<Module> {
        let config = Self {
            activation_commands: vec![command.to_string()],
            deactivation_commands: Vec::new(),
        };
        Ok(Module::new(name, TYPE_TAG).with_config(serde_json::to_value(config)?))
    }
}

pub struct ExecUnit {
    config: ExecConfig,
}

impl Unit for ExecUnit {
    fn activate(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.config.activation_commands.clone())
    }

    fn deactivate(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.config.deactivation_commands.clone())
    }
}

pub fn construct(_ctx: &ProjectContext, module: &Module) -> anyhow::Result<Box<dyn Unit>> {
    Ok(Box::new(ExecUnit {
        config: decode_config(module)?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_commands_verbatim() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = crate::context::test_context(tmp.path(), "web");
        let module = Module::new("e", TYPE_TAG).with_config(serde_json::json!({
            "activation_commands": ["make up", "echo 'hi' | tee log"],
            "deactivation_commands": ["make down"],
        }));
        let unit = construct(&ctx, &module).unwrap();
        assert_eq!(unit.activate().unwrap(), vec!["make up", "echo 'hi' | tee log"]);
        assert_eq!(unit.deactivate().unwrap(), vec!["make down"]);
    }

    #[test]
    fn test_one_shot_module() {
        let module = ExecConfig::one_shot_module("exec_subcommand", "pytest -x").unwrap();
        let cfg: ExecConfig = decode_config(&module).unwrap();
        assert_eq!(cfg.activation_commands, vec!["pytest -x"]);
        assert!(cfg.deactivation_commands.is_empty());
    }
}
