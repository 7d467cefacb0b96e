//! `ps1`: prefix the shell prompt with a colorized `[envscope:<project>]` tag.
//!
//! The shell flavor is detected when the script runs, not when it is generated.

use serde::{Deserialize, Serialize};

use envscope_core::project::Module;
use envscope_core::PROJECT_NAME;

use super::{decode_config, Unit};
use crate::context::ProjectContext;

pub const TYPE_TAG: &str = "ps1";

const ESC: &str = "\x1b";
const FG_HI_GREEN: u8 = 92;
const FG_HI_BLUE: u8 = 94;
const FG_HI_MAGENTA: u8 = 95;
const FG_HI_CYAN: u8 = 96;
const RESET: u8 = 0;

/// Markers around zero-width sequences so prompt length math stays right.
#[derive(Debug, Clone, Copy)]
struct NoPrint {
    start: &'static str,
    end: &'static str,
}

const GENERIC: NoPrint = NoPrint { start: "", end: "" };
const BASH: NoPrint = NoPrint { start: "\\[", end: "\\]" };
const ZSH: NoPrint = NoPrint { start: "%{", end: "%}" };

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub value: Option<String>,
    pub bash_value: Option<String>,
    pub zsh_value: Option<String>,
}

fn colored(text: &str, color: u8, markers: NoPrint) -> String {
    format!(
        "{start}{ESC}[{color}m{end}{text}{start}{ESC}[{RESET}m{end}",
        start = markers.start,
        end = markers.end,
    )
}

/// `[envscope:<project>]` with per-segment colors.
pub fn default_fragment(project: &str, markers_for: &str) -> String {
    let markers = match markers_for {
        "bash" => BASH,
        "zsh" => ZSH,
        _ => GENERIC,
    };
    [
        colored("[", FG_HI_CYAN, markers),
        colored(PROJECT_NAME, FG_HI_BLUE, markers),
        colored(":", FG_HI_GREEN, markers),
        colored(project, FG_HI_MAGENTA, markers),
        colored("]", FG_HI_CYAN, markers),
    ]
    .concat()
}

pub struct PromptUnit {
    generic: String,
    bash: String,
    zsh: String,
}

impl PromptUnit {
    pub fn new(project: &str, config: PromptConfig) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        match non_empty(config.value) {
            None => Self {
                generic: default_fragment(project, "generic"),
                bash: non_empty(config.bash_value)
                    .unwrap_or_else(|| default_fragment(project, "bash")),
                zsh: non_empty(config.zsh_value)
                    .unwrap_or_else(|| default_fragment(project, "zsh")),
            },
            Some(value) => Self {
                bash: non_empty(config.bash_value).unwrap_or_else(|| value.clone()),
                zsh: non_empty(config.zsh_value).unwrap_or_else(|| value.clone()),
                generic: value,
            },
        }
    }
}

impl Unit for PromptUnit {
    fn activate(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec![
            r#"export OLD_PS1="$PS1""#.to_string(),
            format!(r#"GENERIC_PS1="{}""#, self.generic),
            format!(r#"BASH_PS1="{}""#, self.bash),
            format!(r#"ZSH_PS1="{}""#, self.zsh),
            concat!(
                r#"if [ -n "$ZSH_VERSION" ]; then export PS1="$ZSH_PS1 $PS1"; "#,
                r#"elif [ -n "$BASH_VERSION" ]; then export PS1="$BASH_PS1 $PS1"; "#,
                r#"else export PS1="$GENERIC_PS1 $PS1"; fi"#
            )
            .to_string(),
        ])
    }

    fn deactivate(&self) -> anyhow::Result<Vec<String>> {
        Ok(vec![
            r#"if [ -n "$OLD_PS1" ]; then export PS1="$OLD_PS1"; unset OLD_PS1; fi"#.to_string(),
        ])
    }
}

pub fn construct(ctx: &ProjectContext, module: &Module) -> anyhow::Result<Box<dyn Unit>> {
    let config: PromptConfig = decode_config(module)?;
    Ok(Box::new(PromptUnit::new(ctx.name(), config)))
}
