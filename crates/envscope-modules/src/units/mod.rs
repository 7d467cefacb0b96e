//! Built-in capability units.

pub mod debug;
pub mod envvar;
pub mod exec;
pub mod jump;
pub mod prompt;
pub mod python;
pub mod tmux;

use anyhow::Context;
use serde::de::DeserializeOwned;

use envscope_core::project::Module;

/// A module instance: contributes shell lines to the activation and deactivation scripts.
///
/// Lines are plain POSIX shell statements. The orchestrator chains them so the first
/// failing statement aborts the rest.
pub trait Unit: Send + Sync {
    fn activate(&self) -> anyhow::Result<Vec<String>>;
    fn deactivate(&self) -> anyhow::Result<Vec<String>>;
}

/// Decode a module's `config` payload. Absent or null yields the type's defaults.
pub fn decode_config<T: DeserializeOwned + Default>(module: &Module) -> anyhow::Result<T> {
    if module.config.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(module.config.clone())
        .with_context(|| format!("invalid config for {} module {}", module.kind, module.name))
}

/// Escape a literal for use inside double quotes.
pub(crate) fn double_quote_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '"' | '$' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_null_gives_defaults() {
        let module = Module::new("e", "exec");
        let cfg: exec::ExecConfig = decode_config(&module).unwrap();
        assert!(cfg.activation_commands.is_empty());
    }

    #[test]
    fn test_decode_malformed_payload_errors() {
        let module = Module::new("e", "exec")
            .with_config(serde_json::json!({"activation_commands": "not a list"}));
        let err = decode_config::<exec::ExecConfig>(&module).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid config for exec module e"));
    }

    #[test]
    fn test_double_quote_escape() {
        assert_eq!(double_quote_escape(r#"a "b" $c `d` \e"#), r#"a \"b\" \$c \`d\` \\e"#);
    }
}
