//! `shell-init`: the wrapper function users eval from their shell rc file.

use envscope_core::config::env_keys::shell::{ENVSCOPE_ACTIVATE_FILE, ENVSCOPE_DEACTIVATE_FILE};
use envscope_core::PROJECT_NAME;

/// Name of the shell function that sources the saved deactivation script.
pub const DEACTIVATE_FUNCTION: &str = "devenv";

/// Line users add to `.bashrc` / `.zshrc`.
pub fn eval_helper() -> String {
    format!("eval \"$({} shell-init)\"", PROJECT_NAME)
}

/// Shell code defining a `PROJECT_NAME` function that wraps the binary.
///
/// The wrapper runs the binary once with both handoff paths set. If it wrote
/// an activation script, the previous environment is torn down, the binary runs
/// again so the new scripts see the restored state, and the result is sourced.
/// Re-evaluating is a no-op once the function exists.
pub fn render() -> String {
    let name = PROJECT_NAME;
    let act = ENVSCOPE_ACTIVATE_FILE;
    let deact = ENVSCOPE_DEACTIVATE_FILE;
    let off = DEACTIVATE_FUNCTION;
    format!(
        r#"
current_cmd_type=$(command -V {name});
if [ "${{current_cmd_type#*function}}" = "$current_cmd_type" ]; then
	original_{name}_cmd=$(command -v {name});
	{name}() {{
		activate_f=$(mktemp);
		deactivate_f=$(mktemp);
		env {act}="${{activate_f}}" {deact}="${{deactivate_f}}" "${{original_{name}_cmd}}" "$@" || return $?;
		if [ -s "${{activate_f}}" ]; then
			{off} || true;
			env {act}="${{activate_f}}" {deact}="${{deactivate_f}}" "${{original_{name}_cmd}}" "$@" || return $?;
			export ENVSCOPE_DEACTIVATE_F="${{deactivate_f}}";
			. "${{activate_f}}" || return $?;
		fi;
		rm "${{activate_f}}" > /dev/null 2>&1 || true;
		unset activate_f;
		unset deactivate_f;
	}};
	{off}() {{
		if [ -n "${{ENVSCOPE_DEACTIVATE_F}}" ] && [ -s "${{ENVSCOPE_DEACTIVATE_F}}" ]; then
			. "${{ENVSCOPE_DEACTIVATE_F}}" || return $?;
		fi;
		rm "${{ENVSCOPE_DEACTIVATE_F}}" > /dev/null 2>&1 || true;
		unset ENVSCOPE_DEACTIVATE_F;
	}};
fi;
"#
    )
}
