//! Dynamic CLI: one subcommand per discovered project and script.

use clap::{Arg, ArgAction, Args, Command};

use envscope_commands::session::SessionFlags;
use envscope_core::PROJECT_NAME;

use crate::catalog::Catalog;

pub const VERSION_COMMAND: &str = "version";
pub const SHELL_INIT_COMMAND: &str = "shell-init";
pub const VERBOSE_ARG: &str = "verbose";

/// Subcommand names a project cannot take. `help` is added by clap.
pub const RESERVED_COMMANDS: &[&str] = &[VERSION_COMMAND, SHELL_INIT_COMMAND, "help"];

/// Flags for `<project>`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectArgs {
    /// Reset the environment data before initializing
    #[arg(long)]
    pub reset: bool,

    /// Create a temp data dir for the session
    #[arg(long)]
    pub temp: bool,

    /// Print the root dir of the project
    #[arg(long)]
    pub print_root: bool,

    /// Run this command inside the environment instead of activating it
    #[arg(value_name = "CMD", trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

impl ProjectArgs {
    pub fn session(&self) -> SessionFlags {
        SessionFlags {
            reset: self.reset,
            temp: self.temp,
        }
    }
}

/// Flags for `<project>.<script>`.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptArgs {
    /// Reset the environment data before initializing
    #[arg(long)]
    pub reset: bool,

    /// Create a temp data dir for the session
    #[arg(long)]
    pub temp: bool,

    /// Print the path of the script
    #[arg(long)]
    pub print_path: bool,

    /// Arguments passed to the script
    #[arg(value_name = "ARGS", trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

impl ScriptArgs {
    pub fn session(&self) -> SessionFlags {
        SessionFlags {
            reset: self.reset,
            temp: self.temp,
        }
    }
}

pub fn build_cli(catalog: &Catalog) -> Command {
    let mut cli = Command::new(PROJECT_NAME)
        .about("Context managers for shell.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new(VERBOSE_ARG)
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand(Command::new(VERSION_COMMAND).about("Print the version"))
        .subcommand(Command::new(SHELL_INIT_COMMAND).about("Shell helper"));

    for entry in catalog.entries() {
        let name = entry.name().to_string();
        let about = format!("Activate environment {}", name);
        // augment_args installs the struct doc as `about`; set ours afterwards
        cli = cli.subcommand(ProjectArgs::augment_args(Command::new(name)).about(about));
        for script in entry.scripts() {
            let name = format!("{}.{}", entry.name(), script.subcommand);
            cli = cli.subcommand(
                ScriptArgs::augment_args(Command::new(name)).about(script.docstring.clone()),
            );
        }
    }
    cli
}

/// `-v` / `--verbose` anywhere before `--`. Checked before discovery so its
/// logs are visible.
pub fn verbose_requested<I, S>(args: I) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    for arg in args {
        let arg = arg.as_ref();
        if arg == "--" {
            break;
        }
        if arg == "-v" || arg == "--verbose" {
            return true;
        }
    }
    false
}
