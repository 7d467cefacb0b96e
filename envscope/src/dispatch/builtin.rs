//! Fixed commands: version, shell-init.

use envscope_commands::shell_init;
use envscope_core::VERSION;

use crate::cli::{SHELL_INIT_COMMAND, VERSION_COMMAND};
use crate::command_registry::CommandRegistry;

pub fn register(reg: &mut CommandRegistry) {
    reg.register(|inv| {
        (inv.name == VERSION_COMMAND).then(|| {
            println!("{}", VERSION);
            Ok(0)
        })
    });

    reg.register(|inv| {
        (inv.name == SHELL_INIT_COMMAND).then(|| {
            println!("{}", shell_init::render());
            Ok(0)
        })
    });
}
