//! 命令分发：各领域命令的 register 逻辑。

mod builtin;
mod project;
mod script;

use std::sync::Arc;

use envscope_modules::ModuleRegistry;

use crate::catalog::Catalog;
use crate::command_registry::CommandRegistry;

/// Shared state handlers capture.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    pub catalog: Arc<Catalog>,
    pub modules: Arc<ModuleRegistry>,
}

/// 注册所有命令处理器
pub fn register_all(reg: &mut CommandRegistry, ctx: &DispatchContext) {
    builtin::register(reg);
    project::register(reg, ctx);
    script::register(reg, ctx);
}
