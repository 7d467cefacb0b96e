//! 命令注册表：子命令在运行时才确定，处理器按名称和参数自行判断是否处理。
//!
//! 新增命令时：
//! 1. 在 cli.rs 的 `build_cli` 中添加子命令
//! 2. 在对应 dispatch 模块中调用 `reg.register(...)` 注册处理逻辑

use anyhow::{bail, Result};
use clap::ArgMatches;
use std::sync::Arc;

/// A parsed subcommand: its name and its own matches.
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub name: &'a str,
    pub matches: &'a ArgMatches,
}

/// 命令处理器：若匹配则返回 Some(退出码)，否则返回 None
pub type CommandHandler = Arc<dyn Fn(&Invocation<'_>) -> Option<Result<i32>> + Send + Sync>;

/// 命令注册表：按注册顺序尝试分发，第一个返回 Some 的处理器负责执行
pub struct CommandRegistry {
    handlers: Vec<CommandHandler>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn register<F>(&mut self, f: F)
    where
        F: Fn(&Invocation<'_>) -> Option<Result<i32>> + Send + Sync + 'static,
    {
        self.handlers.push(Arc::new(f));
    }

    /// 依次调用已注册的处理器，返回第一个匹配的结果
    pub fn dispatch(&self, invocation: &Invocation<'_>) -> Result<i32> {
        for h in &self.handlers {
            if let Some(r) = h(invocation) {
                return r;
            }
        }
        bail!("no handler registered for command {}", invocation.name)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
