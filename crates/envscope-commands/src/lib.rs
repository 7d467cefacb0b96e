//! envscope commands: turn an orchestrator into files the shell sources, or into
//! a one-shot child process.

pub mod activate;
pub mod exec;
pub mod runner;
pub mod session;
pub mod shell_init;
