//! 统一配置层
//!
//! 所有环境变量读取集中在此模块，业务代码通过结构化配置访问，避免直接 `std::env::var`。
//!
//! - `loader`：env_or、env_optional、env_bool 等辅助函数
//! - `schema`：ObservabilityConfig、DiscoveryConfig、ShellHandoff
//! - `env_keys`：key 常量

pub mod env_keys;
pub mod loader;
pub mod schema;

pub use loader::{env_bool, env_is_set, env_optional, env_or, parse_dotenv};
pub use schema::{DiscoveryConfig, ObservabilityConfig, ShellHandoff};
