//! 结构化配置：从环境变量读取一次后缓存

use std::path::PathBuf;

use super::env_keys::{discovery as disc_keys, observability as obv_keys, shell as shell_keys};
use super::loader::{env_bool, env_is_set, env_optional, env_or};

/// 日志配置
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_json: bool,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            let log_level = env_or(
                obv_keys::ENVSCOPE_LOG_LEVEL,
                obv_keys::LOG_LEVEL_ALIASES,
                || "envscope=error".to_string(),
            );
            let log_json = env_bool(obv_keys::ENVSCOPE_LOG_JSON, obv_keys::LOG_JSON_ALIASES, false);
            Self {
                log_level,
                log_json,
            }
        })
    }
}

/// 配置发现相关开关
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// 是否读写 `seen_configs.json`
    pub use_history: bool,
    /// 全局目录，默认 `~/.envscope`
    pub global_dir: PathBuf,
}

impl DiscoveryConfig {
    pub fn from_env() -> Self {
        let disabled = env_optional(disc_keys::ENVSCOPE_DISABLE_CONFIG_HISTORY, &[]).is_some();
        if disabled {
            tracing::debug!(
                "not using config history because {} is set",
                disc_keys::ENVSCOPE_DISABLE_CONFIG_HISTORY
            );
        }
        let in_ci = disc_keys::CI_MARKERS.iter().any(|k| env_is_set(k, &[]));
        if in_ci {
            tracing::debug!("not using config history, CI environment detected");
        }
        let global_dir = env_optional(disc_keys::ENVSCOPE_HOME, &[])
            .map(PathBuf::from)
            .unwrap_or_else(crate::paths::default_global_dir);
        Self {
            use_history: !disabled && !in_ci,
            global_dir,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.global_dir.join(crate::discovery::HISTORY_FILENAME)
    }
}

/// shell-init 包装函数传入的两个脚本路径；两者都设置时才视为可用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellHandoff {
    pub activate_file: PathBuf,
    pub deactivate_file: PathBuf,
}

impl ShellHandoff {
    pub fn from_env() -> Option<Self> {
        let activate = env_optional(shell_keys::ENVSCOPE_ACTIVATE_FILE, &[])?;
        let deactivate = env_optional(shell_keys::ENVSCOPE_DEACTIVATE_FILE, &[])?;
        Some(Self {
            activate_file: PathBuf::from(activate),
            deactivate_file: PathBuf::from(deactivate),
        })
    }
}
