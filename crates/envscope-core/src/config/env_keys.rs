//! 环境变量 key 常量
//!
//! 主变量统一使用 `ENVSCOPE_*` 前缀。

/// 可观测性与日志
pub mod observability {
    pub const ENVSCOPE_LOG_LEVEL: &str = "ENVSCOPE_LOG_LEVEL";
    pub const LOG_LEVEL_ALIASES: &[&str] = &[];

    pub const ENVSCOPE_LOG_JSON: &str = "ENVSCOPE_LOG_JSON";
    pub const LOG_JSON_ALIASES: &[&str] = &[];
}

/// Shell 集成：shell-init 生成的函数通过这两个变量传入临时文件路径
pub mod shell {
    pub const ENVSCOPE_ACTIVATE_FILE: &str = "ENVSCOPE_ACTIVATE_FILE";
    pub const ENVSCOPE_DEACTIVATE_FILE: &str = "ENVSCOPE_DEACTIVATE_FILE";
}

/// 配置发现与历史记录
pub mod discovery {
    pub const ENVSCOPE_DISABLE_CONFIG_HISTORY: &str = "ENVSCOPE_DISABLE_CONFIG_HISTORY";

    /// 覆盖全局目录（默认 `~/.envscope`）
    pub const ENVSCOPE_HOME: &str = "ENVSCOPE_HOME";

    /// 任一存在即视为 CI 环境，此时不读写历史文件
    pub const CI_MARKERS: &[&str] = &["CI", "JENKINS_URL"];
}
