//! 统一环境变量加载逻辑
//!
//! 集中维护 fallback 链，避免在业务代码中重复 `or_else` 调用。

use std::env;

/// 解析 dotenv 文本为有序的 (key, value) 列表
///
/// 支持 `#` 注释、行尾注释（不在引号内）、可选的 `export ` 前缀和成对引号。
pub fn parse_dotenv(content: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").map(str::trim_start).unwrap_or(line);
        let Some(eq_pos) = line.find('=') else {
            continue;
        };
        let key = line[..eq_pos].trim();
        let mut value = line[eq_pos + 1..].trim();
        // Strip inline comment (# not inside quotes)
        if let Some(hash_pos) = value.find('#') {
            let before_hash = value[..hash_pos].trim_end();
            if !before_hash.contains('"') && !before_hash.contains('\'') {
                value = before_hash;
            }
        }
        if value.len() >= 2
            && ((value.starts_with('"') && value.ends_with('"'))
                || (value.starts_with('\'') && value.ends_with('\'')))
        {
            value = &value[1..value.len() - 1];
        }
        if !key.is_empty() {
            pairs.push((key.to_string(), value.to_string()));
        }
    }
    pairs
}

/// 从主变量或别名链读取环境变量，失败时使用默认值
pub fn env_or<F>(primary: &str, aliases: &[&str], default: F) -> String
where
    F: FnOnce() -> String,
{
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(default)
}

/// 从主变量或别名链读取，返回 Option（空值视为未设置）
pub fn env_optional(primary: &str, aliases: &[&str]) -> Option<String> {
    env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()))
        .and_then(|s| {
            let s = s.trim().to_string();
            if s.is_empty() {
                None
            } else {
                Some(s)
            }
        })
}

/// 解析布尔型环境变量：0/false/no/off 为 false，其余已设置的值为 true
pub fn env_bool(primary: &str, aliases: &[&str], default: bool) -> bool {
    let v = env::var(primary)
        .ok()
        .or_else(|| aliases.iter().find_map(|a| env::var(a).ok()));
    match v.as_deref() {
        Some(s) => !matches!(
            s.trim().to_lowercase().as_str(),
            "0" | "false" | "no" | "off"
        ),
        None => default,
    }
}

/// 检查环境变量是否存在（任意主变量或别名，空值也算存在）
pub fn env_is_set(primary: &str, aliases: &[&str]) -> bool {
    env::var_os(primary).is_some() || aliases.iter().any(|a| env::var_os(a).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotenv() {
        let text = "# comment\nA=1\nexport B = \"two words\"\nC='x#y'\nD=plain # trailing\nbroken\n\nE=\n";
        let pairs = parse_dotenv(text);
        let expected: Vec<(String, String)> = [
            ("A", "1"),
            ("B", "two words"),
            ("C", "x#y"),
            ("D", "plain"),
            ("E", ""),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_env_or_falls_back_to_default() {
        let v = env_or("ENVSCOPE_TEST_SURELY_UNSET_1", &[], || "fallback".to_string());
        assert_eq!(v, "fallback");
    }

    #[test]
    fn test_env_optional_unset_is_none() {
        assert!(
            env_optional("ENVSCOPE_TEST_SURELY_UNSET_2", &["ENVSCOPE_TEST_SURELY_UNSET_3"]).is_none()
        );
    }

    #[test]
    fn test_env_bool_default_when_unset() {
        assert!(env_bool("ENVSCOPE_TEST_SURELY_UNSET_4", &[], true));
        assert!(!env_bool("ENVSCOPE_TEST_SURELY_UNSET_4", &[], false));
    }

    #[test]
    fn test_env_is_set_reads_aliases() {
        // PATH is present in any sane test environment
        assert!(env_is_set("ENVSCOPE_TEST_SURELY_UNSET_5", &["PATH"]));
        assert!(!env_is_set("ENVSCOPE_TEST_SURELY_UNSET_5", &[]));
    }
}
