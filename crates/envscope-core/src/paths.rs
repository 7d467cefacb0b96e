//! Path helpers shared by discovery, the store and the capability units.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::PROJECT_NAME;

/// Project, module and script names must match this.
pub const CLEAN_NAME_PATTERN: &str = r"^[a-z0-9_\-]+$";

pub fn clean_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(CLEAN_NAME_PATTERN).expect("clean name pattern is valid"))
}

pub fn is_clean_name(name: &str) -> bool {
    clean_name_re().is_match(name)
}

/// Config file looked for in git trees and the working directory.
pub fn default_config_filename() -> String {
    format!("{}.yaml", PROJECT_NAME)
}

/// `<dir>/.envscope`
pub fn dot_dir(dir: &Path) -> PathBuf {
    dir.join(format!(".{}", PROJECT_NAME))
}

/// `~/.envscope`, or `./.envscope` when no home dir can be determined.
pub fn default_global_dir() -> PathBuf {
    dot_dir(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
}

/// Expand a leading `~` or `~/`. Other paths are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Walk upward from `start` and return the first directory containing `marker`.
///
/// Stops after checking the filesystem root.
pub fn find_in_ancestors(start: &Path, marker: &str) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(marker).exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

/// Quote a value for a POSIX shell word when it needs it.
pub fn shell_quote(value: &str) -> String {
    let safe = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "/._-+:,@%=".contains(c));
    if safe {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_clean_names() {
        assert!(is_clean_name("web"));
        assert!(is_clean_name("my_proj-2"));
        assert!(!is_clean_name("Web"));
        assert!(!is_clean_name("a.b"));
        assert!(!is_clean_name(""));
    }

    #[test]
    fn test_find_in_ancestors() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a").join("b").join("c");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(tmp.path().join("a").join(".marker")).unwrap();

        let found = find_in_ancestors(&nested, ".marker").unwrap();
        assert_eq!(found, tmp.path().join("a"));
        assert!(find_in_ancestors(&nested, ".surely-not-a-marker-anywhere").is_none());
    }

    #[test]
    fn test_dot_dir_and_filename() {
        assert_eq!(dot_dir(Path::new("/x")), PathBuf::from("/x/.envscope"));
        assert_eq!(default_config_filename(), "envscope.yaml");
    }

    #[test]
    fn test_expand_home_passthrough() {
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
        assert_eq!(expand_home("rel/path"), PathBuf::from("rel/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/x"), home.join("x"));
        }
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/tmp/a-b_c"), "/tmp/a-b_c");
        assert_eq!(shell_quote("/tmp/with space"), "'/tmp/with space'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(shell_quote(""), "''");
    }
}
