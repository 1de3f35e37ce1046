//! XDG Base Directory paths for adaptest.
//!
//! The CLI resolves its config file and its session store through XDG paths
//! on every platform, so a catalog and its sessions live in the same place on
//! Linux and macOS.

use std::path::PathBuf;

const APP_DIR: &str = "adaptest";

/// Get the adaptest config directory.
///
/// Returns `$XDG_CONFIG_HOME/adaptest` if set, otherwise `~/.config/adaptest`.
///
/// # Examples
///
/// ```
/// use adaptest_paths::config_dir;
///
/// let config = config_dir();
/// let config_file = config.join("config.toml");
/// ```
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg_config).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".config").join(APP_DIR)
    } else {
        PathBuf::from(".config").join(APP_DIR)
    }
}

/// Get the adaptest data directory.
///
/// Returns `$XDG_DATA_HOME/adaptest` if set, otherwise `~/.local/share/adaptest`.
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg_data).join(APP_DIR)
    } else if let Some(home) = dirs::home_dir() {
        home.join(".local/share").join(APP_DIR)
    } else {
        PathBuf::from(".local/share").join(APP_DIR)
    }
}

/// Directory holding one JSON document per session.
pub fn sessions_dir() -> PathBuf {
    data_dir().join("sessions")
}

/// User-level config file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_ends_with_adaptest() {
        let path = config_dir();
        assert!(
            path.ends_with("adaptest"),
            "config_dir should end with 'adaptest'"
        );
    }

    #[test]
    fn test_sessions_dir_is_under_data_dir() {
        assert!(sessions_dir().ends_with("adaptest/sessions"));
    }

    #[test]
    fn test_config_file_name() {
        assert!(config_file().ends_with("adaptest/config.toml"));
    }

    #[test]
    fn test_dirs_respect_xdg_env() {
        unsafe {
            std::env::set_var("XDG_CONFIG_HOME", "/tmp/test-config");
            std::env::set_var("XDG_DATA_HOME", "/tmp/test-data");
        }
        assert_eq!(config_dir(), PathBuf::from("/tmp/test-config/adaptest"));
        assert_eq!(data_dir(), PathBuf::from("/tmp/test-data/adaptest"));
        unsafe {
            std::env::remove_var("XDG_CONFIG_HOME");
            std::env::remove_var("XDG_DATA_HOME");
        }
    }
}
