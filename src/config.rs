use std::fs;
use std::path::{Path, PathBuf};

use log::{LevelFilter, warn};
use serde::Deserialize;

const CONFIG_FILE: &str = "~/.rayshellrc";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_history_file")]
    pub history_file: String,
    #[serde(default = "default_history_max_len")]
    pub history_max_len: usize,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_history_file() -> String {
    "~/.rayshell_history".to_string()
}

fn default_history_max_len() -> usize {
    500
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
            history_max_len: default_history_max_len(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let path = shellexpand::tilde(CONFIG_FILE).into_owned();
        Self::load_from(Path::new(&path))
    }

    // Missing file: defaults. Malformed file: defaults, with a warning,
    // so a typo in the rc file never locks the user out of the shell.
    pub fn load_from(path: &Path) -> Self {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&text) {
            Ok(config) => config,
            Err(e) => {
                warn!("ignoring malformed config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn history_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.history_file).into_owned())
    }

    pub fn log_level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Warn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rayshellrc");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = Config::load_from(Path::new("/definitely/not/here.toml"));
        assert_eq!(config.history_file, "~/.rayshell_history");
        assert_eq!(config.history_max_len, 500);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let (_dir, path) = write_config("history_max_len = 42\n");
        let config = Config::load_from(&path);
        assert_eq!(config.history_max_len, 42);
        assert_eq!(config.history_file, "~/.rayshell_history");
    }

    #[test]
    fn test_full_file() {
        let (_dir, path) = write_config(
            "history_file = \"/tmp/h\"\nhistory_max_len = 9\nlog_level = \"debug\"\n",
        );
        let config = Config::load_from(&path);
        assert_eq!(config.history_file, "/tmp/h");
        assert_eq!(config.history_max_len, 9);
        assert_eq!(config.log_level_filter(), LevelFilter::Debug);
    }

    #[test]
    fn test_malformed_file_falls_back_to_defaults() {
        let (_dir, path) = write_config("history_max_len = \"not a number\"\n");
        let config = Config::load_from(&path);
        assert_eq!(config.history_max_len, 500);
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_warn() {
        let config = Config {
            log_level: "chatty".to_string(),
            ..Config::default()
        };
        assert_eq!(config.log_level_filter(), LevelFilter::Warn);
    }

    #[test]
    fn test_history_path_without_tilde_is_verbatim() {
        let config = Config {
            history_file: "/var/tmp/hist".to_string(),
            ..Config::default()
        };
        assert_eq!(config.history_path(), PathBuf::from("/var/tmp/hist"));
    }
}
