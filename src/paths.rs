use std::path::PathBuf;
use std::sync::OnceLock;

// trendlag keeps a single config file and no data directory. `dirs` picks
// the platform location (~/.config/trendlag on Linux, Application Support on
// macOS); the lookup result is cached for the life of the process.

static CONFIG_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Directory holding `config.toml`.
pub fn config_dir() -> &'static PathBuf {
    CONFIG_DIR.get_or_init(|| {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trendlag")
    })
}

/// Full path of the config file.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}
