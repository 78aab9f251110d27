use std::path::PathBuf;

use etcetera::{BaseStrategy, choose_base_strategy};

/// Name of the configuration file looked up in the user and project directories
pub const CONFIG_FILE_NAME: &str = "cjspack.toml";

/// Platform configuration directory for cjspack (e.g. `~/.config/cjspack`)
pub fn user_config_dir() -> Option<PathBuf> {
    choose_base_strategy()
        .ok()
        .map(|strategy| strategy.config_dir().join("cjspack"))
}

/// Full path of the user-level configuration file, whether or not it exists
pub fn user_config_file() -> Option<PathBuf> {
    user_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
