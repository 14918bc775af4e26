//! Defaults file — ~/.config/reconsole/config.toml.
//!
//! Holds settings that predate login (the API base URL) so `reconsole login`
//! works without flags on a configured machine.

use std::path::PathBuf;

use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct Defaults {
    /// API base URL used when `login` is invoked without --api-base.
    #[serde(default)]
    pub api_base: Option<String>,
}

pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|c| c.join("reconsole/config.toml"))
}

/// Load defaults. A missing or unreadable file is just empty defaults; a
/// present-but-invalid file is reported so typos don't silently vanish.
pub fn load_defaults() -> Defaults {
    let Some(path) = config_file_path() else {
        return Defaults::default();
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Defaults::default();
    };
    match toml::from_str(&contents) {
        Ok(defaults) => defaults,
        Err(e) => {
            eprintln!("warning: ignoring invalid {}: {}", path.display(), e);
            Defaults::default()
        }
    }
}
