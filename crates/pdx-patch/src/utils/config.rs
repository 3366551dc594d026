//! Application configuration management utilities.

use crate::errors::CliError;
use camino::Utf8PathBuf;
use pdx_conflict::PatchStateMode;
use pdx_script::{GameRegistry, GameType};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

const CONFIG_FILE: &str = "config.toml";
const DEFAULT_COLLECTION: &str = "default";

/// Application-wide configuration stored in config.toml.
///
/// ```toml
/// game = "stellaris"
/// mods_root = "/home/me/.local/share/Paradox Interactive/Stellaris/mod"
/// load_order = ["first_mod", "second_mod"]
/// collection = "My Collection"
/// mode = "default"
/// ignored_paths = "gfx/\nmodName:Some Mod"
/// ```
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub game: Option<String>,
    pub mods_root: Option<Utf8PathBuf>,
    /// Where the patch mod is written. Defaults to `mods_root`.
    pub patch_root: Option<Utf8PathBuf>,
    /// Mod directory names under `mods_root`, first loaded first.
    pub load_order: Vec<String>,
    pub collection: Option<String>,
    pub mode: PatchStateMode,
    pub ignored_paths: String,
}

impl AppConfig {
    pub fn game_type(&self) -> Result<GameType, CliError> {
        let key = self
            .game
            .as_deref()
            .ok_or_else(|| CliError::missing_setting("game", "set-game <game>"))?;
        lookup_game(key)
    }

    pub fn mods_root(&self) -> Result<Utf8PathBuf, CliError> {
        self.mods_root
            .clone()
            .ok_or_else(|| CliError::missing_setting("mods_root", "set-mods-root <path>"))
    }

    pub fn patch_root(&self) -> Result<Utf8PathBuf, CliError> {
        match &self.patch_root {
            Some(root) => Ok(root.clone()),
            None => self.mods_root(),
        }
    }

    pub fn collection(&self) -> &str {
        self.collection.as_deref().unwrap_or(DEFAULT_COLLECTION)
    }

    /// Mod directories in load order.
    pub fn mod_dirs(&self) -> Result<Vec<Utf8PathBuf>, CliError> {
        if self.load_order.is_empty() {
            return Err(CliError::EmptyLoadOrder);
        }
        let root = self.mods_root()?;
        self.load_order
            .iter()
            .map(|name| {
                let dir = root.join(name);
                if dir.as_std_path().is_dir() {
                    Ok(dir)
                } else {
                    Err(CliError::mod_directory_missing(dir))
                }
            })
            .collect()
    }
}

/// Find a built-in game by key.
pub fn lookup_game(key: &str) -> Result<GameType, CliError> {
    let registry = GameRegistry::builtin();
    registry.get(key).cloned().ok_or_else(|| {
        let known = registry
            .games()
            .iter()
            .map(|g| g.key)
            .collect::<Vec<_>>()
            .join(", ");
        CliError::unknown_game(key.to_string(), known)
    })
}

/// Parse a mode name such as `advanced` or `readOnlyWithoutLocalization`.
pub fn parse_mode(mode: &str) -> Result<PatchStateMode, CliError> {
    serde_json::from_value(serde_json::Value::String(mode.to_string()))
        .map_err(|_| CliError::invalid_mode(mode.to_string()))
}

/// Returns the directory where the current executable resides.
pub fn install_dir() -> Option<Utf8PathBuf> {
    let exe = env::current_exe().ok()?;
    let parent = exe.parent()?;
    Utf8PathBuf::from_path_buf(parent.to_path_buf()).ok()
}

/// Returns the config file path: the explicit one, or config.toml next to the
/// executable.
pub fn config_path(explicit: Option<&str>) -> Result<Utf8PathBuf, CliError> {
    match explicit {
        Some(path) => Ok(Utf8PathBuf::from(path)),
        None => install_dir()
            .map(|dir| dir.join(CONFIG_FILE))
            .ok_or(CliError::ConfigLocationUnknown),
    }
}

/// Loads the configuration. Returns defaults if the file doesn't exist.
pub fn load_config(path: &Utf8PathBuf) -> Result<AppConfig, CliError> {
    if !Path::new(path.as_str()).exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(path.as_str())?;
    toml::from_str(&content).map_err(|e| CliError::config_parse_error(path.clone(), Box::new(e)))
}

/// Saves the configuration, creating parent directories if needed.
pub fn save_config(path: &Utf8PathBuf, cfg: &AppConfig) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        if !parent.as_str().is_empty() {
            fs::create_dir_all(parent.as_str())?;
        }
    }
    let content = toml::to_string_pretty(cfg)
        .map_err(|e| CliError::config_parse_error(path.clone(), Box::new(e)))?;
    fs::write(path.as_str(), content)?;
    Ok(())
}
