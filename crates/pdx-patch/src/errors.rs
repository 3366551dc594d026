use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    #[error("Configuration file error: {path}")]
    #[diagnostic(
        code(config::parse_error),
        help("Check your config.toml file for syntax errors")
    )]
    ConfigParseError {
        path: Utf8PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Could not determine the config file location")]
    #[diagnostic(
        code(config::no_location),
        help("Pass an explicit path with --config")
    )]
    ConfigLocationUnknown,

    #[error("Missing setting: {name}")]
    #[diagnostic(code(config::missing_setting), help("Run 'pdx-patch config {command}' first"))]
    MissingSetting {
        name: &'static str,
        command: &'static str,
    },

    #[error("Unknown game: {game}")]
    #[diagnostic(code(config::unknown_game), help("Known games: {known}"))]
    UnknownGame { game: String, known: String },

    #[error("Invalid patch mode: {mode}")]
    #[diagnostic(
        code(config::invalid_mode),
        help("Use one of: none, default, advanced, readOnly, defaultWithoutLocalization, advancedWithoutLocalization, readOnlyWithoutLocalization")
    )]
    InvalidMode { mode: String },

    #[error("The load order is empty")]
    #[diagnostic(
        code(config::empty_load_order),
        help("Run 'pdx-patch config set-load-order <mod>...' with the mod directory names in load order")
    )]
    EmptyLoadOrder,

    #[error("Mod directory not found: {path}")]
    #[diagnostic(
        code(file::mod_not_found),
        help("Make sure the directory exists under the configured mods root")
    )]
    ModDirectoryMissing { path: Utf8PathBuf },

    #[error(transparent)]
    #[diagnostic(code(conflict::engine))]
    Conflict(#[from] pdx_conflict::Error),

    #[error("IO operation failed")]
    #[diagnostic(code(io::operation_failed))]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn config_parse_error(
        path: Utf8PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::ConfigParseError { path, source }
    }

    pub fn missing_setting(name: &'static str, command: &'static str) -> Self {
        Self::MissingSetting { name, command }
    }

    pub fn unknown_game(game: String, known: String) -> Self {
        Self::UnknownGame { game, known }
    }

    pub fn invalid_mode(mode: String) -> Self {
        Self::InvalidMode { mode }
    }

    pub fn mod_directory_missing(path: Utf8PathBuf) -> Self {
        Self::ModDirectoryMissing { path }
    }
}
