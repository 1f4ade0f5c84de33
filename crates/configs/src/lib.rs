//! # configs
//!
//! Layered settings for the Streamer Bingo binary. Sources, later wins:
//! built-in defaults, `config/default.toml`, `config/local.toml`, then
//! `BINGO__SECTION__KEY` environment variables (a `.env` file is loaded
//! into the environment first).

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

pub const ENV_PREFIX: &str = "BINGO";
pub const DEFAULT_SESSION_SALT: &str = "change-me";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub auth: AuthSettings,
    pub board: BoardSettings,
}

#[derive(Debug, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// Mixed into stored session digests.
    pub session_salt: SecretString,
    /// Display names allowed to manage every page.
    #[serde(default)]
    pub super_admins: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct BoardSettings {
    pub free_space_label: String,
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, SettingsError> {
    Ok(Config::builder()
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("database.url", "sqlite:streamer_bingo.db")?
        .set_default("auth.session_salt", DEFAULT_SESSION_SALT)?
        .set_default("auth.super_admins", Vec::<String>::new())?
        .set_default("board.free_space_label", "Free Space")?)
}

/// Deserializes `builder` on top of the built-in defaults.
pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Settings, SettingsError> {
    let mut merged = defaults()?;
    merged = merged.add_source(builder.build()?);
    Ok(merged.build()?.try_deserialize()?)
}

/// Loads settings from the working directory and the environment.
pub fn load() -> Result<Settings, SettingsError> {
    if let Ok(path) = dotenvy::dotenv() {
        log::debug!("loaded environment from {}", path.display());
    }

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name("config/local").required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("auth.super_admins")
                .try_parsing(true),
        );
    from_builder(builder)
}
