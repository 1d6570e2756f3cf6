//! Runtime configuration for the attendance store.

use crate::error::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Where the database lives when nothing else is configured.
pub const DEFAULT_DATABASE_URL: &str = "attendance.db";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Path to the SQLite database file.
    pub database_url: String,
}

impl Settings {
    /// Loads settings from, in increasing priority: the built-in default, an optional `config.toml`
    /// in the working directory, and the environment (`DATABASE_URL`, also read from `.env`).
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::load_from("config", database_environment())
    }

    fn load_from(config_file: &str, environment: Environment) -> Result<Self> {
        let settings = Config::builder()
            .set_default("database_url", DEFAULT_DATABASE_URL)?
            .add_source(File::with_name(config_file).required(false))
            .add_source(environment)
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

/// Only `DATABASE_*` variables are read, keeping the prefix so `DATABASE_URL` maps to
/// `database_url`.
fn database_environment() -> Environment {
    Environment::with_prefix("DATABASE").keep_prefix(true)
}
