use serde::Deserialize;

use crate::{Globals, error::Result};

const DEFAULT_CONFIG_PATH: &str = "config/householdbook.toml";
const ENV_PREFIX: &str = "HOUSEHOLDBOOK";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    pub log_level: String,
    /// Acting username for every ledger operation.
    pub user: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite:./householdbook.db?mode=rwc".to_string(),
            log_level: "info".to_string(),
            user: None,
        }
    }
}

impl Settings {
    pub fn acting_user(&self) -> Result<&str> {
        self.user
            .as_deref()
            .filter(|user| !user.trim().is_empty())
            .ok_or(crate::error::AppError::MissingUser)
    }
}

/// File, then `HOUSEHOLDBOOK_*` environment, then command line flags.
pub fn load(globals: &Globals) -> Result<Settings> {
    let config_path = globals.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut settings: Settings = config::Config::builder()
        .add_source(config::File::with_name(config_path).required(globals.config.is_some()))
        .add_source(config::Environment::with_prefix(ENV_PREFIX))
        .build()?
        .try_deserialize()?;

    if let Some(database_url) = &globals.database_url {
        settings.database_url = database_url.clone();
    }
    if let Some(log_level) = &globals.log_level {
        settings.log_level = log_level.clone();
    }
    if let Some(user) = &globals.user {
        settings.user = Some(user.clone());
    }

    Ok(settings)
}
