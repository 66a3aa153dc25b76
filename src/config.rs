// config.rs
use std::env;

use crate::errors::{AppError, Result};

pub const DEFAULT_RECENT_BALLS_WINDOW: usize = 12;
pub const MAX_RECENT_BALLS_WINDOW: usize = 36;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// MongoDB connection string. When unset the service keeps scores in memory.
    pub database_url: Option<String>,
    pub database_name: String,
    pub port: u16,
    pub host: String,
    /// How many times a version-conditional innings write is retried.
    pub max_write_retries: u32,
    pub recent_balls_window: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: None,
            database_name: "scorerdb".to_string(),
            port: 10000,
            host: "0.0.0.0".to_string(),
            max_write_retries: 5,
            recent_balls_window: DEFAULT_RECENT_BALLS_WINDOW,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = AppConfig::default();

        let recent_balls_window: usize =
            parse_var("RECENT_BALLS_WINDOW", defaults.recent_balls_window)?;
        if recent_balls_window == 0 || recent_balls_window > MAX_RECENT_BALLS_WINDOW {
            return Err(AppError::configuration(format!(
                "RECENT_BALLS_WINDOW must be between 1 and {}",
                MAX_RECENT_BALLS_WINDOW
            )));
        }

        Ok(AppConfig {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            database_name: env::var("DATABASE_NAME").unwrap_or(defaults.database_name),
            port: parse_var("PORT", defaults.port)?,
            host: env::var("HOST").unwrap_or(defaults.host),
            max_write_retries: parse_var("MAX_WRITE_RETRIES", defaults.max_write_retries)?,
            recent_balls_window,
        })
    }

    pub fn uses_database(&self) -> bool {
        self.database_url.is_some()
    }

    pub fn get_config_info(&self) -> serde_json::Value {
        serde_json::json!({
            "database_configured": self.uses_database(),
            "database_name": self.database_name,
            "max_write_retries": self.max_write_retries,
            "recent_balls_window": self.recent_balls_window,
            "port": self.port,
            "host": self.host,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::configuration(format!("{} must be a number, got '{}'", name, raw))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_scores_in_memory() {
        let config = AppConfig::default();
        assert!(!config.uses_database());
        assert_eq!(config.recent_balls_window, DEFAULT_RECENT_BALLS_WINDOW);
        assert_eq!(config.get_config_info()["database_configured"], false);
    }

    #[test]
    fn parse_var_falls_back_to_default() {
        let value: u32 = parse_var("CRICKET_SCORER_SURELY_UNSET_VAR", 7).unwrap();
        assert_eq!(value, 7);
    }
}
