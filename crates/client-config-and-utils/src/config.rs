//! Configuration for the client runtime.
//!
//! The provider URL and publishable key are baked in at compile time
//! (override with `SUPABASE_URL` / `SUPABASE_PUBLISHABLE_KEY` when building);
//! the config file and environment can only adjust the log level.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

pub const DEFAULT_SUPABASE_URL: &str = match option_env!("SUPABASE_URL") {
    Some(url) => url,
    None => "https://vecino.supabase.co",
};

pub const DEFAULT_SUPABASE_PUBLISHABLE_KEY: &str = match option_env!("SUPABASE_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "vecino-publishable-key",
};

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    /// Supabase publishable API key (public, safe to expose).
    #[serde(default = "default_supabase_publishable_key")]
    pub supabase_publishable_key: String,
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_publishable_key() -> String {
    DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            supabase_url: default_supabase_url(),
            supabase_publishable_key: default_supabase_publishable_key(),
        }
    }
}

impl Config {
    /// Defaults plus any environment overrides, no file involved.
    pub fn new() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Load from the config file under `paths`, falling back to defaults
    /// when the file does not exist.
    ///
    /// The provider URL and key always come from the compile-time constants;
    /// values in the file are ignored for those two fields.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.supabase_url = default_supabase_url();
        config.supabase_publishable_key = default_supabase_publishable_key();
        config.apply_env_overrides();

        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Write the config file under `paths`, creating directories as needed.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Only the log level is adjustable at runtime.
    fn apply_env_overrides(&mut self) {
        if let Ok(log_level) = std::env::var("VECINO_LOG_LEVEL") {
            self.log_level = log_level;
        }
    }

    /// The provider URL, parsed.
    pub fn supabase_url(&self) -> CoreResult<Url> {
        Url::parse(&self.supabase_url).map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert!(config.supabase_url().unwrap().scheme().starts_with("http"));
        assert!(!config.supabase_publishable_key.is_empty());
    }

    #[test]
    fn partial_file_fills_in_missing_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "log_level": "debug" }"#).unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.supabase_url, DEFAULT_SUPABASE_URL);
    }

    #[test]
    fn log_level_survives_a_save_load_cycle() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let mut config = Config::default();
        config.log_level = "trace".to_string();
        config.save(&paths).unwrap();

        assert_eq!(Config::load(&paths).unwrap().log_level, "trace");
    }

    #[test]
    fn file_cannot_override_the_provider_endpoint() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());
        std::fs::write(
            paths.config_file(),
            r#"{ "log_level": "warn", "supabase_url": "https://evil.example.com" }"#,
        )
        .unwrap();

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.supabase_url, DEFAULT_SUPABASE_URL);
        assert_eq!(
            config.supabase_publishable_key,
            DEFAULT_SUPABASE_PUBLISHABLE_KEY
        );
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config::load(&paths).unwrap();
        assert_eq!(config.supabase_url, DEFAULT_SUPABASE_URL);
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
    }

    #[test]
    fn garbage_url_is_rejected() {
        let mut config = Config::default();
        config.supabase_url = "not a valid url".to_string();
        assert!(config.supabase_url().is_err());
    }
}
