//! Configuration Module
//!
//! Handles loading the demo configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Demo configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// File backing the cookie jar
    pub jar_path: PathBuf,
    /// Name of the demo cookie slot
    pub cookie_name: String,
    /// Default expiry in days for persisted values
    pub expiry_days: f64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `COOKIE_JAR_PATH` - Jar file location (default: cookies.json)
    /// - `COOKIE_NAME` - Slot name (default: session)
    /// - `COOKIE_EXPIRY_DAYS` - Default expiry in days (default: 1.0)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            jar_path: env::var("COOKIE_JAR_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.jar_path),
            cookie_name: env::var("COOKIE_NAME")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.cookie_name),
            expiry_days: env::var("COOKIE_EXPIRY_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|days: &f64| days.is_finite())
                .unwrap_or(defaults.expiry_days),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            jar_path: PathBuf::from("cookies.json"),
            cookie_name: "session".to_string(),
            expiry_days: 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.jar_path, PathBuf::from("cookies.json"));
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.expiry_days, 1.0);
    }

    #[test]
    fn test_config_from_env() {
        env::remove_var("COOKIE_JAR_PATH");
        env::remove_var("COOKIE_NAME");
        env::remove_var("COOKIE_EXPIRY_DAYS");

        let config = Config::from_env();
        assert_eq!(config.jar_path, PathBuf::from("cookies.json"));
        assert_eq!(config.cookie_name, "session");
        assert_eq!(config.expiry_days, 1.0);

        env::set_var("COOKIE_NAME", "auth");
        env::set_var("COOKIE_EXPIRY_DAYS", "not-a-number");

        let config = Config::from_env();
        assert_eq!(config.cookie_name, "auth");
        assert_eq!(config.expiry_days, 1.0);

        env::set_var("COOKIE_EXPIRY_DAYS", "0.25");
        assert_eq!(Config::from_env().expiry_days, 0.25);

        env::remove_var("COOKIE_NAME");
        env::remove_var("COOKIE_EXPIRY_DAYS");
    }
}
