//! Configuration management
//!
//! Settings are resolved in order: environment variables, then the
//! `cal-server.toml` file, then built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// Reminder scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Whether the background reminder scheduler runs at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Seconds between scan cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Extra seconds added to each scan window to absorb timer jitter
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: u64,

    /// Application base URL used for deep links in reminder emails
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_secs: default_interval_secs(),
            leeway_secs: default_leeway_secs(),
            base_url: default_base_url(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// Outgoing mail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_user: String,

    #[serde(default)]
    pub smtp_pass: String,

    #[serde(default = "default_from_address")]
    pub from_address: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_user: String::new(),
            smtp_pass: String::new(),
            from_address: default_from_address(),
        }
    }
}

/// Main configuration for cal-server
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub reminders: ReminderConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub mail: MailConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_interval_secs() -> u64 {
    60
}

fn default_leeway_secs() -> u64 {
    5
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_db_path() -> String {
    "data/cal-server.db".to_string()
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_address() -> String {
    "noreply@localhost".to_string()
}

/// Parse a boolean environment flag. Unrecognized values are ignored so a
/// typo falls back to the configured value instead of silently enabling.
fn parse_bool_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let mut config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from the default path, falling back to
    /// environment-only configuration when no file exists
    pub fn load() -> Result<Self> {
        if Path::new("cal-server.toml").exists() {
            return Self::from_toml_file("cal-server.toml");
        }
        Self::from_env()
    }

    /// Load configuration from environment variables with built-in defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Overwrite settings from environment variables where present
    fn apply_env_overrides(&mut self) {
        if let Ok(enabled) = std::env::var("REMINDERS_ENABLED") {
            if let Some(v) = parse_bool_flag(&enabled) {
                self.reminders.enabled = v;
            }
        }
        if let Ok(secs) = std::env::var("REMINDER_INTERVAL_SECS") {
            if let Ok(s) = secs.parse() {
                self.reminders.interval_secs = s;
            }
        }
        if let Ok(secs) = std::env::var("REMINDER_LEEWAY_SECS") {
            if let Ok(s) = secs.parse() {
                self.reminders.leeway_secs = s;
            }
        }
        if let Ok(url) = std::env::var("APP_BASE_URL") {
            if !url.is_empty() {
                self.reminders.base_url = url;
            }
        }

        if let Ok(path) = std::env::var("DB_PATH") {
            self.storage.db_path = path;
        }

        if let Ok(host) = std::env::var("SMTP_HOST") {
            self.mail.smtp_host = host;
        }
        if let Ok(port) = std::env::var("SMTP_PORT") {
            if let Ok(p) = port.parse() {
                self.mail.smtp_port = p;
            }
        }
        if let Ok(user) = std::env::var("SMTP_USER") {
            self.mail.smtp_user = user;
        }
        if let Ok(pass) = std::env::var("SMTP_PASS") {
            self.mail.smtp_pass = pass;
        }
        if let Ok(from) = std::env::var("MAIL_FROM") {
            self.mail.from_address = from;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reminder_config_default() {
        let config = ReminderConfig::default();
        assert!(config.enabled);
        assert_eq!(config.interval_secs, 60);
        assert_eq!(config.leeway_secs, 5);
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.db_path, "data/cal-server.db");
    }

    #[test]
    fn test_toml_parsing() {
        let toml_content = r#"
[reminders]
enabled = false
interval_secs = 30
leeway_secs = 2
base_url = "https://cal.example.com"

[storage]
db_path = "/var/lib/cal/cal.db"

[mail]
smtp_host = "smtp.example.com"
smtp_port = 465
smtp_user = "mailer"
from_address = "reminders@example.com"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(!config.reminders.enabled);
        assert_eq!(config.reminders.interval_secs, 30);
        assert_eq!(config.reminders.leeway_secs, 2);
        assert_eq!(config.reminders.base_url, "https://cal.example.com");
        assert_eq!(config.storage.db_path, "/var/lib/cal/cal.db");
        assert_eq!(config.mail.smtp_host, "smtp.example.com");
        assert_eq!(config.mail.smtp_port, 465);
        assert_eq!(config.mail.from_address, "reminders@example.com");
    }

    #[test]
    fn test_bool_flag_accepts_common_spellings() {
        assert_eq!(parse_bool_flag("true"), Some(true));
        assert_eq!(parse_bool_flag("1"), Some(true));
        assert_eq!(parse_bool_flag("ON"), Some(true));
        assert_eq!(parse_bool_flag("false"), Some(false));
        assert_eq!(parse_bool_flag("0"), Some(false));
        assert_eq!(parse_bool_flag("no"), Some(false));
        assert_eq!(parse_bool_flag(" Off "), Some(false));
        assert_eq!(parse_bool_flag("maybe"), None);
    }

    #[test]
    fn test_toml_partial_sections_use_defaults() {
        let toml_content = r#"
[reminders]
interval_secs = 120
"#;
        let config: Config = toml::from_str(toml_content).unwrap();
        assert!(config.reminders.enabled);
        assert_eq!(config.reminders.interval_secs, 120);
        assert_eq!(config.reminders.leeway_secs, 5);
        assert_eq!(config.mail.smtp_port, 587);
    }
}
