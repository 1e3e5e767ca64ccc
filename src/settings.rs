use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;

use crate::oauth::client::DEFAULT_TIMEOUT_SECS;
use crate::oauth::config::{DEFAULT_AUTHORIZE_PATH, DEFAULT_SITE};
use crate::session::DEFAULT_COOKIE_NAME;
use crate::utils::crypto::generate_session_secret;

/// Environment variable naming a directory whose `Settings.toml` overrides the local one
pub const SECRETS_DIR_ENV: &str = "TWITTER_LOGIN_SECRETS_DIR";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoginSettings {
    pub application: ApplicationSettings,
    pub twitter: TwitterSettings,
    pub login: LoginPathSettings,
    pub session: SessionSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwitterSettings {
    // Direct values (can be overridden by environment variables)
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,

    // Environment variable names for overrides
    pub consumer_key_env: Option<String>,
    pub consumer_secret_env: Option<String>,

    pub site: String,
    pub authorize_path: String,
    pub provider_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginPathSettings {
    /// Path the middleware intercepts
    pub login_path: String,
    /// Where the user lands after a completed or denied login
    pub return_to: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub session_duration_hours: u64,
    pub session_secret: String,
    pub cookie_secure: bool,
    pub cookie_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for ApplicationSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for TwitterSettings {
    fn default() -> Self {
        Self {
            consumer_key: None,
            consumer_secret: None,
            consumer_key_env: Some("TWITTER_CONSUMER_KEY".to_string()),
            consumer_secret_env: Some("TWITTER_CONSUMER_SECRET".to_string()),
            site: DEFAULT_SITE.to_string(),
            authorize_path: DEFAULT_AUTHORIZE_PATH.to_string(),
            provider_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for LoginPathSettings {
    fn default() -> Self {
        Self {
            login_path: "/login".to_string(),
            return_to: "/".to_string(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_duration_hours: 24,
            session_secret: String::new(), // Will be generated if empty
            cookie_secure: false,
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoginSettings {
    /// Load settings from configuration files and environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Logger initialization fails
    /// - Settings file cannot be read or parsed
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::load_base_settings()?;
        Self::apply_logging_env_overrides(&mut settings.logging);
        Self::initialize_logging(&settings.logging)?;

        Self::apply_env_overrides(&mut settings);
        log::info!("✓ Settings loaded (log level: {})", settings.logging.level);

        Ok(settings)
    }

    /// Initialize logging with the configured filter
    ///
    /// # Errors
    ///
    /// Returns an error if a logger is already installed
    fn initialize_logging(logging: &LoggingSettings) -> Result<(), Box<dyn std::error::Error>> {
        Self::logger_builder(logging).try_init()?;
        Ok(())
    }

    /// Logger filtered by `logging.level`, using `RUST_LOG` syntax
    fn logger_builder(logging: &LoggingSettings) -> env_logger::Builder {
        let mut builder = env_logger::Builder::new();
        builder.parse_filters(&logging.level);
        builder
    }

    /// Load base settings from TOML file(s) or use defaults
    /// Settings are loaded with the following priority (highest to lowest):
    /// 1. Environment variables (applied separately after loading base settings)
    /// 2. Settings.toml in `TWITTER_LOGIN_SECRETS_DIR` (if specified and exists)
    /// 3. Settings.toml in current directory (if exists)
    /// 4. Default settings
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Settings file cannot be read
    /// - TOML parsing fails
    pub fn load_base_settings() -> Result<Self, Box<dyn std::error::Error>> {
        let mut settings = Self::default();

        let default_config_path = std::path::PathBuf::from("Settings.toml");
        if default_config_path.exists() {
            settings = Self::from_file(&default_config_path)?;
            log::info!(
                "✓ Loaded base settings from {}",
                default_config_path.display()
            );
        }

        if let Ok(secrets_dir) = std::env::var(SECRETS_DIR_ENV) {
            let secrets_path = std::path::Path::new(&secrets_dir).join("Settings.toml");
            if secrets_path.exists() {
                settings = Self::from_file(&secrets_path)?;
                log::info!("✓ Overriding settings from {}", secrets_path.display());
            } else {
                log::info!(
                    "ℹ {} set but no Settings.toml found at: {}",
                    SECRETS_DIR_ENV,
                    secrets_path.display()
                );
            }
        }

        Ok(settings)
    }

    /// Parse a single TOML settings file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML
    pub fn from_file(path: &std::path::Path) -> Result<Self, Box<dyn std::error::Error>> {
        let toml_content = fs::read_to_string(path)?;
        Ok(basic_toml::from_str(&toml_content)?)
    }

    /// Apply environment variable overrides to settings
    pub fn apply_env_overrides(settings: &mut Self) {
        Self::apply_application_env_overrides(&mut settings.application);
        Self::apply_login_env_overrides(&mut settings.login);
        Self::apply_session_env_overrides(&mut settings.session);
        Self::apply_logging_env_overrides(&mut settings.logging);
    }

    fn apply_application_env_overrides(app_settings: &mut ApplicationSettings) {
        if let Ok(host) = std::env::var("HOST") {
            app_settings.host = host;
        }
        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                app_settings.port = port;
            }
        }
    }

    fn apply_login_env_overrides(login_settings: &mut LoginPathSettings) {
        if let Ok(login_path) = std::env::var("LOGIN_PATH") {
            login_settings.login_path = login_path;
        }
        if let Ok(return_to) = std::env::var("LOGIN_RETURN_TO") {
            login_settings.return_to = return_to;
        }
    }

    /// Apply environment overrides for session settings
    pub fn apply_session_env_overrides(session_settings: &mut SessionSettings) {
        if let Ok(value_str) = std::env::var("SESSION_DURATION_HOURS") {
            if let Ok(value) = value_str.parse::<u64>() {
                session_settings.session_duration_hours = value;
            }
        }
        if let Ok(cookie_secure_str) = std::env::var("COOKIE_SECURE") {
            if let Ok(cookie_secure) = cookie_secure_str.parse::<bool>() {
                session_settings.cookie_secure = cookie_secure;
            }
        }

        Self::handle_session_secret_override(session_settings);
    }

    fn handle_session_secret_override(session_settings: &mut SessionSettings) {
        let env_secret_set = std::env::var("SESSION_SECRET").is_ok_and(|secret| {
            if secret.is_empty() {
                false
            } else {
                session_settings.session_secret = secret;
                true
            }
        });

        if !env_secret_set && session_settings.session_secret.is_empty() {
            session_settings.session_secret = generate_session_secret();
            Self::warn_about_generated_secret();
        }
    }

    fn warn_about_generated_secret() {
        log::warn!("⚠️  Using auto-generated session secret");
        log::warn!("🔒 For production use, set the SESSION_SECRET environment variable or configure session_secret in Settings.toml");
        log::warn!("💡 This secret will change on each restart, logging out every user");
    }

    fn apply_logging_env_overrides(logging_settings: &mut LoggingSettings) {
        if let Ok(log_level) = std::env::var("RUST_LOG") {
            logging_settings.level = log_level;
        }
    }

    /// Check that the middleware can talk to the provider
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or malformed setting
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.twitter.get_consumer_key().unwrap_or_default().is_empty() {
            return Err("twitter.consumer_key (or TWITTER_CONSUMER_KEY) must be set".into());
        }
        if self
            .twitter
            .get_consumer_secret()
            .unwrap_or_default()
            .is_empty()
        {
            return Err("twitter.consumer_secret (or TWITTER_CONSUMER_SECRET) must be set".into());
        }
        if !self.login.login_path.starts_with('/') {
            return Err(format!(
                "login.login_path must start with '/', got '{}'",
                self.login.login_path
            )
            .into());
        }
        Ok(())
    }

    /// Get the bind address for the server
    #[must_use]
    pub fn get_bind_address(&self) -> String {
        format!("{}:{}", self.application.host, self.application.port)
    }
}

impl TwitterSettings {
    /// Get the consumer key, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_consumer_key(&self) -> Option<String> {
        if let Some(env_var) = &self.consumer_key_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.consumer_key.clone()
    }

    /// Get the consumer secret, checking environment variable first, then falling back to direct value
    #[must_use]
    pub fn get_consumer_secret(&self) -> Option<String> {
        if let Some(env_var) = &self.consumer_secret_env {
            if let Ok(value) = std::env::var(env_var) {
                return Some(value);
            }
        }
        self.consumer_secret.clone()
    }

    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }
}
