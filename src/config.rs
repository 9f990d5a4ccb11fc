//! Configuration for the voice controller
//!
//! Values come from `Default`, an optional TOML file and a couple of
//! environment overrides, in that order.

use crate::shortcut::Shortcut;
use crate::{Result, VoiceError};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding the intent endpoint base URL
pub const ENV_ENDPOINT: &str = "SYNCVOICE_ENDPOINT";

/// Environment variable overriding the starting language
pub const ENV_LANG: &str = "SYNCVOICE_LANG";

/// Configuration for the voice session controller
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    /// Base URL of the dashboard backend
    pub endpoint: String,

    /// Path of the intent classifier route
    pub command_path: String,

    /// Starting BCP-47 language tag for recognition and synthesis
    pub default_lang: String,

    /// Spoken when the session is activated
    pub greeting: String,

    /// Pause between cancelling an utterance and starting the next one
    pub cancel_grace_ms: u64,

    /// Key combination that toggles the session
    pub shortcut: String,

    /// Number of log entries read back by `read_logs`
    pub recent_log_count: usize,

    /// Optional client-side timeout for the intent request (none by default)
    pub request_timeout_ms: Option<u64>,

    /// Capacity of the chat event bus
    pub bus_capacity: usize,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:5000".to_string(),
            command_path: "/voice_command".to_string(),
            default_lang: "en-US".to_string(),
            greeting: "Hello, I'm SyncVoice. How can I help?".to_string(),
            cancel_grace_ms: 50,
            shortcut: "Ctrl+Space".to_string(),
            recent_log_count: 5,
            request_timeout_ms: None,
            bus_capacity: 100,
        }
    }
}

impl VoiceConfig {
    /// Load a configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VoiceError::Io(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config: VoiceConfig = toml::from_str(&content).map_err(|e| {
            VoiceError::Config(format!("failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `SYNCVOICE_ENDPOINT` / `SYNCVOICE_LANG` if they are set
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        if let Ok(lang) = std::env::var(ENV_LANG) {
            if !lang.trim().is_empty() {
                self.default_lang = lang;
            }
        }
        self
    }

    /// Set the backend base URL
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the starting language
    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.default_lang = lang.into();
        self
    }

    /// Set the activation greeting
    pub fn with_greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Set the cancel grace period in milliseconds
    pub fn with_cancel_grace_ms(mut self, ms: u64) -> Self {
        self.cancel_grace_ms = ms;
        self
    }

    /// Set the toggle shortcut
    pub fn with_shortcut(mut self, shortcut: impl Into<String>) -> Self {
        self.shortcut = shortcut.into();
        self
    }

    /// Set a client-side timeout for intent requests
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = Some(ms);
        self
    }

    /// Full URL of the intent route
    pub fn command_url(&self) -> String {
        format!(
            "{}/{}",
            self.endpoint.trim_end_matches('/'),
            self.command_path.trim_start_matches('/')
        )
    }

    pub fn cancel_grace(&self) -> Duration {
        Duration::from_millis(self.cancel_grace_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Parse the configured shortcut
    pub fn parsed_shortcut(&self) -> Result<Shortcut> {
        self.shortcut.parse()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        reqwest::Url::parse(&self.command_url()).map_err(|e| {
            VoiceError::Config(format!("invalid endpoint {:?}: {}", self.endpoint, e))
        })?;

        if self.default_lang.trim().is_empty() {
            return Err(VoiceError::Config("default_lang must not be empty".into()));
        }

        if self.recent_log_count == 0 {
            return Err(VoiceError::Config(
                "recent_log_count must be at least 1".into(),
            ));
        }

        if self.bus_capacity == 0 {
            return Err(VoiceError::Config("bus_capacity must be at least 1".into()));
        }

        self.parsed_shortcut()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = VoiceConfig::default();
        assert_eq!(config.default_lang, "en-US");
        assert_eq!(config.cancel_grace_ms, 50);
        assert_eq!(config.recent_log_count, 5);
        assert!(config.request_timeout().is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_command_url_joins_slashes() {
        let config = VoiceConfig::default().with_endpoint("http://localhost:8080/");
        assert_eq!(config.command_url(), "http://localhost:8080/voice_command");
    }

    #[test]
    fn test_config_builder() {
        let config = VoiceConfig::default()
            .with_lang("es-ES")
            .with_cancel_grace_ms(10)
            .with_request_timeout_ms(2000);

        assert_eq!(config.default_lang, "es-ES");
        assert_eq!(config.cancel_grace(), Duration::from_millis(10));
        assert_eq!(config.request_timeout(), Some(Duration::from_millis(2000)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(VoiceConfig::default().with_endpoint("not a url").validate().is_err());
        assert!(VoiceConfig::default().with_lang("  ").validate().is_err());
        assert!(VoiceConfig::default().with_shortcut("Ctrl+").validate().is_err());
    }

    #[test]
    fn test_load_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
endpoint = "http://dashboard.local:5000"
default_lang = "fr-FR"
recent_log_count = 3
"#
        )
        .unwrap();

        let config = VoiceConfig::load(file.path()).unwrap();
        assert_eq!(config.endpoint, "http://dashboard.local:5000");
        assert_eq!(config.default_lang, "fr-FR");
        assert_eq!(config.recent_log_count, 3);
        // untouched fields keep their defaults
        assert_eq!(config.shortcut, "Ctrl+Space");
    }

    #[test]
    fn test_load_missing_file() {
        let err = VoiceConfig::load("/nonexistent/syncvoice.toml").unwrap_err();
        assert!(matches!(err, VoiceError::Io(_)));
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cancel_grace_ms = \"soon\"").unwrap();
        let err = VoiceConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, VoiceError::Config(_)));
    }
}
