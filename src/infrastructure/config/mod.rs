//! Configuration management

pub mod template;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::application::errors::ConfigError;
pub use template::Template;

/// Chatroom server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    pub server: ServerConfig,
    pub chat: ChatConfig,
    pub name_generator: NameGeneratorConfig,
    pub meta: MetaConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Inbound text is cut to this many characters; negative disables truncation
    pub max_message_len: i64,
}

/// Templates for every notification the chatroom emits
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChatConfig {
    pub greeting_template: Template,
    pub connect_notification_template: Template,
    pub disconnect_notification_template: Template,
    pub name_change_notification_template: Template,
    pub shutdown_notification_template: Template,
    pub private_message_from_template: Template,
    pub private_message_to_template: Template,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NameGeneratorConfig {
    pub adjective_path: PathBuf,
    pub animal_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MetaConfig {
    pub environment: String,
    /// Overrides the `!about` text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 5000,
                max_message_len: 500,
            },
            chat: ChatConfig::default(),
            name_generator: NameGeneratorConfig {
                adjective_path: PathBuf::from("data/adjectives.txt"),
                animal_path: PathBuf::from("data/animals.txt"),
            },
            meta: MetaConfig {
                environment: "development".to_string(),
                about: None,
            },
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            greeting_template: "Welcome to the chat, $name! Type !help to see what you can do.".into(),
            connect_notification_template: "$name has joined the chat".into(),
            disconnect_notification_template: "$name has left the chat".into(),
            name_change_notification_template: "$old is now known as $new".into(),
            shutdown_notification_template: "The server is shutting down. Goodbye!".into(),
            private_message_from_template: "[PM from $from_name]: $message".into(),
            private_message_to_template: "[PM to $to_name]: $message".into(),
        }
    }
}

const NAME_VARS: &[&str] = &["name"];
const RENAME_VARS: &[&str] = &["old", "new"];
const NO_VARS: &[&str] = &[];
const PM_FROM_VARS: &[&str] = &["from_name", "message"];
const PM_TO_VARS: &[&str] = &["to_name", "message"];

impl ChatConfig {
    /// (key, template, allowed placeholders) for every template
    fn templates(&self) -> [(&'static str, &Template, &'static [&'static str]); 7] {
        [
            ("greeting-template", &self.greeting_template, NAME_VARS),
            ("connect-notification-template", &self.connect_notification_template, NAME_VARS),
            ("disconnect-notification-template", &self.disconnect_notification_template, NAME_VARS),
            ("name-change-notification-template", &self.name_change_notification_template, RENAME_VARS),
            ("shutdown-notification-template", &self.shutdown_notification_template, NO_VARS),
            ("private-message-from-template", &self.private_message_from_template, PM_FROM_VARS),
            ("private-message-to-template", &self.private_message_to_template, PM_TO_VARS),
        ]
    }

    /// Reject templates referencing placeholders they will never be given
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, template, allowed) in self.templates() {
            if let Some(unknown) = template.placeholders().into_iter().find(|p| !allowed.contains(p)) {
                return Err(ConfigError::InvalidValue(format!(
                    "chat.{}: unknown placeholder ${} (allowed: {})",
                    key,
                    unknown,
                    if allowed.is_empty() { "none".to_string() } else { allowed.join(", ") }
                )));
            }
        }
        Ok(())
    }
}

impl ServerConfig {
    /// Truncation limit in characters, `None` when disabled
    pub fn max_message_len(&self) -> Option<usize> {
        usize::try_from(self.max_message_len).ok()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue("server.host is empty".to_string()));
        }
        if self.meta.environment.trim().is_empty() {
            return Err(ConfigError::InvalidValue("meta.environment is empty".to_string()));
        }
        self.chat.validate()
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
