use crate::auth::{Credential, Secret};
use crate::error::ConfigError;
use crate::scenario::Scenario;
use crate::ws::{CommandKey, RoomKey, UserStatus, WireDialect};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

const ENV_PREFIX: &str = "CHATPROBE_";

/// Largest page the server hands out for a single ChatHistory request.
const MAX_HISTORY_AMOUNT: u32 = 150;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Endpoints
    #[serde(default = "default_login_url")]
    pub login_url: String,

    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    // Credentials
    #[serde(default = "default_email")]
    pub email: String,

    #[serde(default = "default_password")]
    pub password: Secret,

    #[serde(default = "default_remember_me")]
    pub remember_me: bool,

    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,

    #[serde(default = "default_logout_on_exit")]
    pub logout_on_exit: bool,

    // Scenario targets
    #[serde(default)]
    pub scenario: Scenario,

    #[serde(default)]
    pub chatroom_id: Option<Uuid>,

    #[serde(default)]
    pub chatroom_name: Option<String>,

    #[serde(default)]
    pub chatroom_private: Option<bool>,

    #[serde(default = "default_message_text")]
    pub message_text: String,

    #[serde(default = "default_history_start")]
    pub history_start: u32,

    #[serde(default = "default_history_amount")]
    pub history_amount: u32,

    #[serde(default)]
    pub user_id: Option<Uuid>,

    #[serde(default = "default_allow_access")]
    pub allow_access: bool,

    #[serde(default)]
    pub user_status: UserStatus,

    // Wire format
    #[serde(default)]
    pub command_key: CommandKey,

    #[serde(default)]
    pub room_key: RoomKey,

    #[serde(default)]
    pub flags: u32,

    // WebSocket
    #[serde(default = "default_reply_timeout")]
    pub reply_timeout_secs: u64,

    #[serde(default = "default_close_timeout")]
    pub close_timeout_secs: u64,

    // Output
    #[serde(default)]
    pub print_length: bool,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = envy::prefixed(ENV_PREFIX).from_env::<Config>()?;
        config.validate()?;

        Ok(config)
    }

    pub fn credential(&self) -> Credential {
        Credential::new(self.email.clone(), self.password.clone())
    }

    pub fn dialect(&self) -> WireDialect {
        WireDialect {
            command_key: self.command_key,
            room_key: self.room_key,
        }
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !(self.login_url.starts_with("http://") || self.login_url.starts_with("https://")) {
            return Err(ConfigError::InvalidLoginUrl(self.login_url.clone()));
        }

        if !(self.chat_url.starts_with("ws://") || self.chat_url.starts_with("wss://")) {
            return Err(ConfigError::InvalidChatUrl(self.chat_url.clone()));
        }

        if self.history_amount > MAX_HISTORY_AMOUNT {
            return Err(ConfigError::InvalidHistoryAmount(self.history_amount));
        }

        if self.history_start < 1 {
            return Err(ConfigError::InvalidHistoryStart(self.history_start));
        }

        if self.scenario.requires_chatroom() && self.chatroom_id.is_none() {
            return Err(ConfigError::MissingChatroomId(self.scenario.as_str()));
        }

        if self.scenario.requires_user() && self.user_id.is_none() {
            return Err(ConfigError::MissingUserId(self.scenario.as_str()));
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            login_url: default_login_url(),
            chat_url: default_chat_url(),
            email: default_email(),
            password: default_password(),
            remember_me: default_remember_me(),
            login_timeout_secs: default_login_timeout(),
            logout_on_exit: default_logout_on_exit(),
            scenario: Scenario::default(),
            chatroom_id: None,
            chatroom_name: None,
            chatroom_private: None,
            message_text: default_message_text(),
            history_start: default_history_start(),
            history_amount: default_history_amount(),
            user_id: None,
            allow_access: default_allow_access(),
            user_status: UserStatus::default(),
            command_key: CommandKey::default(),
            room_key: RoomKey::default(),
            flags: 0,
            reply_timeout_secs: default_reply_timeout(),
            close_timeout_secs: default_close_timeout(),
            print_length: false,
            log_level: default_log_level(),
        }
    }
}

fn default_login_url() -> String {
    "http://localhost/api/login".to_string()
}

fn default_chat_url() -> String {
    "ws://localhost/chat".to_string()
}

fn default_email() -> String {
    "Administrator".to_string()
}

fn default_password() -> Secret {
    Secret::new("W@chtw00rd")
}

fn default_remember_me() -> bool {
    true
}

fn default_login_timeout() -> u64 {
    10
}

fn default_logout_on_exit() -> bool {
    false
}

fn default_message_text() -> String {
    "Hello from chatprobe".to_string()
}

fn default_history_start() -> u32 {
    1
}

fn default_history_amount() -> u32 {
    20
}

fn default_allow_access() -> bool {
    true
}

fn default_reply_timeout() -> u64 {
    30
}

fn default_close_timeout() -> u64 {
    5
}

fn default_log_level() -> String {
    "info,chatprobe=debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.login_url, "http://localhost/api/login");
        assert_eq!(config.chat_url, "ws://localhost/chat");
        assert_eq!(config.email, "Administrator");
        assert_eq!(config.password.expose(), "W@chtw00rd");
        assert!(config.remember_me);
        assert_eq!(config.scenario, Scenario::CreateChatroom);
        assert_eq!(config.reply_timeout(), Duration::from_secs(30));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_debug_hides_password() {
        let config = Config::default();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("W@chtw00rd"));
        assert!(rendered.contains("Administrator"));
    }

    #[test]
    fn test_url_validation() {
        let mut config = Config::default();
        config.login_url = "ftp://localhost/api/login".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLoginUrl(_))));

        let mut config = Config::default();
        config.chat_url = "http://localhost/chat".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidChatUrl(_))));

        config.chat_url = "wss://chat.example.com/chat".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_history_range_validation() {
        let mut config = Config::default();
        config.history_amount = 151;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHistoryAmount(151))));

        config.history_amount = 150;
        assert!(config.validate().is_ok());

        config.history_start = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidHistoryStart(0))));
    }

    #[test]
    fn test_scenario_targets_required() {
        let mut config = Config::default();
        config.scenario = Scenario::DeleteChatroom;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingChatroomId("delete_chatroom"))
        ));

        config.chatroom_id = Some(Uuid::nil());
        assert!(config.validate().is_ok());

        config.scenario = Scenario::ChangeAccess;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingUserId("change_access"))
        ));

        config.user_id = Some(Uuid::nil());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_dialect_follows_config() {
        let mut config = Config::default();
        config.command_key = CommandKey::Type;
        config.room_key = RoomKey::RoomId;

        let dialect = config.dialect();
        assert_eq!(dialect.command_key, CommandKey::Type);
        assert_eq!(dialect.room_key, RoomKey::RoomId);
    }
}
