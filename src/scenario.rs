use crate::config::Config;
use crate::ws::ChatCommand;
use serde::Deserialize;
use std::fmt;
use uuid::Uuid;

const DEFAULT_CHATROOM_NAME: &str = "chatprobe";

/// What the probe does once the WebSocket is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scenario {
    #[default]
    CreateChatroom,
    EditChatroom,
    DeleteChatroom,
    ChatHistory,
    ChatMessage,
    ChangeAccess,
    ChangeUserStatus,
    /// Prompt for message text and send it lock-step.
    Interactive,
}

impl Scenario {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateChatroom => "create_chatroom",
            Self::EditChatroom => "edit_chatroom",
            Self::DeleteChatroom => "delete_chatroom",
            Self::ChatHistory => "chat_history",
            Self::ChatMessage => "chat_message",
            Self::ChangeAccess => "change_access",
            Self::ChangeUserStatus => "change_user_status",
            Self::Interactive => "interactive",
        }
    }

    pub fn requires_chatroom(self) -> bool {
        !matches!(self, Self::CreateChatroom | Self::ChangeUserStatus)
    }

    pub fn requires_user(self) -> bool {
        matches!(self, Self::ChangeAccess)
    }

    pub fn is_interactive(self) -> bool {
        matches!(self, Self::Interactive)
    }

    /// Commands sent as soon as the connection opens. Empty for `Interactive`.
    ///
    /// Assumes `config` passed validation; a missing target id falls back to nil.
    pub fn opening_commands(self, config: &Config) -> Vec<ChatCommand> {
        let chatroom_id = config.chatroom_id.unwrap_or_else(Uuid::nil);

        let command = match self {
            Self::CreateChatroom => ChatCommand::CreateChatroom {
                name: config
                    .chatroom_name
                    .clone()
                    .unwrap_or_else(|| DEFAULT_CHATROOM_NAME.to_string()),
                private: config.chatroom_private.unwrap_or(false),
            },
            Self::EditChatroom => ChatCommand::EditChatroom {
                chatroom_id,
                name: config.chatroom_name.clone(),
                private: config.chatroom_private,
            },
            Self::DeleteChatroom => ChatCommand::DeleteChatroom { chatroom_id },
            Self::ChatHistory => ChatCommand::ChatHistory {
                chatroom_id,
                start: config.history_start,
                amount: config.history_amount,
            },
            Self::ChatMessage => ChatCommand::ChatMessage {
                chatroom_id,
                text: config.message_text.clone(),
            },
            Self::ChangeAccess => ChatCommand::ChangeAccess {
                chatroom_id,
                user_id: config.user_id.unwrap_or_else(Uuid::nil),
                allow_access: config.allow_access,
            },
            Self::ChangeUserStatus => ChatCommand::ChangeUserStatus {
                status: config.user_status,
            },
            Self::Interactive => return Vec::new(),
        };

        vec![command]
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::UserStatus;

    fn config_for(scenario: Scenario) -> Config {
        Config {
            scenario,
            chatroom_id: Some(Uuid::parse_str("686771e1-5c3a-4cd9-b85b-73500b522865").unwrap()),
            ..Config::default()
        }
    }

    #[test]
    fn test_create_chatroom_defaults() {
        let commands = Scenario::CreateChatroom.opening_commands(&Config::default());
        assert_eq!(
            commands,
            vec![ChatCommand::CreateChatroom {
                name: "chatprobe".to_string(),
                private: false,
            }]
        );
    }

    #[test]
    fn test_targeted_scenarios_use_config_ids() {
        let config = config_for(Scenario::ChatHistory);
        let commands = config.scenario.opening_commands(&config);
        assert_eq!(
            commands,
            vec![ChatCommand::ChatHistory {
                chatroom_id: config.chatroom_id.unwrap(),
                start: 1,
                amount: 20,
            }]
        );

        let mut config = config_for(Scenario::ChangeAccess);
        config.user_id = Some(Uuid::nil());
        config.allow_access = false;
        let commands = config.scenario.opening_commands(&config);
        assert!(matches!(
            commands.as_slice(),
            [ChatCommand::ChangeAccess { allow_access: false, .. }]
        ));
    }

    #[test]
    fn test_edit_passes_optional_fields_through() {
        let mut config = config_for(Scenario::EditChatroom);
        config.chatroom_name = Some("Renamed".to_string());

        let commands = config.scenario.opening_commands(&config);
        assert_eq!(
            commands,
            vec![ChatCommand::EditChatroom {
                chatroom_id: config.chatroom_id.unwrap(),
                name: Some("Renamed".to_string()),
                private: None,
            }]
        );
    }

    #[test]
    fn test_user_status_scenario() {
        let mut config = Config::default();
        config.scenario = Scenario::ChangeUserStatus;
        config.user_status = UserStatus::Busy;

        let commands = config.scenario.opening_commands(&config);
        assert_eq!(
            commands,
            vec![ChatCommand::ChangeUserStatus {
                status: UserStatus::Busy
            }]
        );
    }

    #[test]
    fn test_interactive_has_no_opening_commands() {
        let config = config_for(Scenario::Interactive);
        assert!(Scenario::Interactive.opening_commands(&config).is_empty());
        assert!(Scenario::Interactive.is_interactive());
        assert!(Scenario::Interactive.requires_chatroom());
        assert!(!Scenario::CreateChatroom.requires_chatroom());
    }
}
