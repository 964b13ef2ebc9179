use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::OnceLock;
use uuid::Uuid;

/// Key that names the command in an outgoing message.
///
/// The server's command handlers read `Command`; some clients send `Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum CommandKey {
    #[default]
    #[serde(alias = "command")]
    Command,
    #[serde(alias = "type")]
    Type,
}

impl CommandKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Command => "Command",
            Self::Type => "Type",
        }
    }
}

/// Key that carries the chatroom id inside `Data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum RoomKey {
    #[default]
    #[serde(rename = "ChatroomID", alias = "chatroom_id")]
    ChatroomId,
    #[serde(rename = "RoomID", alias = "room_id")]
    RoomId,
}

impl RoomKey {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChatroomId => "ChatroomID",
            Self::RoomId => "RoomID",
        }
    }
}

/// Naming convention used when encoding command messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WireDialect {
    pub command_key: CommandKey,
    pub room_key: RoomKey,
}

/// Presence states accepted by `ChangeUserStatus`. Sent as their ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Online = 0,
    Busy = 1,
    Away = 2,
    Offline = 3,
}

/// Bit set carried in the `Flags` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageFlags(u32);

impl MessageFlags {
    pub const NONE: Self = Self(0);
    /// Set by the server on answers to a client message.
    pub const REPLY: Self = Self(1 << 0);

    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

/// Commands the chat endpoint understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    CreateChatroom {
        name: String,
        private: bool,
    },
    EditChatroom {
        chatroom_id: Uuid,
        name: Option<String>,
        private: Option<bool>,
    },
    DeleteChatroom {
        chatroom_id: Uuid,
    },
    ChatHistory {
        chatroom_id: Uuid,
        start: u32,
        amount: u32,
    },
    ChatMessage {
        chatroom_id: Uuid,
        text: String,
    },
    ChangeAccess {
        chatroom_id: Uuid,
        user_id: Uuid,
        allow_access: bool,
    },
    ChangeUserStatus {
        status: UserStatus,
    },
}

impl ChatCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateChatroom { .. } => "CreateChatroom",
            Self::EditChatroom { .. } => "EditChatroom",
            Self::DeleteChatroom { .. } => "DeleteChatroom",
            Self::ChatHistory { .. } => "ChatHistory",
            Self::ChatMessage { .. } => "ChatMessage",
            Self::ChangeAccess { .. } => "ChangeAccess",
            Self::ChangeUserStatus { .. } => "ChangeUserStatus",
        }
    }

    /// The `Data` object for this command.
    pub fn data(&self, room_key: RoomKey) -> Value {
        let data = match self {
            Self::CreateChatroom { name, private } => {
                let mut data = Map::new();
                data.insert("Name".to_string(), json!(name));
                data.insert("Private".to_string(), json!(private));
                data
            }
            Self::EditChatroom {
                chatroom_id,
                name,
                private,
            } => {
                let mut data = room_object(room_key, chatroom_id);
                if let Some(name) = name {
                    data.insert("Name".to_string(), json!(name));
                }
                if let Some(private) = private {
                    data.insert("Private".to_string(), json!(private));
                }
                data
            }
            Self::DeleteChatroom { chatroom_id } => room_object(room_key, chatroom_id),
            Self::ChatHistory {
                chatroom_id,
                start,
                amount,
            } => {
                let mut data = room_object(room_key, chatroom_id);
                data.insert("Start".to_string(), json!(start));
                data.insert("Amount".to_string(), json!(amount));
                data
            }
            Self::ChatMessage { chatroom_id, text } => {
                let mut data = room_object(room_key, chatroom_id);
                data.insert("MessageText".to_string(), json!(text));
                data
            }
            Self::ChangeAccess {
                chatroom_id,
                user_id,
                allow_access,
            } => {
                let mut data = room_object(room_key, chatroom_id);
                data.insert("UserID".to_string(), json!(user_id));
                data.insert("AllowAccess".to_string(), json!(allow_access));
                data
            }
            Self::ChangeUserStatus { status } => {
                let mut data = Map::new();
                data.insert("UserStatus".to_string(), json!(*status as u8));
                data
            }
        };

        Value::Object(data)
    }
}

fn room_object(room_key: RoomKey, chatroom_id: &Uuid) -> Map<String, Value> {
    let mut data = Map::new();
    data.insert(room_key.as_str().to_string(), json!(chatroom_id));
    data
}

/// One outgoing frame: a command wrapped with a fresh message id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandMessage {
    pub message_id: Uuid,
    pub flags: MessageFlags,
    pub command: ChatCommand,
}

impl CommandMessage {
    pub fn new(command: ChatCommand) -> Self {
        Self::with_flags(command, MessageFlags::NONE)
    }

    pub fn with_flags(command: ChatCommand, flags: MessageFlags) -> Self {
        Self {
            message_id: next_message_id(),
            flags,
            command,
        }
    }

    pub fn to_json(&self, dialect: WireDialect) -> Value {
        let mut message = Map::new();
        message.insert("MessageID".to_string(), json!(self.message_id));
        message.insert("Flags".to_string(), json!(self.flags.bits()));
        message.insert(
            dialect.command_key.as_str().to_string(),
            json!(self.command.name()),
        );
        message.insert("Data".to_string(), self.command.data(dialect.room_key));
        Value::Object(message)
    }

    pub fn encode(&self, dialect: WireDialect) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_json(dialect))
    }
}

/// Time-based (v1) id. The node id is random per process with the multicast
/// bit set, so it can never collide with a real MAC address.
pub fn next_message_id() -> Uuid {
    static NODE_ID: OnceLock<[u8; 6]> = OnceLock::new();

    let node_id = NODE_ID.get_or_init(|| {
        let mut node: [u8; 6] = rand::random();
        node[0] |= 0x01;
        node
    });

    Uuid::now_v1(node_id)
}
