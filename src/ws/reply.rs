use crate::ws::messages::MessageFlags;
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Status codes the chat server attaches to its replies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStatusCode {
    Ok,
    ChatroomAccessDenied,
    CommandAccessDenied,
    BadMessageType,
    BadMessageData,
    NoSuchChatroom,
    InternalServerError,
    Other(u16),
}

impl ChatStatusCode {
    pub fn from_code(code: u16) -> Self {
        match code {
            200 => Self::Ok,
            300 => Self::ChatroomAccessDenied,
            301 => Self::CommandAccessDenied,
            400 => Self::BadMessageType,
            401 => Self::BadMessageData,
            402 => Self::NoSuchChatroom,
            500 => Self::InternalServerError,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::ChatroomAccessDenied => 300,
            Self::CommandAccessDenied => 301,
            Self::BadMessageType => 400,
            Self::BadMessageData => 401,
            Self::NoSuchChatroom => 402,
            Self::InternalServerError => 500,
            Self::Other(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        (200..300).contains(&self.code())
    }
}

impl fmt::Display for ChatStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "{}", code),
            known => write!(f, "{} {:?}", known.code(), known),
        }
    }
}

/// Best-effort view of a frame received from the server.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerMessage {
    pub message_id: Option<Uuid>,
    pub flags: MessageFlags,
    /// `Type` or `Command`, whichever the server used.
    pub kind: Option<String>,
    pub status: Option<ChatStatusCode>,
    pub data: Value,
}

impl ServerMessage {
    /// Returns `None` for anything that is not a JSON object.
    pub fn parse(text: &str) -> Option<Self> {
        let value: Value = serde_json::from_str(text).ok()?;
        let object = value.as_object()?;

        let message_id = object
            .get("MessageID")
            .and_then(Value::as_str)
            .and_then(|raw| Uuid::parse_str(raw).ok());

        let flags = object
            .get("Flags")
            .and_then(Value::as_u64)
            .and_then(|bits| u32::try_from(bits).ok())
            .map(MessageFlags::from_bits)
            .unwrap_or_default();

        let kind = object
            .get("Type")
            .or_else(|| object.get("Command"))
            .map(|kind| match kind {
                Value::String(name) => name.clone(),
                other => other.to_string(),
            });

        let status = object
            .get("StatusCode")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .map(ChatStatusCode::from_code);

        let data = object.get("Data").cloned().unwrap_or(Value::Null);

        Some(Self {
            message_id,
            flags,
            kind,
            status,
            data,
        })
    }

    pub fn is_reply(&self) -> bool {
        self.flags.contains(MessageFlags::REPLY)
    }

    /// Whether this frame carries the id of the given outgoing message.
    pub fn answers(&self, message_id: Uuid) -> bool {
        self.message_id == Some(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_reply() {
        let id = Uuid::parse_str("1b4e28ba-2fa1-11d2-883f-0016d3cca427").unwrap();
        let text = json!({
            "MessageID": id.to_string(),
            "Flags": 1,
            "Type": "Chat",
            "StatusCode": 402,
            "Data": null,
        })
        .to_string();

        let message = ServerMessage::parse(&text).unwrap();
        assert!(message.is_reply());
        assert!(message.answers(id));
        assert_eq!(message.kind.as_deref(), Some("Chat"));
        assert_eq!(message.status, Some(ChatStatusCode::NoSuchChatroom));
        assert_eq!(message.data, Value::Null);
    }

    #[test]
    fn test_parse_broadcast_with_command_key() {
        let text = r#"{"Command":"ChatMessage","Data":{"Text":"hi"}}"#;

        let message = ServerMessage::parse(text).unwrap();
        assert!(!message.is_reply());
        assert_eq!(message.message_id, None);
        assert_eq!(message.kind.as_deref(), Some("ChatMessage"));
        assert_eq!(message.status, None);
        assert_eq!(message.data["Text"], json!("hi"));
    }

    #[test]
    fn test_numeric_type_is_kept() {
        let message = ServerMessage::parse(r#"{"Type": 14}"#).unwrap();
        assert_eq!(message.kind.as_deref(), Some("14"));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(ServerMessage::parse("not json").is_none());
        assert!(ServerMessage::parse("[1, 2]").is_none());
        assert!(ServerMessage::parse("\"Renewed\"").is_none());
    }

    #[test]
    fn test_out_of_range_numbers_are_dropped() {
        let text = json!({
            "Flags": u64::from(u32::MAX) + 2,
            "StatusCode": 65736,
        })
        .to_string();

        let message = ServerMessage::parse(&text).unwrap();
        assert_eq!(message.status, None);
        assert_eq!(message.flags, MessageFlags::NONE);
        assert!(!message.is_reply());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ChatStatusCode::from_code(200), ChatStatusCode::Ok);
        assert_eq!(ChatStatusCode::from_code(301), ChatStatusCode::CommandAccessDenied);
        assert_eq!(ChatStatusCode::from_code(418), ChatStatusCode::Other(418));
        assert_eq!(ChatStatusCode::Other(418).code(), 418);
        assert!(ChatStatusCode::Ok.is_ok());
        assert!(!ChatStatusCode::BadMessageData.is_ok());
        assert_eq!(ChatStatusCode::BadMessageData.to_string(), "401 BadMessageData");
        assert_eq!(ChatStatusCode::Other(418).to_string(), "418");
    }
}
