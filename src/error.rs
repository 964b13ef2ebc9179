use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("LOGIN_URL must be an http(s) URL, got {0:?}")]
    InvalidLoginUrl(String),

    #[error("CHAT_URL must be a ws(s) URL, got {0:?}")]
    InvalidChatUrl(String),

    #[error("CHATROOM_ID is required for the {0} scenario")]
    MissingChatroomId(&'static str),

    #[error("USER_ID is required for the {0} scenario")]
    MissingUserId(&'static str),

    #[error("HISTORY_AMOUNT must be between 0 and 150, got {0}")]
    InvalidHistoryAmount(u32),

    #[error("HISTORY_START must be at least 1, got {0}")]
    InvalidHistoryStart(u32),

    #[error("Failed to load environment variables: {0}")]
    EnvError(#[from] envy::Error),
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Login request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Login timed out after {0:?}")]
    Timeout(Duration),

    #[error("Login returned {status} without a SessionID cookie: {body:?}")]
    MissingSessionCookie { status: StatusCode, body: String },

    #[error("Logout returned {status}: {body:?}")]
    Logout { status: StatusCode, body: String },
}

#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Invalid WebSocket request: {0}")]
    Request(String),

    #[error("WebSocket handshake failed: {0}")]
    Handshake(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to encode command message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to send frame: {0}")]
    Send(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("Failed to read frame: {0}")]
    Receive(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("No reply to message {message_id} within {timeout:?}")]
    ReplyTimeout { message_id: Uuid, timeout: Duration },

    #[error("Connection closed before message {message_id} was answered")]
    ClosedBeforeReply { message_id: Uuid },

    #[error("Console unavailable: {0}")]
    Console(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Login failed: {0}")]
    Login(#[source] AuthError),

    #[error("Failed to open chat connection: {0}")]
    Connect(#[source] ProbeError),

    #[error("{scenario} scenario failed: {source}")]
    Scenario {
        scenario: &'static str,
        #[source]
        source: ProbeError,
    },

    #[error("Logout failed: {0}")]
    Logout(#[source] AuthError),
}
