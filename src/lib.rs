//! Manual test probe for a chat server: log in over HTTP, then drive the chat
//! WebSocket with hand-built command messages and print what comes back.

pub mod auth;
pub mod config;
pub mod console;
pub mod error;
pub mod probe;
pub mod scenario;
pub mod shutdown;
pub mod ws;
