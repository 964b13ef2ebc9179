mod messages;
mod observer;
mod reply;
mod session;

pub use messages::{
    next_message_id, ChatCommand, CommandKey, CommandMessage, MessageFlags, RoomKey, UserStatus,
    WireDialect,
};
pub use observer::{ConsoleObserver, ProbeObserver};
pub use reply::{ChatStatusCode, ServerMessage};
pub use session::{ProbeOptions, ProbeReport, ProbeSession, RoundTrip};
