use crate::auth::SessionToken;
use crate::error::ProbeError;
use crate::ws::reply::ServerMessage;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use uuid::Uuid;

/// Callbacks fired by a [`ProbeSession`](crate::ws::ProbeSession) as traffic
/// flows. Every method defaults to doing nothing.
pub trait ProbeObserver {
    fn on_login(&mut self, _token: &SessionToken) {}

    fn on_sent(&mut self, _message_id: Uuid, _text: &str) {}

    fn on_message(&mut self, _text: &str) {}

    fn on_error(&mut self, _error: &ProbeError) {}

    fn on_close(&mut self, _frame: Option<&CloseFrame<'_>>) {}
}

/// Prints traffic to stdout for an operator watching the terminal.
#[derive(Debug, Default)]
pub struct ConsoleObserver {
    show_length: bool,
}

impl ConsoleObserver {
    pub fn new(show_length: bool) -> Self {
        Self { show_length }
    }
}

/// One-line summary such as `reply Chat: 200 Ok` or `push ChatMessage`.
fn summarize(message: &ServerMessage) -> String {
    let origin = if message.is_reply() { "reply" } else { "push" };
    let kind = message.kind.as_deref().unwrap_or("?");

    match message.status {
        Some(status) if status.is_ok() => format!("{} {}: {}", origin, kind, status),
        Some(status) => format!("{} {}: {} (failed)", origin, kind, status),
        None => format!("{} {}", origin, kind),
    }
}

impl ProbeObserver for ConsoleObserver {
    fn on_login(&mut self, token: &SessionToken) {
        println!("SessionID is {}", token);
    }

    fn on_sent(&mut self, message_id: Uuid, _text: &str) {
        println!("sent: {}", message_id);
    }

    fn on_message(&mut self, text: &str) {
        println!("text: {}", text);
        if self.show_length {
            println!("length: {}", text.len());
        }
        if let Some(summary) = ServerMessage::parse(text).map(|message| summarize(&message)) {
            println!("{}", summary);
        }
    }

    fn on_error(&mut self, error: &ProbeError) {
        eprintln!("error: {}", error);
    }

    fn on_close(&mut self, frame: Option<&CloseFrame<'_>>) {
        match frame {
            Some(frame) => println!("### closed ({} {}) ###", u16::from(frame.code), frame.reason),
            None => println!("### closed ###"),
        }
    }
}
