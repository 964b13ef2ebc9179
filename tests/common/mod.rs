#![allow(dead_code)]

use chatprobe::error::ProbeError;
use chatprobe::ws::ProbeObserver;
use futures::{SinkExt, StreamExt};
use http::header::COOKIE;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, Message};
use tokio_tungstenite::accept_hdr_async;
use uuid::Uuid;

/// How the mock `/chat` endpoint reacts to each text frame.
#[derive(Debug, Clone)]
pub enum ChatBehavior {
    /// Close the connection after this many frames.
    CloseAfter(usize),
    /// Answer each frame with a reply that echoes its MessageID.
    Reply { delay: Duration },
    /// Answer each frame with this fixed text.
    ReplyWith(String),
    /// Read frames but never answer.
    Silent,
    /// Push this text as soon as the connection opens, then stay silent.
    Greet(String),
    /// Drop the TCP connection after the first frame without a Close frame.
    Vanish,
    /// Refuse the handshake with 401.
    Reject,
}

#[derive(Debug, Default)]
pub struct ChatLog {
    /// `Cookie` header of every handshake, in connection order.
    pub cookies: Vec<Option<String>>,
    /// Every text frame received, across connections.
    pub frames: Vec<String>,
}

pub struct MockChatServer {
    pub addr: SocketAddr,
    pub log: Arc<Mutex<ChatLog>>,
}

impl MockChatServer {
    pub fn url(&self) -> String {
        format!("ws://{}/chat", self.addr)
    }

    pub fn cookies(&self) -> Vec<Option<String>> {
        self.log.lock().unwrap().cookies.clone()
    }

    pub fn frames(&self) -> Vec<String> {
        self.log.lock().unwrap().frames.clone()
    }
}

pub async fn spawn_chat_server(behavior: ChatBehavior) -> MockChatServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(Mutex::new(ChatLog::default()));

    let server_log = log.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            tokio::spawn(handle_connection(stream, behavior.clone(), server_log.clone()));
        }
    });

    MockChatServer { addr, log }
}

async fn handle_connection(stream: TcpStream, behavior: ChatBehavior, log: Arc<Mutex<ChatLog>>) {
    let reject = matches!(behavior, ChatBehavior::Reject);
    let handshake_log = log.clone();
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        let cookie = request
            .headers()
            .get(COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        handshake_log.lock().unwrap().cookies.push(cookie);

        if reject {
            let refusal = http::Response::builder()
                .status(401)
                .body(Some("Unauthorized".to_string()))
                .unwrap();
            return Err(refusal);
        }
        Ok(response)
    };

    let mut ws = match accept_hdr_async(stream, callback).await {
        Ok(ws) => ws,
        Err(_) => return,
    };

    if let ChatBehavior::Greet(greeting) = &behavior {
        if ws.send(Message::Text(greeting.clone())).await.is_err() {
            return;
        }
    }

    let mut count = 0;
    while let Some(Ok(message)) = ws.next().await {
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => continue,
            _ => continue,
        };

        log.lock().unwrap().frames.push(text.clone());
        count += 1;

        match &behavior {
            ChatBehavior::CloseAfter(limit) => {
                if count >= *limit {
                    ws.close(None).await.ok();
                }
            }
            ChatBehavior::Reply { delay } => {
                tokio::time::sleep(*delay).await;
                let request: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
                let reply = json!({
                    "MessageID": request["MessageID"],
                    "Flags": 1,
                    "Type": "Chat",
                    "StatusCode": 200,
                    "Data": null,
                });
                if ws.send(Message::Text(reply.to_string())).await.is_err() {
                    break;
                }
            }
            ChatBehavior::ReplyWith(reply) => {
                if ws.send(Message::Text(reply.clone())).await.is_err() {
                    break;
                }
            }
            ChatBehavior::Vanish => return,
            ChatBehavior::Silent | ChatBehavior::Greet(_) | ChatBehavior::Reject => {}
        }
    }
}

/// Records every callback in order as `sent:<id>`, `recv`, `error` or `close`.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub events: Vec<String>,
    pub messages: Vec<String>,
    pub sent_ids: Vec<Uuid>,
}

impl RecordingObserver {
    /// Event kinds without payloads, e.g. `["sent", "recv", "close"]`.
    pub fn kinds(&self) -> Vec<&str> {
        self.events
            .iter()
            .map(|event| event.split(':').next().unwrap_or_default())
            .collect()
    }
}

impl ProbeObserver for RecordingObserver {
    fn on_sent(&mut self, message_id: Uuid, _text: &str) {
        self.sent_ids.push(message_id);
        self.events.push(format!("sent:{}", message_id));
    }

    fn on_message(&mut self, text: &str) {
        self.messages.push(text.to_string());
        self.events.push("recv".to_string());
    }

    fn on_error(&mut self, _error: &ProbeError) {
        self.events.push("error".to_string());
    }

    fn on_close(&mut self, _frame: Option<&CloseFrame<'_>>) {
        self.events.push("close".to_string());
    }
}
