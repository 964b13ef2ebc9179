use crate::auth::SessionToken;
use crate::config::Config;
use crate::error::ProbeError;
use crate::ws::messages::{ChatCommand, CommandMessage, MessageFlags, WireDialect};
use crate::ws::observer::ProbeObserver;
use crate::ws::reply::ServerMessage;
use futures::{SinkExt, StreamExt};
use http::{header::COOKIE, HeaderValue};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{
    client::IntoClientRequest,
    protocol::{CloseFrame, Message},
    Error as WsError,
};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy)]
pub struct ProbeOptions {
    pub dialect: WireDialect,
    /// `Flags` value stamped on every outgoing message.
    pub flags: MessageFlags,
    /// How long a lock-step send waits for the next text frame.
    pub reply_timeout: Duration,
    /// How long to wait for the peer to acknowledge our Close frame.
    pub close_timeout: Duration,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        Self {
            dialect: WireDialect::default(),
            flags: MessageFlags::NONE,
            reply_timeout: Duration::from_secs(30),
            close_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for ProbeOptions {
    fn from(config: &Config) -> Self {
        Self {
            dialect: config.dialect(),
            flags: MessageFlags::from_bits(config.flags),
            reply_timeout: config.reply_timeout(),
            close_timeout: config.close_timeout(),
        }
    }
}

/// Counters for one connection, returned when it ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeReport {
    pub sent: usize,
    pub received: usize,
    pub closed_by_peer: bool,
}

/// One send and the first text frame that followed it.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundTrip {
    pub message_id: Uuid,
    pub reply: String,
    /// The reply carried `message_id`. Never enforced, only reported.
    pub correlated: bool,
}

enum Incoming {
    Text(String),
    Closed(Option<CloseFrame<'static>>),
}

enum Step {
    Shutdown,
    QueueClosed,
    Request(ChatCommand),
    Incoming(Result<Incoming, ProbeError>),
}

/// A single authenticated connection to the chat endpoint.
pub struct ProbeSession {
    stream: WsStream,
    options: ProbeOptions,
    sent: usize,
    received: usize,
    closed_by_peer: bool,
}

impl ProbeSession {
    /// Open `chat_url` presenting the session token as the `SessionID` cookie.
    pub async fn connect(
        chat_url: &str,
        token: &SessionToken,
        options: ProbeOptions,
    ) -> Result<Self, ProbeError> {
        let mut request = chat_url
            .into_client_request()
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        let cookie = HeaderValue::from_str(&token.cookie_header())
            .map_err(|e| ProbeError::Request(e.to_string()))?;
        request.headers_mut().insert(COOKIE, cookie);

        info!(url=%chat_url, "Connecting to chat endpoint");

        let (stream, response) = connect_async(request)
            .await
            .map_err(ProbeError::Handshake)?;

        info!(status=%response.status(), "WebSocket connected");

        Ok(Self {
            stream,
            options,
            sent: 0,
            received: 0,
            closed_by_peer: false,
        })
    }

    pub fn report(&self) -> ProbeReport {
        ProbeReport {
            sent: self.sent,
            received: self.received,
            closed_by_peer: self.closed_by_peer,
        }
    }

    /// Wrap `command` in a fresh message and send it as one text frame.
    pub async fn send<O>(&mut self, command: ChatCommand, observer: &mut O) -> Result<Uuid, ProbeError>
    where
        O: ProbeObserver + ?Sized,
    {
        let message = CommandMessage::with_flags(command, self.options.flags);
        let text = message.encode(self.options.dialect)?;

        debug!(
            message_id=%message.message_id,
            command=%message.command.name(),
            flags=message.flags.bits(),
            payload=%text,
            "Sending command"
        );

        self.stream
            .send(Message::Text(text.clone()))
            .await
            .map_err(ProbeError::Send)?;
        self.sent += 1;

        observer.on_sent(message.message_id, &text);

        Ok(message.message_id)
    }

    /// Report every text frame until the peer closes or `shutdown` fires.
    pub async fn run_until_closed<O>(
        &mut self,
        observer: &mut O,
        shutdown: CancellationToken,
    ) -> Result<ProbeReport, ProbeError>
    where
        O: ProbeObserver + ?Sized,
    {
        loop {
            let incoming = tokio::select! {
                _ = shutdown.cancelled() => None,
                incoming = self.next_frame() => Some(incoming),
            };

            match incoming {
                None => {
                    info!("Shutdown signal received, closing WebSocket");
                    self.close(observer).await;
                    return Ok(self.report());
                }
                Some(Ok(Incoming::Text(text))) => observer.on_message(&text),
                Some(Ok(Incoming::Closed(frame))) => {
                    self.closed_by_peer = true;
                    observer.on_close(frame.as_ref());
                    return Ok(self.report());
                }
                Some(Err(e)) => {
                    observer.on_error(&e);
                    return Err(e);
                }
            }
        }
    }

    /// Send one command and wait for the next text frame.
    ///
    /// Whatever arrives first counts as the reply, as the server may interleave
    /// broadcasts; `RoundTrip::correlated` tells whether it really was one.
    pub async fn round_trip<O>(
        &mut self,
        command: ChatCommand,
        observer: &mut O,
    ) -> Result<RoundTrip, ProbeError>
    where
        O: ProbeObserver + ?Sized,
    {
        let message_id = self.send(command, observer).await?;
        let timeout = self.options.reply_timeout;

        match tokio::time::timeout(timeout, self.next_frame()).await {
            Ok(Ok(Incoming::Text(reply))) => {
                observer.on_message(&reply);

                let correlated = ServerMessage::parse(&reply)
                    .map(|message| message.answers(message_id))
                    .unwrap_or(false);
                if !correlated {
                    info!(message_id=%message_id, "Reply does not carry the sent MessageID");
                }

                Ok(RoundTrip {
                    message_id,
                    reply,
                    correlated,
                })
            }
            Ok(Ok(Incoming::Closed(frame))) => {
                self.closed_by_peer = true;
                observer.on_close(frame.as_ref());
                Err(ProbeError::ClosedBeforeReply { message_id })
            }
            Ok(Err(e)) => {
                observer.on_error(&e);
                Err(e)
            }
            Err(_) => {
                let e = ProbeError::ReplyTimeout {
                    message_id,
                    timeout,
                };
                observer.on_error(&e);
                Err(e)
            }
        }
    }

    /// Serve commands from `requests` one round trip at a time.
    ///
    /// Each finished round trip is pushed to `completed` before the next
    /// request is taken. Frames arriving while the queue is idle still reach
    /// the observer. Ends when the queue closes, the peer closes, or
    /// `shutdown` fires.
    pub async fn run_lock_step<O>(
        &mut self,
        mut requests: mpsc::Receiver<ChatCommand>,
        completed: mpsc::Sender<RoundTrip>,
        observer: &mut O,
        shutdown: CancellationToken,
    ) -> Result<ProbeReport, ProbeError>
    where
        O: ProbeObserver + ?Sized,
    {
        loop {
            let step = tokio::select! {
                _ = shutdown.cancelled() => Step::Shutdown,
                request = requests.recv() => match request {
                    Some(command) => Step::Request(command),
                    None => Step::QueueClosed,
                },
                incoming = self.next_frame() => Step::Incoming(incoming),
            };

            match step {
                Step::Shutdown => {
                    info!("Shutdown signal received, closing WebSocket");
                    self.close(observer).await;
                    return Ok(self.report());
                }
                Step::QueueClosed => {
                    info!("Request queue closed, closing WebSocket");
                    self.close(observer).await;
                    return Ok(self.report());
                }
                Step::Incoming(Ok(Incoming::Text(text))) => observer.on_message(&text),
                Step::Incoming(Ok(Incoming::Closed(frame))) => {
                    self.closed_by_peer = true;
                    observer.on_close(frame.as_ref());
                    return Ok(self.report());
                }
                Step::Incoming(Err(e)) => {
                    observer.on_error(&e);
                    return Err(e);
                }
                Step::Request(command) => {
                    let result = tokio::select! {
                        _ = shutdown.cancelled() => None,
                        result = self.round_trip(command, observer) => Some(result),
                    };

                    match result {
                        None => {
                            info!("Shutdown signal received mid round trip, closing WebSocket");
                            self.close(observer).await;
                            return Ok(self.report());
                        }
                        Some(Ok(round_trip)) => {
                            if completed.send(round_trip).await.is_err() {
                                debug!("Completion receiver dropped");
                            }
                        }
                        Some(Err(ProbeError::ClosedBeforeReply { .. })) => return Ok(self.report()),
                        Some(Err(e)) => return Err(e),
                    }
                }
            }
        }
    }

    /// Next text or close frame. Control and binary frames are skipped.
    async fn next_frame(&mut self) -> Result<Incoming, ProbeError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => {
                    self.received += 1;
                    debug!(size=text.len(), payload=%text, "Received text frame");
                    return Ok(Incoming::Text(text));
                }
                Some(Ok(Message::Close(frame))) => {
                    info!(frame=?frame, "Closed by server");
                    return Ok(Incoming::Closed(frame));
                }
                Some(Ok(Message::Binary(data))) => {
                    warn!(size=data.len(), "Binary frames not supported, ignoring");
                }
                Some(Ok(_)) => {}
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) | None => {
                    return Ok(Incoming::Closed(None));
                }
                Some(Err(e)) => return Err(ProbeError::Receive(e)),
            }
        }
    }

    /// Send a Close frame and wait briefly for the peer's answer.
    async fn close<O>(&mut self, observer: &mut O)
    where
        O: ProbeObserver + ?Sized,
    {
        if let Err(e) = self.stream.close(None).await {
            debug!(error=%e, "Close frame not sent");
            observer.on_close(None);
            return;
        }

        let timeout = self.options.close_timeout;
        let frame = tokio::time::timeout(timeout, async {
            loop {
                match self.next_frame().await {
                    Ok(Incoming::Closed(frame)) => return frame,
                    Ok(Incoming::Text(text)) => {
                        debug!(payload=%text, "Discarding frame received while closing");
                    }
                    Err(e) => {
                        debug!(error=%e, "Read failed while closing");
                        return None;
                    }
                }
            }
        })
        .await
        .unwrap_or_else(|_| {
            warn!(timeout=?timeout, "Peer did not acknowledge close");
            None
        });

        observer.on_close(frame.as_ref());
    }
}
