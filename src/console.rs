use crate::error::ProbeError;
use crate::ws::{ChatCommand, ProbeObserver, ProbeReport, ProbeSession, RoundTrip};
use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Typing this on its own line ends the interactive session.
pub const QUIT_COMMAND: &str = "/quit";

/// Prompt on stdin for message text and send each line to `chatroom_id`,
/// waiting for the reply before prompting again.
pub async fn run_interactive<O>(
    session: &mut ProbeSession,
    chatroom_id: Uuid,
    observer: &mut O,
    shutdown: CancellationToken,
) -> Result<ProbeReport, ProbeError>
where
    O: ProbeObserver + ?Sized,
{
    // Unlocked stdout: the observer prints from the runtime threads.
    let input = io::BufReader::new(io::stdin());
    run_console(session, chatroom_id, input, io::stdout(), observer, shutdown).await
}

/// [`run_interactive`] over any line source.
pub async fn run_console<R, W, O>(
    session: &mut ProbeSession,
    chatroom_id: Uuid,
    input: R,
    output: W,
    observer: &mut O,
    shutdown: CancellationToken,
) -> Result<ProbeReport, ProbeError>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
    O: ProbeObserver + ?Sized,
{
    // Capacity 1 on both sides keeps the console and the socket in lock-step.
    let (request_tx, request_rx) = mpsc::channel(1);
    let (completed_tx, completed_rx) = mpsc::channel(1);

    // Never joined: a thread blocked on stdin cannot be interrupted.
    let _console = spawn_prompt(
        input,
        output,
        chatroom_id,
        request_tx,
        completed_rx,
        shutdown.clone(),
    )?;

    info!(chatroom_id=%chatroom_id, "Interactive mode, type {} to exit", QUIT_COMMAND);

    session
        .run_lock_step(request_rx, completed_tx, observer, shutdown)
        .await
}

pub fn spawn_prompt<R, W>(
    input: R,
    output: W,
    chatroom_id: Uuid,
    requests: mpsc::Sender<ChatCommand>,
    completed: mpsc::Receiver<RoundTrip>,
    shutdown: CancellationToken,
) -> io::Result<JoinHandle<()>>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
{
    thread::Builder::new()
        .name("console".to_string())
        .spawn(move || {
            match prompt_loop(input, output, chatroom_id, requests, completed, &shutdown) {
                Ok(sent) => debug!(sent, "Console input finished"),
                Err(e) => warn!(error=%e, "Console input failed"),
            }
        })
}

/// Blocking read-send-wait loop. Returns how many messages were sent.
///
/// Stops at end of input, on [`QUIT_COMMAND`], when either channel closes, or
/// once `shutdown` is cancelled. A line typed after Ctrl+C is never sent.
pub fn prompt_loop<R, W>(
    mut input: R,
    mut output: W,
    chatroom_id: Uuid,
    requests: mpsc::Sender<ChatCommand>,
    mut completed: mpsc::Receiver<RoundTrip>,
    shutdown: &CancellationToken,
) -> io::Result<usize>
where
    R: BufRead,
    W: Write,
{
    let mut sent = 0;
    let mut line = String::new();

    while !shutdown.is_cancelled() {
        write!(output, "Message: ")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 || shutdown.is_cancelled() {
            break;
        }

        let text = line.trim_end_matches(|c| c == '\r' || c == '\n');
        if text == QUIT_COMMAND {
            break;
        }
        if text.is_empty() {
            continue;
        }

        let command = ChatCommand::ChatMessage {
            chatroom_id,
            text: text.to_string(),
        };
        if requests.blocking_send(command).is_err() {
            break;
        }
        sent += 1;

        if completed.blocking_recv().is_none() {
            break;
        }
    }

    Ok(sent)
}
