//! Per-connection client session: the read pump and the write pump.
//!
//! The read pump publishes every text frame the client sends onto the shared
//! broadcast channel. The write pump drains the session's mailbox into the
//! socket. Either pump ending tears the session down: the session is removed
//! from the registry, which closes its mailbox, and the write pump answers a
//! closed mailbox with a close frame.
//!
//! A session the registry drops on its own (mailbox overflow) is evicted: both
//! pumps stop at once and the connection is dropped, even if the write pump is
//! stuck on a peer that stopped reading.

use std::{fmt::Display, io::ErrorKind, sync::Arc, time::Duration};

use axum::extract::ws::{CloseCode, Message, WebSocket, close_code};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    domain::{BroadcastSender, InboundMessage, MailboxReceiver, SessionHandle, Username},
    usecase::DisconnectClientUseCase,
};

/// How long the write pump may take to flush the close frame after the read side ended
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Why the read pump stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEnd {
    /// The peer sent a close frame (with its code, if any)
    Closed(Option<CloseCode>),
    /// The connection ended without a close frame
    Eof,
    /// The transport reported an error
    Error(String),
    /// The broadcast engine is gone
    BroadcastClosed,
    /// The registry dropped the session
    Evicted,
}

impl ReadEnd {
    /// Normal and going-away closes, a close without a code, and a dropped
    /// connection are expected ways for a client to leave.
    pub fn is_expected(&self) -> bool {
        match self {
            ReadEnd::Closed(None) | ReadEnd::Eof => true,
            ReadEnd::Closed(Some(code)) => {
                *code == close_code::NORMAL || *code == close_code::AWAY
            }
            ReadEnd::Error(_) | ReadEnd::BroadcastClosed | ReadEnd::Evicted => false,
        }
    }
}

/// Why the write pump stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteEnd {
    /// The mailbox was closed; a close frame was sent (or attempted)
    MailboxClosed,
    /// Writing to the transport failed
    Failed(String),
}

/// One admitted client connection
pub struct ClientSession {
    handle: SessionHandle,
    mailbox: MailboxReceiver,
    eviction: CancellationToken,
    broadcast_tx: BroadcastSender,
    disconnect: Arc<DisconnectClientUseCase>,
}

impl ClientSession {
    pub fn new(
        handle: SessionHandle,
        mailbox: MailboxReceiver,
        eviction: CancellationToken,
        broadcast_tx: BroadcastSender,
        disconnect: Arc<DisconnectClientUseCase>,
    ) -> Self {
        Self {
            handle,
            mailbox,
            eviction,
            broadcast_tx,
            disconnect,
        }
    }

    /// Drive both pumps until the session ends, then tear it down.
    pub async fn run(self, socket: WebSocket) {
        let Self {
            handle,
            mailbox,
            eviction,
            broadcast_tx,
            disconnect,
        } = self;
        let (sink, stream) = socket.split();

        let mut write_task = tokio::spawn(write_pump(sink, mailbox, handle.name.clone()));
        let read = read_pump(stream, &handle.name, &broadcast_tx, &eviction);
        tokio::pin!(read);

        tokio::select! {
            biased;
            _ = eviction.cancelled() => {
                tracing::warn!("Client '{}' evicted, closing the connection", handle.name);
                // Dropping both halves closes the socket; queued messages are discarded.
                write_task.abort();
            }
            end = &mut read => {
                log_read_end(&handle.name, &end);
                // Removal closes the mailbox; the write pump then sends the
                // close frame and exits on its own.
                disconnect.execute(&handle).await;
                match tokio::time::timeout(CLOSE_TIMEOUT, &mut write_task).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => {
                        tracing::error!("Write pump of '{}' panicked: {}", handle.name, e);
                    }
                    Err(_) => {
                        tracing::debug!("Write pump of '{}' did not finish, aborting", handle.name);
                        write_task.abort();
                    }
                }
            }
            result = &mut write_task => {
                match result {
                    Ok(WriteEnd::MailboxClosed) => {
                        tracing::info!("Client '{}' disconnected by the server", handle.name);
                    }
                    Ok(WriteEnd::Failed(e)) => {
                        tracing::warn!("Failed to write to '{}': {}", handle.name, e);
                    }
                    Err(e) => {
                        tracing::error!("Write pump of '{}' panicked: {}", handle.name, e);
                    }
                }
                // Dropping the read half here releases the connection.
                disconnect.execute(&handle).await;
            }
        }
    }
}

fn log_read_end(name: &Username, end: &ReadEnd) {
    if end.is_expected() {
        tracing::info!("Client '{}' disconnected ({:?})", name, end);
    } else {
        tracing::error!("Client '{}' connection ended unexpectedly: {:?}", name, end);
    }
}

/// A peer that vanished without a close frame: the transport reports a reset
/// (tungstenite's `ResetWithoutClosingHandshake`) or an I/O error of that kind.
fn is_abnormal_closure(error: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(error);
    while let Some(err) = source {
        if let Some(io) = err.downcast_ref::<std::io::Error>()
            && matches!(
                io.kind(),
                ErrorKind::ConnectionReset | ErrorKind::BrokenPipe | ErrorKind::UnexpectedEof
            )
        {
            return true;
        }
        if err.to_string().contains("without closing handshake") {
            return true;
        }
        source = err.source();
    }
    false
}

/// Publish every message read from `stream` as `(sender, payload)` until the
/// connection ends or the session is evicted.
///
/// Binary frames are accepted when they hold UTF-8 text. Ping and pong frames
/// are answered by the transport and skipped here.
pub async fn read_pump<S>(
    mut stream: S,
    sender: &Username,
    broadcast_tx: &BroadcastSender,
    eviction: &CancellationToken,
) -> ReadEnd
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(e) if is_abnormal_closure(&e) => return ReadEnd::Eof,
            Err(e) => return ReadEnd::Error(e.to_string()),
        };

        let payload = match message {
            Message::Text(text) => text.as_str().to_owned(),
            Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
                Ok(text) => text,
                Err(_) => {
                    tracing::warn!("Dropping non UTF-8 binary frame from '{}'", sender);
                    continue;
                }
            },
            Message::Close(frame) => return ReadEnd::Closed(frame.map(|f| f.code)),
            _ => continue,
        };

        // 名前は既に解放されているので、以降の発言は流さない
        if eviction.is_cancelled() {
            return ReadEnd::Evicted;
        }

        tracing::debug!("Received from '{}': {}", sender, payload);
        if broadcast_tx
            .send(InboundMessage::new(sender.clone(), payload))
            .is_err()
        {
            return ReadEnd::BroadcastClosed;
        }
    }

    ReadEnd::Eof
}

/// Drain the mailbox into `sink` until the mailbox is closed or a write fails.
///
/// Messages already waiting behind the one just received are sent in the same
/// frame, one per line.
pub async fn write_pump<W>(mut sink: W, mut mailbox: MailboxReceiver, name: Username) -> WriteEnd
where
    W: Sink<Message> + Unpin,
    W::Error: Display,
{
    while let Some(first) = mailbox.recv().await {
        let frame = coalesce(first, &mut mailbox);
        if let Err(e) = sink.send(Message::Text(frame.into())).await {
            tracing::debug!("Write to '{}' failed: {}", name, e);
            return WriteEnd::Failed(e.to_string());
        }
    }

    if let Err(e) = sink.send(Message::Close(None)).await {
        tracing::debug!("Close frame to '{}' not sent: {}", name, e);
    }
    WriteEnd::MailboxClosed
}

/// Join `first` with every message queued in `mailbox` at this instant.
pub fn coalesce(first: String, mailbox: &mut MailboxReceiver) -> String {
    let queued = mailbox.len();
    let mut frame = first;
    for _ in 0..queued {
        match mailbox.try_recv() {
            Ok(next) => {
                frame.push('\n');
                frame.push_str(&next);
            }
            Err(_) => break,
        }
    }
    frame
}
