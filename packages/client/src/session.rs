//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use hiroba_shared::time::local_clock_time;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{
        self,
        client::IntoClientRequest,
        http::HeaderValue,
        protocol::{CloseFrame, Message, frame::coding::CloseCode},
    },
};

use crate::{
    domain::{format_incoming, is_exit_command, rejection_reason, split_frame},
    error::ClientError,
};

use super::ui::redisplay_prompt;

/// Handshake header carrying the requested name (and, in the response, the assigned one)
pub const USERNAME_HEADER: &str = "username";

/// Run the WebSocket client session
pub async fn run_client_session(
    url: &str,
    username: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = url.into_client_request()?;
    let header = HeaderValue::from_str(username)
        .map_err(|e| ClientError::ConnectionError(format!("invalid username header: {}", e)))?;
    request.headers_mut().insert(USERNAME_HEADER, header);

    let (ws_stream, response) = match connect_async(request).await {
        Ok(result) => result,
        Err(tungstenite::Error::Http(response)) => {
            let reason = rejection_reason(response.status().as_u16(), response.body().as_deref());
            return Err(Box::new(ClientError::NameRejected(reason)));
        }
        Err(e) => return Err(Box::new(ClientError::ConnectionError(e.to_string()))),
    };

    // anonymous クライアントはサーバーが割り当てた名前をレスポンスヘッダーで知る
    let assigned = response
        .headers()
        .get(USERNAME_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(username)
        .to_string();

    tracing::info!("Connected to chat server as '{}'", assigned);
    println!(
        "\nYou are '{}'. Type messages and press Enter to send. Type 'exit' or press Ctrl+C to leave.\n",
        assigned
    );

    let (mut write, mut read) = ws_stream.split();

    let username_for_read = assigned.clone();
    let mut read_task = tokio::spawn(async move {
        let mut connection_error = false;

        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let clock_time = local_clock_time();
                    for line in split_frame(text.as_str()) {
                        println!("\r{}", format_incoming(&clock_time, line));
                    }
                    redisplay_prompt(&username_for_read);
                }
                Ok(Message::Close(frame)) => {
                    match frame {
                        Some(frame) if frame.code != CloseCode::Normal => {
                            tracing::warn!("Server closed the connection: {}", frame.code);
                            connection_error = true;
                        }
                        _ => tracing::info!("Server closed the connection"),
                    }
                    break;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    connection_error = true;
                    break;
                }
                _ => {}
            }
        }

        connection_error
    });

    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // rustyline は同期 API のため専用スレッドで読む
    let prompt = format!("{}> ", assigned);
    let _readline_handle = std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if is_exit_command(line) {
                        break;
                    }
                    rl.add_history_entry(line).ok();
                    if input_tx.send(line.to_string()).is_err() {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    // Ctrl+D
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });

    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            if let Err(e) = write.send(Message::Text(line.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                return true;
            }
        }

        // 入力が終わったら正常終了の close フレームを送る
        let frame = CloseFrame {
            code: CloseCode::Normal,
            reason: "bye".into(),
        };
        if let Err(e) = write.send(Message::Close(Some(frame))).await {
            tracing::debug!("Failed to send close frame: {}", e);
        }
        false
    });

    tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            if read_result.unwrap_or(true) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
        write_result = &mut write_task => {
            read_task.abort();
            if write_result.unwrap_or(true) {
                return Err(Box::new(ClientError::ConnectionError(
                    "Connection lost".to_string(),
                )));
            }
        }
    }

    Ok(())
}
