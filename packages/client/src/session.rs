//! WebSocket client session management.

use futures_util::{SinkExt, StreamExt};
use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, protocol::Message},
};

use chabudai_server::infrastructure::dto::websocket::ServerFrame;

use crate::{
    config::ClientConfig,
    domain::{encode_command, parse_input},
    error::ClientError,
};

use super::{formatter::MessageFormatter, ui::redisplay_prompt};

/// Run one WebSocket client session
///
/// Returns `Ok(())` when the user ends the session (Ctrl+C / Ctrl+D).
pub async fn run_client_session(config: &ClientConfig) -> Result<(), ClientError> {
    let url = config.connect_url()?;

    let (ws_stream, _response) = match connect_async(url.as_str()).await {
        Ok(result) => result,
        Err(WsError::Http(response)) => {
            return Err(ClientError::Rejected(response.status().as_u16()));
        }
        Err(e) => return Err(ClientError::ConnectionError(e.to_string())),
    };

    let me = config.display_name().to_string();
    tracing::info!("Connected to chat server!");
    println!(
        "\nYou are '{}' in room '{}'. Type messages and press Enter to send.\n\
         Use /read <timestamp> or /unread <timestamp> to change a message's read status. \
         Press Ctrl+C to exit.\n",
        me, config.chat_id
    );

    let (mut write, mut read) = ws_stream.split();

    // Spawn a task to handle incoming messages
    let me_for_read = me.clone();
    let chat_id_for_read = config.chat_id.clone();
    let mut read_task = tokio::spawn(async move {
        while let Some(message) = read.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    let formatted = match ServerFrame::parse(text.as_str()) {
                        Ok(ServerFrame::RoomState(state)) => {
                            MessageFormatter::format_room_state(&state, &chat_id_for_read, &me_for_read)
                        }
                        Ok(ServerFrame::Status(status)) => {
                            MessageFormatter::format_presence(&status.online_users, &me_for_read)
                        }
                        Ok(ServerFrame::Chat(chat)) => MessageFormatter::format_chat_message(&chat),
                        Ok(ServerFrame::Error(error)) => MessageFormatter::format_error(&error.error),
                        Err(_) => MessageFormatter::format_raw_message(text.as_str()),
                    };
                    print!("{}", formatted);
                    redisplay_prompt(&me_for_read);
                }
                Ok(Message::Binary(data)) => {
                    print!("{}", MessageFormatter::format_binary_message(data.len()));
                    redisplay_prompt(&me_for_read);
                }
                Ok(Message::Close(_)) => {
                    tracing::info!("Server closed the connection");
                    return true;
                }
                Err(e) => {
                    tracing::warn!("WebSocket read error: {}", e);
                    return true;
                }
                // ping / pong are answered by tungstenite
                Ok(_) => {}
            }
        }
        true
    });

    // Create channel for rustyline input
    let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();

    // Spawn a blocking thread for rustyline (synchronous readline)
    let prompt = format!("{}> ", me);
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
                    if !line.trim().is_empty() {
                        rl.add_history_entry(line.trim()).ok();
                    }
                    if input_tx.send(line).is_err() {
                        // Channel closed, exit thread
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

    // Spawn a task to send typed lines to the server
    let chat_id = config.chat_id.clone();
    let me_for_write = me.clone();
    let mut write_task = tokio::spawn(async move {
        while let Some(line) = input_rx.recv().await {
            let command = match parse_input(&line) {
                None => continue,
                Some(Ok(command)) => command,
                Some(Err(e)) => {
                    print!("{}", MessageFormatter::format_input_error(&e.to_string()));
                    redisplay_prompt(&me_for_write);
                    continue;
                }
            };

            let json = match encode_command(&command, &chat_id, &me_for_write) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if let Err(e) = write.send(Message::Text(json.into())).await {
                tracing::warn!("Failed to send message: {}", e);
                return true;
            }
        }
        false
    });

    // If any one of the tasks completes, abort the other
    let connection_lost = tokio::select! {
        read_result = &mut read_task => {
            write_task.abort();
            read_result.unwrap_or(true)
        }
        write_result = &mut write_task => {
            read_task.abort();
            write_result.unwrap_or(true)
        }
    };

    if connection_lost {
        return Err(ClientError::ConnectionError("Connection lost".to_string()));
    }
    Ok(())
}
