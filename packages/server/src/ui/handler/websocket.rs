//! WebSocket connection handlers.
//!
//! Each accepted connection runs three tasks sharing one
//! [`CancellationToken`]:
//!
//! - reader: decodes inbound frames and routes them to the hub
//! - writer: drains the connection's outbound channel into the socket
//! - heartbeat: pings the peer and waits for the pong
//!
//! The first task to stop cancels the token, the connection leaves its room
//! through the hub, and the others follow. Every socket write is abandoned on
//! cancellation so a peer that stopped reading cannot hold the teardown.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use chabudai_shared::time::now_millis;
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use serde::Deserialize;
use tokio::sync::{Mutex, mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::{
    config::HeartbeatConfig,
    domain::{ConnectionId, DisplayName, Member, ReadStatusUpdate, RoomId, Timestamp},
    infrastructure::dto::websocket::{FrameError, IncomingFrame, MISSING_CHAT_ID_ERROR},
    ui::state::AppState,
    usecase::{ChatHub, HubError},
};

type SharedSink = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub client_id: Option<String>,
    pub username: Option<String>,
    #[serde(alias = "room_id")]
    pub chat_id: Option<String>,
}

/// The identity a connection was accepted with
#[derive(Debug, Clone)]
struct Participant {
    connection_id: ConnectionId,
    client_id: String,
    display_name: DisplayName,
    room_id: RoomId,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let participant = accept(query, &state.default_room_id)?;
    tracing::info!(
        "Client '{}' ({}) connecting to room '{}'",
        participant.client_id,
        participant.display_name,
        participant.room_id
    );

    Ok(ws
        .on_failed_upgrade(|e| tracing::warn!("WebSocket upgrade failed: {}", e))
        .on_upgrade(move |socket| handle_socket(socket, state, participant)))
}

/// Validate the query. Nothing reaches the hub unless this succeeds.
fn accept(query: ConnectQuery, default_room_id: &RoomId) -> Result<Participant, StatusCode> {
    let Some(client_id) = query.client_id.filter(|id| !id.is_empty()) else {
        tracing::warn!("Rejected connection without client_id");
        return Err(StatusCode::BAD_REQUEST);
    };

    let username = query
        .username
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| client_id.clone());
    let display_name = DisplayName::new(username).map_err(|e| {
        tracing::warn!("Rejected connection of '{}': {}", client_id, e);
        StatusCode::BAD_REQUEST
    })?;

    let room_id = match query.chat_id.filter(|id| !id.is_empty()) {
        Some(id) => RoomId::new(id).map_err(|e| {
            tracing::warn!("Rejected connection of '{}': {}", client_id, e);
            StatusCode::BAD_REQUEST
        })?,
        None => default_room_id.clone(),
    };

    Ok(Participant {
        connection_id: ConnectionId::generate(),
        client_id,
        display_name,
        room_id,
    })
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, participant: Participant) {
    let (sink, stream) = socket.split();
    let sink: SharedSink = Arc::new(Mutex::new(sink));
    let (tx, rx) = mpsc::unbounded_channel();

    let member = Member::new(
        participant.client_id.clone(),
        participant.display_name.clone(),
        Timestamp::new(now_millis()),
    );
    if let Err(e) = state.hub.join(
        participant.room_id.clone(),
        participant.connection_id,
        member,
        tx,
    ) {
        tracing::error!("Client '{}' could not join: {}", participant.client_id, e);
        return;
    }

    let token = CancellationToken::new();
    // payload of the latest pong
    let (pong_tx, pong_rx) = watch::channel(Bytes::new());

    let writer = tokio::spawn(pusher_loop(
        rx,
        sink.clone(),
        token.clone(),
        participant.connection_id,
    ));
    let heartbeat = tokio::spawn(heartbeat_loop(
        sink.clone(),
        pong_rx,
        state.heartbeat,
        token.clone(),
        participant.connection_id,
    ));
    reader_loop(stream, &state.hub, &participant, pong_tx, token.clone()).await;

    token.cancel();
    if let Err(e) = state
        .hub
        .leave(participant.room_id.clone(), participant.connection_id)
    {
        tracing::error!("Client '{}' could not leave: {}", participant.client_id, e);
    }

    for (name, task) in [("writer", writer), ("heartbeat", heartbeat)] {
        if let Err(e) = task.await {
            tracing::warn!(
                "{} task of connection '{}' failed: {}",
                name,
                participant.connection_id,
                e
            );
        }
    }
    let close = async { sink.lock().await.close().await };
    match tokio::time::timeout(state.heartbeat.timeout, close).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Closing socket of '{}': {}", participant.client_id, e),
        Err(_) => tracing::debug!("Closing socket of '{}' timed out", participant.client_id),
    }
    tracing::info!(
        "Client '{}' disconnected from room '{}'",
        participant.client_id,
        participant.room_id
    );
}

async fn reader_loop(
    mut stream: SplitStream<WebSocket>,
    hub: &ChatHub,
    participant: &Participant,
    pong: watch::Sender<Bytes>,
    token: CancellationToken,
) {
    loop {
        let message = tokio::select! {
            _ = token.cancelled() => break,
            message = stream.next() => message,
        };
        let message = match message {
            Some(Ok(message)) => message,
            Some(Err(e)) => {
                tracing::debug!("WebSocket error from '{}': {}", participant.client_id, e);
                break;
            }
            None => break,
        };

        match message {
            Message::Text(text) => {
                tracing::debug!(
                    "Received text from '{}': {}",
                    participant.client_id,
                    text.as_str()
                );
                if let Err(e) = route_frame(text.as_str(), hub, participant) {
                    tracing::error!("Dropping connection '{}': {}", participant.client_id, e);
                    break;
                }
            }
            Message::Binary(_) => {
                tracing::debug!("Ignored binary frame from '{}'", participant.client_id);
            }
            Message::Pong(payload) => {
                pong.send_replace(payload);
            }
            Message::Ping(_) => {
                tracing::debug!("Received ping from '{}'", participant.client_id);
            }
            Message::Close(_) => {
                tracing::info!("Client '{}' requested close", participant.client_id);
                break;
            }
        }
    }
    token.cancel();
}

/// Decode one text frame and hand it to the hub.
///
/// Bad frames are logged and dropped; only a closed hub is an error.
fn route_frame(text: &str, hub: &ChatHub, participant: &Participant) -> Result<(), HubError> {
    match IncomingFrame::parse(text) {
        Ok(IncomingFrame::Chat(chat)) => match chat.into_draft(participant.display_name.clone()) {
            Ok(draft) => hub.publish(draft),
            Err(e) => {
                tracing::warn!("Dropped message from '{}': {}", participant.client_id, e);
                Ok(())
            }
        },
        Ok(IncomingFrame::ReadStatus(dto)) => match ReadStatusUpdate::try_from(dto) {
            Ok(update) => hub.update_read_status(update),
            Err(e) => {
                tracing::warn!("Dropped read update from '{}': {}", participant.client_id, e);
                Ok(())
            }
        },
        Err(FrameError::MissingRoomId) => {
            tracing::warn!("Message from '{}' has no chat_id", participant.client_id);
            hub.report_error(participant.connection_id, MISSING_CHAT_ID_ERROR.to_string())
        }
        Err(e) => {
            tracing::warn!("Dropped frame from '{}': {}", participant.client_id, e);
            Ok(())
        }
    }
}

/// Drains the outbound channel into the socket.
///
/// The channel closes when the hub unregisters the connection.
async fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    sink: SharedSink,
    token: CancellationToken,
    connection_id: ConnectionId,
) {
    loop {
        let text = tokio::select! {
            _ = token.cancelled() => break,
            text = rx.recv() => text,
        };
        let Some(text) = text else {
            tracing::debug!("Outbound channel of '{}' closed", connection_id);
            break;
        };
        let write = async { sink.lock().await.send(Message::Text(text.into())).await };
        let result = tokio::select! {
            _ = token.cancelled() => break,
            result = write => result,
        };
        if let Err(e) = result {
            tracing::debug!("Write to '{}' failed: {}", connection_id, e);
            break;
        }
    }
    token.cancel();
}

/// Ping payload carrying its sequence number
fn ping_payload(seq: u64) -> Bytes {
    Bytes::copy_from_slice(&seq.to_be_bytes())
}

/// Waits for the pong echoing `payload`. Pongs of earlier pings do not count.
async fn await_pong(pong: &mut watch::Receiver<Bytes>, payload: &Bytes, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, pong.wait_for(|echo| echo == payload)).await,
        Ok(Ok(_))
    )
}

async fn heartbeat_loop(
    sink: SharedSink,
    mut pong: watch::Receiver<Bytes>,
    config: HeartbeatConfig,
    token: CancellationToken,
    connection_id: ConnectionId,
) {
    let mut ticker = tokio::time::interval(config.interval);
    // skip the immediate first tick
    ticker.reset();
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        seq += 1;
        let payload = ping_payload(seq);
        let ping = async { sink.lock().await.send(Message::Ping(payload.clone())).await };
        match tokio::time::timeout(config.timeout, ping).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!("Ping to '{}' failed: {}", connection_id, e);
                break;
            }
            Err(_) => {
                tracing::warn!("Ping to '{}' timed out", connection_id);
                break;
            }
        }

        let answered = tokio::select! {
            _ = token.cancelled() => break,
            answered = await_pong(&mut pong, &payload, config.timeout) => answered,
        };
        if !answered {
            tracing::warn!("No pong from '{}', closing connection", connection_id);
            break;
        }
    }
    token.cancel();
}
