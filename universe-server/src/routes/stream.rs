//! WebSocket delta stream (spec §6.2): server pushes `{op, payload}` frames
//! at 10 Hz, clients send none. Grounded on the teacher's `websocket.rs`
//! `handle_socket` shape (upgrade, then a `tokio::select!`/`interval` loop)
//! with the broadcast side dropped — this stream has no client-originated
//! events to fan in.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;

use universe_core::stream::{encode_frame, Frame};

use crate::state::AppState;
use crate::tracing_logger::CorrelationId;

const STREAM_INTERVAL: Duration = Duration::from_millis(100);

pub async fn stream_deltas(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let correlation_id = CorrelationId::new();
    tracing::info!(%correlation_id, "delta stream session started");

    let mut interval = tokio::time::interval(STREAM_INTERVAL);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let bytes = state.engine.store.snapshot();
                if bytes.is_empty() {
                    continue;
                }
                let frame = Frame::asset_add(&bytes);
                match encode_frame(&frame, true) {
                    Ok(wire) => {
                        if socket.send(Message::Binary(wire)).await.is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        tracing::warn!(%correlation_id, %err, "failed to encode delta frame");
                    }
                }
            }
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(%correlation_id, "delta stream session ended");
}
