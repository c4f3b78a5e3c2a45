//! WebSocket transport: one connection per observer of a game.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use railbird_shared::{ClientMsg, ServerMsg};
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::pretty;
use crate::server::driver::{self, DriveOpts};
use crate::server::state::{AppState, GameRoom};

pub async fn ws_handler(
    Path(game_id): Path<Uuid>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> Response {
    let Some(room) = state.room(&game_id).await else {
        return (StatusCode::NOT_FOUND, "unknown game").into_response();
    };
    ws.on_upgrade(move |socket| handle_socket(socket, state, game_id, room))
        .into_response()
}

async fn handle_socket(mut socket: WebSocket, state: AppState, game_id: Uuid, room: Arc<GameRoom>) {
    tracing::info!(%game_id, "observer connected");

    // Subscribe before the initial snapshot so no event can slip
    // between the two.
    let mut events = room.events.subscribe();
    // Direct channel for frames addressed to this observer only
    // (rejections, malformed input).
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<ServerMsg>();

    let initial = {
        let engine = room.engine.lock().await;
        engine.snapshot(false)
    };
    if send_ws(&mut socket, &ServerMsg::StateUpdate(initial)).await.is_err() {
        state.remove_room_if_idle(&game_id).await;
        return;
    }

    loop {
        tokio::select! {
            biased;

            event = events.recv() => {
                match event {
                    Ok(msg) => {
                        if send_ws(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(%game_id, skipped, "observer lagged, catching up");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            reply = reply_rx.recv() => {
                // reply_tx lives in this scope, so the channel cannot close.
                if let Some(msg) = reply {
                    if send_ws(&mut socket, &msg).await.is_err() {
                        break;
                    }
                }
            }

            incoming = socket.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMsg>(&text) {
                            Ok(ClientMsg::Continue) => {
                                // Fires the step-mode rendezvous; never
                                // touches the engine lock.
                                room.step.notify_one();
                            }
                            Ok(msg) => {
                                // Run game traffic as its own task so this
                                // loop keeps reading (continue frames,
                                // disconnects) while the room lock and any
                                // step-mode pauses are held.
                                tokio::spawn(handle_game_msg(
                                    room.clone(),
                                    reply_tx.clone(),
                                    msg,
                                    state.clone(),
                                ));
                            }
                            Err(e) => {
                                tracing::debug!(%game_id, error = %e, raw = %text, "malformed client frame");
                                let _ = reply_tx.send(ServerMsg::Error {
                                    message: "Malformed client message".to_owned(),
                                });
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    _ => {}
                }
            }
        }
    }

    drop(events);
    tracing::info!(%game_id, "observer disconnected");
    state.remove_room_if_idle(&game_id).await;
}

async fn send_ws(socket: &mut WebSocket, msg: &ServerMsg) -> Result<(), axum::Error> {
    match serde_json::to_string(msg) {
        Ok(text) => socket.send(Message::Text(text)).await,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize ServerMsg");
            Ok(())
        }
    }
}

/// Handle an `action` or `next_hand` frame. All state mutation for the
/// game happens under the room's engine lock, including the AI drive
/// that follows.
async fn handle_game_msg(
    room: Arc<GameRoom>,
    reply: mpsc::UnboundedSender<ServerMsg>,
    msg: ClientMsg,
    state: AppState,
) {
    match msg {
        ClientMsg::Action {
            action,
            amount,
            show_ai_thinking,
            step_mode,
        } => {
            let opts = DriveOpts::new(&state.config, show_ai_thinking, step_mode);
            let mut engine = room.engine.lock().await;
            if let Err(e) = engine.submit_human_action(action, amount, false) {
                // The engine state is unchanged; only the offender hears
                // about it.
                let _ = reply.send(ServerMsg::Error {
                    message: e.to_string(),
                });
                return;
            }
            room.broadcast(ServerMsg::StateUpdate(engine.snapshot(show_ai_thinking)));
            driver::drive_ai_turns(&mut engine, &room, &opts).await;
        }
        ClientMsg::NextHand {
            show_ai_thinking,
            step_mode,
        } => {
            let opts = DriveOpts::new(&state.config, show_ai_thinking, step_mode);
            let mut engine = room.engine.lock().await;
            if let Err(e) = engine.start_hand(false) {
                let _ = reply.send(ServerMsg::Error {
                    message: e.to_string(),
                });
                return;
            }
            tracing::info!(
                "{}",
                pretty::format_table_header(&engine.snapshot(false), false)
            );
            room.broadcast(ServerMsg::StateUpdate(engine.snapshot(show_ai_thinking)));
            driver::drive_ai_turns(&mut engine, &room, &opts).await;
        }
        ClientMsg::Continue => room.step.notify_one(),
    }
}
