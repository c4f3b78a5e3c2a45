//! WebSocket integration tests against the real router.

use std::time::Duration;

use anyhow::Result;
use futures_util::{SinkExt, StreamExt};
use railbird_shared::{ClientMsg, GamePhase, ServerMsg};
use tokio_tungstenite::tungstenite::Message;

use railbird_server::server::{build_router, AppState};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn spawn_server(state: AppState) -> Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("server error: {}", e);
        }
    });
    Ok((addr, handle))
}

async fn next_server_msg(ws: &mut WsStream, wait: Duration) -> Option<ServerMsg> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let remaining = deadline.checked_duration_since(tokio::time::Instant::now())?;
        match tokio::time::timeout(remaining, ws.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => {
                if let Ok(msg) = serde_json::from_str::<ServerMsg>(&text) {
                    return Some(msg);
                }
            }
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(_))) | Ok(None) => return None,
            Err(_) => return None,
        }
    }
}

async fn next_state_update(
    ws: &mut WsStream,
    wait: Duration,
) -> Option<railbird_shared::GameStatePublic> {
    let deadline = tokio::time::Instant::now() + wait;
    loop {
        let remaining = deadline.checked_duration_since(tokio::time::Instant::now())?;
        match next_server_msg(ws, remaining).await? {
            ServerMsg::StateUpdate(gs) => return Some(gs),
            _ => continue,
        }
    }
}

#[tokio::test]
async fn connect_receives_initial_state_and_next_hand_plays_out() -> Result<()> {
    let state = AppState::default();
    let game_id = state.create_game("Alice", 2).await?;
    let (addr, server) = spawn_server(state.clone()).await?;

    let url = format!("ws://{}/ws/{}", addr, game_id);
    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await?;

    // The server greets every observer with the current snapshot.
    let initial = next_state_update(&mut ws, Duration::from_secs(2))
        .await
        .expect("initial state_update");
    assert_eq!(initial.hand_count, 0);
    assert_eq!(initial.players.len(), 3);

    let frame = serde_json::to_string(&ClientMsg::NextHand {
        show_ai_thinking: false,
        step_mode: false,
    })?;
    ws.send(Message::Text(frame)).await?;

    // The hand starts and the driver runs until the human holds the
    // turn or the hand settles.
    let mut settled = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        let Some(gs) = next_state_update(&mut ws, Duration::from_secs(5)).await else {
            break;
        };
        if gs.hand_count != 1 {
            continue;
        }
        if gs.human_player.is_current_turn || gs.state == GamePhase::Showdown {
            settled = true;
            break;
        }
    }
    assert!(settled, "hand neither reached the human nor showdown");

    server.abort();
    Ok(())
}

#[tokio::test]
async fn broadcasts_reach_other_observers_of_the_same_game() -> Result<()> {
    let state = AppState::default();
    let game_id = state.create_game("Alice", 1).await?;
    let (addr, server) = spawn_server(state.clone()).await?;
    let url = format!("ws://{}/ws/{}", addr, game_id);

    let (mut ws1, _) = tokio_tungstenite::connect_async(&url).await?;
    let (mut ws2, _) = tokio_tungstenite::connect_async(&url).await?;
    let _ = next_state_update(&mut ws1, Duration::from_secs(2)).await;
    let _ = next_state_update(&mut ws2, Duration::from_secs(2)).await;

    let frame = serde_json::to_string(&ClientMsg::NextHand {
        show_ai_thinking: false,
        step_mode: false,
    })?;
    ws1.send(Message::Text(frame)).await?;

    let mut seen_hand = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while tokio::time::Instant::now() < deadline {
        let Some(gs) = next_state_update(&mut ws2, Duration::from_secs(5)).await else {
            break;
        };
        if gs.hand_count == 1 {
            seen_hand = true;
            break;
        }
    }
    assert!(seen_hand, "observer 2 never saw the hand started by observer 1");

    server.abort();
    Ok(())
}

#[tokio::test]
async fn out_of_turn_action_gets_an_error_frame_only() -> Result<()> {
    let state = AppState::default();
    let game_id = state.create_game("Alice", 2).await?;
    let (addr, server) = spawn_server(state.clone()).await?;
    let url = format!("ws://{}/ws/{}", addr, game_id);

    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await?;
    let _ = next_state_update(&mut ws, Duration::from_secs(2)).await;

    // No hand has started, so any action is out of turn.
    let frame = serde_json::to_string(&ClientMsg::Action {
        action: railbird_shared::ActionKind::Call,
        amount: None,
        show_ai_thinking: false,
        step_mode: false,
    })?;
    ws.send(Message::Text(frame)).await?;

    let mut got_error = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        match next_server_msg(&mut ws, Duration::from_secs(2)).await {
            Some(ServerMsg::Error { message }) => {
                assert!(message.contains("not your turn"), "{}", message);
                got_error = true;
                break;
            }
            Some(_) => continue,
            None => break,
        }
    }
    assert!(got_error, "expected an error frame for the out-of-turn action");

    server.abort();
    Ok(())
}

#[tokio::test]
async fn malformed_frames_are_rejected_politely() -> Result<()> {
    let state = AppState::default();
    let game_id = state.create_game("Alice", 1).await?;
    let (addr, server) = spawn_server(state.clone()).await?;
    let url = format!("ws://{}/ws/{}", addr, game_id);

    let (mut ws, _) = tokio_tungstenite::connect_async(&url).await?;
    let _ = next_state_update(&mut ws, Duration::from_secs(2)).await;

    // Non-integer raise amounts must not parse.
    ws.send(Message::Text(
        r#"{"type":"action","action":"raise","amount":12.5}"#.to_owned(),
    ))
    .await?;

    let msg = next_server_msg(&mut ws, Duration::from_secs(3)).await;
    assert!(
        matches!(msg, Some(ServerMsg::Error { .. })),
        "expected an error frame, got {:?}",
        msg
    );

    server.abort();
    Ok(())
}

#[tokio::test]
async fn unknown_game_id_is_refused() -> Result<()> {
    let state = AppState::default();
    let (addr, server) = spawn_server(state.clone()).await?;
    let url = format!("ws://{}/ws/{}", addr, uuid::Uuid::new_v4());
    assert!(tokio_tungstenite::connect_async(&url).await.is_err());
    server.abort();
    Ok(())
}
