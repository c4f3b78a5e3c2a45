//! Plain HTTP endpoints: game creation and health.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};

use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub player_name: String,
    pub ai_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CreateGameResponse {
    pub game_id: String,
}

/// `POST /games`: instantiate one engine and one room. The first hand
/// starts when a client sends `next_hand` over the WebSocket.
pub async fn create_game(
    State(state): State<AppState>,
    Json(req): Json<CreateGameRequest>,
) -> Result<Json<CreateGameResponse>, (StatusCode, String)> {
    match state.create_game(&req.player_name, req.ai_count).await {
        Ok(game_id) => Ok(Json(CreateGameResponse {
            game_id: game_id.to_string(),
        })),
        Err(e) => Err((StatusCode::BAD_REQUEST, e.to_string())),
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}
