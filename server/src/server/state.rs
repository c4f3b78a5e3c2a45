//! Shared server state: the per-game-id registry of rooms.

use std::collections::HashMap;
use std::sync::Arc;

use railbird_shared::ServerMsg;
use tokio::sync::{broadcast, Mutex, Notify, RwLock};
use uuid::Uuid;

use crate::config::Config;
use crate::error::EngineError;
use crate::game::GameEngine;

pub const CHANNEL_BUFFER_SIZE: usize = 256;

/// One game's shared resources. The mutex serializes every mutation on
/// the engine; the broadcast channel fans events out to all observers
/// in emission order; the step signal is a one-shot rendezvous that
/// `continue` frames fire without taking the engine lock.
pub struct GameRoom {
    pub engine: Mutex<GameEngine>,
    pub events: broadcast::Sender<ServerMsg>,
    pub step: Notify,
}

impl GameRoom {
    pub fn new(engine: GameEngine) -> Self {
        let (events, _) = broadcast::channel(CHANNEL_BUFFER_SIZE);
        GameRoom {
            engine: Mutex::new(engine),
            events,
            step: Notify::new(),
        }
    }

    /// Best-effort fan-out; observers that lag or vanish handle
    /// themselves on the receiving side.
    pub fn broadcast(&self, msg: ServerMsg) {
        let _ = self.events.send(msg);
    }

    pub fn observer_count(&self) -> usize {
        self.events.receiver_count()
    }
}

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    games: Arc<RwLock<HashMap<Uuid, Arc<GameRoom>>>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        AppState {
            games: Arc::new(RwLock::new(HashMap::new())),
            config: Arc::new(config),
        }
    }

    /// Instantiate one engine and one room for it. No hand is started;
    /// the first WebSocket frame bootstraps play.
    pub async fn create_game(
        &self,
        player_name: &str,
        ai_count: usize,
    ) -> Result<Uuid, EngineError> {
        let engine = GameEngine::new(player_name, ai_count, self.config.engine_config())?;
        let game_id = Uuid::new_v4();
        let room = Arc::new(GameRoom::new(engine));
        self.games.write().await.insert(game_id, room);
        tracing::info!(%game_id, player = player_name, ai_count, "created game");
        Ok(game_id)
    }

    pub async fn room(&self, game_id: &Uuid) -> Option<Arc<GameRoom>> {
        self.games.read().await.get(game_id).cloned()
    }

    /// Tear a game down once its last observer has left.
    pub async fn remove_room_if_idle(&self, game_id: &Uuid) {
        let mut games = self.games.write().await;
        let idle = games
            .get(game_id)
            .is_some_and(|room| room.observer_count() == 0);
        if idle {
            games.remove(game_id);
            tracing::info!(%game_id, "tearing down idle game");
        }
    }

    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }
}

impl Default for AppState {
    fn default() -> Self {
        AppState::new(Config::default())
    }
}
