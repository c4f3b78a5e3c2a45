//! The game engine, split by concern: state and snapshots in `engine`,
//! hand setup in `dealing`, action application in `betting`, turn and
//! phase flow in `flow`, settlement in `showdown`, records in
//! `history`, runtime self-checks in `invariants`.

mod betting;
mod dealing;
mod engine;
mod flow;
mod history;
mod invariants;
mod showdown;

pub use betting::ActionOutcome;
pub use engine::{EngineConfig, GameEngine, Player, ShowdownResults, ShowdownSeat};
pub use flow::AiTurnReport;
pub use history::{ActionRecord, BettingRound, CompletedHand, EventKind, HandEvent};

#[cfg(test)]
pub(crate) mod test_support {
    use railbird_shared::{Personality, PlayerId};

    use super::{EngineConfig, GameEngine, Player};
    use crate::poker::Deck;

    pub(crate) fn test_config() -> EngineConfig {
        EngineConfig {
            blind_escalation_enabled: false,
            ..EngineConfig::default()
        }
    }

    /// Seat 0 is the human; the rest are Conservative bots.
    pub(crate) fn test_players(stacks: &[u32]) -> Vec<Player> {
        stacks
            .iter()
            .enumerate()
            .map(|(i, &stack)| {
                if i == 0 {
                    let mut p = Player::new(PlayerId::human(), "Alice", stack);
                    p.is_human = true;
                    p
                } else {
                    let mut p = Player::new(PlayerId::ai(i), format!("Bot {}", i), stack);
                    p.personality = Some(Personality::Conservative);
                    p
                }
            })
            .collect()
    }

    /// Start a hand with a deterministic deck and nobody driving AI
    /// turns, so tests can script every action. The dealer starts on
    /// seat 0, so with four seats the blinds sit on 1 and 2 and seat 3
    /// acts first.
    pub(crate) fn start_scripted_hand(stacks: &[u32], seed: u64) -> anyhow::Result<GameEngine> {
        let mut engine = GameEngine::with_players_and_deck(
            test_players(stacks),
            test_config(),
            Deck::seeded(seed),
        )?;
        engine.dealer_index = stacks.len() - 1; // advances onto seat 0
        engine.start_hand(false)?;
        Ok(engine)
    }
}
