//! Client-server messaging protocol.
//!
//! Client frames are flat JSON objects tagged by `type`; server events
//! carry a `type` tag and a `data` payload object.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::cards::Card;
use crate::game::{ActionKind, GamePhase};
use crate::player::{HumanPublic, PlayerId, PlayerPublic};

/// Messages that clients can send to the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Submit the human player's action. `amount` is the total target bet
    /// for a raise, not the increment.
    Action {
        action: ActionKind,
        #[serde(default)]
        amount: Option<u32>,
        #[serde(default)]
        show_ai_thinking: bool,
        #[serde(default)]
        step_mode: bool,
    },
    /// Release the step-mode pause after an AI action.
    Continue,
    /// Start the next hand.
    NextHand {
        #[serde(default)]
        show_ai_thinking: bool,
        #[serde(default)]
        step_mode: bool,
    },
}

/// Messages that the server broadcasts or sends to clients.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerMsg {
    StateUpdate(GameStatePublic),
    AiAction(AiActionPublic),
    AwaitingContinue {
        player_name: String,
        action: ActionKind,
    },
    AutoResumed {
        reason: String,
        timeout_seconds: u64,
    },
    Error {
        message: String,
    },
}

/// One AI action as it happened, broadcast before the following
/// `state_update`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiActionPublic {
    pub player_id: PlayerId,
    pub player_name: String,
    pub action: ActionKind,
    pub amount: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub stack_after: u32,
    pub pot_after: u32,
    pub bet_amount: u32,
}

/// An AI decision as exposed to observers. `decision_id` is always
/// present so clients can deduplicate retransmissions; the reasoning
/// fields are only filled in when the observer opted into AI thinking.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AiDecisionPublic {
    pub action: ActionKind,
    pub amount: u32,
    pub decision_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hand_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pot_odds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spr: Option<f64>,
}

/// A single credited pot winner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PotWinner {
    pub player_id: PlayerId,
    pub name: String,
    pub amount: u32,
    pub is_human: bool,
    pub won_by_fold: bool,
    pub hand_rank: Option<String>,
    pub hole_cards: Vec<Card>,
}

/// A hand revealed at showdown, ranked best-first.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ShowdownHand {
    pub player_id: PlayerId,
    pub name: String,
    pub hand_rank: String,
    pub hole_cards: Vec<Card>,
    pub amount_won: u32,
    pub is_human: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FoldedPlayer {
    pub player_id: PlayerId,
    pub name: String,
    pub is_human: bool,
}

/// How the last pot was settled. Present once a `pot_award` happened
/// this hand.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WinnerInfo {
    pub winners: Vec<PotWinner>,
    pub all_showdown_hands: Vec<ShowdownHand>,
    pub folded_players: Vec<FoldedPlayer>,
}

/// The authoritative engine snapshot broadcast after every mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameStatePublic {
    pub state: GamePhase,
    pub pot: u32,
    pub current_bet: u32,
    pub last_raise_amount: Option<u32>,
    pub small_blind: u32,
    pub big_blind: u32,
    pub hand_count: u32,
    pub dealer_position: Option<usize>,
    pub small_blind_position: Option<usize>,
    pub big_blind_position: Option<usize>,
    pub current_player_index: Option<usize>,
    pub community_cards: Vec<Card>,
    pub players: Vec<PlayerPublic>,
    pub human_player: HumanPublic,
    pub last_ai_decisions: HashMap<PlayerId, AiDecisionPublic>,
    pub winner_info: Option<WinnerInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{CardRank, CardSuit};

    #[test]
    fn client_frames_are_flat() {
        let raw = r#"{"type":"action","action":"raise","amount":30,"show_ai_thinking":true,"step_mode":false}"#;
        let cm: ClientMsg = serde_json::from_str(raw).unwrap();
        match cm {
            ClientMsg::Action {
                action,
                amount,
                show_ai_thinking,
                step_mode,
            } => {
                assert_eq!(action, ActionKind::Raise);
                assert_eq!(amount, Some(30));
                assert!(show_ai_thinking);
                assert!(!step_mode);
            }
            other => panic!("unexpected frame: {:?}", other),
        }

        let cm: ClientMsg = serde_json::from_str(r#"{"type":"continue"}"#).unwrap();
        assert!(matches!(cm, ClientMsg::Continue));
    }

    #[test]
    fn non_integer_amount_is_rejected() {
        let raw = r#"{"type":"action","action":"raise","amount":12.5}"#;
        assert!(serde_json::from_str::<ClientMsg>(raw).is_err());
    }

    #[test]
    fn server_events_are_tagged_with_data_payload() {
        let msg = ServerMsg::AutoResumed {
            reason: "timeout".into(),
            timeout_seconds: 60,
        };
        let v: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(v["type"], "auto_resumed");
        assert_eq!(v["data"]["timeout_seconds"], 60);
    }

    #[test]
    fn state_update_round_trips() {
        let human = HumanPublic {
            player_id: PlayerId::human(),
            name: "Alice".into(),
            stack: 990,
            current_bet: 10,
            hole_cards: vec![
                Card::new(CardRank::Ace, CardSuit::Spades),
                Card::new(CardRank::Ten, CardSuit::Hearts),
            ],
            is_active: true,
            is_current_turn: true,
        };
        let gs = GameStatePublic {
            state: GamePhase::PreFlop,
            pot: 15,
            current_bet: 10,
            last_raise_amount: Some(10),
            small_blind: 5,
            big_blind: 10,
            hand_count: 1,
            dealer_position: Some(0),
            small_blind_position: Some(1),
            big_blind_position: Some(2),
            current_player_index: Some(3),
            community_cards: vec![],
            players: vec![PlayerPublic {
                player_id: PlayerId::human(),
                name: "Alice".into(),
                stack: 990,
                current_bet: 10,
                is_active: true,
                all_in: false,
                is_human: true,
                personality: None,
                hole_cards: human.hole_cards.clone(),
            }],
            human_player: human,
            last_ai_decisions: HashMap::new(),
            winner_info: None,
        };
        let text = serde_json::to_string(&ServerMsg::StateUpdate(gs)).unwrap();
        let back: ServerMsg = serde_json::from_str(&text).unwrap();
        match back {
            ServerMsg::StateUpdate(gs) => {
                assert_eq!(gs.state, GamePhase::PreFlop);
                assert_eq!(gs.pot, 15);
                assert_eq!(gs.human_player.hole_cards.len(), 2);
                assert_eq!(gs.players[0].player_id, PlayerId::human());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn phase_labels_match_wire_values() {
        assert_eq!(
            serde_json::to_string(&GamePhase::PreFlop).unwrap(),
            "\"pre_flop\""
        );
        assert_eq!(
            serde_json::to_string(&GamePhase::Showdown).unwrap(),
            "\"showdown\""
        );
    }
}
