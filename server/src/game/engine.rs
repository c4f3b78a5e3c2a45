//! Core engine state: players, the per-game state machine fields, and
//! read-only snapshots.

use std::collections::HashMap;

use rand::seq::IndexedRandom;
use railbird_shared::{
    AiDecisionPublic, Card, FoldedPlayer, GamePhase, GameStatePublic, HumanPublic, Personality,
    PlayerId, PlayerPublic, PotWinner, ShowdownHand, WinnerInfo,
};
use uuid::Uuid;

use crate::ai::AiDecision;
use crate::error::EngineError;
use crate::game::history::{ActionRecord, BettingRound, CompletedHand, EventKind, HandEvent};
use crate::poker::pots::{self, Pot, SeatStake};
use crate::poker::{evaluation, Deck};

/// Display names for AI opponents, drawn uniquely per game.
const AI_NAME_POOL: [&str; 30] = [
    "AI-ce",
    "AI-ron",
    "AI-nstein",
    "Chip Checker",
    "The Algorithm",
    "Beta Bluffer",
    "Neural Net",
    "Deep Blue",
    "Data Dealer",
    "Binary Bob",
    "Quantum Quinn",
    "All-In Annie",
    "Fold Franklin",
    "Raise Rachel",
    "Call Carl",
    "Bluff Master",
    "The Calculator",
    "Lady Luck",
    "Card Shark",
    "Cool Hand Luke",
    "The Professor",
    "Wild Card",
    "Stone Face",
    "The Grinder",
    "Risk Taker",
    "The Rock",
    "Loose Lucy",
    "The Oracle",
    "Monte Carlo",
    "House Edge",
];

/// Engine-level options, a subset of the server config.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub starting_stack: u32,
    pub small_blind: u32,
    pub big_blind: u32,
    pub blind_escalation_enabled: bool,
    pub hands_per_blind_level: u32,
    pub blind_multiplier: f64,
    pub event_history_cap: usize,
    pub hand_history_cap: usize,
    pub completed_hands_cap: usize,
    pub assertions_enabled: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            starting_stack: 1000,
            small_blind: 5,
            big_blind: 10,
            blind_escalation_enabled: true,
            hands_per_blind_level: 10,
            blind_multiplier: 2.0,
            event_history_cap: 1000,
            hand_history_cap: 100,
            completed_hands_cap: 50,
            assertions_enabled: true,
        }
    }
}

/// One seat's full state for the current hand.
#[derive(Clone, Debug)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub stack: u32,
    pub hole_cards: Vec<Card>,
    pub is_active: bool,
    /// Bet in the current betting round.
    pub current_bet: u32,
    /// Total invested this hand, across rounds (feeds side pots).
    pub total_invested: u32,
    pub all_in: bool,
    pub is_human: bool,
    pub personality: Option<Personality>,
    pub has_acted: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>, stack: u32) -> Self {
        Player {
            id,
            name: name.into(),
            stack,
            hole_cards: Vec::new(),
            is_active: true,
            current_bet: 0,
            total_invested: 0,
            all_in: false,
            is_human: false,
            personality: None,
            has_acted: false,
        }
    }

    /// Place a bet, capped at the remaining stack. Marks the player
    /// all-in when the stack is exhausted. Returns the chips actually
    /// put in.
    pub fn bet(&mut self, amount: u32) -> u32 {
        let mut amount = amount;
        if amount >= self.stack {
            amount = self.stack;
            self.all_in = true;
        }
        self.stack -= amount;
        self.current_bet += amount;
        self.total_invested += amount;
        if self.stack == 0 && self.current_bet > 0 {
            self.all_in = true;
        }
        amount
    }

    pub fn reset_for_new_hand(&mut self) {
        self.current_bet = 0;
        self.total_invested = 0;
        self.all_in = false;
        self.hole_cards.clear();
        self.has_acted = false;
        // Seats that cannot cover any meaningful bet sit out.
        self.is_active = self.stack >= 5;
    }

    pub fn reset_for_new_round(&mut self) {
        self.current_bet = 0;
        self.has_acted = false;
    }
}

/// The deterministic state machine for one game. All mutation routes
/// through `apply_action`; everything else is bookkeeping around it.
#[derive(Clone, Debug)]
pub struct GameEngine {
    pub players: Vec<Player>,
    pub deck: Deck,
    pub community_cards: Vec<Card>,
    pub pot: u32,
    pub current_bet: u32,
    pub phase: GamePhase,
    pub dealer_index: usize,
    pub small_blind_index: Option<usize>,
    pub big_blind_index: Option<usize>,
    pub hand_count: u32,
    pub small_blind: u32,
    pub big_blind: u32,
    pub current_player_index: Option<usize>,
    pub last_raiser_index: Option<usize>,
    pub last_raise_amount: Option<u32>,
    pub session_id: String,
    pub last_ai_decisions: HashMap<PlayerId, AiDecision>,
    pub hand_events: Vec<HandEvent>,
    pub current_hand_events: Vec<HandEvent>,
    pub completed_hands: Vec<CompletedHand>,
    pub hand_history: Vec<CompletedHand>,
    pub last_hand_summary: Option<CompletedHand>,
    pub(crate) current_round_actions: Vec<ActionRecord>,
    pub(crate) hand_betting_rounds: Vec<BettingRound>,
    pub(crate) pot_at_round_start: u32,
    /// Set when the pot resolver settled the hand; distinguishes
    /// showdown wins from fold wins in `winner_info`.
    pub(crate) showdown_resolved: bool,
    /// Sum of all stacks at creation; the conserved quantity.
    pub total_chips: u32,
    pub(crate) config: EngineConfig,
}

/// Pure showdown view for callers that want the pot layering.
#[derive(Clone, Debug)]
pub struct ShowdownResults {
    pub pots: Vec<Pot>,
    pub community_cards: Vec<Card>,
    pub players: Vec<ShowdownSeat>,
}

#[derive(Clone, Debug)]
pub struct ShowdownSeat {
    pub player_id: PlayerId,
    pub name: String,
    pub hole_cards: Vec<Card>,
    pub stack: u32,
}

impl GameEngine {
    /// Build a default table: one human seat plus `ai_count` AI seats
    /// with unique names and distinct personalities.
    pub fn new(
        human_name: &str,
        ai_count: usize,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        Self::build(human_name, ai_count, config, Deck::new())
    }

    /// Deterministic-deck variant for tests and simulations.
    pub fn new_with_seed(
        human_name: &str,
        ai_count: usize,
        config: EngineConfig,
        seed: u64,
    ) -> Result<Self, EngineError> {
        Self::build(human_name, ai_count, config, Deck::seeded(seed))
    }

    fn build(
        human_name: &str,
        ai_count: usize,
        config: EngineConfig,
        deck: Deck,
    ) -> Result<Self, EngineError> {
        if !(1..=3).contains(&ai_count) {
            return Err(EngineError::InvalidInput(format!(
                "AI count must be between 1 and 3, got {}",
                ai_count
            )));
        }

        let mut rng = rand::rng();
        let names: Vec<&&str> = AI_NAME_POOL.choose_multiple(&mut rng, ai_count).collect();
        let personalities: Vec<&Personality> =
            Personality::ALL.choose_multiple(&mut rng, ai_count).collect();

        let mut human = Player::new(PlayerId::human(), human_name, config.starting_stack);
        human.is_human = true;
        let mut players = vec![human];
        for i in 0..ai_count {
            let mut ai = Player::new(PlayerId::ai(i + 1), *names[i], config.starting_stack);
            ai.personality = Some(*personalities[i]);
            players.push(ai);
        }

        Self::with_players_and_deck(players, config, deck)
    }

    /// Build an engine around pre-constructed players. Used by tests
    /// that script exact stacks and personalities.
    pub fn with_players(players: Vec<Player>, config: EngineConfig) -> Result<Self, EngineError> {
        Self::with_players_and_deck(players, config, Deck::new())
    }

    pub fn with_players_and_deck(
        players: Vec<Player>,
        config: EngineConfig,
        deck: Deck,
    ) -> Result<Self, EngineError> {
        if players.len() < 2 {
            return Err(EngineError::InvalidInput(
                "a game needs at least two players".to_owned(),
            ));
        }
        if players.iter().filter(|p| p.is_human).count() != 1 {
            return Err(EngineError::InvalidInput(
                "a game needs exactly one human seat".to_owned(),
            ));
        }
        let total_chips = players.iter().map(|p| p.stack).sum();
        Ok(GameEngine {
            players,
            deck,
            community_cards: Vec::new(),
            pot: 0,
            current_bet: 0,
            phase: GamePhase::PreFlop,
            dealer_index: 0,
            small_blind_index: None,
            big_blind_index: None,
            hand_count: 0,
            small_blind: config.small_blind,
            big_blind: config.big_blind,
            current_player_index: None,
            last_raiser_index: None,
            last_raise_amount: None,
            session_id: Uuid::new_v4().to_string(),
            last_ai_decisions: HashMap::new(),
            hand_events: Vec::new(),
            current_hand_events: Vec::new(),
            completed_hands: Vec::new(),
            hand_history: Vec::new(),
            last_hand_summary: None,
            current_round_actions: Vec::new(),
            hand_betting_rounds: Vec::new(),
            pot_at_round_start: 0,
            showdown_resolved: false,
            total_chips,
            config,
        })
    }

    pub fn current_player(&self) -> Option<&Player> {
        self.current_player_index.and_then(|i| self.players.get(i))
    }

    pub(crate) fn stakes(&self) -> Vec<SeatStake> {
        self.players
            .iter()
            .map(|p| SeatStake {
                player_id: p.id.clone(),
                total_invested: p.total_invested,
                in_hand: p.is_active || p.all_in,
                hole_cards: p.hole_cards.clone(),
            })
            .collect()
    }

    /// Pure view of the pot layering at showdown.
    pub fn showdown_results(&self) -> Option<ShowdownResults> {
        if self.phase != GamePhase::Showdown {
            return None;
        }
        Some(ShowdownResults {
            pots: pots::resolve(&self.stakes(), &self.community_cards),
            community_cards: self.community_cards.clone(),
            players: self
                .players
                .iter()
                .map(|p| ShowdownSeat {
                    player_id: p.id.clone(),
                    name: p.name.clone(),
                    hole_cards: p.hole_cards.clone(),
                    stack: p.stack,
                })
                .collect(),
        })
    }

    /// The authoritative `state_update` payload. Hole cards of other
    /// players stay concealed until showdown; blind positions are the
    /// hand-start snapshots, never recomputed.
    pub fn snapshot(&self, show_ai_thinking: bool) -> GameStatePublic {
        let showdown = self.phase == GamePhase::Showdown;
        let players = self
            .players
            .iter()
            .map(|p| PlayerPublic {
                player_id: p.id.clone(),
                name: p.name.clone(),
                stack: p.stack,
                current_bet: p.current_bet,
                is_active: p.is_active,
                all_in: p.all_in,
                is_human: p.is_human,
                personality: p.personality,
                hole_cards: if p.is_human || showdown {
                    p.hole_cards.clone()
                } else {
                    Vec::new()
                },
            })
            .collect();

        let human = self.players.iter().find(|p| p.is_human);
        let human_index = self.players.iter().position(|p| p.is_human);
        let human_player = match human {
            Some(h) => HumanPublic {
                player_id: h.id.clone(),
                name: h.name.clone(),
                stack: h.stack,
                current_bet: h.current_bet,
                hole_cards: h.hole_cards.clone(),
                is_active: h.is_active,
                is_current_turn: human_index.is_some() && self.current_player_index == human_index,
            },
            None => HumanPublic {
                player_id: PlayerId::human(),
                name: String::new(),
                stack: 0,
                current_bet: 0,
                hole_cards: Vec::new(),
                is_active: false,
                is_current_turn: false,
            },
        };

        let last_ai_decisions = self
            .last_ai_decisions
            .iter()
            .map(|(id, d)| {
                (
                    id.clone(),
                    AiDecisionPublic {
                        action: d.action,
                        amount: d.amount,
                        decision_id: d.decision_id.clone(),
                        reasoning: show_ai_thinking.then(|| d.reasoning.clone()),
                        hand_strength: show_ai_thinking.then_some(d.hand_strength),
                        pot_odds: show_ai_thinking.then_some(d.pot_odds),
                        confidence: show_ai_thinking.then_some(d.confidence),
                        spr: show_ai_thinking.then_some(d.spr),
                    },
                )
            })
            .collect();

        GameStatePublic {
            state: self.phase,
            pot: self.pot,
            current_bet: self.current_bet,
            last_raise_amount: self.last_raise_amount,
            small_blind: self.small_blind,
            big_blind: self.big_blind,
            hand_count: self.hand_count,
            dealer_position: (self.hand_count > 0).then_some(self.dealer_index),
            small_blind_position: self.small_blind_index,
            big_blind_position: self.big_blind_index,
            current_player_index: self.current_player_index,
            community_cards: self.community_cards.clone(),
            players,
            human_player,
            last_ai_decisions,
            winner_info: self.winner_info(),
        }
    }

    /// How the current hand's pot was settled, derived from the
    /// `pot_award` events and the transition that produced them (fold
    /// collapse vs the showdown resolver).
    fn winner_info(&self) -> Option<WinnerInfo> {
        let awards: Vec<&HandEvent> = self
            .current_hand_events
            .iter()
            .filter(|e| e.kind == EventKind::PotAward)
            .collect();
        if awards.is_empty() {
            return None;
        }

        let at_showdown = self.showdown_resolved;
        let summary = self.last_hand_summary.as_ref().filter(|_| at_showdown);

        let winners: Vec<PotWinner> = awards
            .iter()
            .filter_map(|event| {
                let player = self.players.iter().find(|p| p.id == event.player_id)?;
                let hand_rank =
                    summary.and_then(|s| s.hand_rankings.get(&player.id).cloned());
                let hole_cards = summary
                    .and_then(|s| s.showdown_hands.get(&player.id).cloned())
                    .unwrap_or_default();
                Some(PotWinner {
                    player_id: player.id.clone(),
                    name: player.name.clone(),
                    amount: event.amount,
                    is_human: player.is_human,
                    won_by_fold: !at_showdown,
                    hand_rank,
                    hole_cards,
                })
            })
            .collect();

        let mut all_showdown_hands = Vec::new();
        let mut folded_players = Vec::new();
        if let Some(summary) = summary {
            let mut ranked: Vec<(i32, ShowdownHand)> = Vec::new();
            for player in &self.players {
                match summary.showdown_hands.get(&player.id) {
                    Some(hole_cards) => {
                        let score = if !hole_cards.is_empty() && !self.community_cards.is_empty() {
                            evaluation::evaluate(hole_cards, &self.community_cards).0
                        } else {
                            evaluation::WORST_SCORE
                        };
                        let amount_won: u32 = winners
                            .iter()
                            .filter(|w| w.player_id == player.id)
                            .map(|w| w.amount)
                            .sum();
                        ranked.push((
                            score,
                            ShowdownHand {
                                player_id: player.id.clone(),
                                name: player.name.clone(),
                                hand_rank: summary
                                    .hand_rankings
                                    .get(&player.id)
                                    .cloned()
                                    .unwrap_or_else(|| "Unknown".to_owned()),
                                hole_cards: hole_cards.clone(),
                                amount_won,
                                is_human: player.is_human,
                            },
                        ));
                    }
                    None => folded_players.push(FoldedPlayer {
                        player_id: player.id.clone(),
                        name: player.name.clone(),
                        is_human: player.is_human,
                    }),
                }
            }
            ranked.sort_by_key(|(score, _)| *score);
            all_showdown_hands = ranked.into_iter().map(|(_, hand)| hand).collect();
        }

        Some(WinnerInfo {
            winners,
            all_showdown_hands,
            folded_players,
        })
    }
}
