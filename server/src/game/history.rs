//! Per-hand events, betting-round records and completed-hand history.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use railbird_shared::{Card, GamePhase, PlayerId};

use crate::ai::AiDecision;
use crate::game::engine::GameEngine;
use crate::poker::evaluation;
use crate::poker::pots::Pot;

pub(crate) fn now_ms() -> u64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_millis() as u64,
        Err(_) => 0,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Deal,
    Action,
    PotAward,
    BlindIncrease,
}

/// One recorded event in a hand. The buffer of these drives the BB
/// option check and the `winner_info` derivation, then flushes into the
/// bounded cross-hand history.
#[derive(Clone, Debug)]
pub struct HandEvent {
    pub timestamp_ms: u64,
    pub kind: EventKind,
    pub player_id: PlayerId,
    pub action: String,
    pub amount: u32,
    pub hand_strength: f64,
    pub reasoning: String,
    /// Pot and table bet at emission time.
    pub pot_size: u32,
    pub current_bet: u32,
}

/// A single successful action inside a betting round.
#[derive(Clone, Debug)]
pub struct ActionRecord {
    pub player_id: PlayerId,
    pub player_name: String,
    pub action: String,
    pub amount: u32,
    pub stack_before: u32,
    pub stack_after: u32,
    pub pot_before: u32,
    pub pot_after: u32,
    pub reasoning: String,
}

/// All actions of one street, closed out when the round completes.
#[derive(Clone, Debug)]
pub struct BettingRound {
    pub round_name: GamePhase,
    pub community_cards: Vec<Card>,
    pub actions: Vec<ActionRecord>,
    pub pot_at_start: u32,
    pub pot_at_end: u32,
}

/// Snapshot of a finished hand, kept for analysis. Stored by value so
/// the live buffers can be reset freely.
#[derive(Clone, Debug)]
pub struct CompletedHand {
    pub hand_number: u32,
    pub community_cards: Vec<Card>,
    pub pot_size: u32,
    pub winner_ids: Vec<PlayerId>,
    pub winner_names: Vec<String>,
    pub human_action: String,
    pub human_cards: Vec<Card>,
    pub human_final_stack: u32,
    pub human_hand_strength: f64,
    pub human_pot_odds: f64,
    pub ai_decisions: HashMap<PlayerId, AiDecision>,
    pub events: Vec<HandEvent>,
    pub session_id: String,
    pub timestamp_ms: u64,
    pub betting_rounds: Vec<BettingRound>,
    /// Hole cards revealed by every player who reached showdown.
    pub showdown_hands: HashMap<PlayerId, Vec<Card>>,
    pub hand_rankings: HashMap<PlayerId, String>,
}

fn cap_front<T>(items: &mut Vec<T>, cap: usize) {
    if items.len() > cap {
        let overflow = items.len() - cap;
        items.drain(..overflow);
    }
}

impl GameEngine {
    pub(crate) fn log_event(
        &mut self,
        kind: EventKind,
        player_id: PlayerId,
        action: &str,
        amount: u32,
        hand_strength: f64,
        reasoning: String,
    ) {
        let event = HandEvent {
            timestamp_ms: now_ms(),
            kind,
            player_id,
            action: action.to_owned(),
            amount,
            hand_strength,
            reasoning,
            pot_size: self.pot,
            current_bet: self.current_bet,
        };
        tracing::debug!("{}", crate::pretty::format_event(&event, false));
        self.current_hand_events.push(event);
    }

    /// Append the outgoing hand's events to the bounded cross-hand
    /// history and clear the per-hand buffer.
    pub(crate) fn flush_hand_events(&mut self) {
        if self.current_hand_events.is_empty() {
            return;
        }
        let drained: Vec<HandEvent> = self.current_hand_events.drain(..).collect();
        self.hand_events.extend(drained);
        cap_front(&mut self.hand_events, self.config.event_history_cap);
    }

    fn human_final_action(&self) -> String {
        let Some(human) = self.players.iter().find(|p| p.is_human) else {
            return "unknown".to_owned();
        };
        if !human.is_active {
            return "fold".to_owned();
        }
        if human.all_in {
            return "all-in".to_owned();
        }
        self.current_hand_events
            .iter()
            .rev()
            .find(|e| e.player_id == human.id && e.kind == EventKind::Action)
            .map(|e| e.action.clone())
            .unwrap_or_else(|| "unknown".to_owned())
    }

    fn human_hand_strength(&self) -> f64 {
        let Some(human) = self.players.iter().find(|p| p.is_human) else {
            return 0.0;
        };
        if human.hole_cards.is_empty() || self.community_cards.is_empty() {
            return 0.0;
        }
        let (score, _) = evaluation::evaluate(&human.hole_cards, &self.community_cards);
        evaluation::score_to_strength(score)
    }

    /// Pot odds at the human's last decision point, reconstructed from
    /// the event buffer.
    fn human_pot_odds(&self) -> f64 {
        let Some(human) = self.players.iter().find(|p| p.is_human) else {
            return 0.0;
        };
        for event in self.current_hand_events.iter().rev() {
            if event.player_id == human.id && event.pot_size > 0 {
                let call_amount = event.current_bet;
                if call_amount > 0 {
                    return call_amount as f64 / (event.pot_size + call_amount) as f64;
                }
                break;
            }
        }
        0.0
    }

    fn store_completed_hand(&mut self, hand: CompletedHand) {
        self.last_hand_summary = Some(hand.clone());
        self.completed_hands.push(hand.clone());
        cap_front(&mut self.completed_hands, self.config.completed_hands_cap);
        self.hand_history.push(hand);
        cap_front(&mut self.hand_history, self.config.hand_history_cap);
    }

    fn build_completed_hand(
        &self,
        winner_ids: Vec<PlayerId>,
        pot_size: u32,
        showdown_hands: HashMap<PlayerId, Vec<Card>>,
        hand_rankings: HashMap<PlayerId, String>,
    ) -> Option<CompletedHand> {
        // AI-only tables have nothing to analyze.
        let human = self.players.iter().find(|p| p.is_human)?;
        let winner_names = self
            .players
            .iter()
            .filter(|p| winner_ids.contains(&p.id))
            .map(|p| p.name.clone())
            .collect();
        Some(CompletedHand {
            hand_number: self.hand_count,
            community_cards: self.community_cards.clone(),
            pot_size,
            winner_ids,
            winner_names,
            human_action: self.human_final_action(),
            human_cards: human.hole_cards.clone(),
            human_final_stack: human.stack,
            human_hand_strength: self.human_hand_strength(),
            human_pot_odds: self.human_pot_odds(),
            ai_decisions: self.last_ai_decisions.clone(),
            events: self.current_hand_events.clone(),
            session_id: self.session_id.clone(),
            timestamp_ms: now_ms(),
            betting_rounds: self.hand_betting_rounds.clone(),
            showdown_hands,
            hand_rankings,
        })
    }

    /// Record a hand that ended before showdown (fold collapse).
    pub(crate) fn save_hand_on_early_end(&mut self, winner_id: Option<PlayerId>, pot_size: u32) {
        let winner_ids = winner_id.into_iter().collect();
        if let Some(hand) =
            self.build_completed_hand(winner_ids, pot_size, HashMap::new(), HashMap::new())
        {
            self.store_completed_hand(hand);
        }
    }

    /// Record a hand settled by the pot resolver at showdown.
    pub(crate) fn save_completed_hand(&mut self, pots: &[Pot], pot_size: u32) {
        let mut winner_ids: Vec<PlayerId> = Vec::new();
        for pot in pots {
            for id in &pot.winners {
                if !winner_ids.contains(id) {
                    winner_ids.push(id.clone());
                }
            }
        }

        let mut showdown_hands = HashMap::new();
        let mut hand_rankings = HashMap::new();
        for player in &self.players {
            if player.hole_cards.len() == 2 && (player.is_active || player.all_in) {
                showdown_hands.insert(player.id.clone(), player.hole_cards.clone());
                let (_, rank) = evaluation::evaluate(&player.hole_cards, &self.community_cards);
                hand_rankings.insert(player.id.clone(), rank.to_owned());
            }
        }

        if let Some(hand) =
            self.build_completed_hand(winner_ids, pot_size, showdown_hands, hand_rankings)
        {
            self.store_completed_hand(hand);
        }
    }
}
