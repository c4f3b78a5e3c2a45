//! Turn order, betting-round completion and state advancement.

use railbird_shared::{ActionKind, GamePhase, Personality, PlayerId};

use crate::ai::{self, DecisionContext};
use crate::error::EngineError;
use crate::game::engine::GameEngine;
use crate::game::history::{BettingRound, EventKind};
use crate::pretty;

/// Loop guards for the AI drivers.
const MAX_DRIVER_ITERATIONS: usize = 100;
const MAX_SAME_SEAT_REPEATS: usize = 5;

/// One AI turn as applied by `step_ai_turn`, with everything the
/// pipeline needs to emit an `ai_action` event.
#[derive(Clone, Debug)]
pub struct AiTurnReport {
    pub player_id: PlayerId,
    pub player_name: String,
    pub action: ActionKind,
    pub amount: u32,
    pub reasoning: String,
    pub hand_strength: f64,
    pub bet_amount: u32,
    pub stack_after: u32,
    pub pot_after: u32,
    pub triggers_showdown: bool,
    /// The decision was rejected and converted to a fold.
    pub fallback_fold: bool,
}

impl GameEngine {
    /// Next seat that can still act (active, not all-in), scanning
    /// forward from `start` inclusive.
    pub fn next_active_player_index(&self, start: usize) -> Option<usize> {
        let n = self.players.len();
        if n == 0 {
            return None;
        }
        (0..n)
            .map(|i| (start + i) % n)
            .find(|&idx| self.players[idx].is_active && !self.players[idx].all_in)
    }

    /// Move the turn to the next seat that can act.
    pub fn advance_actor(&mut self) {
        if let Some(current) = self.current_player_index {
            self.current_player_index = self.next_active_player_index(current + 1);
        }
    }

    /// Count of real betting actions the big blind has taken this hand.
    /// Posting the blind does not count; the BB keeps its pre-flop
    /// option until this is non-zero.
    fn big_blind_action_count(&self, bb_id: &PlayerId) -> usize {
        self.current_hand_events
            .iter()
            .filter(|e| {
                e.kind == EventKind::Action
                    && &e.player_id == bb_id
                    && matches!(e.action.as_str(), "check" | "call" | "raise" | "fold")
            })
            .count()
    }

    /// Whether the current betting round is finished.
    pub fn betting_round_complete(&self) -> bool {
        let can_act: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter_map(|(i, p)| (p.is_active && !p.all_in).then_some(i))
            .collect();
        let in_hand = self.players.iter().filter(|p| p.is_active).count();

        if can_act.is_empty() {
            return true;
        }
        if can_act.len() == 1 {
            // Alone against all-ins the last player still owes an
            // action; alone because everyone folded, the hand is over.
            if in_hand > 1 {
                return self.players[can_act[0]].has_acted;
            }
            return true;
        }

        for &idx in &can_act {
            let p = &self.players[idx];
            if !p.has_acted || p.current_bet != self.current_bet {
                return false;
            }
        }

        // Pre-flop the BB may raise even after everyone merely called.
        if self.phase == GamePhase::PreFlop {
            if let Some(bb_index) = self.last_raiser_index {
                if let Some(bb) = self.players.get(bb_index) {
                    if bb.is_active && !bb.all_in && self.big_blind_action_count(&bb.id) == 0 {
                        return false;
                    }
                }
            }
        }

        true
    }

    /// Compute and apply one AI decision for the current actor. A
    /// decision the engine rejects is converted to a fold so the hand
    /// always makes progress.
    pub fn step_ai_turn(&mut self) -> Result<AiTurnReport, EngineError> {
        let seat = self.current_player_index.ok_or_else(|| {
            EngineError::Invariant("AI turn requested with no current actor".to_owned())
        })?;

        let decision = {
            let player = &self.players[seat];
            let personality = player.personality.unwrap_or(Personality::Conservative);
            ai::decide(
                personality,
                &DecisionContext {
                    hole_cards: &player.hole_cards,
                    community_cards: &self.community_cards,
                    current_bet: self.current_bet,
                    pot: self.pot,
                    stack: player.stack,
                    player_bet: player.current_bet,
                    big_blind: self.big_blind,
                    last_raise_amount: self.last_raise_amount,
                },
            )
        };
        let (player_id, player_name) =
            (self.players[seat].id.clone(), self.players[seat].name.clone());
        self.last_ai_decisions
            .insert(player_id.clone(), decision.clone());

        match self.apply_action(
            seat,
            decision.action,
            decision.amount,
            decision.hand_strength,
            &decision.reasoning,
        ) {
            Ok(outcome) => Ok(AiTurnReport {
                player_id,
                player_name,
                action: decision.action,
                amount: decision.amount,
                reasoning: decision.reasoning,
                hand_strength: decision.hand_strength,
                bet_amount: outcome.bet_amount,
                stack_after: self.players[seat].stack,
                pot_after: self.pot,
                triggers_showdown: outcome.triggers_showdown,
                fallback_fold: false,
            }),
            Err(e) if e.is_rejection() => {
                tracing::warn!(
                    player = %player_name,
                    action = %decision.action,
                    error = %e,
                    "AI action rejected, falling back to fold"
                );
                let reasoning =
                    format!("[FORCED FOLD] Original {} failed: {}", decision.action, e);
                let outcome =
                    self.apply_action(seat, ActionKind::Fold, 0, decision.hand_strength, &reasoning)?;
                Ok(AiTurnReport {
                    player_id,
                    player_name,
                    action: ActionKind::Fold,
                    amount: 0,
                    reasoning,
                    hand_strength: decision.hand_strength,
                    bet_amount: 0,
                    stack_after: self.players[seat].stack,
                    pot_after: self.pot,
                    triggers_showdown: outcome.triggers_showdown,
                    fallback_fold: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Synchronous AI turn driver: act until the betting round is
    /// complete or an unacted human holds the turn.
    pub(crate) fn process_remaining_actions(&mut self) -> Result<(), EngineError> {
        let mut iterations = 0usize;
        let mut last_seat: Option<usize> = None;
        let mut same_seat_repeats = 0usize;

        while !self.betting_round_complete() {
            let Some(seat) = self.current_player_index else {
                break;
            };

            iterations += 1;
            if iterations > MAX_DRIVER_ITERATIONS {
                tracing::error!(seat, "AI driver exceeded iteration limit, breaking");
                break;
            }
            if last_seat == Some(seat) {
                same_seat_repeats += 1;
                if same_seat_repeats > MAX_SAME_SEAT_REPEATS {
                    tracing::error!(seat, "AI driver stuck on one seat, breaking");
                    break;
                }
            } else {
                same_seat_repeats = 0;
            }
            last_seat = Some(seat);

            let player = &self.players[seat];
            if player.is_human && !player.has_acted && !player.all_in {
                break; // wait for the human's submission
            }
            if !player.is_active || player.all_in || player.has_acted {
                self.advance_actor();
                continue;
            }

            let report = self.step_ai_turn()?;
            if report.triggers_showdown || self.current_player_index.is_none() {
                break;
            }
            self.advance_actor();
        }
        Ok(())
    }

    /// Deal whatever community cards are still missing, in one burst.
    fn fast_forward_board(&mut self) -> Result<(), EngineError> {
        let missing = 5usize.saturating_sub(self.community_cards.len());
        if missing > 0 {
            let cards = self.deck.deal(missing)?;
            self.community_cards.extend(cards);
            tracing::info!(
                board = %pretty::format_cards(&self.community_cards, false),
                "fast-forwarding board, betting is closed"
            );
        }
        Ok(())
    }

    /// Perform any applicable end-of-round transition. Returns whether
    /// the state changed. With `process_ai` the next round's AI turns
    /// run synchronously and advancement recurses; without it the
    /// caller drives AI turns and calls this again.
    pub fn advance_state(&mut self, process_ai: bool) -> Result<bool, EngineError> {
        let changed = self.advance_state_inner(process_ai)?;
        if changed {
            self.check_invariants("after advance_state")?;
        }
        Ok(changed)
    }

    fn advance_state_inner(&mut self, process_ai: bool) -> Result<bool, EngineError> {
        if self.phase == GamePhase::Showdown {
            return Ok(false);
        }

        let active_count = self.players.iter().filter(|p| p.is_active).count();

        // No seat holds the turn: force a resolution rather than stall.
        if self.current_player_index.is_none() {
            if self.pot > 0 {
                if active_count == 1 {
                    self.credit_pot_to_sole_survivor("no other players can act");
                } else if active_count > 1 {
                    self.fast_forward_board()?;
                    self.phase = GamePhase::Showdown;
                    self.award_pot_at_showdown()?;
                    return Ok(true);
                }
            }
            self.phase = GamePhase::Showdown;
            return Ok(true);
        }

        // Everyone folded out (recovery path): give the pot to whoever
        // acted last.
        if active_count == 0 {
            let last_actor = self
                .current_hand_events
                .iter()
                .rev()
                .find(|e| e.kind == EventKind::Action)
                .map(|e| e.player_id.clone());
            if let Some(winner_id) = last_actor {
                if self.pot > 0 {
                    if let Some(idx) = self.players.iter().position(|p| p.id == winner_id) {
                        let amount = self.pot;
                        self.players[idx].stack += amount;
                        self.players[idx].is_active = true;
                        if self.players[idx].stack > 0 && self.players[idx].all_in {
                            self.players[idx].all_in = false;
                        }
                        let name = self.players[idx].name.clone();
                        self.log_event(
                            EventKind::PotAward,
                            winner_id,
                            "win",
                            amount,
                            0.0,
                            format!("All players folded - {} wins ${} by default", name, amount),
                        );
                        self.pot = 0;
                    }
                }
            }
            self.phase = GamePhase::Showdown;
            self.current_player_index = None;
            return Ok(true);
        }

        // Everyone else folded: fold victory.
        if active_count == 1 {
            let pot_awarded = self.pot;
            let winner_id = self.credit_pot_to_sole_survivor("all others folded");
            self.save_hand_on_early_end(winner_id, pot_awarded);
            self.phase = GamePhase::Showdown;
            self.current_player_index = None;
            return Ok(true);
        }

        // All-in fast-forward: nobody (or only one player) can still
        // bet, so run out the board and settle.
        let can_act = self
            .players
            .iter()
            .filter(|p| p.is_active && !p.all_in)
            .count();
        if can_act <= 1 {
            self.fast_forward_board()?;
            self.phase = GamePhase::Showdown;
            self.award_pot_at_showdown()?;
            self.current_player_index = None;
            return Ok(true);
        }

        if !self.betting_round_complete() {
            return Ok(false);
        }

        // Close out this street's action history.
        if !self.current_round_actions.is_empty() {
            let actions = std::mem::take(&mut self.current_round_actions);
            self.hand_betting_rounds.push(BettingRound {
                round_name: self.phase,
                community_cards: self.community_cards.clone(),
                actions,
                pot_at_start: self.pot_at_round_start,
                pot_at_end: self.pot,
            });
        }

        match self.phase {
            GamePhase::PreFlop => {
                self.phase = GamePhase::Flop;
                let cards = self.deck.deal(3)?;
                self.community_cards.extend(cards);
            }
            GamePhase::Flop => {
                self.phase = GamePhase::Turn;
                let cards = self.deck.deal(1)?;
                self.community_cards.extend(cards);
            }
            GamePhase::Turn => {
                self.phase = GamePhase::River;
                let cards = self.deck.deal(1)?;
                self.community_cards.extend(cards);
            }
            GamePhase::River => {
                self.phase = GamePhase::Showdown;
                self.current_player_index = None;
                self.award_pot_at_showdown()?;
                return Ok(true);
            }
            GamePhase::Showdown => {}
        }
        tracing::info!(
            stage = %self.phase,
            board = %pretty::format_cards(&self.community_cards, false),
            "betting round complete"
        );

        for player in &mut self.players {
            player.reset_for_new_round();
        }
        self.current_bet = 0;
        self.last_raiser_index = None;
        self.last_raise_amount = None;
        self.pot_at_round_start = self.pot;
        self.current_player_index = self.next_active_player_index(self.dealer_index + 1);

        if process_ai {
            self.process_remaining_actions()?;
            self.advance_state(true)?;
        }
        Ok(true)
    }

    /// Credit the whole pot to the only player left in the hand.
    /// Returns the winner id for history.
    fn credit_pot_to_sole_survivor(&mut self, why: &str) -> Option<PlayerId> {
        let idx = self.players.iter().position(|p| p.is_active)?;
        if self.pot == 0 {
            return Some(self.players[idx].id.clone());
        }
        let amount = self.pot;
        self.players[idx].stack += amount;
        if self.players[idx].stack > 0 && self.players[idx].all_in {
            self.players[idx].all_in = false;
        }
        let (id, name) = (self.players[idx].id.clone(), self.players[idx].name.clone());
        self.log_event(
            EventKind::PotAward,
            id.clone(),
            "win",
            amount,
            0.0,
            format!("{} wins ${} ({})", name, amount, why),
        );
        self.pot = 0;
        Some(id)
    }
}
