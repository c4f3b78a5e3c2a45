//! Action application: the single source of truth for all mutation.

use railbird_shared::{ActionKind, GamePhase};

use crate::error::EngineError;
use crate::game::engine::GameEngine;
use crate::game::history::{ActionRecord, EventKind};

/// What a successfully applied action did.
#[derive(Clone, Copy, Debug, Default)]
pub struct ActionOutcome {
    /// Chips actually added to the pot (0 for fold).
    pub bet_amount: u32,
    /// The action collapsed the hand (all but one folded).
    pub triggers_showdown: bool,
}

impl GameEngine {
    /// Apply one player action. Every mutation path (human submit, AI
    /// driver, fallback fold) routes through here. A rejected action
    /// returns an error and leaves the engine untouched: `has_acted`
    /// stays unset and the turn does not advance, so the caller can
    /// retry or fall back.
    ///
    /// For a raise, `amount` is the TOTAL target bet, not the increment.
    pub fn apply_action(
        &mut self,
        seat: usize,
        action: ActionKind,
        amount: u32,
        hand_strength: f64,
        reasoning: &str,
    ) -> Result<ActionOutcome, EngineError> {
        if self.phase == GamePhase::Showdown {
            return Err(EngineError::IllegalTransition(
                "hand is already at showdown".to_owned(),
            ));
        }
        if seat >= self.players.len() {
            return Err(EngineError::InvalidInput(format!(
                "invalid player index: {}",
                seat
            )));
        }

        let outcome = match action {
            ActionKind::Fold => self.apply_fold(seat, hand_strength, reasoning),
            ActionKind::Call => Ok(self.apply_call(seat, hand_strength, reasoning)),
            ActionKind::Raise => self.apply_raise(seat, amount, hand_strength, reasoning),
        }?;

        if action != ActionKind::Fold {
            let player = &self.players[seat];
            self.current_round_actions.push(ActionRecord {
                player_id: player.id.clone(),
                player_name: player.name.clone(),
                action: action.label().to_owned(),
                amount: outcome.bet_amount,
                stack_before: player.stack + outcome.bet_amount,
                stack_after: player.stack,
                pot_before: self.pot - outcome.bet_amount,
                pot_after: self.pot,
                reasoning: reasoning.to_owned(),
            });
        }

        self.assert_chip_conservation("after apply_action")?;
        Ok(outcome)
    }

    fn apply_fold(
        &mut self,
        seat: usize,
        hand_strength: f64,
        reasoning: &str,
    ) -> Result<ActionOutcome, EngineError> {
        let (id, name) = (self.players[seat].id.clone(), self.players[seat].name.clone());
        self.players[seat].is_active = false;
        self.players[seat].has_acted = true;
        let note = if reasoning.is_empty() {
            format!("{} folded", name)
        } else {
            reasoning.to_owned()
        };
        self.log_event(EventKind::Action, id, "fold", 0, hand_strength, note);

        let survivors: Vec<usize> = self
            .players
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.is_active.then_some(i))
            .collect();
        if survivors.len() > 1 {
            return Ok(ActionOutcome::default());
        }

        // Hand collapses: the last player standing takes the pot.
        let pot_awarded = self.pot;
        let mut winner_id = None;
        if let Some(&widx) = survivors.first() {
            self.players[widx].stack += self.pot;
            if self.players[widx].stack > 0 && self.players[widx].all_in {
                self.players[widx].all_in = false;
            }
            let (wid, wname) = (self.players[widx].id.clone(), self.players[widx].name.clone());
            self.log_event(
                EventKind::PotAward,
                wid.clone(),
                "win_by_fold",
                pot_awarded,
                0.0,
                format!("{} wins ${} (all others folded)", wname, pot_awarded),
            );
            winner_id = Some(wid);
            self.pot = 0;
        }

        self.save_hand_on_early_end(winner_id, pot_awarded);
        self.phase = GamePhase::Showdown;
        self.current_player_index = None;
        Ok(ActionOutcome {
            bet_amount: 0,
            triggers_showdown: true,
        })
    }

    fn apply_call(&mut self, seat: usize, hand_strength: f64, reasoning: &str) -> ActionOutcome {
        let call_amount = self.current_bet.saturating_sub(self.players[seat].current_bet);
        let bet_amount = self.players[seat].bet(call_amount);
        self.pot += bet_amount;
        self.players[seat].has_acted = true;
        let (id, name) = (self.players[seat].id.clone(), self.players[seat].name.clone());
        let note = if reasoning.is_empty() {
            format!("{} called ${}", name, call_amount)
        } else {
            reasoning.to_owned()
        };
        self.log_event(EventKind::Action, id, "call", bet_amount, hand_strength, note);
        ActionOutcome {
            bet_amount,
            triggers_showdown: false,
        }
    }

    fn apply_raise(
        &mut self,
        seat: usize,
        amount: u32,
        hand_strength: f64,
        reasoning: &str,
    ) -> Result<ActionOutcome, EngineError> {
        // Min raise = current bet + size of the previous raise; the big
        // blind seeds the increment for a round's first raise.
        let min_raise_increment = self.last_raise_amount.unwrap_or(self.big_blind);
        let min_raise = self.current_bet + min_raise_increment;

        if amount < min_raise {
            let player = &self.players[seat];
            let max_possible_bet = player.stack + player.current_bet;
            if amount >= player.stack || amount >= max_possible_bet {
                // An all-in for less than a full raise is a call; it
                // does not reopen the action.
                let call_amount = self.current_bet.saturating_sub(player.current_bet);
                let bet_amount = self.players[seat].bet(call_amount);
                self.pot += bet_amount;
                self.players[seat].has_acted = true;
                let (id, name) =
                    (self.players[seat].id.clone(), self.players[seat].name.clone());
                let note = if reasoning.is_empty() {
                    format!("{} called all-in ${}", name, call_amount)
                } else {
                    reasoning.to_owned()
                };
                self.log_event(EventKind::Action, id, "call", bet_amount, hand_strength, note);
                return Ok(ActionOutcome {
                    bet_amount,
                    triggers_showdown: false,
                });
            }
            return Err(EngineError::InvalidInput(format!(
                "raise amount {} below minimum {}",
                amount, min_raise
            )));
        }

        let increment = (amount - self.players[seat].current_bet).min(self.players[seat].stack);
        let bet_amount = self.players[seat].bet(increment);
        self.pot += bet_amount;

        let previous_bet = self.current_bet;
        self.current_bet = amount;
        self.last_raise_amount = Some(amount - previous_bet);
        self.last_raiser_index = Some(seat);
        self.players[seat].has_acted = true;

        // Everyone else now owes a response to the raise.
        for (i, p) in self.players.iter_mut().enumerate() {
            if i != seat && p.is_active && !p.all_in {
                p.has_acted = false;
            }
        }

        let (id, name) = (self.players[seat].id.clone(), self.players[seat].name.clone());
        let note = if reasoning.is_empty() {
            format!("{} raised to ${}", name, amount)
        } else {
            reasoning.to_owned()
        };
        self.log_event(EventKind::Action, id, "raise", bet_amount, hand_strength, note);
        Ok(ActionOutcome {
            bet_amount,
            triggers_showdown: false,
        })
    }

    /// Validate and apply the human player's action. The caller decides
    /// whether the engine should also drive AI turns (REST/tests) or
    /// leave them to the pipeline (WebSocket).
    pub fn submit_human_action(
        &mut self,
        action: ActionKind,
        amount: Option<u32>,
        process_ai: bool,
    ) -> Result<ActionOutcome, EngineError> {
        let human_index = self
            .players
            .iter()
            .position(|p| p.is_human)
            .ok_or_else(|| EngineError::InvalidInput("no human seat in this game".to_owned()))?;

        if self.current_player_index != Some(human_index) {
            return Err(EngineError::InvalidInput("not your turn".to_owned()));
        }
        if !self.players[human_index].is_active && action != ActionKind::Fold {
            return Err(EngineError::InvalidInput(
                "you are no longer in this hand".to_owned(),
            ));
        }

        let hand_strength = {
            let human = &self.players[human_index];
            if human.hole_cards.is_empty() {
                0.0
            } else {
                let (score, _) =
                    crate::poker::evaluation::evaluate(&human.hole_cards, &self.community_cards);
                crate::poker::evaluation::score_to_strength(score)
            }
        };

        let outcome = self.apply_action(
            human_index,
            action,
            amount.unwrap_or(0),
            hand_strength,
            &format!("Human player {}", action),
        )?;

        if !outcome.triggers_showdown {
            self.current_player_index = self.next_active_player_index(human_index + 1);
            if process_ai {
                self.process_remaining_actions()?;
                self.advance_state(true)?;
            }
        }

        self.check_invariants("after submit_human_action")?;
        Ok(outcome)
    }
}
