//! Runtime self-auditing.
//!
//! The engine re-checks its own rules at every mutation boundary: hand
//! start, after blinds, after every action, after every state advance
//! and after every pot award. A failed check is fatal for the hand:
//! the mutation returns an `Invariant` error instead of continuing in
//! an inconsistent state. Chip counts use unsigned integers, so the
//! no-negatives rules hold structurally; the checks below cover the
//! relational invariants.

use railbird_shared::GamePhase;

use crate::error::EngineError;
use crate::game::engine::GameEngine;

impl GameEngine {
    /// Chips cannot be created or destroyed: stacks plus pot must equal
    /// the table's initial total at every observable point.
    pub fn assert_chip_conservation(&self, context: &str) -> Result<(), EngineError> {
        if !self.config.assertions_enabled {
            return Ok(());
        }
        let total: u32 = self.players.iter().map(|p| p.stack).sum::<u32>() + self.pot;
        if total != self.total_chips {
            let stacks: Vec<String> = self
                .players
                .iter()
                .map(|p| format!("{}=${}", p.name, p.stack))
                .collect();
            return Err(EngineError::Invariant(format!(
                "chip conservation violated {}: total ${} (expected ${}), pot ${}, stacks {}, state {}",
                context,
                total,
                self.total_chips,
                self.pot,
                stacks.join(", "),
                self.phase
            )));
        }
        Ok(())
    }

    /// The relational state rules: all-in consistency in both
    /// directions, current-actor legality, pot settled at showdown, and
    /// the can-the-hand-continue sanity checks.
    pub fn assert_valid_state(&self, context: &str) -> Result<(), EngineError> {
        if !self.config.assertions_enabled {
            return Ok(());
        }
        let mut errors: Vec<String> = Vec::new();

        for p in &self.players {
            if p.all_in && p.stack > 0 {
                errors.push(format!("{} marked all-in but has ${} remaining", p.name, p.stack));
            }
            if p.stack == 0 && p.is_active && p.total_invested > 0 && !p.all_in {
                errors.push(format!(
                    "{} has $0 stack and is active with ${} invested but NOT marked all-in",
                    p.name, p.total_invested
                ));
            }
        }

        if self.phase != GamePhase::Showdown {
            if let Some(idx) = self.current_player_index {
                match self.players.get(idx) {
                    Some(current) => {
                        if !current.is_active {
                            errors.push(format!(
                                "current player {} is not active (index={})",
                                current.name, idx
                            ));
                        }
                        if current.all_in {
                            errors.push(format!(
                                "current player {} is all-in (index={})",
                                current.name, idx
                            ));
                        }
                        if current.stack == 0 && !current.all_in {
                            errors.push(format!(
                                "current player {} has $0 but is not all-in (index={})",
                                current.name, idx
                            ));
                        }
                    }
                    None => errors.push(format!("current player index {} out of range", idx)),
                }
            }
        }

        if self.phase == GamePhase::Showdown && self.pot > 0 {
            errors.push(format!("at showdown but pot not awarded: ${}", self.pot));
        }

        // At pre-flop start, seats busted in earlier hands are inactive;
        // that is the one phase where <=1 active is a normal resting state.
        let active_count = self.players.iter().filter(|p| p.is_active).count();
        if active_count <= 1
            && self.phase != GamePhase::Showdown
            && self.phase != GamePhase::PreFlop
        {
            errors.push(format!(
                "only {} active players but not at showdown (state: {})",
                active_count, self.phase
            ));
        }

        if self.phase != GamePhase::Showdown {
            let can_act = self
                .players
                .iter()
                .filter(|p| p.is_active && !p.all_in)
                .count();
            if can_act > 1 && self.current_player_index.is_none() {
                errors.push(format!(
                    "{} players can act but no current player is set",
                    can_act
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Invariant(format!(
                "invalid game state {}: {}",
                context,
                errors.join("; ")
            )))
        }
    }

    /// The full assertion block.
    pub(crate) fn check_invariants(&self, context: &str) -> Result<(), EngineError> {
        self.assert_chip_conservation(context)?;
        self.assert_valid_state(context)
    }
}
