//! Pot awarding at showdown.

use crate::error::EngineError;
use crate::game::engine::GameEngine;
use crate::game::history::EventKind;
use crate::poker::pots;

impl GameEngine {
    /// Run the pot resolver and credit every winner. Indivisible
    /// remainder chips go one at a time to the earliest winners in list
    /// order; any delta between the live pot and the layered amounts
    /// (partial blinds, defensive paths) goes to the first credited
    /// winner so conservation always holds.
    pub(crate) fn award_pot_at_showdown(&mut self) -> Result<(), EngineError> {
        if self.pot == 0 {
            return Ok(());
        }

        let original_pot = self.pot;
        let resolved = pots::resolve(&self.stakes(), &self.community_cards);
        let layered_total: u32 = resolved.iter().map(|p| p.amount).sum();
        let pot_difference = original_pot.saturating_sub(layered_total);

        let mut total_awarded: u32 = 0;
        for pot_info in &resolved {
            let winner_count = pot_info.winners.len() as u32;
            if winner_count == 0 {
                continue;
            }
            let share = pot_info.amount / winner_count;
            let remainder = pot_info.amount % winner_count;

            for (i, winner_id) in pot_info.winners.iter().enumerate() {
                let mut award = share + if (i as u32) < remainder { 1 } else { 0 };
                if pot_difference > 0 && total_awarded == 0 {
                    award += pot_difference;
                }
                let Some(idx) = self.players.iter().position(|p| &p.id == winner_id) else {
                    continue;
                };
                self.players[idx].stack += award;
                total_awarded += award;
                if self.players[idx].stack > 0 && self.players[idx].all_in {
                    self.players[idx].all_in = false;
                }
                let name = self.players[idx].name.clone();
                tracing::info!(winner = %name, award, pot = %pot_info.label, "pot awarded");
                self.log_event(
                    EventKind::PotAward,
                    winner_id.clone(),
                    "win",
                    award,
                    0.0,
                    format!("{} wins ${} at showdown", name, award),
                );
            }
        }

        self.pot = 0;
        self.showdown_resolved = true;
        self.save_completed_hand(&resolved, original_pot);

        self.check_invariants("after award_pot_at_showdown")?;
        Ok(())
    }
}
