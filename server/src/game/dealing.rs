//! Start-of-hand sequence: defensive cleanup, blind escalation, player
//! resets, dealing and blind posting.

use railbird_shared::{GamePhase, PlayerId};

use crate::error::EngineError;
use crate::game::engine::GameEngine;
use crate::game::history::EventKind;
use crate::pretty;

impl GameEngine {
    /// Begin a new hand. With `process_ai` the engine drives AI turns
    /// synchronously until the human must act (REST/test flow); without
    /// it the caller interleaves AI turns itself (WebSocket flow).
    pub fn start_hand(&mut self, process_ai: bool) -> Result<(), EngineError> {
        // A hand should never end with chips left in the pot. If one
        // did, hand them to someone rather than destroy them.
        self.recover_undistributed_pot();

        self.flush_hand_events();
        self.hand_count += 1;
        self.maybe_increase_blinds();

        self.last_ai_decisions.clear();
        self.current_round_actions.clear();
        self.hand_betting_rounds.clear();
        self.pot_at_round_start = 0;
        self.showdown_resolved = false;

        for player in &mut self.players {
            player.reset_for_new_hand();
        }
        self.community_cards.clear();
        self.pot = 0;
        self.current_bet = 0;
        self.phase = GamePhase::PreFlop;
        self.last_raiser_index = None;
        self.last_raise_amount = None;
        self.current_player_index = None;

        self.deck.reset();
        for i in 0..self.players.len() {
            if !self.players[i].is_active {
                continue;
            }
            let cards = self.deck.deal(2)?;
            self.players[i].hole_cards = cards;
            let (id, name) = (self.players[i].id.clone(), self.players[i].name.clone());
            self.log_event(
                EventKind::Deal,
                id,
                "hole_cards",
                0,
                0.0,
                "Dealt 2 hole cards".to_owned(),
            );
            tracing::debug!(
                player = %name,
                cards = %pretty::format_cards(&self.players[i].hole_cards, false),
                "dealt hole cards"
            );
        }

        let (_, bb_index) = self.post_blinds()?;
        self.assert_chip_conservation("immediately after post_blinds")?;

        // First to act sits after the big blind; with no blinds posted
        // there is no one to act.
        self.current_player_index =
            bb_index.and_then(|bb| self.next_active_player_index(bb + 1));

        if process_ai {
            self.process_remaining_actions()?;
        }
        self.advance_state(process_ai)?;

        self.check_invariants("after start_hand")?;
        Ok(())
    }

    /// Defensive award of any pot left over from a prior hand: first
    /// still-active player, or failing that any seated player.
    fn recover_undistributed_pot(&mut self) {
        if self.pot == 0 {
            return;
        }
        let winner_index = self
            .players
            .iter()
            .position(|p| p.is_active)
            .or_else(|| (!self.players.is_empty()).then_some(0));
        let Some(idx) = winner_index else { return };

        let amount = self.pot;
        self.players[idx].stack += amount;
        if self.players[idx].stack > 0 && self.players[idx].all_in {
            self.players[idx].all_in = false;
        }
        let (id, name) = (self.players[idx].id.clone(), self.players[idx].name.clone());
        tracing::warn!(player = %name, amount, "recovering undistributed pot");
        self.log_event(
            EventKind::PotAward,
            id,
            "defensive_award",
            amount,
            0.0,
            format!("Defensive pot award: {} receives ${}", name, amount),
        );
        self.pot = 0;
    }

    /// Escalate blinds every N hands once past the first level.
    fn maybe_increase_blinds(&mut self) {
        if !self.config.blind_escalation_enabled {
            return;
        }
        let level_size = self.config.hands_per_blind_level;
        if level_size == 0 {
            return;
        }
        if self.hand_count > level_size && (self.hand_count - 1) % level_size == 0 {
            let (old_sb, old_bb) = (self.small_blind, self.big_blind);
            self.small_blind = (self.small_blind as f64 * self.config.blind_multiplier) as u32;
            self.big_blind = (self.big_blind as f64 * self.config.blind_multiplier) as u32;
            let note = format!(
                "Blinds increased from ${}/${} to ${}/${}",
                old_sb, old_bb, self.small_blind, self.big_blind
            );
            tracing::info!("{}", note);
            self.log_event(
                EventKind::BlindIncrease,
                PlayerId::from("system"),
                "increase",
                0,
                0.0,
                note,
            );
        }
    }

    fn next_seat_with_chips(&self, start: usize, exclude: Option<usize>) -> Option<usize> {
        let n = self.players.len();
        (0..n)
            .map(|i| (start + i) % n)
            .find(|&idx| self.players[idx].stack > 0 && Some(idx) != exclude)
    }

    /// Advance the button past busted seats and post the blinds.
    /// Returns the (SB, BB) seat indices, or (None, None) when fewer
    /// than two seats can pay.
    pub(crate) fn post_blinds(&mut self) -> Result<(Option<usize>, Option<usize>), EngineError> {
        let chipped = self.players.iter().filter(|p| p.stack > 0).count();
        if chipped < 2 {
            self.pot = 0;
            self.current_bet = 0;
            self.small_blind_index = None;
            self.big_blind_index = None;
            return Ok((None, None));
        }

        let n = self.players.len();
        self.dealer_index = (self.dealer_index + 1) % n;
        if let Some(dealer) = self.next_seat_with_chips(self.dealer_index, None) {
            self.dealer_index = dealer;
        }

        // Heads-up the dealer posts the small blind; otherwise the two
        // seats after the button do.
        let (sb_index, bb_index) = if chipped == 2 {
            let sb = self.dealer_index;
            let bb = self.next_seat_with_chips((sb + 1) % n, Some(sb));
            (Some(sb), bb)
        } else {
            let sb = self.next_seat_with_chips((self.dealer_index + 1) % n, None);
            let bb = sb.and_then(|sb| self.next_seat_with_chips((sb + 1) % n, None));
            (sb, bb)
        };
        let (Some(sb_index), Some(bb_index)) = (sb_index, bb_index) else {
            return Err(EngineError::Invariant(
                "blind posting: unable to seat both blinds".to_owned(),
            ));
        };
        if sb_index == bb_index {
            return Err(EngineError::Invariant(format!(
                "blind posting: SB and BB are the same player (index={})",
                sb_index
            )));
        }

        let sb_amount = self.players[sb_index].bet(self.small_blind);
        let bb_amount = self.players[bb_index].bet(self.big_blind);
        self.pot += sb_amount + bb_amount;

        // The table bet is what the BB actually posted, which can be a
        // partial all-in. The BB owns the pre-flop option.
        self.current_bet = bb_amount;
        self.last_raiser_index = Some(bb_index);
        self.last_raise_amount = Some(self.big_blind);
        self.small_blind_index = Some(sb_index);
        self.big_blind_index = Some(bb_index);

        tracing::debug!(
            sb = %self.players[sb_index].name,
            sb_amount,
            bb = %self.players[bb_index].name,
            bb_amount,
            dealer = self.dealer_index,
            "posted blinds"
        );
        Ok((Some(sb_index), Some(bb_index)))
    }
}

#[cfg(test)]
mod tests {
    use crate::game::test_support::{test_config, test_players};
    use crate::game::GameEngine;
    use crate::poker::Deck;
    use railbird_shared::GamePhase;

    fn seeded_engine(stacks: &[u32], seed: u64) -> anyhow::Result<GameEngine> {
        let mut engine = GameEngine::with_players(test_players(stacks), test_config())?;
        engine.deck = Deck::seeded(seed);
        Ok(engine)
    }

    #[test]
    fn heads_up_dealer_posts_small_blind() -> anyhow::Result<()> {
        let mut engine = seeded_engine(&[1000, 1000], 42)?;
        engine.dealer_index = 1; // advances onto seat 0
        engine.start_hand(false)?;

        assert_eq!(engine.dealer_index, 0);
        assert_eq!(engine.small_blind_index, Some(0));
        assert_eq!(engine.big_blind_index, Some(1));
        assert_eq!(engine.players[0].stack, 995);
        assert_eq!(engine.players[1].stack, 990);
        assert_eq!(engine.pot, 15);
        // Dealer acts first pre-flop in heads-up.
        assert_eq!(engine.current_player_index, Some(0));
        Ok(())
    }

    #[test]
    fn three_handed_blinds_and_first_actor() -> anyhow::Result<()> {
        let mut engine = seeded_engine(&[1000, 1000, 1000], 7)?;
        engine.start_hand(false)?;

        // Dealer advanced from 0 to 1; blinds follow it around.
        assert_eq!(engine.dealer_index, 1);
        assert_eq!(engine.small_blind_index, Some(2));
        assert_eq!(engine.big_blind_index, Some(0));
        assert_eq!(engine.players[2].current_bet, 5);
        assert_eq!(engine.players[0].current_bet, 10);
        assert_eq!(engine.pot, 15);
        assert_eq!(engine.current_bet, 10);
        assert_eq!(engine.last_raiser_index, Some(0));
        assert_eq!(engine.last_raise_amount, Some(10));
        assert_eq!(engine.current_player_index, Some(1));
        Ok(())
    }

    #[test]
    fn short_stack_posts_partial_blind_all_in() -> anyhow::Result<()> {
        let mut engine = seeded_engine(&[1000, 1000, 8], 11)?;
        // Seat 2 (stack 8, below the BB of 10) lands on the big blind.
        engine.dealer_index = 2; // advances onto seat 0
        engine.start_hand(false)?;

        assert_eq!(engine.big_blind_index, Some(2));
        assert_eq!(engine.players[2].stack, 0);
        assert!(engine.players[2].all_in);
        assert_eq!(engine.players[2].current_bet, 8);
        // Table bet is what the BB actually posted.
        assert_eq!(engine.current_bet, 8);
        assert_eq!(engine.pot, 13);
        Ok(())
    }

    #[test]
    fn busted_seats_are_skipped_for_blinds() -> anyhow::Result<()> {
        let mut engine = seeded_engine(&[1000, 0, 1000, 1000], 3)?;
        engine.start_hand(false)?;

        assert!(!engine.players[1].is_active);
        assert_ne!(engine.small_blind_index, Some(1));
        assert_ne!(engine.big_blind_index, Some(1));
        assert_ne!(engine.dealer_index, 1);
        engine.check_invariants("in test")?;
        Ok(())
    }

    #[test]
    fn hands_deal_two_cards_to_each_active_player() -> anyhow::Result<()> {
        let mut engine = seeded_engine(&[1000, 1000, 1000, 1000], 99)?;
        engine.start_hand(false)?;
        for p in &engine.players {
            assert_eq!(p.hole_cards.len(), 2);
        }
        assert_eq!(engine.phase, GamePhase::PreFlop);
        assert_eq!(engine.deck.remaining(), 52 - 8);
        Ok(())
    }

    #[test]
    fn blind_escalation_doubles_on_schedule() -> anyhow::Result<()> {
        let mut config = test_config();
        config.blind_escalation_enabled = true;
        let mut engine = GameEngine::with_players(test_players(&[5000, 5000]), config)?;
        engine.deck = Deck::seeded(5);

        for _ in 0..10 {
            engine.start_hand(false)?;
            fold_to_end(&mut engine)?;
        }
        assert_eq!(engine.small_blind, 5);
        assert_eq!(engine.big_blind, 10);

        engine.start_hand(false)?;
        assert_eq!(engine.hand_count, 11);
        assert_eq!(engine.small_blind, 10);
        assert_eq!(engine.big_blind, 20);
        Ok(())
    }

    fn fold_to_end(engine: &mut GameEngine) -> anyhow::Result<()> {
        while engine.phase != GamePhase::Showdown {
            let Some(idx) = engine.current_player_index else { break };
            engine
                .apply_action(idx, railbird_shared::ActionKind::Fold, 0, 0.0, "")?;
            engine.advance_actor();
        }
        Ok(())
    }
}
