//! End-to-end hand scenarios driven through the engine's public API
//! with deterministic decks and scripted actions.

use anyhow::Result;
use railbird_server::game::{EngineConfig, GameEngine, Player};
use railbird_server::poker::Deck;
use railbird_shared::{ActionKind, GamePhase, Personality, PlayerId};

fn config() -> EngineConfig {
    EngineConfig {
        blind_escalation_enabled: false,
        ..EngineConfig::default()
    }
}

fn players(stacks: &[u32]) -> Vec<Player> {
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

/// Engine with the dealer advancing onto seat 0 at the first hand.
fn scripted_engine(stacks: &[u32], seed: u64) -> Result<GameEngine> {
    let mut engine =
        GameEngine::with_players_and_deck(players(stacks), config(), Deck::seeded(seed))?;
    engine.dealer_index = stacks.len() - 1;
    Ok(engine)
}

fn total_chips(engine: &GameEngine) -> u32 {
    engine.players.iter().map(|p| p.stack).sum::<u32>() + engine.pot
}

#[test]
fn preflop_fold_around_to_big_blind() -> Result<()> {
    let mut engine = scripted_engine(&[1000, 1000, 1000, 1000], 1)?;
    engine.start_hand(false)?;
    assert_eq!(engine.dealer_index, 0);
    assert_eq!(engine.small_blind_index, Some(1));
    assert_eq!(engine.big_blind_index, Some(2));

    // P3, P0, P1 fold in order; the blinds go to P2.
    for seat in [3usize, 0, 1] {
        assert_eq!(engine.current_player_index, Some(seat));
        let outcome = engine.apply_action(seat, ActionKind::Fold, 0, 0.0, "")?;
        if seat == 1 {
            assert!(outcome.triggers_showdown);
        } else {
            engine.advance_actor();
        }
    }

    assert_eq!(engine.phase, GamePhase::Showdown);
    assert_eq!(engine.pot, 0);
    assert_eq!(engine.players[0].stack, 1000);
    assert_eq!(engine.players[1].stack, 995);
    assert_eq!(engine.players[2].stack, 1005);
    assert_eq!(engine.players[3].stack, 1000);
    assert_eq!(total_chips(&engine), 4000);

    let snapshot = engine.snapshot(false);
    let info = snapshot.winner_info.expect("winner info after fold win");
    assert_eq!(info.winners.len(), 1);
    assert_eq!(info.winners[0].player_id, PlayerId::ai(2));
    assert_eq!(info.winners[0].amount, 15);
    assert!(info.winners[0].won_by_fold);
    assert!(info.all_showdown_hands.is_empty());

    let last_award = engine
        .current_hand_events
        .iter()
        .rev()
        .find(|e| e.kind == railbird_server::game::EventKind::PotAward)
        .expect("pot award event");
    assert_eq!(last_award.action, "win_by_fold");
    Ok(())
}

#[test]
fn heads_up_all_in_for_less() -> Result<()> {
    let mut engine = scripted_engine(&[100, 1000], 2)?;
    engine.start_hand(false)?;
    // Heads-up: the dealer (P0) posts the small blind and acts first.
    assert_eq!(engine.small_blind_index, Some(0));
    assert_eq!(engine.big_blind_index, Some(1));
    assert_eq!(engine.current_player_index, Some(0));

    engine.apply_action(0, ActionKind::Raise, 100, 0.0, "")?;
    assert!(engine.players[0].all_in);
    assert_eq!(engine.current_bet, 100);
    assert_eq!(engine.last_raise_amount, Some(90));
    engine.advance_actor();

    engine.apply_action(1, ActionKind::Call, 0, 0.0, "")?;
    assert_eq!(engine.pot, 200);
    engine.advance_actor();

    // Only one player can still act: the board runs out in one burst.
    let advanced = engine.advance_state(false)?;
    assert!(advanced);
    assert_eq!(engine.phase, GamePhase::Showdown);
    assert_eq!(engine.community_cards.len(), 5);
    assert_eq!(engine.pot, 0);
    assert_eq!(total_chips(&engine), 1100);

    let summary = engine.last_hand_summary.as_ref().expect("completed hand");
    assert!(!summary.winner_ids.is_empty());
    match summary.winner_ids.as_slice() {
        [winner] if *winner == PlayerId::human() => {
            assert_eq!(engine.players[0].stack, 200);
            assert!(!engine.players[0].all_in, "winner's stale all-in cleared");
            assert_eq!(engine.players[1].stack, 900);
        }
        [winner] if *winner == PlayerId::ai(1) => {
            assert_eq!(engine.players[0].stack, 0);
            assert_eq!(engine.players[1].stack, 1100);
        }
        _ => {
            // Split pot.
            assert_eq!(engine.players[0].stack, 100);
            assert_eq!(engine.players[1].stack, 1000);
        }
    }
    Ok(())
}

#[test]
fn three_way_all_in_on_the_flop_fast_forwards() -> Result<()> {
    let mut engine = scripted_engine(&[100, 150, 80], 3)?;
    engine.start_hand(false)?;
    // Dealer 0, SB 1, BB 2; P0 acts first pre-flop.
    assert_eq!(engine.current_player_index, Some(0));

    engine.apply_action(0, ActionKind::Call, 0, 0.0, "")?;
    engine.advance_actor();
    engine.apply_action(1, ActionKind::Call, 0, 0.0, "")?;
    engine.advance_actor();
    // BB exercises its option by checking (a call of nothing).
    engine.apply_action(2, ActionKind::Call, 0, 0.0, "")?;
    engine.advance_actor();
    assert!(engine.betting_round_complete());
    engine.advance_state(false)?;
    assert_eq!(engine.phase, GamePhase::Flop);
    assert_eq!(engine.pot, 30);

    // P1 shoves, P2 and P0 call all-in for less.
    assert_eq!(engine.current_player_index, Some(1));
    engine.apply_action(1, ActionKind::Raise, 140, 0.0, "")?;
    assert!(engine.players[1].all_in);
    engine.advance_actor();
    engine.apply_action(2, ActionKind::Call, 0, 0.0, "")?;
    assert!(engine.players[2].all_in);
    engine.advance_actor();
    engine.apply_action(0, ActionKind::Call, 0, 0.0, "")?;
    assert!(engine.players[0].all_in);
    engine.advance_actor();

    let advanced = engine.advance_state(false)?;
    assert!(advanced);
    assert_eq!(engine.phase, GamePhase::Showdown);
    assert_eq!(engine.community_cards.len(), 5, "turn and river dealt in one pass");
    assert_eq!(engine.pot, 0);
    assert_eq!(total_chips(&engine), 330);

    let snapshot = engine.snapshot(false);
    let info = snapshot.winner_info.expect("winner info at showdown");
    assert!(!info.winners.is_empty());
    assert!(info.winners.iter().all(|w| !w.won_by_fold));
    assert_eq!(info.all_showdown_hands.len(), 3);
    let awarded: u32 = info.winners.iter().map(|w| w.amount).sum();
    assert_eq!(awarded, 330);
    Ok(())
}

#[test]
fn big_blind_option_reopens_the_action() -> Result<()> {
    let mut engine = scripted_engine(&[1000, 1000, 1000, 1000], 4)?;
    engine.start_hand(false)?;

    for seat in [3usize, 0, 1] {
        engine.apply_action(seat, ActionKind::Call, 0, 0.0, "")?;
        engine.advance_actor();
    }
    // Everyone has called and matched, but the BB has taken no action
    // beyond posting the blind: the round stays open.
    assert!(!engine.betting_round_complete());
    assert!(!engine.advance_state(false)?);
    assert_eq!(engine.current_player_index, Some(2));

    engine.apply_action(2, ActionKind::Raise, 30, 0.0, "")?;
    assert_eq!(engine.current_bet, 30);
    for seat in [0usize, 1, 3] {
        assert!(
            !engine.players[seat].has_acted,
            "seat {} owes a response to the BB's raise",
            seat
        );
    }
    Ok(())
}

#[test]
fn fold_only_hands_conserve_chips_indefinitely() -> Result<()> {
    let mut engine = scripted_engine(&[1000, 1000, 1000, 1000], 5)?;
    for _ in 0..20 {
        engine.start_hand(false)?;
        while engine.phase != GamePhase::Showdown {
            let Some(seat) = engine.current_player_index else {
                engine.advance_state(false)?;
                continue;
            };
            engine.apply_action(seat, ActionKind::Fold, 0, 0.0, "")?;
            engine.advance_actor();
        }
        assert_eq!(total_chips(&engine), 4000);
        engine.assert_chip_conservation("after scripted hand")?;
        engine.assert_valid_state("after scripted hand")?;
    }
    assert_eq!(engine.hand_count, 20);
    Ok(())
}

#[test]
fn ai_driven_hands_keep_invariants() -> Result<()> {
    let mut engine = GameEngine::new_with_seed("Alice", 3, config(), 99)?;
    for _ in 0..5 {
        engine.start_hand(true)?;
        if engine.phase != GamePhase::Showdown {
            // The driver stopped because the human holds the turn.
            let snapshot = engine.snapshot(false);
            assert!(snapshot.human_player.is_current_turn);
            engine.submit_human_action(ActionKind::Fold, None, true)?;
        }
        assert_eq!(engine.phase, GamePhase::Showdown);
        engine.assert_chip_conservation("after AI-driven hand")?;
        engine.assert_valid_state("after AI-driven hand")?;
    }
    Ok(())
}

#[test]
fn rejected_raise_leaves_engine_untouched() -> Result<()> {
    let mut engine = scripted_engine(&[1000, 1000, 1000, 1000], 6)?;
    engine.start_hand(false)?;
    let seat = engine.current_player_index.unwrap();
    let pot_before = engine.pot;
    let stacks_before: Vec<u32> = engine.players.iter().map(|p| p.stack).collect();

    let err = engine.apply_action(seat, ActionKind::Raise, 12, 0.0, "");
    assert!(err.is_err());
    assert!(err.unwrap_err().to_string().contains("below minimum"));

    let stacks_after: Vec<u32> = engine.players.iter().map(|p| p.stack).collect();
    assert_eq!(stacks_before, stacks_after);
    assert_eq!(engine.pot, pot_before);
    assert_eq!(engine.current_player_index, Some(seat));
    assert!(!engine.players[seat].has_acted);
    Ok(())
}
