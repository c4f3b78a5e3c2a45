//! AI opponent decision making.
//!
//! Each personality is a tagged variant with its own decision policy.
//! Decisions carry the reasoning shown to observers who opted into "AI
//! thinking", plus the derived metrics (hand strength, pot odds, SPR)
//! and a fresh decision id for client-side deduplication.

use railbird_shared::{ActionKind, Card, Personality};
use uuid::Uuid;

use crate::poker::evaluation;

/// SPR stand-in when the pot is empty; finite so it serializes cleanly.
pub const SPR_EMPTY_POT: f64 = 999.0;

#[derive(Clone, Debug)]
pub struct AiDecision {
    pub action: ActionKind,
    /// For a raise, the total target bet. For a call, the chips to add.
    pub amount: u32,
    pub reasoning: String,
    pub hand_strength: f64,
    pub pot_odds: f64,
    pub confidence: f64,
    pub spr: f64,
    pub decision_id: String,
}

/// Everything a personality needs to decide, snapshotted from the
/// engine before the decision is made.
#[derive(Clone, Debug)]
pub struct DecisionContext<'a> {
    pub hole_cards: &'a [Card],
    pub community_cards: &'a [Card],
    /// Highest total bet on the table this round.
    pub current_bet: u32,
    pub pot: u32,
    pub stack: u32,
    /// The deciding player's own bet this round.
    pub player_bet: u32,
    pub big_blind: u32,
    pub last_raise_amount: Option<u32>,
}

struct Derived {
    hand_strength: f64,
    hand_rank: &'static str,
    pot_odds: f64,
    spr: f64,
    call_amount: u32,
    min_raise_increment: u32,
    /// Total bet that puts the whole stack in.
    all_in_total: u32,
}

fn chance(p: f64) -> bool {
    rand::random::<f64>() < p
}

fn derive(ctx: &DecisionContext<'_>) -> Derived {
    let (score, hand_rank) = evaluation::evaluate(ctx.hole_cards, ctx.community_cards);
    let hand_strength = evaluation::score_to_strength(score);

    let call_amount = ctx.current_bet.saturating_sub(ctx.player_bet);
    let denominator = ctx.pot + call_amount;
    let pot_odds = if denominator > 0 {
        call_amount as f64 / denominator as f64
    } else {
        0.0
    };
    let spr = if ctx.pot > 0 {
        ctx.stack as f64 / ctx.pot as f64
    } else {
        SPR_EMPTY_POT
    };

    Derived {
        hand_strength,
        hand_rank,
        pot_odds,
        spr,
        call_amount,
        min_raise_increment: ctx.last_raise_amount.unwrap_or(ctx.big_blind),
        all_in_total: ctx.stack + ctx.player_bet,
    }
}

/// Decide an action for the given personality. Raise amounts are total
/// target bets, always capped at all-in; the engine converts undersized
/// all-in raises to calls and rejects other undersized raises, so the
/// policy is free to propose what the personality wants.
pub fn decide(personality: Personality, ctx: &DecisionContext<'_>) -> AiDecision {
    let d = derive(ctx);
    let (action, amount, reasoning, confidence) = match personality {
        Personality::Conservative => decide_conservative(ctx, &d),
        Personality::Aggressive => decide_aggressive(ctx, &d),
        Personality::Mathematical => decide_mathematical(ctx, &d),
        Personality::LoosePassive => decide_loose_passive(ctx, &d),
        Personality::TightAggressive => decide_tight_aggressive(ctx, &d),
        Personality::Maniac => decide_maniac(ctx, &d),
    };

    AiDecision {
        action,
        amount,
        reasoning,
        hand_strength: d.hand_strength,
        pot_odds: d.pot_odds,
        confidence,
        spr: d.spr,
        decision_id: Uuid::new_v4().to_string(),
    }
}

fn pct(strength: f64) -> String {
    format!("{:.1}%", strength * 100.0)
}

fn decide_conservative(ctx: &DecisionContext<'_>, d: &Derived) -> (ActionKind, u32, String, f64) {
    let s = d.hand_strength;
    if d.spr < 3.0 && s >= 0.45 {
        // Pot committed with two pair or better.
        let raise = chance(0.7);
        let amount = if raise {
            ctx.current_bet + d.min_raise_increment
        } else {
            d.call_amount
        };
        let action = if raise { ActionKind::Raise } else { ActionKind::Call };
        return (
            action,
            amount.min(d.all_in_total),
            format!(
                "Low SPR ({:.1}) - pot committed with {} ({})",
                d.spr,
                d.hand_rank,
                pct(s)
            ),
            0.85,
        );
    }
    if d.spr > 10.0 && s < 0.65 {
        return (
            ActionKind::Fold,
            0,
            format!(
                "High SPR ({:.1}) - need premium hand, folding {} ({})",
                d.spr,
                d.hand_rank,
                pct(s)
            ),
            0.8,
        );
    }
    if s >= 0.75 {
        let raise = chance(0.7);
        let amount = if raise {
            (ctx.current_bet + d.min_raise_increment).max(ctx.current_bet * 2)
        } else {
            d.call_amount
        };
        let action = if raise { ActionKind::Raise } else { ActionKind::Call };
        return (
            action,
            amount.min(d.all_in_total),
            format!(
                "Premium hand ({}, {}). Conservative value betting.",
                d.hand_rank,
                pct(s)
            ),
            0.9,
        );
    }
    if s >= 0.45 {
        return (
            ActionKind::Call,
            d.call_amount,
            format!("Solid hand ({}, {}). Conservative call.", d.hand_rank, pct(s)),
            0.7,
        );
    }
    if s >= 0.25 && d.call_amount <= ctx.stack / 20 {
        return (
            ActionKind::Call,
            d.call_amount,
            format!(
                "Marginal hand ({}, {}). Small bet, worth a call.",
                d.hand_rank,
                pct(s)
            ),
            0.5,
        );
    }
    (
        ActionKind::Fold,
        0,
        format!("Weak hand ({}, {}). Conservative fold.", d.hand_rank, pct(s)),
        0.9,
    )
}

fn decide_aggressive(ctx: &DecisionContext<'_>, d: &Derived) -> (ActionKind, u32, String, f64) {
    let s = d.hand_strength;
    if d.spr < 3.0 && s >= 0.25 {
        return (
            ActionKind::Raise,
            d.all_in_total,
            format!(
                "Low SPR ({:.1}) - aggressive push with {} ({})",
                d.spr,
                d.hand_rank,
                pct(s)
            ),
            0.75,
        );
    }
    if d.spr > 7.0 && s < 0.25 {
        let bluff_chance = if d.call_amount <= ctx.stack / 20 { 0.4 } else { 0.2 };
        if chance(bluff_chance) {
            let amount = (ctx.current_bet + d.min_raise_increment).max(ctx.current_bet * 2);
            return (
                ActionKind::Raise,
                amount.min(d.all_in_total),
                format!(
                    "High SPR ({:.1}) - applying pressure with weak {}. Bluff play.",
                    d.spr, d.hand_rank
                ),
                0.4,
            );
        }
        return (
            ActionKind::Fold,
            0,
            format!(
                "High SPR ({:.1}) - weak hand ({}), conserving chips for better spots.",
                d.spr, d.hand_rank
            ),
            0.7,
        );
    }
    if s >= 0.55 {
        let raise = chance(0.8);
        let amount = if raise {
            (ctx.current_bet + d.min_raise_increment).max(ctx.current_bet * 3)
        } else {
            d.call_amount
        };
        let action = if raise { ActionKind::Raise } else { ActionKind::Call };
        return (
            action,
            amount.min(d.all_in_total),
            format!(
                "Strong hand ({}, {}). Aggressive value betting.",
                d.hand_rank,
                pct(s)
            ),
            0.8,
        );
    }
    if s >= 0.25 {
        if chance(0.6) {
            let raise = chance(0.6);
            let amount = if raise {
                (ctx.current_bet + d.min_raise_increment).max(ctx.current_bet * 2)
            } else {
                d.call_amount
            };
            let action = if raise { ActionKind::Raise } else { ActionKind::Call };
            return (
                action,
                amount.min(d.all_in_total),
                format!(
                    "Playable hand ({}, {}). Aggressive play to build pot.",
                    d.hand_rank,
                    pct(s)
                ),
                0.6,
            );
        }
        return (
            ActionKind::Fold,
            0,
            format!("Marginal hand ({}). Aggressive fold to control pot size.", d.hand_rank),
            0.5,
        );
    }
    if chance(0.3) && d.call_amount <= ctx.stack / 40 {
        let amount = (ctx.current_bet + d.min_raise_increment).max(ctx.current_bet * 2);
        return (
            ActionKind::Raise,
            amount.min(d.all_in_total),
            format!(
                "Weak hand ({}) but bluffing for fold equity. Aggressive move.",
                d.hand_rank
            ),
            0.3,
        );
    }
    (
        ActionKind::Fold,
        0,
        format!("Too weak to continue ({}, {}). Smart aggression.", d.hand_rank, pct(s)),
        0.8,
    )
}

fn decide_mathematical(ctx: &DecisionContext<'_>, d: &Derived) -> (ActionKind, u32, String, f64) {
    let s = d.hand_strength;
    if d.spr < 3.0 && s >= 0.25 {
        let (action, amount) = if d.call_amount < ctx.stack {
            (ActionKind::Call, d.call_amount)
        } else {
            (ActionKind::Raise, d.all_in_total)
        };
        return (
            action,
            amount,
            format!(
                "Low SPR ({:.1}) - pot committed with {}. Positive EV.",
                d.spr, d.hand_rank
            ),
            0.85,
        );
    }
    if s >= 0.65 {
        let amount = (ctx.current_bet + d.min_raise_increment).max(ctx.current_bet * 2);
        return (
            ActionKind::Raise,
            amount.min(d.all_in_total),
            format!(
                "Strong hand ({}, {}). Mathematical value betting.",
                d.hand_rank,
                pct(s)
            ),
            0.9,
        );
    }
    if s >= 0.45 {
        return (
            ActionKind::Call,
            d.call_amount,
            format!(
                "Solid hand ({}, {}). Positive expectation call.",
                d.hand_rank,
                pct(s)
            ),
            0.8,
        );
    }
    if s >= 0.25 && (d.pot_odds <= 0.33 || d.spr < 5.0) {
        return (
            ActionKind::Call,
            d.call_amount,
            format!(
                "Marginal hand ({}, {}). Pot odds {:.1}%, SPR {:.1} - positive EV.",
                d.hand_rank,
                pct(s),
                d.pot_odds * 100.0,
                d.spr
            ),
            0.6,
        );
    }
    if s >= 0.25 {
        return (
            ActionKind::Fold,
            0,
            format!(
                "Pair ({}). Pot odds {:.1}%, SPR {:.1} - negative EV fold.",
                d.hand_rank,
                d.pot_odds * 100.0,
                d.spr
            ),
            0.8,
        );
    }
    (
        ActionKind::Fold,
        0,
        format!("Weak hand ({}, {}). Clear mathematical fold.", d.hand_rank, pct(s)),
        0.95,
    )
}

fn decide_loose_passive(ctx: &DecisionContext<'_>, d: &Derived) -> (ActionKind, u32, String, f64) {
    let s = d.hand_strength;
    if s >= 0.20 {
        if d.spr < 3.0 {
            return (
                ActionKind::Call,
                d.call_amount,
                format!(
                    "Low SPR ({:.1}) - calling with {}. Loose-passive play.",
                    d.spr, d.hand_rank
                ),
                0.6,
            );
        }
        if d.call_amount > ctx.stack / 3 {
            return (
                ActionKind::Fold,
                0,
                format!("Too expensive ({}). Even calling stations fold sometimes.", d.hand_rank),
                0.7,
            );
        }
        return (
            ActionKind::Call,
            d.call_amount,
            format!("Calling with {} ({}). Loose-passive style.", d.hand_rank, pct(s)),
            0.5,
        );
    }
    if d.call_amount <= ctx.stack / 40 {
        return (
            ActionKind::Call,
            d.call_amount,
            format!("Small bet, worth a call with {}. Loose play.", d.hand_rank),
            0.4,
        );
    }
    (
        ActionKind::Fold,
        0,
        format!("Weak hand ({}). Fold.", d.hand_rank),
        0.8,
    )
}

fn decide_tight_aggressive(ctx: &DecisionContext<'_>, d: &Derived) -> (ActionKind, u32, String, f64) {
    let s = d.hand_strength;
    if s >= 0.75 {
        let amount = (ctx.current_bet + d.min_raise_increment).max(ctx.pot);
        return (
            ActionKind::Raise,
            amount.min(d.all_in_total),
            format!("Premium hand ({}, {}). TAG value betting.", d.hand_rank, pct(s)),
            0.95,
        );
    }
    if s >= 0.55 {
        if d.spr < 5.0 {
            return (
                ActionKind::Raise,
                d.all_in_total,
                format!("Low SPR ({:.1}), strong hand ({}). TAG push.", d.spr, d.hand_rank),
                0.9,
            );
        }
        let amount = (ctx.current_bet + d.min_raise_increment).max(ctx.current_bet * 2);
        return (
            ActionKind::Raise,
            amount.min(d.all_in_total),
            format!("Strong hand ({}). TAG value raise.", d.hand_rank),
            0.85,
        );
    }
    if s >= 0.35 {
        return (
            ActionKind::Fold,
            0,
            format!("Below TAG threshold ({}, {}). Fold.", d.hand_rank, pct(s)),
            0.8,
        );
    }
    (
        ActionKind::Fold,
        0,
        format!("Weak hand ({}). TAG disciplined fold.", d.hand_rank),
        0.95,
    )
}

fn decide_maniac(ctx: &DecisionContext<'_>, d: &Derived) -> (ActionKind, u32, String, f64) {
    let s = d.hand_strength;
    if s >= 0.45 {
        let amount = (ctx.current_bet + d.min_raise_increment).max(ctx.pot * 2);
        return (
            ActionKind::Raise,
            amount.min(d.all_in_total),
            format!("Strong hand ({}). Maniac value aggression!", d.hand_rank),
            0.7,
        );
    }
    if chance(0.70) {
        let amount = (ctx.current_bet + d.min_raise_increment).max(ctx.pot);
        return (
            ActionKind::Raise,
            amount.min(d.all_in_total),
            format!("Bluffing with {}. Maniac pressure play!", d.hand_rank),
            0.3,
        );
    }
    if d.call_amount < ctx.stack / 2 {
        return (
            ActionKind::Call,
            d.call_amount,
            format!("Calling with {} to vary play. Maniac style.", d.hand_rank),
            0.4,
        );
    }
    (
        ActionKind::Fold,
        0,
        "Too expensive. Even maniacs fold sometimes.".to_owned(),
        0.6,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use railbird_shared::{CardRank, CardSuit};

    fn royal_board() -> (Vec<Card>, Vec<Card>) {
        // Hole Ah Kh on a Qh Jh Th board: a royal flush, strength 0.95.
        let hole = vec![
            Card::new(CardRank::Ace, CardSuit::Hearts),
            Card::new(CardRank::King, CardSuit::Hearts),
        ];
        let board = vec![
            Card::new(CardRank::Queen, CardSuit::Hearts),
            Card::new(CardRank::Jack, CardSuit::Hearts),
            Card::new(CardRank::Ten, CardSuit::Hearts),
            Card::new(CardRank::Two, CardSuit::Clubs),
            Card::new(CardRank::Seven, CardSuit::Diamonds),
        ];
        (hole, board)
    }

    fn trash_board() -> (Vec<Card>, Vec<Card>) {
        // 7-2 offsuit on a dry, unconnected board: high card, 0.05.
        let hole = vec![
            Card::new(CardRank::Seven, CardSuit::Spades),
            Card::new(CardRank::Two, CardSuit::Hearts),
        ];
        let board = vec![
            Card::new(CardRank::King, CardSuit::Diamonds),
            Card::new(CardRank::Ten, CardSuit::Clubs),
            Card::new(CardRank::Five, CardSuit::Hearts),
            Card::new(CardRank::Jack, CardSuit::Spades),
            Card::new(CardRank::Four, CardSuit::Diamonds),
        ];
        (hole, board)
    }

    fn ctx<'a>(hole: &'a [Card], board: &'a [Card]) -> DecisionContext<'a> {
        DecisionContext {
            hole_cards: hole,
            community_cards: board,
            current_bet: 20,
            pot: 100,
            stack: 1000,
            player_bet: 0,
            big_blind: 10,
            last_raise_amount: Some(10),
        }
    }

    #[test]
    fn tight_aggressive_folds_weak_hands() {
        let (hole, board) = trash_board();
        let decision = decide(Personality::TightAggressive, &ctx(&hole, &board));
        assert_eq!(decision.action, ActionKind::Fold);
        assert_eq!(decision.amount, 0);
        assert!(decision.hand_strength <= 0.25);
    }

    #[test]
    fn tight_aggressive_raises_premium_hands() {
        let (hole, board) = royal_board();
        let decision = decide(Personality::TightAggressive, &ctx(&hole, &board));
        assert_eq!(decision.action, ActionKind::Raise);
        assert!(decision.amount >= 100, "pot-sized raise expected, got {}", decision.amount);
        assert_eq!(decision.hand_strength, 0.95);
    }

    #[test]
    fn mathematical_calls_with_good_pot_odds() {
        // Two pair on board: hole pairs both board cards.
        let hole = vec![
            Card::new(CardRank::King, CardSuit::Spades),
            Card::new(CardRank::Ten, CardSuit::Hearts),
        ];
        let board = vec![
            Card::new(CardRank::King, CardSuit::Diamonds),
            Card::new(CardRank::Ten, CardSuit::Clubs),
            Card::new(CardRank::Five, CardSuit::Hearts),
            Card::new(CardRank::Two, CardSuit::Spades),
            Card::new(CardRank::Eight, CardSuit::Diamonds),
        ];
        let decision = decide(Personality::Mathematical, &ctx(&hole, &board));
        assert_eq!(decision.action, ActionKind::Call);
        assert_eq!(decision.amount, 20);
        assert!((decision.hand_strength - 0.45).abs() < f64::EPSILON);
    }

    #[test]
    fn loose_passive_calls_tiny_bets_with_nothing() {
        let (hole, board) = trash_board();
        let mut context = ctx(&hole, &board);
        context.current_bet = 5; // call of 5 <= stack/40
        let decision = decide(Personality::LoosePassive, &context);
        assert_eq!(decision.action, ActionKind::Call);
    }

    #[test]
    fn raises_never_exceed_all_in_total() {
        let (hole, board) = royal_board();
        let mut context = ctx(&hole, &board);
        context.stack = 30;
        context.player_bet = 10;
        for personality in Personality::ALL {
            let decision = decide(personality, &context);
            if decision.action == ActionKind::Raise {
                assert!(
                    decision.amount <= 40,
                    "{:?} proposed {} with 40 behind",
                    personality,
                    decision.amount
                );
            }
        }
    }

    #[test]
    fn spr_uses_sentinel_when_pot_is_empty() {
        let (hole, board) = royal_board();
        let mut context = ctx(&hole, &board);
        context.pot = 0;
        context.current_bet = 0;
        let decision = decide(Personality::Conservative, &context);
        assert_eq!(decision.spr, SPR_EMPTY_POT);
        assert_eq!(decision.pot_odds, 0.0);
    }

    #[test]
    fn decision_ids_are_unique() {
        let (hole, board) = royal_board();
        let context = ctx(&hole, &board);
        let a = decide(Personality::Maniac, &context);
        let b = decide(Personality::Maniac, &context);
        assert_ne!(a.decision_id, b.decision_id);
        assert!(!a.decision_id.is_empty());
    }
}
