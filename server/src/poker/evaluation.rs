//! Seven-card hand evaluation.
//!
//! Hands are scored in the standard space of 7462 distinct five-card
//! hand classes where 1 is a royal flush and 7462 the worst high card:
//! lower is better. The numeric ranges per category are load-bearing;
//! `score_to_strength` is the single source of truth for hand strength
//! and maps them piecewise:
//!
//! | score     | category            | strength |
//! |-----------|---------------------|----------|
//! | 1..=10    | Straight Flush      | 0.95     |
//! | 11..=166  | Four of a Kind      | 0.90     |
//! | 167..=322 | Full House          | 0.85     |
//! | 323..=1599| Flush               | 0.75     |
//! |1600..=1609| Straight            | 0.65     |
//! |1610..=2467| Three of a Kind     | 0.55     |
//! |2468..=3325| Two Pair            | 0.45     |
//! |3326..=6185| One Pair            | 0.25     |
//! |6186..=7462| High Card           | 0.05     |

use rand::seq::IndexedRandom;
use railbird_shared::Card;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Hand categories ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl HandCategory {
    pub fn label(self) -> &'static str {
        match self {
            HandCategory::HighCard => "High Card",
            HandCategory::OnePair => "One Pair",
            HandCategory::TwoPair => "Two Pair",
            HandCategory::ThreeOfAKind => "Three of a Kind",
            HandCategory::Straight => "Straight",
            HandCategory::Flush => "Flush",
            HandCategory::FullHouse => "Full House",
            HandCategory::FourOfAKind => "Four of a Kind",
            HandCategory::StraightFlush => "Straight Flush",
        }
    }
}

pub const WORST_SCORE: i32 = 7462;

/// Evaluate a hand of 2 hole cards plus the known community cards.
///
/// With a full board the score is exact. With fewer than five community
/// cards the score is the average over 100 Monte Carlo completions of
/// the board from the remaining deck (the evaluator only knows the
/// caller's own cards).
pub fn evaluate(hole: &[Card], community: &[Card]) -> (i32, &'static str) {
    if community.len() >= 5 {
        let mut cards: Vec<Card> = hole.to_vec();
        cards.extend_from_slice(&community[..5]);
        let score = exact_score(&cards);
        return (score, category_label_for_score(score));
    }

    let known: Vec<Card> = hole.iter().chain(community.iter()).copied().collect();
    let remaining: Vec<Card> = (0..52).map(Card).filter(|c| !known.contains(c)).collect();
    let need = 5 - community.len();

    let mut rng = rand::rng();
    let mut total: i64 = 0;
    const SAMPLES: usize = 100;
    for _ in 0..SAMPLES {
        let mut cards: Vec<Card> = known.clone();
        cards.extend(remaining.choose_multiple(&mut rng, need).copied());
        total += exact_score(&cards) as i64;
    }
    let avg = (total as f64 / SAMPLES as f64).round() as i32;
    (avg, category_label_for_score(avg))
}

/// Exact score of a complete 7-card hand.
pub fn exact_score(cards: &[Card]) -> i32 {
    let (category, tiebreakers) = classify(cards);
    score_of_class(category, &tiebreakers)
}

/// Convert a score to the canonical 0..1 strength value.
pub fn score_to_strength(score: i32) -> f64 {
    if score <= 10 {
        0.95
    } else if score <= 166 {
        0.90
    } else if score <= 322 {
        0.85
    } else if score <= 1599 {
        0.75
    } else if score <= 1609 {
        0.65
    } else if score <= 2467 {
        0.55
    } else if score <= 3325 {
        0.45
    } else if score <= 6185 {
        0.25
    } else {
        0.05
    }
}

pub fn category_label_for_score(score: i32) -> &'static str {
    if score <= 10 {
        HandCategory::StraightFlush.label()
    } else if score <= 166 {
        HandCategory::FourOfAKind.label()
    } else if score <= 322 {
        HandCategory::FullHouse.label()
    } else if score <= 1599 {
        HandCategory::Flush.label()
    } else if score <= 1609 {
        HandCategory::Straight.label()
    } else if score <= 2467 {
        HandCategory::ThreeOfAKind.label()
    } else if score <= 3325 {
        HandCategory::TwoPair.label()
    } else if score <= 6185 {
        HandCategory::OnePair.label()
    } else {
        HandCategory::HighCard.label()
    }
}

// ===== Classification =====

/// High rank value: Ace=14 down to Two=2.
fn rank_value_high(card: Card) -> u8 {
    match card.rank().as_usize() {
        0 => 14,
        r => (r + 1) as u8,
    }
}

/// Reduce a hand of 5..7 cards to its best five-card class: the
/// category plus canonical tiebreakers (best-first rank values).
pub fn classify(cards: &[Card]) -> (HandCategory, Vec<u8>) {
    let mut counts = [0u8; 15];
    let mut values: Vec<u8> = Vec::with_capacity(cards.len());
    for &c in cards {
        let v = rank_value_high(c);
        counts[v as usize] += 1;
        values.push(v);
    }

    let flush_suit = (0..4).find(|&s| cards.iter().filter(|c| c.suit().as_usize() == s).count() >= 5);

    if let Some(suit) = flush_suit {
        let suited: Vec<u8> = cards
            .iter()
            .filter(|c| c.suit().as_usize() == suit)
            .map(|&c| rank_value_high(c))
            .collect();
        if let Some(high) = straight_high(&suited) {
            return (HandCategory::StraightFlush, vec![high]);
        }
    }

    if let Some(quad) = (2..=14u8).rev().find(|&v| counts[v as usize] == 4) {
        let kicker = top_values_excluding(&values, &[quad], 1);
        let mut tb = vec![quad];
        tb.extend(kicker);
        return (HandCategory::FourOfAKind, tb);
    }

    let trips: Vec<u8> = (2..=14u8).rev().filter(|&v| counts[v as usize] >= 3).collect();
    let pairs: Vec<u8> = (2..=14u8).rev().filter(|&v| counts[v as usize] == 2).collect();

    if let Some(&trip) = trips.first() {
        let pair = pairs
            .first()
            .copied()
            .into_iter()
            .chain(trips.get(1).copied())
            .max();
        if let Some(pair) = pair {
            return (HandCategory::FullHouse, vec![trip, pair]);
        }
    }

    if let Some(suit) = flush_suit {
        let mut suited: Vec<u8> = cards
            .iter()
            .filter(|c| c.suit().as_usize() == suit)
            .map(|&c| rank_value_high(c))
            .collect();
        suited.sort_unstable_by(|a, b| b.cmp(a));
        suited.truncate(5);
        return (HandCategory::Flush, suited);
    }

    if let Some(high) = straight_high(&values) {
        return (HandCategory::Straight, vec![high]);
    }

    if let Some(&trip) = trips.first() {
        let mut tb = vec![trip];
        tb.extend(top_values_excluding(&values, &[trip], 2));
        return (HandCategory::ThreeOfAKind, tb);
    }

    if pairs.len() >= 2 {
        let (high, low) = (pairs[0], pairs[1]);
        let mut tb = vec![high, low];
        tb.extend(top_values_excluding(&values, &[high, low], 1));
        return (HandCategory::TwoPair, tb);
    }

    if let Some(&pair) = pairs.first() {
        let mut tb = vec![pair];
        tb.extend(top_values_excluding(&values, &[pair], 3));
        return (HandCategory::OnePair, tb);
    }

    (HandCategory::HighCard, top_values_excluding(&values, &[], 5))
}

/// Highest `take` distinct rank values not in `exclude`, descending.
fn top_values_excluding(values: &[u8], exclude: &[u8], take: usize) -> Vec<u8> {
    let mut rest: Vec<u8> = values
        .iter()
        .copied()
        .filter(|v| !exclude.contains(v))
        .collect();
    rest.sort_unstable_by(|a, b| b.cmp(a));
    rest.dedup();
    rest.truncate(take);
    rest
}

/// Highest straight high-card in the given rank values, wheel included.
fn straight_high(values: &[u8]) -> Option<u8> {
    let mut present = [false; 15];
    for &v in values {
        present[v as usize] = true;
    }
    if present[14] {
        present[1] = true; // A-2-3-4-5
    }
    (5..=14usize)
        .rev()
        .find(|&h| (h - 4..=h).all(|v| present[v]))
        .map(|h| h as u8)
}

// ===== Score table =====
//
// All 7462 equivalence classes enumerated best-first; a class's score is
// its 1-based position. Built once on first use.

type ClassKey = (HandCategory, Vec<u8>);

fn class_table() -> &'static HashMap<ClassKey, u16> {
    static TABLE: OnceLock<HashMap<ClassKey, u16>> = OnceLock::new();
    TABLE.get_or_init(build_class_table)
}

fn score_of_class(category: HandCategory, tiebreakers: &[u8]) -> i32 {
    match class_table().get(&(category, tiebreakers.to_vec())) {
        Some(&score) => score as i32,
        None => {
            // Unreachable for any classify() output; degrade instead of
            // corrupting the game if it ever happens.
            tracing::error!(?category, ?tiebreakers, "hand class missing from score table");
            WORST_SCORE
        }
    }
}

fn build_class_table() -> HashMap<ClassKey, u16> {
    let mut classes: Vec<ClassKey> = Vec::with_capacity(7462);
    let straight_highs: Vec<u8> = (5..=14u8).rev().collect();
    let rank_sets = five_rank_sets_descending();

    for &h in &straight_highs {
        classes.push((HandCategory::StraightFlush, vec![h]));
    }
    for q in (2..=14u8).rev() {
        for k in (2..=14u8).rev().filter(|&k| k != q) {
            classes.push((HandCategory::FourOfAKind, vec![q, k]));
        }
    }
    for t in (2..=14u8).rev() {
        for p in (2..=14u8).rev().filter(|&p| p != t) {
            classes.push((HandCategory::FullHouse, vec![t, p]));
        }
    }
    for set in &rank_sets {
        classes.push((HandCategory::Flush, set.clone()));
    }
    for &h in &straight_highs {
        classes.push((HandCategory::Straight, vec![h]));
    }
    for t in (2..=14u8).rev() {
        for k1 in (2..=14u8).rev().filter(|&v| v != t) {
            for k2 in (2..k1).rev().filter(|&v| v != t) {
                classes.push((HandCategory::ThreeOfAKind, vec![t, k1, k2]));
            }
        }
    }
    for hp in (2..=14u8).rev() {
        for lp in (2..hp).rev() {
            for k in (2..=14u8).rev().filter(|&v| v != hp && v != lp) {
                classes.push((HandCategory::TwoPair, vec![hp, lp, k]));
            }
        }
    }
    for p in (2..=14u8).rev() {
        for k1 in (2..=14u8).rev().filter(|&v| v != p) {
            for k2 in (2..k1).rev().filter(|&v| v != p) {
                for k3 in (2..k2).rev().filter(|&v| v != p) {
                    classes.push((HandCategory::OnePair, vec![p, k1, k2, k3]));
                }
            }
        }
    }
    for set in &rank_sets {
        classes.push((HandCategory::HighCard, set.clone()));
    }

    debug_assert_eq!(classes.len(), 7462);
    classes
        .into_iter()
        .enumerate()
        .map(|(i, key)| (key, (i + 1) as u16))
        .collect()
}

/// All 1277 five-card rank sets that are neither straights nor paired,
/// in descending lexicographic (strongest-first) order.
fn five_rank_sets_descending() -> Vec<Vec<u8>> {
    let mut sets = Vec::with_capacity(1277);
    for c1 in (2..=14u8).rev() {
        for c2 in (2..c1).rev() {
            for c3 in (2..c2).rev() {
                for c4 in (2..c3).rev() {
                    for c5 in (2..c4).rev() {
                        let set = vec![c1, c2, c3, c4, c5];
                        let consecutive = c1 - c5 == 4;
                        let wheel = set == [14, 5, 4, 3, 2];
                        if !consecutive && !wheel {
                            sets.push(set);
                        }
                    }
                }
            }
        }
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;
    use railbird_shared::{CardRank, CardSuit};

    fn c(code: &str) -> Card {
        code.parse().unwrap()
    }

    fn cards(codes: &[&str]) -> Vec<Card> {
        codes.iter().map(|s| c(s)).collect()
    }

    #[test]
    fn class_table_covers_all_7462_classes() {
        assert_eq!(class_table().len(), 7462);
    }

    #[test]
    fn category_boundary_scores() {
        // Royal flush is the best possible hand.
        assert_eq!(exact_score(&cards(&["As", "Ks", "Qs", "Js", "Ts", "2d", "3c"])), 1);
        // Steel wheel is the worst straight flush.
        assert_eq!(exact_score(&cards(&["5h", "4h", "3h", "2h", "Ah", "9c", "8d"])), 10);
        // Best quads: aces with a king.
        assert_eq!(exact_score(&cards(&["As", "Ah", "Ad", "Ac", "Ks", "2d", "3c"])), 11);
        // Worst quads: twos with a three.
        assert_eq!(exact_score(&cards(&["2s", "2h", "2d", "2c", "3s", "3d", "3c"])), 166);
        // Best full house: aces full of kings.
        assert_eq!(exact_score(&cards(&["As", "Ah", "Ad", "Ks", "Kh", "2d", "3c"])), 167);
        // Worst full house: twos full of threes.
        assert_eq!(exact_score(&cards(&["2s", "2h", "2d", "3s", "3h", "5d", "6c"])), 322);
        // Best flush: A-K-Q-J-9 suited.
        assert_eq!(exact_score(&cards(&["As", "Ks", "Qs", "Js", "9s", "2d", "3c"])), 323);
        // Worst flush: 7-5-4-3-2 suited.
        assert_eq!(exact_score(&cards(&["7s", "5s", "4s", "3s", "2s", "Kd", "Kc"])), 1599);
        // Broadway straight.
        assert_eq!(exact_score(&cards(&["As", "Kh", "Qd", "Jc", "Ts", "2d", "3c"])), 1600);
        // Wheel straight.
        assert_eq!(exact_score(&cards(&["5s", "4h", "3d", "2c", "Ah", "9c", "8d"])), 1609);
        // Best trips: aces with K-Q.
        assert_eq!(exact_score(&cards(&["As", "Ah", "Ad", "Ks", "Qh", "2d", "9c"])), 1610);
        // Worst trips: twos with 4-3 kickers.
        assert_eq!(exact_score(&cards(&["2s", "2h", "2d", "4s", "3h"])), 2467);
        // Best two pair: aces and kings, queen kicker.
        assert_eq!(exact_score(&cards(&["As", "Ah", "Ks", "Kh", "Qd", "2c", "9h"])), 2468);
        // Worst two pair: threes and twos, four kicker.
        assert_eq!(exact_score(&cards(&["3s", "3h", "2d", "2c", "4s"])), 3325);
        // Best one pair: aces with K-Q-J.
        assert_eq!(exact_score(&cards(&["As", "Ah", "Ks", "Qd", "Jc", "2h", "9s"])), 3326);
        // Worst one pair: twos with 5-4-3.
        assert_eq!(exact_score(&cards(&["2s", "2h", "5d", "4c", "3s"])), 6185);
        // Best high card: A-K-Q-J-9.
        assert_eq!(exact_score(&cards(&["As", "Kh", "Qd", "Jc", "9s", "2h", "3d"])), 6186);
        // Worst high card: 7-5-4-3-2.
        assert_eq!(exact_score(&cards(&["7s", "5h", "4d", "3c", "2s"])), 7462);
    }

    #[test]
    fn worst_high_card_without_pairs() {
        // 7-6-5-4-2 is not quite the floor; 7-5-4-3-2 is.
        let score = exact_score(&cards(&["7s", "6h", "5d", "4c", "2s", "Kh", "Qd"]));
        assert_eq!(category_label_for_score(score), "High Card");
        assert!(score < 7462);
    }

    #[test]
    fn strength_is_monotonic_nonincreasing_in_score() {
        let mut last = 1.0f64;
        for score in 1..=7462 {
            let s = score_to_strength(score);
            assert!(s <= last, "strength rose at score {}", score);
            last = s;
        }
        assert_eq!(score_to_strength(1), 0.95);
        assert_eq!(score_to_strength(7462), 0.05);
    }

    #[test]
    fn classify_prefers_flush_over_straight() {
        let (cat, _) = classify(&cards(&["As", "Ks", "Qs", "9s", "2s", "Jh", "Td"]));
        assert_eq!(cat, HandCategory::Flush);
    }

    #[test]
    fn classify_finds_straight_flush_among_six_suited() {
        // Top five suited cards are not consecutive, but a straight
        // flush hides lower in the suit.
        let (cat, tb) = classify(&cards(&["Ks", "9s", "8s", "7s", "6s", "5s", "2d"]));
        assert_eq!(cat, HandCategory::StraightFlush);
        assert_eq!(tb, vec![9]);
    }

    #[test]
    fn three_pairs_keep_best_kicker() {
        let (cat, tb) = classify(&cards(&["As", "Ah", "Ks", "Kh", "2d", "2c", "Qs"]));
        assert_eq!(cat, HandCategory::TwoPair);
        assert_eq!(tb, vec![14, 13, 12]);
    }

    #[test]
    fn monte_carlo_preflop_scores_pocket_aces_ahead_of_seven_deuce() {
        let aces = evaluate(
            &[
                Card::new(CardRank::Ace, CardSuit::Spades),
                Card::new(CardRank::Ace, CardSuit::Hearts),
            ],
            &[],
        );
        let trash = evaluate(
            &[
                Card::new(CardRank::Seven, CardSuit::Spades),
                Card::new(CardRank::Two, CardSuit::Hearts),
            ],
            &[],
        );
        assert!(aces.0 < trash.0, "aces {} vs 72o {}", aces.0, trash.0);
    }

    #[test]
    fn full_board_is_exact() {
        let board = cards(&["Kh", "Ts", "9h", "9c", "4c"]);
        let (score, label) = evaluate(&cards(&["Jc", "7h"]), &board);
        assert_eq!(label, "One Pair");
        assert_eq!(score, exact_score(&cards(&["Jc", "7h", "Kh", "Ts", "9h", "9c", "4c"])));
    }
}
