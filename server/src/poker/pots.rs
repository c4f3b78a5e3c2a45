//! Main- and side-pot resolution from per-hand investments.

use railbird_shared::{Card, PlayerId};

use super::evaluation;

/// One seat's contribution to the hand as the resolver sees it. The
/// engine builds these from its players; the resolver never touches
/// engine state.
#[derive(Clone, Debug)]
pub struct SeatStake {
    pub player_id: PlayerId,
    pub total_invested: u32,
    /// Still in the hand (active or all-in). Folded seats contribute
    /// chips but cannot win.
    pub in_hand: bool,
    pub hole_cards: Vec<Card>,
}

/// A resolved pot: its chips, who was eligible to win it, and who won.
#[derive(Clone, Debug)]
pub struct Pot {
    pub amount: u32,
    pub label: String,
    pub eligible: Vec<PlayerId>,
    pub winners: Vec<PlayerId>,
}

fn best_hands(
    seats: &[&SeatStake],
    community: &[Card],
) -> Vec<(PlayerId, i32)> {
    seats
        .iter()
        .filter(|s| !s.hole_cards.is_empty())
        .map(|s| (s.player_id.clone(), evaluation::evaluate(&s.hole_cards, community).0))
        .collect()
}

fn winners_among(seats: &[&SeatStake], community: &[Card]) -> Vec<PlayerId> {
    let scored = best_hands(seats, community);
    let Some(best) = scored.iter().map(|(_, score)| *score).min() else {
        return Vec::new();
    };
    scored
        .into_iter()
        .filter(|(_, score)| *score == best)
        .map(|(id, _)| id)
        .collect()
}

/// Layer the invested chips into a main pot and side pots, and pick the
/// winners of each. Investments are copied into a working list; the
/// caller's stakes are never mutated.
pub fn resolve(stakes: &[SeatStake], community: &[Card]) -> Vec<Pot> {
    let eligible: Vec<&SeatStake> = stakes.iter().filter(|s| s.in_hand).collect();
    let contributors: Vec<&SeatStake> =
        stakes.iter().filter(|s| s.total_invested > 0).collect();
    let total_pot: u32 = contributors.iter().map(|s| s.total_invested).sum();

    if eligible.len() <= 1 {
        let Some(winner) = eligible.first() else {
            return Vec::new();
        };
        return vec![Pot {
            amount: total_pot,
            label: "main".to_owned(),
            eligible: vec![winner.player_id.clone()],
            winners: vec![winner.player_id.clone()],
        }];
    }

    // Fast path: everyone still in the hand invested the same amount,
    // so a single pot covers all contributions (folders included).
    let first_investment = eligible[0].total_invested;
    if eligible.iter().all(|s| s.total_invested == first_investment) {
        let winners = winners_among(&eligible, community);
        if !winners.is_empty() {
            return vec![Pot {
                amount: total_pot,
                label: "main".to_owned(),
                eligible: eligible.iter().map(|s| s.player_id.clone()).collect(),
                winners,
            }];
        }
    }

    // General case: peel off one layer per distinct investment level.
    let mut remaining: Vec<(usize, u32)> = contributors
        .iter()
        .enumerate()
        .map(|(i, s)| (i, s.total_invested))
        .collect();
    let mut pots = Vec::new();

    while !remaining.is_empty() {
        let Some(level) = remaining
            .iter()
            .map(|&(_, inv)| inv)
            .filter(|&inv| inv > 0)
            .min()
        else {
            break;
        };

        let mut amount = 0;
        let mut layer_eligible: Vec<&SeatStake> = Vec::new();
        for (idx, inv) in remaining.iter_mut() {
            let contribution = (*inv).min(level);
            amount += contribution;
            *inv -= contribution;
            if contribution > 0 && contributors[*idx].in_hand {
                layer_eligible.push(contributors[*idx]);
            }
        }

        if !layer_eligible.is_empty() {
            let winners = winners_among(&layer_eligible, community);
            if !winners.is_empty() {
                let label = if pots.is_empty() {
                    "main".to_owned()
                } else {
                    format!("side_{}", pots.len())
                };
                pots.push(Pot {
                    amount,
                    label,
                    eligible: layer_eligible.iter().map(|s| s.player_id.clone()).collect(),
                    winners,
                });
            }
        }

        remaining.retain(|&(_, inv)| inv > 0);
    }

    pots
}
