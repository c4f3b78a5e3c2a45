//! Shuffled 52-card deck dealing from the top without replacement.

use rand::seq::SliceRandom;
use railbird_shared::Card;

use crate::error::EngineError;

/// Where a deck's shuffle order comes from. The seeded variant advances
/// a small LCG on every reset so successive hands stay deterministic
/// but distinct.
#[derive(Clone, Debug)]
enum ShuffleSource {
    Thread,
    Seeded(u64),
}

#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
    source: ShuffleSource,
}

impl Deck {
    pub fn new() -> Self {
        let mut deck = Deck {
            cards: Vec::new(),
            source: ShuffleSource::Thread,
        };
        deck.reset();
        deck
    }

    /// Deterministic deck for tests and simulations.
    pub fn seeded(seed: u64) -> Self {
        let mut deck = Deck {
            cards: Vec::new(),
            source: ShuffleSource::Seeded(seed),
        };
        deck.reset();
        deck
    }

    /// Restore all 52 cards and reshuffle.
    pub fn reset(&mut self) {
        self.cards = (0..52).map(Card).collect();
        match &mut self.source {
            ShuffleSource::Thread => {
                self.cards.shuffle(&mut rand::rng());
            }
            ShuffleSource::Seeded(state) => {
                // Fisher-Yates driven by an LCG (constants from Numerical
                // Recipes), state carried across resets.
                for i in (1..self.cards.len()).rev() {
                    *state = state.wrapping_mul(1664525).wrapping_add(1013904223);
                    let r = ((*state >> 16) as usize) % (i + 1);
                    self.cards.swap(i, r);
                }
            }
        }
    }

    /// Remove and return the top `n` cards.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, EngineError> {
        if n > self.cards.len() {
            return Err(EngineError::Invariant(format!(
                "not enough cards: need {}, have {}",
                n,
                self.cards.len()
            )));
        }
        Ok(self.cards.drain(..n).collect())
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}
