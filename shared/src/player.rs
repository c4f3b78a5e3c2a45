//! Player identifiers, AI personalities, and public player views.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::cards::Card;

/// Unique identifier for a player within a game ("human", "ai1", ...).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn human() -> Self {
        PlayerId("human".to_owned())
    }

    pub fn ai(n: usize) -> Self {
        PlayerId(format!("ai{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_owned())
    }
}

/// The six AI playing styles. Each game assigns a distinct personality
/// to every AI seat.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Personality {
    Conservative,
    Aggressive,
    Mathematical,
    #[serde(rename = "Loose-Passive")]
    LoosePassive,
    #[serde(rename = "Tight-Aggressive")]
    TightAggressive,
    Maniac,
}

impl Personality {
    pub const ALL: [Personality; 6] = [
        Personality::Conservative,
        Personality::Aggressive,
        Personality::Mathematical,
        Personality::LoosePassive,
        Personality::TightAggressive,
        Personality::Maniac,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Personality::Conservative => "Conservative",
            Personality::Aggressive => "Aggressive",
            Personality::Mathematical => "Mathematical",
            Personality::LoosePassive => "Loose-Passive",
            Personality::TightAggressive => "Tight-Aggressive",
            Personality::Maniac => "Maniac",
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Public view of a seat. Hole cards are empty for non-human players
/// until showdown.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerPublic {
    pub player_id: PlayerId,
    pub name: String,
    pub stack: u32,
    pub current_bet: u32,
    pub is_active: bool,
    pub all_in: bool,
    pub is_human: bool,
    pub personality: Option<Personality>,
    pub hole_cards: Vec<Card>,
}

/// The human seat's own view, including whose turn it is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HumanPublic {
    pub player_id: PlayerId,
    pub name: String,
    pub stack: u32,
    pub current_bet: u32,
    pub hole_cards: Vec<Card>,
    pub is_active: bool,
    pub is_current_turn: bool,
}
