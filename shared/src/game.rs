//! Game phases and player action kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The current phase of a poker hand.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl GamePhase {
    /// The wire/display label, e.g. "pre_flop".
    pub fn label(self) -> &'static str {
        match self {
            GamePhase::PreFlop => "pre_flop",
            GamePhase::Flop => "flop",
            GamePhase::Turn => "turn",
            GamePhase::River => "river",
            GamePhase::Showdown => "showdown",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The three actions a player can submit.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Fold,
    Call,
    Raise,
}

impl ActionKind {
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::Fold => "fold",
            ActionKind::Call => "call",
            ActionKind::Raise => "raise",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
