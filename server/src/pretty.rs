//! Human-readable console formatting for cards and game events.

use owo_colors::OwoColorize;
use railbird_shared::{Card, GameStatePublic};

use crate::game::{EventKind, HandEvent};

/// Render a card as "A♠", red for hearts and diamonds when colors are on.
pub fn format_card(card: Card, color: bool) -> String {
    let text = format!("{}{}", card.rank_char(), card.suit_icon());
    if color && card.is_red() {
        text.red().to_string()
    } else {
        text
    }
}

pub fn format_cards(cards: &[Card], color: bool) -> String {
    cards
        .iter()
        .map(|&c| format_card(c, color))
        .collect::<Vec<_>>()
        .join(" ")
}

/// One-line console banner at the top of a hand.
pub fn format_table_header(gs: &GameStatePublic, color: bool) -> String {
    let title = format!(
        "=== Hand #{} | blinds ${}/${} | dealer seat {} ===",
        gs.hand_count,
        gs.small_blind,
        gs.big_blind,
        gs.dealer_position.map_or("-".to_owned(), |d| d.to_string()),
    );
    if color {
        title.bold().cyan().to_string()
    } else {
        title
    }
}

/// One console line per engine event.
pub fn format_event(event: &HandEvent, color: bool) -> String {
    let tag = match event.kind {
        EventKind::Deal => "[DEAL]",
        EventKind::Action => "[ACTION]",
        EventKind::PotAward => "[POT]",
        EventKind::BlindIncrease => "[BLINDS]",
    };
    let body = if event.amount > 0 {
        format!("{} {} ${}", event.player_id, event.action, event.amount)
    } else {
        format!("{} {}", event.player_id, event.action)
    };
    let line = format!("{} {} (pot ${})", tag, body, event.pot_size);
    if !color {
        return line;
    }
    match event.kind {
        EventKind::PotAward => line.green().to_string(),
        EventKind::BlindIncrease => line.yellow().to_string(),
        _ => line,
    }
}
