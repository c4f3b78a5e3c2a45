//! Card types and their stable two-character text form.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Card rank values (0=Ace, 1=2, ..., 12=King)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardRank {
    Ace = 0,
    Two = 1,
    Three = 2,
    Four = 3,
    Five = 4,
    Six = 5,
    Seven = 6,
    Eight = 7,
    Nine = 8,
    Ten = 9,
    Jack = 10,
    Queen = 11,
    King = 12,
}

impl CardRank {
    /// Convert from u8 to CardRank. Panics if value > 12.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => CardRank::Ace,
            1 => CardRank::Two,
            2 => CardRank::Three,
            3 => CardRank::Four,
            4 => CardRank::Five,
            5 => CardRank::Six,
            6 => CardRank::Seven,
            7 => CardRank::Eight,
            8 => CardRank::Nine,
            9 => CardRank::Ten,
            10 => CardRank::Jack,
            11 => CardRank::Queen,
            12 => CardRank::King,
            _ => panic!("Invalid card rank: {}", value),
        }
    }

    pub fn as_usize(self) -> usize {
        self as usize
    }
}

/// Card suit values (0=Clubs, 1=Diamonds, 2=Hearts, 3=Spades)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardSuit {
    Clubs = 0,
    Diamonds = 1,
    Hearts = 2,
    Spades = 3,
}

impl CardSuit {
    /// Convert from u8 to CardSuit. Panics if value > 3.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => CardSuit::Clubs,
            1 => CardSuit::Diamonds,
            2 => CardSuit::Hearts,
            3 => CardSuit::Spades,
            _ => panic!("Invalid card suit: {}", value),
        }
    }

    pub fn as_usize(self) -> usize {
        self as usize
    }
}

/// A playing card represented as a compact u8 value.
///
/// On the wire a card is its two-character code: rank in
/// `A23456789TJQK`, suit in `shdc` (e.g. `"As"`, `"Th"`). `"10h"` is
/// accepted on input and normalized to `"Th"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Card(pub u8);

impl Card {
    pub fn new(rank: CardRank, suit: CardSuit) -> Self {
        Card((suit as u8) * 13 + (rank as u8))
    }

    pub fn rank(self) -> CardRank {
        CardRank::from_u8(self.0 % 13)
    }

    pub fn suit(self) -> CardSuit {
        CardSuit::from_u8(self.0 / 13)
    }

    /// Rank as a single character (A, 2, ..., 9, T, J, Q, K).
    pub fn rank_char(self) -> char {
        match self.rank() {
            CardRank::Ace => 'A',
            CardRank::Two => '2',
            CardRank::Three => '3',
            CardRank::Four => '4',
            CardRank::Five => '5',
            CardRank::Six => '6',
            CardRank::Seven => '7',
            CardRank::Eight => '8',
            CardRank::Nine => '9',
            CardRank::Ten => 'T',
            CardRank::Jack => 'J',
            CardRank::Queen => 'Q',
            CardRank::King => 'K',
        }
    }

    /// Suit as its wire character (s, h, d, c).
    pub fn suit_letter(self) -> char {
        match self.suit() {
            CardSuit::Clubs => 'c',
            CardSuit::Diamonds => 'd',
            CardSuit::Hearts => 'h',
            CardSuit::Spades => 's',
        }
    }

    /// Suit as a display icon (♣, ♦, ♥, ♠).
    pub fn suit_icon(self) -> char {
        match self.suit() {
            CardSuit::Clubs => '♣',
            CardSuit::Diamonds => '♦',
            CardSuit::Hearts => '♥',
            CardSuit::Spades => '♠',
        }
    }

    /// The stable two-character text form, e.g. "As", "Th".
    pub fn code(self) -> String {
        format!("{}{}", self.rank_char(), self.suit_letter())
    }

    pub fn is_red(self) -> bool {
        matches!(self.suit(), CardSuit::Hearts | CardSuit::Diamonds)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank_char(), self.suit_letter())
    }
}

fn rank_from_char(c: char) -> Option<CardRank> {
    Some(match c.to_ascii_uppercase() {
        'A' => CardRank::Ace,
        '2' => CardRank::Two,
        '3' => CardRank::Three,
        '4' => CardRank::Four,
        '5' => CardRank::Five,
        '6' => CardRank::Six,
        '7' => CardRank::Seven,
        '8' => CardRank::Eight,
        '9' => CardRank::Nine,
        'T' => CardRank::Ten,
        'J' => CardRank::Jack,
        'Q' => CardRank::Queen,
        'K' => CardRank::King,
        _ => return None,
    })
}

fn suit_from_char(c: char) -> Option<CardSuit> {
    Some(match c.to_ascii_lowercase() {
        'c' => CardSuit::Clubs,
        'd' => CardSuit::Diamonds,
        'h' => CardSuit::Hearts,
        's' => CardSuit::Spades,
        _ => return None,
    })
}

impl FromStr for Card {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        let (rank, suit) = match chars.as_slice() {
            // "10h" is the long form of the ten
            ['1', '0', suit] => (Some(CardRank::Ten), suit_from_char(*suit)),
            [rank, suit] => (rank_from_char(*rank), suit_from_char(*suit)),
            _ => return Err(format!("invalid card: {:?}", s)),
        };
        match (rank, suit) {
            (Some(r), Some(su)) => Ok(Card::new(r, su)),
            _ => Err(format!("invalid card: {:?}", s)),
        }
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.code())
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
