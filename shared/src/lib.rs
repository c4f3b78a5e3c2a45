//! Shared wire types for the railbird poker server.
//!
//! Everything a client needs to speak the WebSocket protocol lives here:
//! cards, game phases, action kinds, AI personalities and the client/server
//! message envelopes with the full `state_update` payload.

pub mod cards;
pub mod game;
pub mod messages;
pub mod player;

pub use cards::*;
pub use game::*;
pub use messages::*;
pub use player::*;
