//! Доменная модель: фишки, карты, игроки, вариант игры и структура ставок.

pub mod card;
pub mod chips;
pub mod deck;
pub mod hand;
pub mod player;
pub mod structure;

pub type PlayerId = u64;
pub type TableId = u64;
pub type HandId = u64;
pub type SeatIndex = u8;

// Удобные реэкспорты, чтобы в других модулях писать crate::domain::Card и т.п.
pub use card::*;
pub use chips::*;
pub use deck::*;
pub use hand::*;
pub use player::*;
pub use structure::*;
