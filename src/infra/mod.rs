//! Инфраструктура вокруг движка:
//! - генерация ID;
//! - RNG-реализации для тасования колоды.

pub mod ids;
pub mod rng;

pub use ids::*;
pub use rng::*;
