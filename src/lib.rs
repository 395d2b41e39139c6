//! Движок правил покерной раздачи.
//!
//! Один объект `PokerGame` ведёт стол: рассадку, блайнды и анте, раунды
//! торговли, сайд-поты, распределение банка с рейком и вскрытие. Вариант
//! игры и структура ставок задаются конфигурацией (`TableConfig`).
//! Ведущий экземпляр пишет публичный журнал событий, зеркальный
//! восстанавливает по нему то же состояние.

pub mod domain;
pub mod engine;
pub mod eval;
pub mod infra;

pub use domain::{Chips, HandId, PlayerId, SeatIndex, TableConfig, TableId};
pub use engine::{EngineError, Mode, PokerGame, Rejection};
pub use eval::{HandEvaluator, StandardEvaluator};
