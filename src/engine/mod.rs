//! Движок раздачи: блайнды, раунды торговли, сайд-поты, распределение
//! банка, вскрытие, журнал событий.
//!
//! Высокоуровневый объект: `PokerGame` (один стол).
//! Основные операции:
//!   - `begin_turn` – запустить новую раздачу
//!   - `blind` / `ante` / `wait_big_blind` – ответ на запрос блайнда
//!   - `call` / `call_n_raise` / `check` / `fold` – торговля
//!   - `muck` – решение на вскрытии
//!   - `apply_event` – применить запись журнала (зеркальный режим)

pub mod actions;
pub mod betting;
pub mod blinds;
pub mod distribution;
pub mod errors;
pub mod game;
pub mod game_loop;
pub mod hand_history;
pub mod positions;
pub mod rake;
pub mod replay;
pub mod showdown;
pub mod side_pots;
pub mod table_manager;
pub mod validation;

pub use actions::{PlayerAction, PlayerActionKind};
pub use betting::BetLimits;
pub use errors::{EngineError, Rejection};
pub use game::{GameSnapshot, Mode, PokerGame};
pub use hand_history::{HandEvent, HandEventKind, HandHistory};
pub use rake::{apportion_rake, NoRake, PercentRake, RakeContext, RakePolicy};
pub use side_pots::{PotLevel, SidePots};
pub use table_manager::{ManagerError, TableManager};

/// RNG интерфейс для engine.
/// Реализации - в infra (обёртки над `rand`).
pub trait RandomSource {
    fn shuffle<T>(&mut self, slice: &mut [T]);
}
