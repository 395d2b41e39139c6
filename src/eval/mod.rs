//! Оценка силы рук.
//!
//! Движок знает только контракт `HandEvaluator`: кто выиграл каждую сторону
//! банка и сравнимое значение руки для порядка вскрытия.
//! `StandardEvaluator` - встроенная реализация.

pub mod evaluator;
pub mod hand_rank;

use std::collections::BTreeMap;

use crate::domain::card::Card;
use crate::domain::hand::{HandRank, WinSide};

pub use evaluator::{evaluate_high, evaluate_low8, StandardEvaluator};
pub use hand_rank::{describe_hand, hand_category, is_low, HandCategory};

/// Контракт оценщика. Чистая функция от карт, без состояния раздачи.
pub trait HandEvaluator {
    /// Лучшее значение руки для стороны. `None` - рука не квалифицируется
    /// (например, нет лоу).
    fn best(&self, variant: &str, side: WinSide, pocket: &[Card], board: &[Card]) -> Option<HandRank>;

    /// Сила открытых карт (стад: кто начинает торговлю).
    fn rank_visible(&self, cards: &[Card]) -> HandRank;

    /// Для каждой стороны, где есть квалифицированная рука, - индексы
    /// победителей в `pockets` (с учётом ничьих).
    fn winners(
        &self,
        variant: &str,
        sides: &[WinSide],
        pockets: &[Vec<Card>],
        board: &[Card],
    ) -> BTreeMap<WinSide, Vec<usize>> {
        evaluator::winners_by_best(self, variant, sides, pockets, board)
    }
}
