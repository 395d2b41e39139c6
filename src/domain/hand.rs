use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::{HandId, PlayerId};

/// Состояние раздачи.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum GameState {
    /// Раздач ещё не было.
    #[default]
    Idle,
    /// Сбор блайндов и анте.
    BlindAnte,
    /// Раунд торговли с номером (0 - первый).
    Round(usize),
    /// Деньги распределены, решается, кто открывает карты.
    Muck,
    /// Раздача завершена.
    End,
    /// Раздача отменена на фазе блайндов: игроков осталось меньше двух.
    Canceled,
}

impl GameState {
    pub fn is_running(&self) -> bool {
        !matches!(self, GameState::Idle | GameState::End | GameState::Canceled)
    }
}

/// Сторона банка.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WinSide {
    High,
    /// Лоу «восемь или ниже», туз младший.
    Low,
}

/// Сила комбинации. Больше - лучше, для обеих сторон.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandRank(pub u32);

/// Один шаг раздачи банка (кадр вскрытия).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ShowdownFrame {
    /// Все сбросили, кроме одного.
    FoldWin { serial: PlayerId, amount: Chips },
    /// Уровень банка разыгран между претендентами.
    Resolve {
        contenders: Vec<PlayerId>,
        winners: Vec<(WinSide, Vec<PlayerId>)>,
        pot: Chips,
        shares: BTreeMap<PlayerId, Chips>,
        chips_left: Chips,
    },
    /// Остаток, который никто не уравнял, возвращается владельцу.
    Uncalled { serial: PlayerId, amount: Chips },
    /// Неделимые остатки отданы игроку слева от дилера.
    LeftOver { serial: PlayerId, amount: Chips },
}

/// Итог раздачи.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandSummary {
    pub hand_id: HandId,
    /// Банк до распределения.
    pub pot: Chips,
    pub rake: Chips,
    /// Доля рейка на каждого вкладчика.
    pub rake_by_player: BTreeMap<PlayerId, Chips>,
    pub uncalled: Chips,
    pub uncalled_serial: Option<PlayerId>,
    /// Сколько фишек вернулось каждому игроку (выигрыш + возвраты).
    pub payouts: BTreeMap<PlayerId, Chips>,
    pub winners: Vec<PlayerId>,
    pub frames: Vec<ShowdownFrame>,
}
