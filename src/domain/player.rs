use serde::{Deserialize, Serialize};

use crate::domain::card::Pocket;
use crate::domain::chips::Chips;
use crate::domain::{PlayerId, SeatIndex};

/// Какой блайнд игрок должен в текущей раздаче.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BlindDuty {
    /// Ничего не должен.
    #[default]
    Exempt,
    Small,
    Big,
    /// Догоняющий блайнд (размером с большой) перед входом в игру.
    Late,
    /// Большой блайнд в банк + мёртвые деньги размером с малый.
    BigAndDead,
    /// Блайнд в этой раздаче уже внесён.
    Posted,
}

impl BlindDuty {
    /// Долг ещё не погашен.
    pub fn is_due(&self) -> bool {
        !matches!(self, BlindDuty::Exempt | BlindDuty::Posted)
    }
}

/// Какой блайнд игрок пропустил, пока отсутствовал.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MissedBlind {
    /// Новичок за столом: блайнды ещё ни разу не платил.
    NewPlayer,
    Small,
    Big,
}

/// Чего ждёт игрок, прежде чем войти в раздачу.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum WaitFor {
    /// Позиция блайндов уже прошла - ждёт следующего круга.
    Late,
    /// Сам решил дождаться большого блайнда.
    Big,
}

/// Предпочтение игрока по сбросу карт на вскрытии.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AutoMuck {
    /// Никогда не сбрасывать автоматически - спросить игрока.
    Never,
    /// Автоматически сбрасывать выигравшую без вскрытия руку.
    Win,
    /// Автоматически сбрасывать проигравшую руку.
    Lose,
    #[default]
    Always,
}

impl AutoMuck {
    /// `Some(true)` - сбросить, `None` - спросить игрока.
    pub fn decide(&self, won_by_fold: bool) -> Option<bool> {
        match (self, won_by_fold) {
            (AutoMuck::Always, _) => Some(true),
            (AutoMuck::Win, true) | (AutoMuck::Lose, false) => Some(true),
            _ => None,
        }
    }
}

/// Игрок за столом: постоянные данные + состояние текущей раздачи.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub serial: PlayerId,
    pub seat: SeatIndex,

    /// Стек (фишки перед игроком).
    pub money: Chips,
    /// Ставка в текущем раунде торговли.
    pub bet: Chips,
    /// Сколько из вклада в банк ушло мёртвыми деньгами на фазе блайндов/анте.
    /// Сами фишки уже лежат в банке, здесь только учёт.
    pub dead: Chips,
    /// Докупка, которая будет зачислена по окончании раздачи.
    pub rebuy: Chips,

    pub fold: bool,
    pub all_in: bool,
    pub talked_once: bool,
    /// Номер сайд-пота, в котором сейчас лежат фишки игрока. Только растёт.
    pub side_pot_index: usize,
    pub hand: Pocket,

    pub blind: BlindDuty,
    pub missed_blind: Option<MissedBlind>,
    pub wait_for: Option<WaitFor>,
    pub ante: bool,

    // Настройки, а не состояние раздачи.
    pub buy_in_paid: bool,
    pub sit_out: bool,
    pub sit_out_next_turn: bool,
    pub remove_next_turn: bool,
    pub auto: bool,
    pub auto_blind_ante: bool,
    pub auto_muck: AutoMuck,
}

impl Player {
    pub fn new(serial: PlayerId, seat: SeatIndex) -> Self {
        Self {
            serial,
            seat,
            money: Chips::ZERO,
            bet: Chips::ZERO,
            dead: Chips::ZERO,
            rebuy: Chips::ZERO,
            fold: false,
            all_in: false,
            talked_once: false,
            side_pot_index: 0,
            hand: Pocket::default(),
            blind: BlindDuty::Exempt,
            missed_blind: Some(MissedBlind::NewPlayer),
            wait_for: None,
            ante: false,
            buy_in_paid: false,
            sit_out: true,
            sit_out_next_turn: false,
            remove_next_turn: false,
            auto: false,
            auto_blind_ante: false,
            auto_muck: AutoMuck::default(),
        }
    }

    /// Сброс состояния раздачи перед новой раздачей.
    pub fn begin_turn(&mut self) {
        self.bet = Chips::ZERO;
        self.dead = Chips::ZERO;
        self.fold = false;
        self.all_in = false;
        self.talked_once = false;
        self.side_pot_index = 0;
        self.hand.clear();
        self.blind = BlindDuty::Exempt;
        self.ante = false;
    }

    /// Забыть пропущенный блайнд. Догоняющему больше нечего ждать.
    pub fn forgive_missed_blind(&mut self) {
        self.missed_blind = None;
        if self.wait_for == Some(WaitFor::Late) {
            self.wait_for = None;
        }
    }

    pub fn is_sit(&self) -> bool {
        !self.sit_out
    }

    /// Ещё может делать ставки: не сбросил и не олл-ин.
    pub fn is_in_game(&self) -> bool {
        !self.fold && !self.all_in
    }

    pub fn is_not_fold(&self) -> bool {
        !self.fold
    }
}
