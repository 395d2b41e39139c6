//! Описание варианта игры и структуры ставок.
//!
//! Всё здесь - внешняя конфигурация, которую движок только читает.
//! Загружается из JSON (`TableConfig::from_json`) и проверяется `validate()`.

use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::hand::WinSide;
use crate::domain::TableId;

/// Кто открывает торговлю в раунде.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FirstToAct {
    /// Фиксированный сдвиг от дилера: третий игрок слева (после блайндов).
    UnderTheGun,
    /// Первый игрок слева от дилера.
    NextToDealer,
    /// Игрок с худшей открытой комбинацией (стад).
    LowestVisible,
    /// Игрок с лучшей открытой комбинацией (стад).
    HighestVisible,
}

/// Один раунд раздачи: сколько карт сдаётся и кто начинает.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundDef {
    pub name: String,
    pub first_to_act: FirstToAct,
    /// Общие карты на стол.
    #[serde(default)]
    pub board: usize,
    /// Закрытые карты каждому игроку.
    #[serde(default)]
    pub down: usize,
    /// Открытые карты каждому игроку.
    #[serde(default)]
    pub up: usize,
}

/// Вариант игры: раунды и стороны банка (хай / лоу).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variant {
    pub name: String,
    pub sides: Vec<WinSide>,
    pub rounds: Vec<RoundDef>,
}

impl Variant {
    /// Техасский холдем.
    pub fn holdem() -> Self {
        Self {
            name: "holdem".to_string(),
            sides: vec![WinSide::High],
            rounds: vec![
                round("pre-flop", FirstToAct::UnderTheGun, 0, 2, 0),
                round("flop", FirstToAct::NextToDealer, 3, 0, 0),
                round("turn", FirstToAct::NextToDealer, 1, 0, 0),
                round("river", FirstToAct::NextToDealer, 1, 0, 0),
            ],
        }
    }

    /// Семикарточный стад (хай).
    pub fn stud7() -> Self {
        Self {
            name: "7stud".to_string(),
            sides: vec![WinSide::High],
            rounds: vec![
                round("third", FirstToAct::LowestVisible, 0, 2, 1),
                round("fourth", FirstToAct::HighestVisible, 0, 0, 1),
                round("fifth", FirstToAct::HighestVisible, 0, 0, 1),
                round("sixth", FirstToAct::HighestVisible, 0, 0, 1),
                round("seventh", FirstToAct::HighestVisible, 0, 1, 0),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.rounds.is_empty() {
            return Err(format!("Вариант {}: нет ни одного раунда", self.name));
        }
        if self.sides.is_empty() {
            return Err(format!("Вариант {}: не заданы стороны банка", self.name));
        }
        let cards: usize = self.rounds.iter().map(|r| r.down + r.up).sum();
        if cards == 0 {
            return Err(format!("Вариант {}: игрокам не сдаётся ни одной карты", self.name));
        }
        Ok(())
    }

    /// Копия раундов на одну раздачу с накопленными размерами руки и борда.
    pub fn plan(&self) -> Vec<RoundPlan> {
        let mut hand_size = 0;
        let mut board_size = 0;
        self.rounds
            .iter()
            .map(|r| {
                hand_size += r.down + r.up;
                board_size += r.board;
                RoundPlan {
                    name: r.name.clone(),
                    first_to_act: r.first_to_act,
                    board: r.board,
                    down: r.down,
                    up: r.up,
                    hand_size,
                    board_size,
                }
            })
            .collect()
    }
}

fn round(name: &str, first_to_act: FirstToAct, board: usize, down: usize, up: usize) -> RoundDef {
    RoundDef {
        name: name.to_string(),
        first_to_act,
        board,
        down,
        up,
    }
}

/// Раунд в плане конкретной раздачи. Может отличаться от `RoundDef`,
/// если колоды не хватило и личные карты превратились в общие.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundPlan {
    pub name: String,
    pub first_to_act: FirstToAct,
    pub board: usize,
    pub down: usize,
    pub up: usize,
    /// Карт в руке после этого раунда.
    pub hand_size: usize,
    /// Карт на борде после этого раунда.
    pub board_size: usize,
}

/// Минимальная ставка в раунде.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MinBet {
    Value(Chips),
    /// `base * 2^(level-1)`.
    PowLevel(Chips),
    /// Размер большого блайнда текущего уровня.
    BigBlind,
}

/// Максимальная ставка в раунде.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum MaxBet {
    Value(Chips),
    /// Пот-лимит: банк + все ставки + сумма колла.
    Pot,
    /// Безлимит: весь стек.
    Stack,
}

/// Правило размера ставки.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum BetLimit {
    /// Фиксированный лимит.
    Fixed(Chips),
    /// Фиксированный лимит, растущий с уровнем: `base * 2^(level-1)`.
    PowLevel(Chips),
    Range { min: MinBet, max: MaxBet },
}

/// Ставки одного раунда: размер и лимит числа рейзов (`None` - без лимита).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BetRule {
    pub limit: BetLimit,
    pub cap: Option<u32>,
}

impl BetRule {
    pub fn no_limit() -> Self {
        Self {
            limit: BetLimit::Range {
                min: MinBet::BigBlind,
                max: MaxBet::Stack,
            },
            cap: None,
        }
    }

    pub fn pot_limit() -> Self {
        Self {
            limit: BetLimit::Range {
                min: MinBet::BigBlind,
                max: MaxBet::Pot,
            },
            cap: None,
        }
    }

    pub fn fixed(amount: Chips, cap: u32) -> Self {
        Self {
            limit: BetLimit::Fixed(amount),
            cap: Some(cap),
        }
    }
}

/// Блайнды первого уровня.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Blinds {
    pub small: Chips,
    pub big: Chips,
}

/// Анте первого уровня.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ante {
    pub value: Chips,
    #[serde(default)]
    pub bring_in: Chips,
}

/// Единица частоты смены уровней.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum LevelUnit {
    Hands,
    Minutes,
}

/// Расписание уровней.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum Schedule {
    /// Кэш-игра: ставки не меняются.
    #[default]
    Fixed,
    /// Турнир: всё удваивается каждые `frequency` единиц.
    Double { unit: LevelUnit, frequency: u32 },
}

/// Структура ставок стола.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BettingStructure {
    pub name: String,
    pub blinds: Option<Blinds>,
    pub ante: Option<Ante>,
    #[serde(default)]
    pub schedule: Schedule,
    /// Правило ставок на каждый раунд варианта.
    pub rounds: Vec<BetRule>,
    pub buy_in: Chips,
    pub max_buy_in: Chips,
    /// Минимальная фишка: доли при делёжке банка кратны ей.
    pub chip_unit: Chips,
}

impl BettingStructure {
    /// Безлимитный холдем с блайндами `small/big`.
    pub fn no_limit(small: u64, big: u64) -> Self {
        Self {
            name: format!("{small}-{big}-no-limit"),
            blinds: Some(Blinds {
                small: Chips(small),
                big: Chips(big),
            }),
            ante: None,
            schedule: Schedule::Fixed,
            rounds: vec![BetRule::no_limit(); 4],
            buy_in: Chips(big * 10),
            max_buy_in: Chips(big * 100),
            chip_unit: Chips(1),
        }
    }

    /// Лимитный холдем: малая ставка `small_bet` на первых двух раундах,
    /// двойная на остальных; не больше `cap` повышений за раунд.
    pub fn limit(small_bet: u64, cap: u32) -> Self {
        let small = Chips(small_bet);
        let big = Chips(small_bet * 2);
        Self {
            name: format!("{}-{}-limit", small_bet, small_bet * 2),
            blinds: Some(Blinds {
                small: Chips(small_bet / 2),
                big: small,
            }),
            ante: None,
            schedule: Schedule::Fixed,
            rounds: vec![
                BetRule::fixed(small, cap),
                BetRule::fixed(small, cap),
                BetRule::fixed(big, cap),
                BetRule::fixed(big, cap),
            ],
            buy_in: Chips(small_bet * 10),
            max_buy_in: Chips(small_bet * 100),
            chip_unit: Chips(1),
        }
    }

    pub fn is_tournament(&self) -> bool {
        matches!(self.schedule, Schedule::Double { .. })
    }

    pub fn validate(&self, rounds: usize) -> Result<(), String> {
        if self.chip_unit.is_zero() {
            return Err(format!("Структура {}: единица фишек равна нулю", self.name));
        }
        if self.rounds.len() < rounds {
            return Err(format!(
                "Структура {}: правил ставок {} на {} раундов",
                self.name,
                self.rounds.len(),
                rounds
            ));
        }
        if let Some(b) = self.blinds {
            if b.small > b.big {
                return Err(format!("Структура {}: малый блайнд больше большого", self.name));
            }
            if b.big.is_zero() {
                return Err(format!("Структура {}: большой блайнд равен нулю", self.name));
            }
        }
        if self.buy_in > self.max_buy_in {
            return Err(format!("Структура {}: минимальный бай-ин больше максимального", self.name));
        }
        if let Schedule::Double { frequency: 0, .. } = self.schedule {
            return Err(format!("Структура {}: частота смены уровней равна нулю", self.name));
        }
        Ok(())
    }

    /// Уровень по числу сыгранных раздач и минут с начала игры.
    pub fn level_for(&self, hands_played: u64, minutes: u64) -> u32 {
        match self.schedule {
            Schedule::Fixed => 1,
            Schedule::Double { unit, frequency } => {
                let elapsed = match unit {
                    LevelUnit::Hands => hands_played,
                    LevelUnit::Minutes => minutes,
                };
                (elapsed / frequency.max(1) as u64) as u32 + 1
            }
        }
    }

    /// Ставки на заданном уровне. Уровни нумеруются с 1.
    pub fn stakes_for_level(&self, level: u32) -> Stakes {
        let level = level.max(1);
        let factor = match self.schedule {
            Schedule::Fixed => 1,
            Schedule::Double { .. } => pow_level(level),
        };
        Stakes {
            level,
            blinds: self.blinds.map(|b| Blinds {
                small: Chips(b.small.0.saturating_mul(factor)),
                big: Chips(b.big.0.saturating_mul(factor)),
            }),
            ante: self.ante.map(|a| Ante {
                value: Chips(a.value.0.saturating_mul(factor)),
                bring_in: Chips(a.bring_in.0.saturating_mul(factor)),
            }),
            tournament: self.is_tournament(),
        }
    }

    pub fn round_rule(&self, round: usize) -> Option<&BetRule> {
        self.rounds.get(round).or_else(|| self.rounds.last())
    }
}

/// `2^(level-1)` без переполнения.
pub fn pow_level(level: u32) -> u64 {
    1u64.checked_shl(level.saturating_sub(1)).unwrap_or(u64::MAX)
}

/// Ставки одной раздачи. Значение принадлежит хосту стола и передаётся
/// в `begin_turn`; движок не меняет его сам.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Stakes {
    pub level: u32,
    pub blinds: Option<Blinds>,
    pub ante: Option<Ante>,
    pub tournament: bool,
}

/// Конфигурация стола.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableConfig {
    pub id: TableId,
    pub name: String,
    pub max_players: usize,
    pub variant: Variant,
    pub structure: BettingStructure,
}

impl TableConfig {
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: TableConfig =
            serde_json::from_str(json).map_err(|e| format!("Некорректный JSON конфигурации: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(2..=10).contains(&self.max_players) {
            return Err(format!(
                "Стол {}: число мест {} вне диапазона 2..=10",
                self.id, self.max_players
            ));
        }
        self.variant.validate()?;
        self.structure.validate(self.variant.rounds.len())
    }
}
