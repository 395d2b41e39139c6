use crate::domain::{Chips, PlayerId, SeatIndex};

use thiserror::Error;

/// Отказ на уровне протокола: действие не того игрока, не в свою очередь,
/// при исчерпанном лимите рейзов и т.п. Состояние стола не меняется.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("Раздача уже идёт")]
    HandAlreadyRunning,

    #[error("Раздача не активна")]
    NoActiveHand,

    #[error("Недостаточно игроков для раздачи")]
    NotEnoughPlayers,

    #[error("Игрок {0} не найден за столом")]
    UnknownPlayer(PlayerId),

    #[error("Игрок {0} уже за столом")]
    AlreadySeated(PlayerId),

    #[error("Место {0} занято или не существует")]
    SeatUnavailable(SeatIndex),

    #[error("Свободных мест нет")]
    TableFull,

    #[error("Сейчас не ход игрока {0}")]
    NotPlayersTurn(PlayerId),

    #[error("Идёт сбор блайндов и анте")]
    BlindAntePhase,

    #[error("Сейчас не фаза блайндов и анте")]
    NotBlindAntePhase,

    #[error("Карты раунда ещё не сданы")]
    CardsNotDealt,

    #[error("Лимит рейзов в раунде исчерпан")]
    RoundCapped,

    #[error("Игрок {0} не может повысить ставку")]
    CannotRaise(PlayerId),

    #[error("Игрок {0} не может сделать check: нужно уравнять ставку")]
    CannotCheck(PlayerId),

    #[error("Игрок {0} ничего не должен на фазе блайндов")]
    NothingDue(PlayerId),

    #[error("Сумма {0} вне допустимых пределов")]
    InvalidAmount(Chips),

    #[error("Игрок {0} не может сесть в игру: нет бай-ина или нет фишек")]
    CannotSit(PlayerId),

    #[error("Игрок {0} не решает судьбу карт на вскрытии")]
    NotMuckable(PlayerId),

    #[error("Операция недоступна зеркальному экземпляру")]
    MirrorMode,

    #[error("Журнал применяется только к зеркальному экземпляру")]
    AuthoritativeMode,
}

/// Ошибки движка покера.
///
/// `Rejected` - ожидаемый отказ, остальное - нарушение инвариантов
/// (конфигурации или логики движка), после которого продолжать нельзя.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("Невозможно определить дилера по месту {0:?}")]
    UnresolvableDealer(Option<SeatIndex>),

    #[error("Колода пуста")]
    DeckExhausted,

    #[error("Нарушен учёт фишек: {0}")]
    Accounting(String),

    #[error("Некорректная конфигурация: {0}")]
    InvalidConfig(String),

    #[error("Журнал расходится с состоянием: {0}")]
    Journal(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(&'static str),
}

impl EngineError {
    pub fn is_rejection(&self) -> bool {
        matches!(self, EngineError::Rejected(_))
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            EngineError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

/// Залогировать отказ и вернуть его как ошибку.
pub(crate) fn reject<T>(r: Rejection) -> Result<T, EngineError> {
    log::warn!("{r}");
    Err(EngineError::Rejected(r))
}
