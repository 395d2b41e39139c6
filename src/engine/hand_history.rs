//! Журнал событий стола.
//!
//! Только дописывается. Каждая запись публичная (закрытые карты скрыты)
//! и неизменна после добавления. По журналу зеркальный экземпляр
//! восстанавливает состояние, см. `replay`.

use std::sync::mpsc::{self, Receiver, Sender};

use serde::{Deserialize, Serialize};

use crate::domain::card::{Card, DealtCard};
use crate::domain::chips::Chips;
use crate::domain::hand::HandSummary;
use crate::domain::player::{BlindDuty, WaitFor};
use crate::domain::structure::{RoundPlan, Stakes};
use crate::domain::{HandId, PlayerId, SeatIndex};

/// Тип события.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum HandEventKind {
    /// Новая раздача: участники, дилер, стеки и ставки уровня.
    HandStarted {
        hand_id: HandId,
        stakes: Stakes,
        hands_count: u64,
        player_list: Vec<PlayerId>,
        dealer_seat: SeatIndex,
        chips: Vec<(PlayerId, Chips)>,
    },

    /// Сменился ходящий (индекс в списке игроков раздачи).
    Position {
        position: Option<usize>,
        serial: Option<PlayerId>,
    },

    BlindRequest {
        serial: PlayerId,
        amount: Chips,
        dead: Chips,
        duty: BlindDuty,
    },

    AnteRequest {
        serial: PlayerId,
        amount: Chips,
    },

    BlindPaid {
        serial: PlayerId,
        amount: Chips,
        dead: Chips,
    },

    AntePaid {
        serial: PlayerId,
        amount: Chips,
    },

    /// Игрок решил дождаться большого блайнда.
    WaitBlind {
        serial: PlayerId,
    },

    /// Игрок исключён из раздачи до своего блайнда.
    WaitFor {
        serial: PlayerId,
        reason: WaitFor,
    },

    /// Блайнды и анте собраны; окончательный список участников.
    BlindAnteFinished {
        player_list: Vec<PlayerId>,
    },

    /// Раздача отменена: собранное возвращено единственному оставшемуся игроку.
    Canceled {
        serial: Option<PlayerId>,
        amount: Chips,
    },

    /// Сданы карты раунда (публичный вид).
    CardsDealt {
        round: usize,
        board: Vec<Card>,
        pockets: Vec<(PlayerId, Vec<DealtCard>)>,
        plan: Vec<RoundPlan>,
    },

    RoundStarted {
        round: usize,
        name: String,
        position: Option<usize>,
        last_to_talk: Option<usize>,
    },

    Call {
        serial: PlayerId,
        amount: Chips,
    },

    Raise {
        serial: PlayerId,
        amount: Chips,
    },

    Check {
        serial: PlayerId,
    },

    Fold {
        serial: PlayerId,
    },

    AllIn {
        serial: PlayerId,
    },

    /// Банк распределён.
    PotDistributed {
        summary: HandSummary,
    },

    /// Эти игроки должны решить: сбросить карты или показать.
    MuckRequest {
        serials: Vec<PlayerId>,
    },

    Muck {
        serial: PlayerId,
        mucked: bool,
        cards: Vec<DealtCard>,
    },

    /// Борд и все открытые руки.
    Showdown {
        board: Vec<Card>,
        hands: Vec<(PlayerId, Vec<DealtCard>)>,
    },

    HandEnded {
        hand_id: HandId,
    },

    Rebuy {
        serial: PlayerId,
        amount: Chips,
    },

    SitOut {
        serial: PlayerId,
    },

    PlayerLeft {
        serial: PlayerId,
    },
}

/// Событие с порядковым номером и номером раздачи.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandEvent {
    pub index: u64,
    pub hand_id: HandId,
    pub kind: HandEventKind,
}

/// Журнал стола: записи + подписчики.
///
/// Подписчик получает копию каждой новой записи через канал. Отправка
/// никогда не блокирует; отвалившиеся подписчики удаляются.
#[derive(Debug, Default)]
pub struct HandHistory {
    events: Vec<HandEvent>,
    subscribers: Vec<Sender<HandEvent>>,
}

impl HandHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, hand_id: HandId, kind: HandEventKind) {
        let event = HandEvent {
            index: self.events.len() as u64,
            hand_id,
            kind,
        };
        log::debug!("журнал #{}: {:?}", event.index, event.kind);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        self.events.push(event);
    }

    pub fn subscribe(&mut self) -> Receiver<HandEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn events(&self) -> &[HandEvent] {
        &self.events
    }

    /// Записи одной раздачи.
    pub fn hand_events(&self, hand_id: HandId) -> impl Iterator<Item = &HandEvent> {
        self.events.iter().filter(move |e| e.hand_id == hand_id)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
