use serde::{Deserialize, Serialize};

use crate::domain::{Chips, PlayerId};
use crate::engine::errors::EngineError;
use crate::engine::game::PokerGame;

/// Тип действия игрока.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerActionKind {
    Fold,
    Check,
    Call,
    /// Уравнять и повысить; сумма приводится к границам раунда.
    Raise(Chips),
    Blind,
    Ante,
    WaitBigBlind,
    /// `true` - сбросить карты, `false` - показать.
    Muck(bool),
    SitOut,
}

/// Конкретное действие игрока.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerAction {
    pub player_id: PlayerId,
    pub kind: PlayerActionKind,
}

impl PlayerAction {
    pub fn new(player_id: PlayerId, kind: PlayerActionKind) -> Self {
        Self { player_id, kind }
    }
}

impl PokerGame {
    /// Применить действие игрока.
    pub fn apply_action(&mut self, action: &PlayerAction) -> Result<(), EngineError> {
        let serial = action.player_id;
        match &action.kind {
            PlayerActionKind::Fold => self.fold(serial),
            PlayerActionKind::Check => self.check(serial),
            PlayerActionKind::Call => self.call(serial),
            PlayerActionKind::Raise(amount) => self.call_n_raise(serial, *amount),
            PlayerActionKind::Blind => self.blind(serial),
            PlayerActionKind::Ante => self.ante(serial),
            PlayerActionKind::WaitBigBlind => self.wait_big_blind(serial),
            PlayerActionKind::Muck(mucked) => self.muck(serial, *mucked),
            PlayerActionKind::SitOut => self.sit_out(serial).map(|_| ()),
        }
    }
}
