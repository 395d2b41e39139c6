//! Действия торговли: call, raise, check, fold.
//!
//! Каждое действие проверяется до изменения состояния; отказ оставляет
//! стол нетронутым. После действия управление переходит в `talked`.

use crate::domain::chips::Chips;
use crate::domain::structure::{pow_level, BetLimit, MaxBet, MinBet};
use crate::domain::PlayerId;
use crate::engine::errors::{reject, EngineError, Rejection};
use crate::engine::game::PokerGame;
use crate::engine::hand_history::HandEventKind;

/// Границы ставки игрока в текущем раунде.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BetLimits {
    /// Минимальная сумма, которую игрок кладёт (с учётом колла).
    pub min: Chips,
    pub max: Chips,
    pub to_call: Chips,
}

impl PokerGame {
    /// Уравнять. Если уравнивать нечего, равносильно check.
    pub fn call(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        self.require_can_act(serial)?;
        let player = self.player_ref(serial)?;
        let amount = self.to_call(serial).min(player.money);
        log::debug!("игрок {serial}: call {amount}");
        self.emit(HandEventKind::Call { serial, amount });
        self.money_to_bet(serial, amount)?;
        self.talked(serial)
    }

    /// Уравнять и повысить. Сумма приводится к допустимым границам.
    pub fn call_n_raise(&mut self, serial: PlayerId, amount: Chips) -> Result<(), EngineError> {
        self.require_can_act(serial)?;
        if self.round_cap_left == Some(0) {
            return reject(Rejection::RoundCapped);
        }
        if !self.can_raise(serial) {
            return reject(Rejection::CannotRaise(serial));
        }
        let limits = self.bet_limits(serial);
        let amount = amount.max(limits.min).min(limits.max);

        log::debug!("игрок {serial}: raise {amount}");
        self.emit(HandEventKind::Raise { serial, amount });
        let highest = self.highest_bet_not_fold();
        self.money_to_bet(serial, amount)?;
        let raise = self.highest_bet_not_fold().saturating_sub(highest);
        self.last_bet = self.last_bet.max(raise);
        if let Some(cap) = self.round_cap_left.as_mut() {
            *cap = cap.saturating_sub(1);
        }
        self.talked(serial)
    }

    pub fn check(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        self.require_can_act(serial)?;
        if !self.to_call(serial).is_zero() {
            return reject(Rejection::CannotCheck(serial));
        }
        log::debug!("игрок {serial}: check");
        self.emit(HandEventKind::Check { serial });
        self.talked(serial)
    }

    /// Сбросить карты. Ставка игрока уходит в банк.
    pub fn fold(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        self.require_can_act(serial)?;
        if self.player_ref(serial)?.fold {
            return Ok(());
        }
        log::debug!("игрок {serial}: fold");
        self.emit(HandEventKind::Fold { serial });
        self.player_mut(serial)?.fold = true;
        self.bet_to_pot(Some(serial));
        self.talked(serial)
    }

    /// Границы ставки для игрока по правилу текущего раунда.
    pub fn bet_limits(&self, serial: PlayerId) -> BetLimits {
        let to_call = self.to_call(serial);
        let money = self.players.get(&serial).map(|p| p.money).unwrap_or_default();
        let closed = BetLimits {
            min: Chips::ZERO,
            max: Chips::ZERO,
            to_call,
        };
        let Some(rule) = self
            .current_round()
            .and_then(|r| self.config.structure.round_rule(r))
        else {
            return closed;
        };
        if rule.cap.is_some() && self.round_cap_left == Some(0) {
            return closed;
        }

        let factor = pow_level(self.stakes.level);
        let (min_bet, max_bet) = match rule.limit {
            BetLimit::Fixed(v) => (v, v),
            BetLimit::PowLevel(base) => {
                let v = Chips(base.0.saturating_mul(factor));
                (v, v)
            }
            BetLimit::Range { min, max } => {
                let min_bet = match min {
                    MinBet::Value(v) => v,
                    MinBet::PowLevel(base) => Chips(base.0.saturating_mul(factor)),
                    MinBet::BigBlind => self.stakes.blinds.map(|b| b.big).unwrap_or_default(),
                };
                let min_bet = min_bet.max(self.last_bet);
                let max_bet = match max {
                    MaxBet::Value(v) => v,
                    MaxBet::Pot => (self.pot_and_bets() + to_call).max(min_bet),
                    MaxBet::Stack => money,
                };
                (min_bet, max_bet)
            }
        };

        BetLimits {
            min: money.min(min_bet + to_call),
            max: money.min(max_bet + to_call),
            to_call,
        }
    }

    /// Банк плюс все ставки на столе.
    pub fn pot_and_bets(&self) -> Chips {
        let bets: Chips = self.list_players().map(|p| p.bet).sum();
        self.pot + bets
    }
}
