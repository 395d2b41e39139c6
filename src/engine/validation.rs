use crate::domain::chips::Chips;
use crate::domain::hand::GameState;
use crate::domain::PlayerId;
use crate::engine::errors::{reject, EngineError, Rejection};
use crate::engine::game::{Mode, PokerGame};

impl PokerGame {
    /// Может ли игрок действовать: идёт раунд торговли, его очередь,
    /// карты раунда сданы.
    pub fn can_act(&self, serial: PlayerId) -> bool {
        self.check_can_act(serial).is_ok()
    }

    /// То же, что `can_act`, но с причиной отказа. Ничего не логирует.
    pub(crate) fn check_can_act(&self, serial: PlayerId) -> Result<(), Rejection> {
        if !self.players.contains_key(&serial) {
            return Err(Rejection::UnknownPlayer(serial));
        }
        match self.state {
            GameState::Round(_) => {}
            GameState::BlindAnte => return Err(Rejection::BlindAntePhase),
            _ => return Err(Rejection::NoActiveHand),
        }
        if self.serial_in_position() != Some(serial) {
            return Err(Rejection::NotPlayersTurn(serial));
        }
        if !self.cards_dealt() {
            return Err(Rejection::CardsNotDealt);
        }
        Ok(())
    }

    pub(crate) fn require_can_act(&self, serial: PlayerId) -> Result<(), EngineError> {
        if self.mode == Mode::Mirror && !self.replaying {
            return reject(Rejection::MirrorMode);
        }
        match self.check_can_act(serial) {
            Ok(()) => Ok(()),
            Err(r) => reject(r),
        }
    }

    /// У всех, кто ещё в игре, столько карт, сколько положено раунду,
    /// и борд полон.
    pub fn cards_dealt(&self) -> bool {
        let Some(plan) = self.current_round().and_then(|r| self.round_plan.get(r)) else {
            return false;
        };
        self.board.len() == plan.board_size
            && self
                .list_players()
                .filter(|p| p.is_in_game())
                .all(|p| p.hand.len() == plan.hand_size)
    }

    pub fn highest_bet_not_fold(&self) -> Chips {
        self.list_players()
            .filter(|p| p.is_not_fold())
            .map(|p| p.bet)
            .max()
            .unwrap_or_default()
    }

    pub fn highest_bet_in_game(&self) -> Chips {
        self.list_players()
            .filter(|p| p.is_in_game())
            .map(|p| p.bet)
            .max()
            .unwrap_or_default()
    }

    /// Сколько игроку нужно добавить, чтобы уравнять.
    pub fn to_call(&self, serial: PlayerId) -> Chips {
        self.players
            .get(&serial)
            .map(|p| self.highest_bet_not_fold().saturating_sub(p.bet))
            .unwrap_or_default()
    }

    pub fn can_call(&self, serial: PlayerId) -> bool {
        self.can_act(serial) && !self.to_call(serial).is_zero()
    }

    pub fn can_check(&self, serial: PlayerId) -> bool {
        self.can_act(serial) && self.to_call(serial).is_zero()
    }

    /// Рейз возможен, если лимит не исчерпан, после колла остаются фишки
    /// и игрок ещё не говорил либо его с тех пор перебили.
    pub fn can_raise(&self, serial: PlayerId) -> bool {
        if !self.can_act(serial) || self.round_cap_left == Some(0) {
            return false;
        }
        let highest = self.highest_bet_not_fold();
        self.players.get(&serial).map_or(false, |p| {
            (!p.talked_once || p.bet < highest) && p.money > self.to_call(serial)
        })
    }

    /// Ставки уравнены: никто из олл-инов не поставил больше играющих,
    /// и все играющие поставили поровну.
    pub fn bets_equal(&self) -> bool {
        if self.not_fold_count() < 2 || self.in_game_count() == 0 {
            return true;
        }
        if self.highest_bet_not_fold() > self.highest_bet_in_game() {
            return false;
        }
        let mut bets = self.list_players().filter(|p| p.is_in_game()).map(|p| p.bet);
        match bets.next() {
            Some(first) => bets.all(|b| b == first),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::{BettingStructure, Chips, TableConfig, Variant};
    use crate::engine::game::{Mode, PokerGame};
    use crate::infra::DeterministicRng;

    #[test]
    fn talked_player_raises_only_after_being_raised() {
        let config = TableConfig {
            id: 1,
            name: "validation".to_string(),
            max_players: 6,
            variant: Variant::holdem(),
            structure: BettingStructure::no_limit(10, 20),
        };
        let mut game = PokerGame::new(config, Mode::Authoritative).unwrap();
        for (serial, seat) in [(1, 0), (2, 1), (3, 2)] {
            game.add_player(serial, Some(seat)).unwrap();
            game.pay_buy_in(serial, Chips(1000)).unwrap();
            game.sit(serial).unwrap();
            game.auto_blind_ante(serial, true).unwrap();
        }
        let stakes = game.config().structure.stakes_for_level(1);
        game.begin_turn(1, stakes, &mut DeterministicRng::from_seed(1)).unwrap();

        let serial = game.serial_in_position().unwrap();
        assert_eq!(serial, 1);
        assert!(game.can_raise(serial));

        // Уже говорил и уравнял: нового повода для рейза нет.
        let p = game.players.get_mut(&serial).unwrap();
        p.bet = Chips(20);
        p.money = Chips(980);
        p.talked_once = true;
        assert!(!game.can_raise(serial));

        game.players.get_mut(&serial).unwrap().bet = Chips(10);
        assert!(game.can_raise(serial));
    }
}
