//! Фаза блайндов и анте.
//!
//! Кто что должен (`update_blinds`), сбор долгов по кругу с автооплатой
//! или запросом (`auto_pay_blind_ante`) и переход к первому раунду
//! торговли, когда всё собрано.
//!
//! Правила пропущенных блайндов:
//!   - новичок платит догоняющий блайнд размером с большой;
//!   - пропустивший малый или большой платит большой, а при шести и
//!     более игроках ещё и малый мёртвыми деньгами;
//!   - кто не хочет платить догоняющий, ждёт большого блайнда.

use crate::domain::chips::Chips;
use crate::domain::hand::GameState;
use crate::domain::player::{BlindDuty, MissedBlind, Player, WaitFor};
use crate::domain::PlayerId;
use crate::engine::errors::{reject, EngineError, Rejection};
use crate::engine::game::{Mode, PokerGame};
use crate::engine::hand_history::HandEventKind;
use crate::engine::positions::{dealer_index, index_in_game_add, next_seat_from};

impl PokerGame {
    // ===== Дилер и состав раздачи =====

    /// Список участников по местам. `with_wait_for = false` исключает
    /// ждущих своего блайнда.
    pub(crate) fn build_player_list(&mut self, with_wait_for: bool) {
        let mut list: Vec<&Player> = self
            .players
            .values()
            .filter(|p| p.is_sit() && (with_wait_for || p.wait_for.is_none()))
            .collect();
        list.sort_by_key(|p| p.seat);
        self.player_list = list.into_iter().map(|p| p.serial).collect();
    }

    /// Кнопка на следующее место, чей игрок сидит, не ждёт блайнда и не
    /// пропускал блайндов. Один на один кнопка достаётся любому сидящему.
    pub(crate) fn move_dealer_left(&mut self) {
        let Some(current) = self.dealer_seat else {
            return;
        };
        let heads_up = self.is_heads_up();
        let start = current as usize + 1;
        let next = next_seat_from(&self.players, self.config.max_players, start, |p| {
            p.is_sit() && (heads_up || (p.wait_for.is_none() && p.missed_blind.is_none()))
        });
        match next {
            Some(seat) => self.dealer_seat = Some(seat),
            None => log::warn!("стол {}: кнопку некуда сдвинуть, остаётся на месте {current}", self.config.id),
        }
    }

    pub(crate) fn dealer_from_dealer_seat(&mut self) -> Result<(), EngineError> {
        let Some(seat) = self.dealer_seat else {
            return Err(EngineError::UnresolvableDealer(None));
        };
        self.dealer = dealer_index(&self.player_list, &self.players, seat);
        if self.dealer.is_none() {
            log::error!("стол {}: место дилера {seat} не соответствует ни одному участнику", self.config.id);
            return Err(EngineError::UnresolvableDealer(Some(seat)));
        }
        Ok(())
    }

    // ===== Назначение блайндов =====

    pub(crate) fn init_blind_ante(&mut self) {
        let has_blinds = self.stakes.blinds.is_some();
        let tournament = self.stakes.tournament;
        let first_turn = self.first_turn;
        for p in self.players.values_mut() {
            if has_blinds && first_turn {
                p.forgive_missed_blind();
            }
            if tournament {
                p.auto_blind_ante = true;
            }
        }
        self.position = if has_blinds && !self.is_heads_up() {
            self.dealer
                .and_then(|d| index_in_game_add(&self.player_list, &self.players, d, 1))
        } else {
            self.dealer
        };
        self.emit_position();
    }

    /// Пересчитать, кто какой блайнд должен.
    ///
    /// Места обходятся от малого блайнда (один на один - от дилера).
    /// Пропущенные блайнды запоминаются у отсутствующих игроков по ходу
    /// обхода.
    pub(crate) fn update_blinds(&mut self) {
        if self.stakes.blinds.is_none() {
            return;
        }
        let sit_count = self.sit_count();
        if sit_count <= 1 {
            for p in self.players.values_mut() {
                p.missed_blind = None;
                p.blind = BlindDuty::Exempt;
                p.wait_for = None;
            }
            return;
        }
        let Some(dealer_seat) = self.dealer_seat else {
            log::error!("стол {}: блайнды без кнопки", self.config.id);
            return;
        };

        let max = self.config.max_players;
        let first = if self.is_heads_up() {
            dealer_seat as usize
        } else {
            dealer_seat as usize + 1
        };
        let mut by_seat: Vec<Option<PlayerId>> = vec![None; max];
        for p in self.players.values() {
            if let Some(slot) = by_seat.get_mut(p.seat as usize) {
                *slot = Some(p.serial);
            }
        }
        let order: Vec<Option<PlayerId>> = (0..max).map(|k| by_seat[(first + k) % max]).collect();

        let blind_ok = self
            .players
            .values()
            .filter(|p| p.is_sit() && p.missed_blind.is_none())
            .count();
        if blind_ok < 2 {
            for p in self.players.values_mut().filter(|p| p.is_sit()) {
                p.forgive_missed_blind();
            }
        }

        // Малый блайнд.
        let mut index = 0;
        let mut small_done = false;
        while index < max && !small_done {
            index = self.update_missed(&order, index, MissedBlind::Small);
            let Some(serial) = order.get(index).copied().flatten() else {
                continue;
            };
            if let Some(p) = self.players.get_mut(&serial) {
                if p.blind == BlindDuty::Posted {
                    small_done = true;
                } else if (p.wait_for.is_none() && p.missed_blind.is_none()) || sit_count == 2 {
                    p.blind = BlindDuty::Small;
                    small_done = true;
                } else if p.missed_blind.is_some() {
                    p.wait_for = Some(WaitFor::Late);
                }
            }
            index += 1;
        }
        if !small_done {
            log::error!("стол {}: некому назначить малый блайнд", self.config.id);
        }

        // Большой блайнд.
        index = self.update_missed(&order, index, MissedBlind::Big);
        match order.get(index).copied().flatten().and_then(|s| self.players.get_mut(&s)) {
            Some(p) => {
                p.wait_for = None;
                if p.blind != BlindDuty::Posted {
                    p.blind = BlindDuty::Big;
                }
                index += 1;
            }
            None => log::error!("стол {}: некому назначить большой блайнд", self.config.id),
        }

        // Остальные: догоняющие и пропустившие.
        while index < max {
            if let Some(p) = order[index].and_then(|s| self.players.get_mut(&s)) {
                if p.sit_out {
                    p.blind = BlindDuty::Exempt;
                } else if p.blind == BlindDuty::Posted {
                    // уже заплатил в этой раздаче
                } else if p.wait_for == Some(WaitFor::Big) || p.missed_blind.is_none() {
                    p.blind = BlindDuty::Exempt;
                } else {
                    p.blind = match p.missed_blind {
                        Some(MissedBlind::NewPlayer) => BlindDuty::Late,
                        _ if sit_count > 5 => BlindDuty::BigAndDead,
                        _ => BlindDuty::Big,
                    };
                    p.wait_for = None;
                }
            }
            index += 1;
        }

        log::debug!(
            "блайнды: {:?}",
            self.list_players()
                .map(|p| (p.serial, p.blind, p.missed_blind, p.wait_for))
                .collect::<Vec<_>>()
        );
    }

    /// Пропустить пустые места и отсутствующих, отметив последним
    /// пропущенный блайнд. Возвращает индекс первого сидящего.
    fn update_missed(&mut self, order: &[Option<PlayerId>], mut index: usize, what: MissedBlind) -> usize {
        while index < order.len() {
            let Some(p) = order[index].and_then(|s| self.players.get_mut(&s)) else {
                index += 1;
                continue;
            };
            if p.is_sit() {
                break;
            }
            if p.missed_blind.is_none() {
                p.missed_blind = Some(what);
            }
            index += 1;
        }
        index
    }

    /// (живая часть, мёртвая часть) блайнда игрока.
    pub fn blind_amount(&self, serial: PlayerId) -> (Chips, Chips) {
        let (Some(blinds), Some(p)) = (self.stakes.blinds, self.players.get(&serial)) else {
            return (Chips::ZERO, Chips::ZERO);
        };
        match p.blind {
            BlindDuty::Big | BlindDuty::Late => (blinds.big, Chips::ZERO),
            BlindDuty::Small => (blinds.small, Chips::ZERO),
            BlindDuty::BigAndDead => (blinds.big, blinds.small),
            BlindDuty::Exempt | BlindDuty::Posted => (Chips::ZERO, Chips::ZERO),
        }
    }

    /// Сколько игрок внесёт на деле: не хватает фишек - вносится сколько
    /// есть, сначала живая часть.
    pub(crate) fn capped_blind(&self, serial: PlayerId, amount: Chips, dead: Chips) -> Result<(Chips, Chips), EngineError> {
        let money = self.player_ref(serial)?.money;
        Ok(if money < amount + dead {
            if money < amount {
                (money, Chips::ZERO)
            } else {
                (amount, money.saturating_sub(amount))
            }
        } else {
            (amount, dead)
        })
    }

    /// Внести блайнд.
    pub(crate) fn pay_blind(&mut self, serial: PlayerId, amount: Chips, dead: Chips) -> Result<(), EngineError> {
        let (amount, dead) = self.capped_blind(serial, amount, dead)?;
        log::debug!("игрок {serial}: блайнд {amount}, мёртвые {dead}");
        self.emit(HandEventKind::BlindPaid { serial, amount, dead });
        if !dead.is_zero() {
            self.money_to_pot(serial, dead)?;
        }
        self.money_to_bet(serial, amount)?;
        let p = self.player_mut(serial)?;
        p.blind = BlindDuty::Posted;
        p.missed_blind = None;
        p.wait_for = None;
        Ok(())
    }

    pub(crate) fn pay_ante(&mut self, serial: PlayerId, amount: Chips) -> Result<(), EngineError> {
        let amount = amount.min(self.player_ref(serial)?.money);
        log::debug!("игрок {serial}: анте {amount}");
        self.emit(HandEventKind::AntePaid { serial, amount });
        self.money_to_pot(serial, amount)?;
        self.player_mut(serial)?.ante = true;
        Ok(())
    }

    pub fn is_blind_ante_paid(&self) -> bool {
        let blinds = self.stakes.blinds.is_some();
        let ante = self.stakes.ante.is_some();
        self.list_players()
            .filter(|p| p.is_sit())
            .all(|p| !(blinds && p.blind.is_due()) && !(ante && !p.ante))
    }

    // ===== Сбор =====

    /// Обойти участников от текущей позиции: с автооплатой - заплатить,
    /// иначе запросить и ждать ответа.
    pub(crate) fn auto_pay_blind_ante(&mut self) -> Result<(), EngineError> {
        if self.stakes.blinds.is_none() && self.stakes.ante.is_none() {
            return self.talked_blind_ante();
        }
        let len = self.player_list.len();
        let start = self.position.unwrap_or(0);
        let mut auto_paid = false;
        let mut requested = false;

        for k in 0..len {
            let index = (start + k) % len;
            let serial = self.player_list[index];
            let player = self.player_ref(serial)?;
            if player.sit_out {
                continue;
            }
            let auto = player.auto_blind_ante;
            let ante_due = self.stakes.ante.filter(|_| !player.ante);

            let (amount, dead) = self.blind_amount(serial);
            if !amount.is_zero() {
                self.position = Some(index);
                self.emit_position();
                if auto {
                    self.pay_blind(serial, amount, dead)?;
                    auto_paid = true;
                } else {
                    let duty = self.player_ref(serial)?.blind;
                    self.emit(HandEventKind::BlindRequest {
                        serial,
                        amount,
                        dead,
                        duty,
                    });
                    requested = true;
                    break;
                }
            }
            if let Some(ante) = ante_due {
                self.position = Some(index);
                self.emit_position();
                if auto {
                    self.pay_ante(serial, ante.value)?;
                    auto_paid = true;
                } else {
                    self.emit(HandEventKind::AnteRequest {
                        serial,
                        amount: ante.value,
                    });
                    requested = true;
                    break;
                }
            }
            if self.is_blind_ante_paid() {
                break;
            }
        }

        if !requested && (auto_paid || self.is_blind_ante_paid()) {
            self.talked_blind_ante()?;
        }
        Ok(())
    }

    /// Кто-то заплатил, отказался или ушёл: собрано ли всё?
    pub(crate) fn talked_blind_ante(&mut self) -> Result<(), EngineError> {
        if self.sit_count() < 2 {
            let serial = self.players.values().find(|p| p.is_sit()).map(|p| p.serial);
            let bets: Chips = self.list_players().map(|p| p.bet).sum();
            let amount = self.pot + bets;
            log::info!("раздача {} отменена: игроков меньше двух", self.hand_id);
            self.emit(HandEventKind::Canceled { serial, amount });
            return self.cancel_hand(serial);
        }

        if self.is_blind_ante_paid() {
            let before = self.player_list.clone();
            self.build_player_list(false);
            if before != self.player_list {
                for serial in before {
                    if let Some(reason) = self.players.get(&serial).and_then(|p| p.wait_for) {
                        self.emit(HandEventKind::WaitFor { serial, reason });
                    }
                }
            }
            let player_list = self.player_list.clone();
            self.emit(HandEventKind::BlindAnteFinished { player_list });
            return self.finish_blind_ante();
        }

        self.update_blinds();
        self.position = self
            .position
            .and_then(|p| index_in_game_add(&self.player_list, &self.players, p, 1));
        self.auto_pay_blind_ante()
    }

    /// Блайнды собраны, состав раздачи окончательный.
    pub(crate) fn finish_blind_ante(&mut self) -> Result<(), EngineError> {
        self.dealer_from_dealer_seat()?;
        self.first_turn = false;
        self.next_round();
        if self.in_game_count() < 2 {
            // Играть некому: все, кроме одного, олл-ин на блайндах.
            self.settle_round()?;
            self.deal_cards()?;
            self.run_out_board()?;
            return self.end_state();
        }
        self.deal_cards()?;
        if self.mode == Mode::Authoritative {
            self.init_round()?;
        }
        Ok(())
    }

    /// Раздача отменена: ставки в банк, банк - единственному сидящему.
    /// Если сидящих нет, каждый получает свой вклад обратно.
    pub(crate) fn cancel_hand(&mut self, serial: Option<PlayerId>) -> Result<(), EngineError> {
        self.bet_to_pot(None);
        match serial.filter(|s| self.players.contains_key(s)) {
            Some(s) => {
                let pot = self.pot;
                self.player_mut(s)?.money += pot;
            }
            None => {
                for (s, amount) in self.side_pots.totals.clone() {
                    self.player_mut(s)?.money += amount;
                }
            }
        }
        self.pot = Chips::ZERO;
        self.position = None;
        self.state = GameState::Canceled;
        Ok(())
    }

    // ===== Ответы игрока на запрос =====

    /// Заплатить запрошенный блайнд.
    pub fn blind(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        self.require_blind_phase(serial)?;
        let (amount, dead) = self.blind_amount(serial);
        if amount.is_zero() {
            return reject(Rejection::NothingDue(serial));
        }
        self.pay_blind(serial, amount, dead)?;
        self.talked_blind_ante()
    }

    /// Заплатить анте.
    pub fn ante(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        self.require_blind_phase(serial)?;
        let Some(ante) = self.stakes.ante else {
            return reject(Rejection::NothingDue(serial));
        };
        if self.player_ref(serial)?.ante {
            return reject(Rejection::NothingDue(serial));
        }
        self.pay_ante(serial, ante.value)?;
        self.talked_blind_ante()
    }

    /// Не платить догоняющий блайнд, а дождаться большого.
    pub fn wait_big_blind(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        self.require_blind_phase(serial)?;
        if self.stakes.blinds.is_none() {
            return reject(Rejection::NothingDue(serial));
        }
        let p = self.player_mut(serial)?;
        p.wait_for = Some(WaitFor::Big);
        p.blind = BlindDuty::Exempt;
        self.update_blinds();
        self.emit(HandEventKind::WaitBlind { serial });
        self.talked_blind_ante()
    }

    fn require_blind_phase(&self, serial: PlayerId) -> Result<(), EngineError> {
        if self.mode != Mode::Authoritative {
            return reject(Rejection::MirrorMode);
        }
        self.player_ref(serial)?;
        if self.state != GameState::BlindAnte {
            return reject(Rejection::NotBlindAntePhase);
        }
        if self.serial_in_position() != Some(serial) {
            return reject(Rejection::NotPlayersTurn(serial));
        }
        Ok(())
    }
}
