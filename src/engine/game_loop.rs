//! Ход раздачи: старт, раунды торговли, сдача карт, завершение.

use crate::domain::card::DealtCard;
use crate::domain::chips::Chips;
use crate::domain::deck::Deck;
use crate::domain::hand::GameState;
use crate::domain::structure::{FirstToAct, Stakes};
use crate::domain::{HandId, PlayerId};
use crate::engine::errors::{reject, EngineError, Rejection};
use crate::engine::game::{Mode, PokerGame};
use crate::engine::hand_history::HandEventKind;
use crate::engine::positions::{index_in_game_add, index_not_fold_add};
use crate::engine::side_pots::SidePots;
use crate::engine::RandomSource;

impl PokerGame {
    /// Начать раздачу: перетасовать колоду и перейти к сбору блайндов.
    pub fn begin_turn<R: RandomSource>(
        &mut self,
        hand_id: HandId,
        stakes: Stakes,
        rng: &mut R,
    ) -> Result<(), EngineError> {
        let mut deck = Deck::standard_52();
        rng.shuffle(&mut deck.cards);
        self.begin_turn_with_deck(hand_id, stakes, deck)
    }

    /// То же, что `begin_turn`, но с готовой колодой (карты берутся с конца).
    pub fn begin_turn_with_deck(&mut self, hand_id: HandId, stakes: Stakes, deck: Deck) -> Result<(), EngineError> {
        if self.mode == Mode::Mirror {
            return reject(Rejection::MirrorMode);
        }
        if self.is_running() {
            return reject(Rejection::HandAlreadyRunning);
        }
        if self.sit_count() < 2 {
            return reject(Rejection::NotEnoughPlayers);
        }

        self.reset_hand(hand_id, stakes);
        self.build_player_list(true);
        self.heads_up = self.player_list.len() == 2;
        self.state = GameState::BlindAnte;
        if stakes.blinds.is_some() && !self.first_turn {
            self.move_dealer_left();
        }
        // Мёртвая кнопка бывает только после сдвига.
        let first_turn = self.first_turn;
        let occupied = self.dealer_seat.map_or(false, |seat| {
            self.players
                .values()
                .any(|p| p.seat == seat && (p.is_sit() || !first_turn))
        });
        if !occupied {
            self.dealer_seat = self
                .player_list
                .first()
                .and_then(|s| self.players.get(s))
                .map(|p| p.seat);
        }
        self.dealer_from_dealer_seat()?;

        let dealer_seat = self.dealer_seat.ok_or(EngineError::UnresolvableDealer(None))?;
        log::info!(
            "стол {}: раздача {hand_id}, уровень {}, игроков {}, кнопка на месте {dealer_seat}",
            self.config.id,
            stakes.level,
            self.player_list.len()
        );
        let chips = self
            .list_players()
            .map(|p| (p.serial, p.money))
            .collect();
        self.emit(HandEventKind::HandStarted {
            hand_id,
            stakes,
            hands_count: self.hands_count,
            player_list: self.player_list.clone(),
            dealer_seat,
            chips,
        });

        self.init_blind_ante();
        self.deck = deck;
        self.update_blinds();
        self.auto_pay_blind_ante()
    }

    /// Сброс состояния раздачи (общий для ведущего и зеркала).
    pub(crate) fn reset_hand(&mut self, hand_id: HandId, stakes: Stakes) {
        self.hand_id = hand_id;
        self.stakes = stakes;
        self.pot = Chips::ZERO;
        self.board.clear();
        self.side_pots = SidePots::new();
        self.summary = None;
        self.muckable.clear();
        self.showdown_done = false;
        self.round_plan = self.config.variant.plan();
        self.round_cap_left = None;
        self.last_bet = Chips::ZERO;
        self.first_betting_pass = true;
        self.position = None;
        self.last_to_talk = None;
        for p in self.players.values_mut() {
            p.begin_turn();
        }
    }

    pub(crate) fn next_round(&mut self) {
        let next = self.current_round().map_or(0, |r| r + 1);
        self.state = GameState::Round(next);
        self.position = None;
        log::debug!("раздача {}: раунд {next}", self.hand_id);
    }

    pub fn is_last_round(&self) -> bool {
        self.current_round().map_or(false, |r| r + 1 >= self.round_plan.len())
    }

    /// Начало раунда торговли: кто открывает, кто закрывает, лимит рейзов.
    pub(crate) fn init_round(&mut self) -> Result<(), EngineError> {
        let round = self
            .current_round()
            .ok_or(EngineError::Internal("init_round вне раунда торговли"))?;
        let plan = self
            .round_plan
            .get(round)
            .cloned()
            .ok_or(EngineError::Internal("раунд вне плана раздачи"))?;
        let dealer = self.dealer.ok_or(EngineError::UnresolvableDealer(self.dealer_seat))?;

        self.round_cap_left = self.config.structure.round_rule(round).and_then(|r| r.cap);
        self.last_bet = Chips::ZERO;
        self.first_betting_pass = true;

        let list = &self.player_list;
        let players = &self.players;
        let heads_up = self.is_heads_up();
        let (position, last_to_talk) = match plan.first_to_act {
            FirstToAct::UnderTheGun => {
                if self.in_game_count() < 2 {
                    return Err(EngineError::Internal("раунд торговли, где играет меньше двух"));
                }
                if heads_up {
                    (Some(dealer), index_in_game_add(list, players, dealer, 1))
                } else {
                    (
                        index_in_game_add(list, players, dealer, 3),
                        index_in_game_add(list, players, dealer, 2),
                    )
                }
            }
            FirstToAct::NextToDealer => {
                let first = index_in_game_add(list, players, dealer, 1);
                let last = first.and_then(|f| index_in_game_add(list, players, f, -1));
                (first, last)
            }
            FirstToAct::LowestVisible | FirstToAct::HighestVisible => {
                let ranked = list.iter().enumerate().filter_map(|(i, s)| {
                    let p = players.get(s)?;
                    p.is_in_game()
                        .then(|| (self.evaluator.rank_visible(&p.hand.visible_cards()), i))
                });
                let chosen = if plan.first_to_act == FirstToAct::LowestVisible {
                    ranked.min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)))
                } else {
                    ranked.max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
                };
                let first = chosen.map(|(_, i)| i);
                let last = first.and_then(|f| index_in_game_add(list, players, f, -1));
                (first, last)
            }
        };
        self.position = position;
        self.last_to_talk = last_to_talk;

        for p in self.players.values_mut() {
            if p.is_in_game() {
                p.talked_once = false;
            }
        }

        log::debug!(
            "раунд {} ({}): дилер {dealer}, первым {:?}, последним {:?}",
            round,
            plan.name,
            self.position,
            self.last_to_talk
        );
        self.emit(HandEventKind::RoundStarted {
            round,
            name: plan.name,
            position: self.position,
            last_to_talk: self.last_to_talk,
        });
        self.autoplay()
    }

    /// Игрок сказал своё слово: закончить раунд или передать ход.
    pub(crate) fn talked(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        self.player_mut(serial)?.talked_once = true;
        if self.round_finished(serial) {
            return self.finish_round();
        }
        self.position = self
            .position
            .and_then(|p| index_in_game_add(&self.player_list, &self.players, p, 1));
        self.emit_position();
        self.autoplay()
    }

    /// Раунд окончен, если играть некому или все сказали слово хотя бы
    /// раз (до последнего по очереди) и ставки уравнены.
    fn round_finished(&mut self, serial: PlayerId) -> bool {
        if self.not_fold_count() < 2 || self.in_game_count() < 1 {
            return true;
        }
        if self.first_betting_pass {
            let last = self.last_to_talk.and_then(|i| self.player_list.get(i).copied());
            if last != Some(serial) {
                return false;
            }
            self.first_betting_pass = false;
        }
        self.bets_equal()
    }

    fn finish_round(&mut self) -> Result<(), EngineError> {
        self.settle_round()?;

        if self.not_fold_count() < 2 {
            self.position = self
                .position
                .and_then(|p| index_not_fold_add(&self.player_list, &self.players, p, 1));
            return self.end_state();
        }
        if self.in_game_count() < 2 {
            self.run_out_board()?;
            return self.end_state();
        }
        if self.is_last_round() {
            return self.end_state();
        }
        self.next_round();
        self.deal_cards()?;
        if self.mode == Mode::Authoritative {
            self.init_round()?;
        }
        Ok(())
    }

    /// Несравненная ставка, сайд-поты, ставки в банк, сверка банка.
    pub(crate) fn settle_round(&mut self) -> Result<(), EngineError> {
        let round = self.contribution_round();
        self.side_pots.update_uncalled(round, &self.players);
        self.side_pots
            .make_side_pots(round, &mut self.players, &self.player_list)?;
        self.bet_to_pot(None);
        let accounted = self.side_pots.total();
        if self.pot != accounted {
            log::error!(
                "раздача {}: банк {} не сходится с уровнями {}",
                self.hand_id,
                self.pot,
                accounted
            );
            return Err(EngineError::Accounting(format!(
                "банк {} против {} по уровням",
                self.pot, accounted
            )));
        }
        Ok(())
    }

    /// Играть некому: сдать оставшиеся раунды без торговли.
    pub(crate) fn run_out_board(&mut self) -> Result<(), EngineError> {
        while !self.is_last_round() {
            self.next_round();
            self.deal_cards()?;
        }
        Ok(())
    }

    /// Сдать карты текущего раунда всем не сбросившим.
    pub(crate) fn deal_cards(&mut self) -> Result<(), EngineError> {
        if self.mode == Mode::Mirror {
            return Ok(());
        }
        let round = self
            .current_round()
            .ok_or(EngineError::Internal("сдача карт вне раунда"))?;
        let receivers: Vec<PlayerId> = self
            .list_players()
            .filter(|p| p.is_not_fold())
            .map(|p| p.serial)
            .collect();
        self.fit_plan_to_deck(round, receivers.len())?;
        let plan = self
            .round_plan
            .get(round)
            .cloned()
            .ok_or(EngineError::Internal("раунд вне плана раздачи"))?;

        for _ in 0..plan.down {
            for serial in &receivers {
                let card = self.deck.draw_one().ok_or(EngineError::DeckExhausted)?;
                self.player_mut(*serial)?.hand.push(DealtCard::down(card));
            }
        }
        for _ in 0..plan.up {
            for serial in &receivers {
                let card = self.deck.draw_one().ok_or(EngineError::DeckExhausted)?;
                self.player_mut(*serial)?.hand.push(DealtCard::up(card));
            }
        }
        for _ in 0..plan.board {
            let card = self.deck.draw_one().ok_or(EngineError::DeckExhausted)?;
            self.board.push(card);
        }

        let pockets = receivers
            .iter()
            .filter_map(|s| self.players.get(s).map(|p| (*s, p.hand.public())))
            .collect();
        self.emit(HandEventKind::CardsDealt {
            round,
            board: self.board.clone(),
            pockets,
            plan: self.round_plan.clone(),
        });
        Ok(())
    }

    /// Колоды не хватает: личные карты раунда по одной превращаются
    /// в общие. Меняется только план этой раздачи.
    fn fit_plan_to_deck(&mut self, round: usize, receivers: usize) -> Result<(), EngineError> {
        let available = self.deck.len();
        loop {
            let Some(plan) = self.round_plan.get_mut(round) else {
                return Err(EngineError::Internal("раунд вне плана раздачи"));
            };
            if plan.board + (plan.down + plan.up) * receivers <= available {
                return Ok(());
            }
            if plan.up > 0 {
                plan.up -= 1;
            } else if plan.down > 0 {
                plan.down -= 1;
            } else {
                return Err(EngineError::DeckExhausted);
            }
            plan.board += 1;
            log::warn!("раздача {}: колоды не хватает, одна карта раунда {round} общая", self.hand_id);
            for later in self.round_plan.iter_mut().skip(round) {
                later.hand_size = later.hand_size.saturating_sub(1);
                later.board_size += 1;
            }
        }
    }

    /// Торговля окончена: распределить банк и перейти ко вскрытию.
    pub(crate) fn end_state(&mut self) -> Result<(), EngineError> {
        self.state = GameState::Muck;
        self.position = None;
        if self.mode == Mode::Authoritative {
            self.distribute_money()?;
            self.begin_muck()?;
        }
        Ok(())
    }

    /// Раздача сыграна: счётчик, кнопка, состояние.
    pub(crate) fn close_hand(&mut self) {
        self.hands_count += 1;
        if let Some(seat) = self
            .dealer
            .and_then(|d| self.player_list.get(d))
            .and_then(|s| self.players.get(s))
            .map(|p| p.seat)
        {
            self.dealer_seat = Some(seat);
        }
        self.state = GameState::End;
        self.position = None;
        log::info!("стол {}: раздача {} завершена", self.config.id, self.hand_id);
    }

    /// Завершение раздачи: докупки, уход разорившихся и покинувших стол.
    pub(crate) fn end_turn(&mut self) -> Result<(), EngineError> {
        self.close_hand();
        self.emit(HandEventKind::HandEnded { hand_id: self.hand_id });

        let serials: Vec<PlayerId> = self.players.keys().copied().collect();
        for serial in &serials {
            let p = self.player_mut(*serial)?;
            if p.rebuy.is_zero() {
                continue;
            }
            let amount = p.rebuy;
            p.money += amount;
            p.rebuy = Chips::ZERO;
            self.emit(HandEventKind::Rebuy { serial: *serial, amount });
        }

        for serial in &serials {
            if self.players.get(serial).map_or(false, |p| p.is_sit()) && self.is_broke(*serial) {
                log::info!("игрок {serial} без фишек, встаёт из-за стола");
                self.player_mut(*serial)?.sit_out_next_turn = true;
            }
        }

        for serial in &serials {
            let p = self.player_ref(*serial)?;
            if p.is_sit() && (p.sit_out_next_turn || p.remove_next_turn) {
                self.apply_sit_out(*serial)?;
                self.emit(HandEventKind::SitOut { serial: *serial });
            }
        }

        for serial in &serials {
            if self.players.get(serial).map_or(false, |p| p.remove_next_turn) {
                self.players.remove(serial);
                log::info!("стол {}: игрок {serial} ушёл", self.config.id);
                self.emit(HandEventKind::PlayerLeft { serial: *serial });
            }
        }
        Ok(())
    }

    /// Ход у отсутствующего или у автоигры: сбросить за него.
    pub(crate) fn autoplay(&mut self) -> Result<(), EngineError> {
        if self.mode != Mode::Authoritative || !matches!(self.state, GameState::Round(_)) {
            return Ok(());
        }
        let Some(serial) = self.serial_in_position() else {
            return Ok(());
        };
        let Some(p) = self.players.get(&serial) else {
            return Ok(());
        };
        if (p.sit_out || p.auto) && p.is_in_game() && self.cards_dealt() {
            log::debug!("автоигра: игрок {serial} сбрасывает");
            return self.fold(serial);
        }
        Ok(())
    }
}
