//! Стол и раздача: состояние и операции рассадки.
//!
//! Ход раздачи - `game_loop`, блайнды - `blinds`, ставки - `betting`,
//! распределение банка - `distribution`, вскрытие - `showdown`,
//! применение журнала зеркалом - `replay`.

use std::collections::BTreeMap;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use crate::domain::card::Card;
use crate::domain::chips::Chips;
use crate::domain::deck::Deck;
use crate::domain::hand::{GameState, HandSummary};
use crate::domain::player::{AutoMuck, BlindDuty, Player, WaitFor};
use crate::domain::structure::{RoundPlan, Stakes, TableConfig};
use crate::domain::{HandId, PlayerId, SeatIndex};
use crate::engine::errors::{reject, EngineError, Rejection};
use crate::engine::hand_history::{HandEvent, HandEventKind, HandHistory};
use crate::engine::rake::{NoRake, RakePolicy};
use crate::engine::side_pots::SidePots;
use crate::eval::{HandEvaluator, StandardEvaluator};

/// Кто ведёт раздачу.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Тасует, сдаёт, распределяет банк и пишет журнал.
    Authoritative,
    /// Только повторяет журнал, полученный от ведущего экземпляра.
    Mirror,
}

/// Наблюдаемое состояние для сравнения экземпляров.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameSnapshot {
    pub state: GameState,
    pub position: Option<usize>,
    pub serial_in_position: Option<PlayerId>,
    pub player_list: Vec<PlayerId>,
    pub pot: Chips,
    pub side_pots: SidePots,
    /// Игрок → (стек, ставка).
    pub stacks: BTreeMap<PlayerId, (Chips, Chips)>,
}

/// Стол с игроками и текущей раздачей.
pub struct PokerGame {
    pub(crate) mode: Mode,
    pub(crate) config: TableConfig,
    pub(crate) evaluator: Arc<dyn HandEvaluator + Send + Sync>,
    pub(crate) rake_policy: Box<dyn RakePolicy + Send + Sync>,

    pub(crate) players: BTreeMap<PlayerId, Player>,
    /// Участники раздачи по местам. Не меняется в течение раунда торговли.
    pub(crate) player_list: Vec<PlayerId>,

    pub(crate) state: GameState,
    pub(crate) hand_id: HandId,
    pub(crate) hands_count: u64,
    pub(crate) stakes: Stakes,
    pub(crate) first_turn: bool,
    /// Раздача началась вдвоём: кнопка платит малый и ходит первой
    /// до флопа. Не меняется до конца раздачи.
    pub(crate) heads_up: bool,

    pub(crate) dealer_seat: Option<SeatIndex>,
    pub(crate) dealer: Option<usize>,
    pub(crate) position: Option<usize>,
    pub(crate) last_to_talk: Option<usize>,

    pub(crate) round_plan: Vec<RoundPlan>,
    /// Сколько ещё рейзов можно в раунде (`None` - без лимита).
    pub(crate) round_cap_left: Option<u32>,
    /// Наибольшее повышение в раунде: нижняя граница следующего рейза.
    pub(crate) last_bet: Chips,
    pub(crate) first_betting_pass: bool,

    pub(crate) pot: Chips,
    pub(crate) side_pots: SidePots,
    pub(crate) board: Vec<Card>,
    pub(crate) deck: Deck,

    pub(crate) summary: Option<HandSummary>,
    pub(crate) muckable: Vec<PlayerId>,
    pub(crate) showdown_done: bool,
    pub(crate) rake_collected: Chips,

    pub(crate) journal: HandHistory,
    /// Зеркало применяет запись журнала.
    pub(crate) replaying: bool,
}

impl PokerGame {
    pub fn new(config: TableConfig, mode: Mode) -> Result<Self, EngineError> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        let stakes = config.structure.stakes_for_level(1);
        log::info!(
            "стол {} ({}): {} / {}, режим {:?}",
            config.id,
            config.name,
            config.variant.name,
            config.structure.name,
            mode
        );
        Ok(Self {
            mode,
            config,
            evaluator: Arc::new(StandardEvaluator),
            rake_policy: Box::new(NoRake),
            players: BTreeMap::new(),
            player_list: Vec::new(),
            state: GameState::Idle,
            hand_id: 0,
            hands_count: 0,
            stakes,
            first_turn: true,
            heads_up: false,
            dealer_seat: None,
            dealer: None,
            position: None,
            last_to_talk: None,
            round_plan: Vec::new(),
            round_cap_left: None,
            last_bet: Chips::ZERO,
            first_betting_pass: true,
            pot: Chips::ZERO,
            side_pots: SidePots::new(),
            board: Vec::new(),
            deck: Deck::standard_52(),
            summary: None,
            muckable: Vec::new(),
            showdown_done: false,
            rake_collected: Chips::ZERO,
            journal: HandHistory::new(),
            replaying: false,
        })
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn HandEvaluator + Send + Sync>) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn with_rake_policy(mut self, policy: Box<dyn RakePolicy + Send + Sync>) -> Self {
        self.rake_policy = policy;
        self
    }

    // ===== Чтение состояния =====

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    pub fn hand_id(&self) -> HandId {
        self.hand_id
    }

    pub fn hands_count(&self) -> u64 {
        self.hands_count
    }

    pub fn stakes(&self) -> &Stakes {
        &self.stakes
    }

    pub fn player(&self, serial: PlayerId) -> Option<&Player> {
        self.players.get(&serial)
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    pub fn player_list(&self) -> &[PlayerId] {
        &self.player_list
    }

    pub fn dealer_seat(&self) -> Option<SeatIndex> {
        self.dealer_seat
    }

    pub fn dealer(&self) -> Option<usize> {
        self.dealer
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn serial_in_position(&self) -> Option<PlayerId> {
        self.position.and_then(|i| self.player_list.get(i).copied())
    }

    pub fn current_round(&self) -> Option<usize> {
        match self.state {
            GameState::Round(i) => Some(i),
            _ => None,
        }
    }

    pub fn round_plan(&self) -> &[RoundPlan] {
        &self.round_plan
    }

    pub fn round_cap_left(&self) -> Option<u32> {
        self.round_cap_left
    }

    pub fn last_bet(&self) -> Chips {
        self.last_bet
    }

    pub fn pot(&self) -> Chips {
        self.pot
    }

    pub fn side_pots(&self) -> &SidePots {
        &self.side_pots
    }

    pub fn board(&self) -> &[Card] {
        &self.board
    }

    pub fn summary(&self) -> Option<&HandSummary> {
        self.summary.as_ref()
    }

    pub fn muckable(&self) -> &[PlayerId] {
        &self.muckable
    }

    /// Рейк, собранный столом за всё время.
    pub fn rake_collected(&self) -> Chips {
        self.rake_collected
    }

    pub fn journal(&self) -> &HandHistory {
        &self.journal
    }

    pub fn events(&self) -> &[HandEvent] {
        self.journal.events()
    }

    /// Подписка на новые записи журнала.
    pub fn subscribe(&mut self) -> Receiver<HandEvent> {
        self.journal.subscribe()
    }

    /// Все фишки на столе: стеки, ставки, банк, отложенные докупки.
    pub fn chips_on_table(&self) -> Chips {
        let players: Chips = self
            .players
            .values()
            .map(|p| p.money + p.bet + p.rebuy)
            .sum();
        players + self.pot
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state,
            position: self.position,
            serial_in_position: self.serial_in_position(),
            player_list: self.player_list.clone(),
            pot: self.pot,
            side_pots: self.side_pots.clone(),
            stacks: self
                .players
                .values()
                .map(|p| (p.serial, (p.money, p.bet)))
                .collect(),
        }
    }

    // ===== Счётчики =====

    /// Сидящие за столом (не sit-out), в раздаче или нет.
    pub fn sit_count(&self) -> usize {
        self.players.values().filter(|p| p.is_sit()).count()
    }

    pub fn in_game_count(&self) -> usize {
        self.list_players().filter(|p| p.is_in_game()).count()
    }

    pub fn not_fold_count(&self) -> usize {
        self.list_players().filter(|p| p.is_not_fold()).count()
    }

    pub fn all_in_count(&self) -> usize {
        self.list_players().filter(|p| p.all_in).count()
    }

    /// Один на один: в раздачу вошли ровно два игрока. Если кто-то
    /// выбыл на фазе блайндов, раздача остаётся не один на один.
    pub fn is_heads_up(&self) -> bool {
        self.heads_up
    }

    pub fn is_playing(&self, serial: PlayerId) -> bool {
        self.is_running() && self.player_list.contains(&serial)
    }

    pub fn is_broke(&self, serial: PlayerId) -> bool {
        let Some(p) = self.players.get(&serial) else {
            return false;
        };
        if p.money.is_zero() {
            return true;
        }
        if self.stakes.tournament {
            return false;
        }
        match self.stakes.blinds {
            Some(b) => p.money < b.small + b.big,
            None => false,
        }
    }

    pub(crate) fn list_players(&self) -> impl Iterator<Item = &Player> {
        self.player_list.iter().filter_map(|s| self.players.get(s))
    }

    pub(crate) fn player_ref(&self, serial: PlayerId) -> Result<&Player, EngineError> {
        match self.players.get(&serial) {
            Some(p) => Ok(p),
            None => reject(Rejection::UnknownPlayer(serial)),
        }
    }

    pub(crate) fn player_mut(&mut self, serial: PlayerId) -> Result<&mut Player, EngineError> {
        self.players
            .get_mut(&serial)
            .ok_or(EngineError::Rejected(Rejection::UnknownPlayer(serial)))
    }

    pub(crate) fn emit(&mut self, kind: HandEventKind) {
        if self.mode == Mode::Authoritative {
            self.journal.push(self.hand_id, kind);
        }
    }

    pub(crate) fn emit_position(&mut self) {
        let kind = HandEventKind::Position {
            position: self.position,
            serial: self.serial_in_position(),
        };
        self.emit(kind);
    }

    // ===== Перемещение фишек =====

    /// Ключ раунда для учёта вкладов: фаза блайндов пишет в раунд 0.
    pub(crate) fn contribution_round(&self) -> usize {
        self.current_round().unwrap_or(0)
    }

    /// Стек → ставка.
    pub(crate) fn money_to_bet(&mut self, serial: PlayerId, amount: Chips) -> Result<(), EngineError> {
        let round = self.contribution_round();
        let player = self.player_mut(serial)?;
        player.money = player.money.checked_sub(amount).ok_or_else(|| {
            EngineError::Accounting(format!("ставка {amount} больше стека игрока {serial}"))
        })?;
        player.bet += amount;
        self.side_pots.add(round, serial, amount);
        self.mark_all_in(serial);
        Ok(())
    }

    /// Стек → банк мимо ставки (мёртвые деньги, анте).
    pub(crate) fn money_to_pot(&mut self, serial: PlayerId, amount: Chips) -> Result<(), EngineError> {
        let round = self.contribution_round();
        let player = self.player_mut(serial)?;
        player.money = player.money.checked_sub(amount).ok_or_else(|| {
            EngineError::Accounting(format!("взнос {amount} больше стека игрока {serial}"))
        })?;
        player.dead += amount;
        self.pot += amount;
        self.side_pots.add(round, serial, amount);
        self.mark_all_in(serial);
        Ok(())
    }

    fn mark_all_in(&mut self, serial: PlayerId) {
        let Some(player) = self.players.get_mut(&serial) else {
            return;
        };
        if player.money.is_zero() && !player.all_in {
            player.all_in = true;
            log::debug!("игрок {serial} олл-ин");
            self.emit(HandEventKind::AllIn { serial });
        }
    }

    /// Ставки → банк: у одного игрока или у всех участников.
    pub(crate) fn bet_to_pot(&mut self, serial: Option<PlayerId>) {
        let serials = match serial {
            Some(s) => vec![s],
            None => self.player_list.clone(),
        };
        for s in serials {
            if let Some(player) = self.players.get_mut(&s) {
                self.pot += player.bet;
                player.bet = Chips::ZERO;
            }
        }
    }

    // ===== Рассадка =====

    /// Посадить игрока. `seat = None` - на первое свободное место.
    pub fn add_player(&mut self, serial: PlayerId, seat: Option<SeatIndex>) -> Result<SeatIndex, EngineError> {
        if self.players.contains_key(&serial) {
            return reject(Rejection::AlreadySeated(serial));
        }
        if self.players.len() >= self.config.max_players {
            return reject(Rejection::TableFull);
        }
        let free = self.seats_left();
        let seat = match seat {
            Some(s) if free.contains(&s) => s,
            Some(s) => return reject(Rejection::SeatUnavailable(s)),
            None => match free.first() {
                Some(s) => *s,
                None => return reject(Rejection::TableFull),
            },
        };
        self.players.insert(serial, Player::new(serial, seat));
        log::info!("стол {}: игрок {serial} сел на место {seat}", self.config.id);
        Ok(seat)
    }

    pub fn seats_left(&self) -> Vec<SeatIndex> {
        let taken: Vec<SeatIndex> = self.players.values().map(|p| p.seat).collect();
        (0..self.config.max_players as SeatIndex)
            .filter(|s| !taken.contains(s))
            .collect()
    }

    pub fn pay_buy_in(&mut self, serial: PlayerId, amount: Chips) -> Result<(), EngineError> {
        let structure = &self.config.structure;
        let tournament = structure.is_tournament();
        if amount > structure.max_buy_in || (!tournament && amount < structure.buy_in) {
            return reject(Rejection::InvalidAmount(amount));
        }
        let player = self.player_mut(serial)?;
        player.money = amount;
        player.buy_in_paid = true;
        log::info!("игрок {serial}: бай-ин {amount}");
        Ok(())
    }

    /// Докупка. Во время раздачи откладывается до её конца.
    pub fn rebuy(&mut self, serial: PlayerId, amount: Chips) -> Result<(), EngineError> {
        if self.mode == Mode::Mirror {
            return reject(Rejection::MirrorMode);
        }
        let max = self.config.structure.max_buy_in;
        let playing = self.is_playing(serial);
        let player = self.player_ref(serial)?;
        if amount.is_zero() || player.money + player.rebuy + amount > max {
            return reject(Rejection::InvalidAmount(amount));
        }
        if playing {
            self.player_mut(serial)?.rebuy += amount;
            log::info!("игрок {serial}: докупка {amount} после раздачи");
        } else {
            self.player_mut(serial)?.money += amount;
            self.emit(HandEventKind::Rebuy { serial, amount });
        }
        Ok(())
    }

    /// Сесть в игру. Нужен оплаченный бай-ин и стек не меньше блайндов.
    pub fn sit(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        let player = self.player_ref(serial)?;
        if !player.buy_in_paid || self.is_broke(serial) {
            return reject(Rejection::CannotSit(serial));
        }
        let player = self.player_mut(serial)?;
        player.sit_out = false;
        player.sit_out_next_turn = false;
        player.auto = false;
        if player.wait_for == Some(WaitFor::Big) {
            player.wait_for = None;
        }
        let seat = player.seat;
        if self.sit_count() < 2 {
            self.first_turn = true;
            self.dealer_seat = Some(seat);
        }
        log::info!("игрок {serial} в игре");
        Ok(())
    }

    /// Встать из-за стола, сохранив место. `false`, если уже стоял.
    pub fn sit_out(&mut self, serial: PlayerId) -> Result<bool, EngineError> {
        if self.mode == Mode::Mirror && self.is_playing(serial) {
            return reject(Rejection::MirrorMode);
        }
        if self.player_ref(serial)?.sit_out {
            return Ok(false);
        }
        self.apply_sit_out(serial)?;
        self.emit(HandEventKind::SitOut { serial });

        if self.state == GameState::BlindAnte && self.player_list.contains(&serial) {
            self.update_blinds();
            if self.serial_in_position() == Some(serial) {
                self.talked_blind_ante()?;
            }
        } else if self.is_playing(serial) {
            self.autoplay()?;
        }
        Ok(true)
    }

    pub(crate) fn apply_sit_out(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        let blind_phase = self.state == GameState::BlindAnte;
        let player = self.player_mut(serial)?;
        player.sit_out = true;
        player.sit_out_next_turn = false;
        player.wait_for = None;
        if blind_phase {
            player.blind = BlindDuty::Exempt;
        }
        if self.sit_count() < 2 {
            self.first_turn = true;
            self.dealer_seat = self
                .players
                .values()
                .find(|p| p.is_sit())
                .or_else(|| self.players.values().next())
                .map(|p| p.seat);
        }
        log::info!("игрок {serial} встал из-за стола");
        Ok(())
    }

    /// Встать после текущей раздачи (или сразу, если сейчас не играет).
    pub fn sit_out_next_turn(&mut self, serial: PlayerId) -> Result<bool, EngineError> {
        let in_position_on_blinds =
            self.state == GameState::BlindAnte && self.serial_in_position() == Some(serial);
        if self.is_playing(serial) && !in_position_on_blinds {
            self.player_mut(serial)?.sit_out_next_turn = true;
            Ok(false)
        } else {
            self.sit_out(serial)
        }
    }

    /// Отменить отложенный уход и автоигру.
    pub fn come_back(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        let player = self.player_mut(serial)?;
        player.remove_next_turn = false;
        player.sit_out_next_turn = false;
        player.auto = false;
        Ok(())
    }

    /// Убрать игрока. Во время раздачи - по её окончании; `true`, если убран сразу.
    pub fn remove_player(&mut self, serial: PlayerId) -> Result<bool, EngineError> {
        self.player_ref(serial)?;
        if self.is_playing(serial) {
            if self.mode == Mode::Mirror {
                return reject(Rejection::MirrorMode);
            }
            self.player_mut(serial)?.remove_next_turn = true;
            if self.state == GameState::BlindAnte {
                self.sit_out(serial)?;
            } else {
                self.autoplay()?;
            }
            return Ok(false);
        }
        self.players.remove(&serial);
        log::info!("стол {}: игрок {serial} ушёл", self.config.id);
        self.emit(HandEventKind::PlayerLeft { serial });
        Ok(true)
    }

    /// Платить блайнды и анте без запроса.
    pub fn auto_blind_ante(&mut self, serial: PlayerId, enabled: bool) -> Result<(), EngineError> {
        self.player_mut(serial)?.auto_blind_ante = enabled;
        if enabled
            && self.mode == Mode::Authoritative
            && self.state == GameState::BlindAnte
            && self.serial_in_position() == Some(serial)
        {
            self.auto_pay_blind_ante()?;
        }
        Ok(())
    }

    /// Передать руку автоигре: она сбрасывает карты в свою очередь.
    pub fn auto_player(&mut self, serial: PlayerId) -> Result<(), EngineError> {
        if self.mode == Mode::Mirror && self.is_playing(serial) {
            return reject(Rejection::MirrorMode);
        }
        self.player_mut(serial)?.auto = true;
        if self.state == GameState::BlindAnte {
            self.sit_out(serial)?;
        } else if self.is_playing(serial) {
            self.autoplay()?;
        }
        Ok(())
    }

    pub fn set_auto_muck(&mut self, serial: PlayerId, auto_muck: AutoMuck) -> Result<(), EngineError> {
        self.player_mut(serial)?.auto_muck = auto_muck;
        Ok(())
    }
}
