//! Зеркальный режим: состояние восстанавливается по журналу ведущего.
//!
//! Зеркало не знает колоды и не решает исход: карты, итог раздачи и
//! вскрытие приходят готовыми записями. Ставки, блайнды, переходы раундов
//! и сайд-поты оно считает само тем же кодом, что и ведущий, и сверяет
//! результат с журналом.

use crate::domain::card::DealtCard;
use crate::domain::hand::GameState;
use crate::domain::player::{BlindDuty, WaitFor};
use crate::domain::{HandId, PlayerId};
use crate::engine::errors::{reject, EngineError, Rejection};
use crate::engine::game::{Mode, PokerGame};
use crate::engine::hand_history::{HandEvent, HandEventKind};

fn desync(hand_id: HandId, what: String) -> EngineError {
    log::error!("зеркало, раздача {hand_id}: {what}");
    EngineError::Journal(what)
}

impl PokerGame {
    /// Применить одну запись журнала ведущего экземпляра.
    pub fn apply_event(&mut self, event: &HandEvent) -> Result<(), EngineError> {
        if self.mode != Mode::Mirror {
            return reject(Rejection::AuthoritativeMode);
        }
        self.replaying = true;
        let result = self.apply_kind(event);
        self.replaying = false;
        result?;
        self.journal.push(event.hand_id, event.kind.clone());
        Ok(())
    }

    fn apply_kind(&mut self, event: &HandEvent) -> Result<(), EngineError> {
        match &event.kind {
            HandEventKind::HandStarted {
                hand_id,
                stakes,
                hands_count,
                player_list,
                dealer_seat,
                chips,
            } => {
                if let Some(missing) = player_list.iter().find(|s| !self.players.contains_key(s)) {
                    return Err(desync(*hand_id, format!("игрок {missing} не сидит за столом")));
                }
                let mut sitting: Vec<PlayerId> = self.players.values().filter(|p| p.is_sit()).map(|p| p.serial).collect();
                let mut listed = player_list.clone();
                sitting.sort_unstable();
                listed.sort_unstable();
                if sitting != listed {
                    return Err(desync(*hand_id, format!("в игре {sitting:?}, в журнале {listed:?}")));
                }
                self.reset_hand(*hand_id, *stakes);
                self.hands_count = *hands_count;
                for (serial, money) in chips {
                    self.player_mut(*serial)?.money = *money;
                }
                self.player_list = player_list.clone();
                self.heads_up = self.player_list.len() == 2;
                self.dealer_seat = Some(*dealer_seat);
                self.state = GameState::BlindAnte;
                self.dealer_from_dealer_seat()?;
                // Долги по блайндам зеркало считает само и сверяет с запросами.
                self.init_blind_ante();
                self.update_blinds();
            }
            HandEventKind::Position { position, serial } => {
                self.position = *position;
                if self.serial_in_position() != *serial {
                    return Err(desync(
                        self.hand_id,
                        format!("позиция {position:?} указывает не на игрока {serial:?}"),
                    ));
                }
            }
            HandEventKind::BlindRequest {
                serial,
                amount,
                dead,
                duty,
            } => {
                let ours = self.player_ref(*serial)?.blind;
                let expected = self.blind_amount(*serial);
                if ours != *duty || expected != (*amount, *dead) {
                    return Err(desync(
                        self.hand_id,
                        format!(
                            "игрок {serial}: запрошен {duty:?} {amount}+{dead}, по расчёту {ours:?} {}+{}",
                            expected.0, expected.1
                        ),
                    ));
                }
            }
            HandEventKind::AnteRequest { serial, amount } => {
                let expected = self.stakes.ante.map(|a| a.value);
                if self.player_ref(*serial)?.ante || expected != Some(*amount) {
                    return Err(desync(self.hand_id, format!("лишний запрос анте {amount} у игрока {serial}")));
                }
            }
            HandEventKind::BlindPaid { serial, amount, dead } => {
                let (due, due_dead) = self.blind_amount(*serial);
                let expected = self.capped_blind(*serial, due, due_dead)?;
                if due.is_zero() || expected != (*amount, *dead) {
                    return Err(desync(
                        self.hand_id,
                        format!(
                            "игрок {serial}: внесено {amount}+{dead}, по расчёту {}+{}",
                            expected.0, expected.1
                        ),
                    ));
                }
                self.pay_blind(*serial, *amount, *dead)?;
                self.blinds_after_payment();
            }
            HandEventKind::AntePaid { serial, amount } => {
                self.pay_ante(*serial, *amount)?;
                self.blinds_after_payment();
            }
            HandEventKind::WaitBlind { serial } => {
                let p = self.player_mut(*serial)?;
                p.wait_for = Some(WaitFor::Big);
                p.blind = BlindDuty::Exempt;
                self.update_blinds();
            }
            HandEventKind::WaitFor { serial, reason } => {
                self.player_mut(*serial)?.wait_for = Some(*reason);
            }
            HandEventKind::BlindAnteFinished { player_list } => {
                self.player_list = player_list.clone();
                self.finish_blind_ante()?;
            }
            HandEventKind::Canceled { serial, .. } => {
                self.cancel_hand(*serial)?;
            }
            HandEventKind::CardsDealt {
                round,
                board,
                pockets,
                plan,
            } => {
                // Без торговли ведущий сдаёт оставшиеся раунды подряд,
                // зеркало к этому моменту уже дошло до вскрытия.
                if *round >= plan.len() || !self.is_running() {
                    return Err(desync(
                        self.hand_id,
                        format!("карты раунда {round} в состоянии {:?}", self.state),
                    ));
                }
                self.board = board.clone();
                self.round_plan = plan.clone();
                for (serial, cards) in pockets {
                    self.player_mut(*serial)?.hand.cards = cards.clone();
                }
            }
            HandEventKind::RoundStarted {
                round,
                position,
                last_to_talk,
                ..
            } => {
                if self.current_round() != Some(*round) {
                    return Err(desync(
                        self.hand_id,
                        format!("начало раунда {round}, а идёт {:?}", self.state),
                    ));
                }
                self.init_round()?;
                if self.position != *position || self.last_to_talk != *last_to_talk {
                    return Err(desync(
                        self.hand_id,
                        format!(
                            "раунд {round}: позиции {:?}/{:?} против {position:?}/{last_to_talk:?}",
                            self.position, self.last_to_talk
                        ),
                    ));
                }
            }
            HandEventKind::Call { serial, amount } => {
                let expected = self.to_call(*serial).min(self.player_ref(*serial)?.money);
                if expected != *amount {
                    return Err(desync(
                        self.hand_id,
                        format!("call игрока {serial}: {amount}, по расчёту {expected}"),
                    ));
                }
                self.call(*serial)?;
            }
            HandEventKind::Raise { serial, amount } => {
                self.call_n_raise(*serial, *amount)?;
            }
            HandEventKind::Check { serial } => self.check(*serial)?,
            HandEventKind::Fold { serial } => self.fold(*serial)?,
            HandEventKind::AllIn { serial } => {
                if !self.player_ref(*serial)?.all_in {
                    return Err(desync(self.hand_id, format!("игрок {serial} не олл-ин")));
                }
            }
            HandEventKind::PotDistributed { summary } => {
                if self.state != GameState::Muck {
                    return Err(desync(
                        self.hand_id,
                        format!("распределение банка в состоянии {:?}", self.state),
                    ));
                }
                self.apply_summary(summary.clone())?;
            }
            HandEventKind::MuckRequest { serials } => {
                self.muckable = serials.clone();
            }
            HandEventKind::Muck { serial, cards, .. } => {
                self.muckable.retain(|s| s != serial);
                self.player_mut(*serial)?.hand.cards = cards.clone();
            }
            HandEventKind::Showdown { board, hands } => {
                self.showdown_done = true;
                self.board = board.clone();
                for (serial, cards) in hands {
                    self.player_mut(*serial)?.hand.cards = reveal_known(cards);
                }
            }
            HandEventKind::HandEnded { hand_id } => {
                if *hand_id != self.hand_id {
                    return Err(desync(self.hand_id, format!("конец чужой раздачи {hand_id}")));
                }
                self.close_hand();
            }
            HandEventKind::Rebuy { serial, amount } => {
                self.player_mut(*serial)?.money += *amount;
            }
            HandEventKind::SitOut { serial } => {
                self.apply_sit_out(*serial)?;
                if self.state == GameState::BlindAnte && self.player_list.contains(serial) {
                    self.update_blinds();
                }
            }
            HandEventKind::PlayerLeft { serial } => {
                self.remove_left(*serial);
            }
        }
        Ok(())
    }

    /// Ведущий пересчитывает долги после каждого взноса, пока собрано
    /// не всё.
    fn blinds_after_payment(&mut self) {
        if !self.is_blind_ante_paid() && self.sit_count() >= 2 {
            self.update_blinds();
        }
    }

    fn remove_left(&mut self, serial: PlayerId) {
        if self.players.remove(&serial).is_some() {
            log::info!("зеркало {}: игрок {serial} ушёл", self.config.id);
        }
    }
}

/// Открытые на вскрытии карты остаются открытыми.
fn reveal_known(cards: &[DealtCard]) -> Vec<DealtCard> {
    cards
        .iter()
        .map(|c| DealtCard {
            card: c.card,
            visible: c.visible || c.card.is_some(),
        })
        .collect()
}
