//! Вскрытие: кто обязан показать карты, кто может сбросить.

use std::collections::BTreeMap;

use crate::domain::hand::{GameState, HandRank, WinSide};
use crate::domain::PlayerId;
use crate::engine::errors::{reject, EngineError, Rejection};
use crate::engine::game::{Mode, PokerGame};
use crate::engine::hand_history::HandEventKind;

impl PokerGame {
    /// Решить, кто открывает карты. Банк к этому моменту уже распределён.
    pub(crate) fn begin_muck(&mut self) -> Result<(), EngineError> {
        self.muckable.clear();
        let contenders = self.not_fold_from_dealer();

        if let [winner] = contenders.as_slice() {
            let decision = self.player_ref(*winner)?.auto_muck.decide(true);
            if decision.is_none() {
                self.muckable.push(*winner);
            }
        } else {
            self.showdown_done = true;
            let winners = self
                .summary
                .as_ref()
                .map(|s| s.winners.clone())
                .unwrap_or_default();
            let variant = self.config.variant.clone();
            let mut best: BTreeMap<WinSide, HandRank> = BTreeMap::new();

            for serial in contenders {
                let (known, auto_muck) = {
                    let p = self.player_ref(serial)?;
                    (p.hand.known(), p.auto_muck)
                };
                let mut must_show = winners.contains(&serial);
                for side in &variant.sides {
                    let Some(value) = self.evaluator.best(&variant.name, *side, &known, &self.board) else {
                        continue;
                    };
                    if best.get(side).map_or(true, |b| value >= *b) {
                        best.insert(*side, value);
                        must_show = true;
                    }
                }

                if must_show {
                    self.player_mut(serial)?.hand.reveal();
                } else if auto_muck.decide(false).is_none() {
                    self.muckable.push(serial);
                }
            }
        }

        if self.muckable.is_empty() {
            return self.finish_showdown();
        }
        log::debug!("раздача {}: ждём решения о сбросе от {:?}", self.hand_id, self.muckable);
        self.emit(HandEventKind::MuckRequest {
            serials: self.muckable.clone(),
        });
        Ok(())
    }

    /// Решение игрока из списка на сброс: `true` - сбросить, `false` - показать.
    pub fn muck(&mut self, serial: PlayerId, mucked: bool) -> Result<(), EngineError> {
        if self.mode == Mode::Mirror {
            return reject(Rejection::MirrorMode);
        }
        if self.state != GameState::Muck || !self.muckable.contains(&serial) {
            return reject(Rejection::NotMuckable(serial));
        }
        self.muckable.retain(|s| *s != serial);
        let player = self.player_mut(serial)?;
        if !mucked {
            player.hand.reveal();
        }
        let cards = player.hand.public();
        log::debug!("игрок {serial}: {}", if mucked { "сбросил" } else { "показал" });
        self.emit(HandEventKind::Muck { serial, mucked, cards });

        if self.muckable.is_empty() {
            self.finish_showdown()?;
        }
        Ok(())
    }

    fn finish_showdown(&mut self) -> Result<(), EngineError> {
        let hands: Vec<_> = self
            .list_players()
            .filter(|p| p.is_not_fold() && p.hand.cards.iter().any(|c| c.visible))
            .map(|p| (p.serial, p.hand.public()))
            .collect();
        if self.showdown_done || !hands.is_empty() {
            self.emit(HandEventKind::Showdown {
                board: self.board.clone(),
                hands,
            });
        }
        self.end_turn()
    }
}
