//! Распределение банка: рейк, уровни, победители, неделимые остатки.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::chips::Chips;
use crate::domain::hand::{HandSummary, ShowdownFrame, WinSide};
use crate::domain::PlayerId;
use crate::engine::errors::EngineError;
use crate::engine::game::PokerGame;
use crate::engine::hand_history::HandEventKind;
use crate::engine::positions::index_add;
use crate::engine::rake::{apportion_rake, RakeContext};

impl PokerGame {
    /// Не сбросившие игроки, начиная с первого слева от дилера.
    pub(crate) fn not_fold_from_dealer(&self) -> Vec<PlayerId> {
        let len = self.player_list.len();
        let start = self.dealer.map_or(0, |d| d + 1);
        (0..len)
            .filter_map(|k| self.player_list.get((start + k) % len.max(1)))
            .filter(|s| self.players.get(s).map_or(false, |p| p.is_not_fold()))
            .copied()
            .collect()
    }

    /// Распределить банк. Вызывается один раз за раздачу, после последнего
    /// раунда торговли; результат пишется в журнал одной записью.
    pub(crate) fn distribute_money(&mut self) -> Result<(), EngineError> {
        if self.summary.is_some() {
            return Err(EngineError::Internal("банк этой раздачи уже распределён"));
        }
        let pot = self.pot;
        let uncalled = self.side_pots.uncalled.min(pot);
        let uncalled_serial = self.side_pots.uncalled_serial;
        let contenders = self.not_fold_from_dealer();

        let ctx = RakeContext {
            raked_pot: pot.saturating_sub(uncalled),
            tournament: self.stakes.tournament,
            players: self.side_pots.totals.len(),
            showdown: contenders.len() > 1,
        };
        let rake = self.rake_policy.rake(&ctx).min(ctx.raked_pot);
        let mut raked_contributions = self.side_pots.totals.clone();
        if let Some(serial) = uncalled_serial {
            if let Some(c) = raked_contributions.get_mut(&serial) {
                *c = c.checked_sub(uncalled).ok_or_else(|| {
                    EngineError::Accounting(format!(
                        "несравненная ставка {uncalled} больше вклада игрока {serial}"
                    ))
                })?;
            }
        }
        let rake_by_player = apportion_rake(rake, &raked_contributions);

        let mut summary = HandSummary {
            hand_id: self.hand_id,
            pot,
            rake,
            rake_by_player,
            uncalled,
            uncalled_serial,
            ..HandSummary::default()
        };

        match contenders.as_slice() {
            [] => return Err(EngineError::Internal("в раздаче не осталось ни одного игрока")),
            [winner] => {
                let amount = pot.saturating_sub(rake);
                summary.payouts.insert(*winner, amount);
                summary.winners.push(*winner);
                summary.frames.push(ShowdownFrame::FoldWin {
                    serial: *winner,
                    amount,
                });
                log::debug!("раздача {}: {winner} забирает {amount} без вскрытия", self.hand_id);
            }
            _ => self.resolve_levels(&contenders, rake, &mut summary)?,
        }

        self.apply_summary(summary)?;
        if let Some(summary) = self.summary.clone() {
            self.emit(HandEventKind::PotDistributed { summary });
        }
        Ok(())
    }

    /// Уровни банка от нижнего к верхнему.
    fn resolve_levels(
        &self,
        contenders: &[PlayerId],
        rake: Chips,
        summary: &mut HandSummary,
    ) -> Result<(), EngineError> {
        let levels = self.side_pots.levels_after_rake(rake);
        let mut balance: BTreeMap<PlayerId, Chips> = BTreeMap::new();
        for serial in contenders {
            let index = self.player_ref(*serial)?.side_pot_index;
            let level = levels
                .get(index)
                .copied()
                .ok_or(EngineError::Internal("игрок на несуществующем уровне банка"))?;
            balance.insert(*serial, level);
        }

        let chip_unit = self.config.structure.chip_unit;
        let variant = &self.config.variant;
        let mut winners_all: BTreeSet<PlayerId> = BTreeSet::new();
        let mut chips_left = Chips::ZERO;
        let mut resolves = Vec::new();
        let mut uncalled_frame = None;

        loop {
            let potential: Vec<PlayerId> = contenders
                .iter()
                .filter(|s| balance.get(s).map_or(false, |b| !b.is_zero()))
                .copied()
                .collect();
            match potential.as_slice() {
                [] => break,
                [only] => {
                    let amount = balance.get(only).copied().unwrap_or_default();
                    *summary.payouts.entry(*only).or_default() += amount;
                    balance.insert(*only, Chips::ZERO);
                    uncalled_frame = Some(ShowdownFrame::Uncalled {
                        serial: *only,
                        amount,
                    });
                    break;
                }
                _ => {}
            }

            let pockets: Vec<_> = potential
                .iter()
                .map(|s| self.players.get(s).map(|p| p.hand.known()).unwrap_or_default())
                .collect();
            let by_side = self
                .evaluator
                .winners(&variant.name, &variant.sides, &pockets, &self.board);
            if by_side.is_empty() {
                return Err(EngineError::Internal("оценщик не нашёл победителя ни на одной стороне"));
            }
            let by_side: Vec<(WinSide, Vec<PlayerId>)> = by_side
                .into_iter()
                .map(|(side, idx)| (side, idx.iter().filter_map(|i| potential.get(*i).copied()).collect()))
                .collect();

            let level = by_side
                .iter()
                .flat_map(|(_, w)| w.iter())
                .filter_map(|s| balance.get(s).copied())
                .min()
                .unwrap_or_default();

            let (side_share, mut left) = level.divide(by_side.len(), chip_unit);
            let mut shares: BTreeMap<PlayerId, Chips> = BTreeMap::new();
            for (_, side_winners) in &by_side {
                let (share, rest) = side_share.divide(side_winners.len(), chip_unit);
                left += rest;
                for w in side_winners {
                    *shares.entry(*w).or_default() += share;
                    winners_all.insert(*w);
                }
            }
            for (serial, share) in &shares {
                *summary.payouts.entry(*serial).or_default() += *share;
            }
            chips_left += left;
            // Проигравший с меньшим остатком выбывает с нулём.
            for serial in &potential {
                if let Some(b) = balance.get_mut(serial) {
                    *b = b.saturating_sub(level);
                }
            }
            log::debug!(
                "раздача {}: уровень {level} среди {:?}, остаток {left}",
                self.hand_id,
                potential
            );
            resolves.push(ShowdownFrame::Resolve {
                contenders: potential,
                winners: by_side,
                pot: level,
                shares,
                chips_left: left,
            });
        }

        // Неделимые фишки - игроку слева от дилера, даже если он сбросил.
        if !chips_left.is_zero() {
            let dealer = self.dealer.unwrap_or(0);
            let serial = index_add(&self.player_list, dealer, 1, |_| true)
                .and_then(|i| self.player_list.get(i).copied())
                .ok_or(EngineError::UnresolvableDealer(self.dealer_seat))?;
            *summary.payouts.entry(serial).or_default() += chips_left;
            summary.frames.push(ShowdownFrame::LeftOver {
                serial,
                amount: chips_left,
            });
        }
        summary.frames.extend(uncalled_frame);
        summary.frames.extend(resolves);
        summary.winners = winners_all.into_iter().collect();
        Ok(())
    }

    /// Зачислить выплаты итога раздачи. Общая часть для ведущего и зеркала.
    pub(crate) fn apply_summary(&mut self, summary: HandSummary) -> Result<(), EngineError> {
        let paid: Chips = summary.payouts.values().sum();
        if paid + summary.rake != self.pot || summary.pot != self.pot {
            log::error!(
                "раздача {}: выплаты {paid} + рейк {} не равны банку {}",
                self.hand_id,
                summary.rake,
                self.pot
            );
            return Err(EngineError::Accounting(format!(
                "выплаты {paid} + рейк {} против банка {}",
                summary.rake, self.pot
            )));
        }
        for (serial, amount) in &summary.payouts {
            self.player_mut(*serial)?.money += *amount;
        }
        self.pot = Chips::ZERO;
        self.rake_collected += summary.rake;
        log::info!(
            "раздача {}: банк {} распределён, рейк {}, победители {:?}",
            self.hand_id,
            summary.pot,
            summary.rake,
            summary.winners
        );
        self.summary = Some(summary);
        Ok(())
    }
}
