//! Сайд-поты.
//!
//! Банк хранится как список уровней. `amount` - фишки, лежащие именно
//! на этом уровне; `total` - сумма всех уровней до него включительно,
//! поэтому `total` последнего уровня равен всему банку.
//! Вклады учитываются по раундам и уровням; на фазе блайндов/анте
//! вклады пишутся в раунд 0, и первый раунд торговли их наследует.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::chips::Chips;
use crate::domain::player::Player;
use crate::domain::PlayerId;
use crate::engine::errors::EngineError;

/// Уровень банка.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PotLevel {
    pub amount: Chips,
    pub total: Chips,
}

/// Вклады одного раунда: уровень → игрок → фишки.
pub type RoundContributions = BTreeMap<usize, BTreeMap<PlayerId, Chips>>;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidePots {
    pub pots: Vec<PotLevel>,
    /// Раунд → уровень → игрок → фишки.
    pub contributions: BTreeMap<usize, RoundContributions>,
    /// Всё, что игрок внёс за раздачу (включая мёртвые деньги).
    pub totals: BTreeMap<PlayerId, Chips>,
    /// Ставка, которую никто не уравнял в последнем раунде.
    pub uncalled: Chips,
    pub uncalled_serial: Option<PlayerId>,
}

impl Default for SidePots {
    fn default() -> Self {
        Self {
            pots: vec![PotLevel::default()],
            contributions: BTreeMap::new(),
            totals: BTreeMap::new(),
            uncalled: Chips::ZERO,
            uncalled_serial: None,
        }
    }
}

impl SidePots {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_index(&self) -> usize {
        self.pots.len().saturating_sub(1)
    }

    /// Весь банк по учёту уровней.
    pub fn total(&self) -> Chips {
        self.pots.last().map(|p| p.total).unwrap_or_default()
    }

    /// Записать вклад игрока в последний уровень.
    pub fn add(&mut self, round: usize, serial: PlayerId, amount: Chips) {
        let index = self.last_index();
        if let Some(pot) = self.pots.last_mut() {
            pot.amount += amount;
            pot.total += amount;
        }
        *self
            .contributions
            .entry(round)
            .or_default()
            .entry(index)
            .or_default()
            .entry(serial)
            .or_default() += amount;
        *self.totals.entry(serial).or_default() += amount;
    }

    /// Сколько игрок внёс в раунде (по всем уровням).
    pub fn round_contribution(&self, round: usize, serial: PlayerId) -> Chips {
        self.contributions
            .get(&round)
            .map(|levels| levels.values().filter_map(|c| c.get(&serial)).sum())
            .unwrap_or_default()
    }

    /// Игроки, внёсшие что-то в последний уровень в этом раунде.
    pub fn players_in_last_pot(&self, round: usize) -> usize {
        self.contributions
            .get(&round)
            .and_then(|levels| levels.get(&self.last_index()))
            .map(|c| c.len())
            .unwrap_or(0)
    }

    /// Несравненная ставка раунда: единственный не сбросивший игрок
    /// с наибольшим вкладом получает право на разницу со вторым вкладом.
    pub fn update_uncalled(&mut self, round: usize, players: &BTreeMap<PlayerId, Player>) {
        self.uncalled = Chips::ZERO;
        self.uncalled_serial = None;

        let mut by_player: Vec<(Chips, PlayerId)> = players
            .keys()
            .map(|serial| (self.round_contribution(round, *serial), *serial))
            .filter(|(amount, _)| !amount.is_zero())
            .collect();
        by_player.sort_by(|a, b| b.cmp(a));

        let Some(&(top, serial)) = by_player.first() else {
            return;
        };
        let second = by_player.get(1).map(|(c, _)| *c).unwrap_or_default();
        if top == second {
            return;
        }
        if players.get(&serial).map_or(true, |p| p.fold) {
            return;
        }
        self.uncalled = top.saturating_sub(second);
        self.uncalled_serial = Some(serial);
    }

    /// Разбить последний уровень по олл-инам этого раунда.
    ///
    /// Олл-ины обрабатываются от меньшего вклада к большему. Всё, что
    /// превышает вклад олл-ина, уходит на новый уровень вместе с игроками,
    /// которые ещё могут ставить.
    pub fn make_side_pots(
        &mut self,
        round: usize,
        players: &mut BTreeMap<PlayerId, Player>,
        player_list: &[PlayerId],
    ) -> Result<(), EngineError> {
        let start_index = self.last_index();
        let mut all_ins: Vec<(Chips, PlayerId)> = player_list
            .iter()
            .filter_map(|serial| players.get(serial))
            .filter(|p| p.all_in && p.side_pot_index == start_index)
            .map(|p| {
                let amount = self
                    .contributions
                    .get(&round)
                    .and_then(|levels| levels.get(&start_index))
                    .and_then(|c| c.get(&p.serial))
                    .copied()
                    .unwrap_or_default();
                (amount, p.serial)
            })
            .collect();
        if all_ins.is_empty() {
            return Ok(());
        }
        all_ins.sort();

        let round_levels = self.contributions.entry(round).or_default();
        for (_, serial) in all_ins {
            let pot_index = self.pots.len() - 1;
            let Some(level) = round_levels.get_mut(&pot_index) else {
                continue;
            };
            // Двое олл-инов на одну и ту же сумму: второй уже разобран.
            let Some(&threshold) = level.get(&serial) else {
                continue;
            };
            // Олл-ин с самым большим стеком: делить не с кем.
            if level.len() == 1 {
                break;
            }

            let new_index = pot_index + 1;
            let mut moved: BTreeMap<PlayerId, Chips> = BTreeMap::new();
            let mut reassigned = false;
            for (other, contribution) in level.iter_mut() {
                let Some(other_player) = players.get_mut(other) else {
                    continue;
                };
                if *contribution > threshold {
                    moved.insert(*other, contribution.saturating_sub(threshold));
                    *contribution = threshold;
                    other_player.side_pot_index = new_index;
                    reassigned = true;
                } else if *contribution == threshold && !other_player.all_in && !other_player.fold {
                    other_player.side_pot_index = new_index;
                    reassigned = true;
                }
            }
            if !reassigned {
                continue;
            }

            let moved_amount: Chips = moved.values().sum();
            let Some(pot) = self.pots.last_mut() else {
                return Err(EngineError::Internal("сайд-поты без уровней"));
            };
            let (Some(amount), Some(total)) = (
                pot.amount.checked_sub(moved_amount),
                pot.total.checked_sub(moved_amount),
            ) else {
                return Err(EngineError::Accounting(format!(
                    "уровень #{pot_index}: {} на уровне, а переносится {moved_amount}",
                    pot.amount
                )));
            };
            pot.amount = amount;
            pot.total = total;
            let new_pot = PotLevel {
                amount: moved_amount,
                total: total + moved_amount,
            };
            log::debug!(
                "сайд-пот #{new_index}: олл-ин {serial} на {threshold}, сверху {moved_amount}"
            );
            round_levels.insert(new_index, moved);
            self.pots.push(new_pot);
        }
        Ok(())
    }

    /// Нарастающие суммы уровней после снятия рейка с нижних уровней.
    /// `result[i]` - сколько разыгрывается среди претендентов уровня `i`.
    pub fn levels_after_rake(&self, rake: Chips) -> Vec<Chips> {
        let mut left = rake;
        let mut running = Chips::ZERO;
        self.pots
            .iter()
            .map(|pot| {
                let take = pot.amount.min(left);
                left = left.saturating_sub(take);
                running += pot.amount.saturating_sub(take);
                running
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(serial: PlayerId) -> Player {
        let mut p = Player::new(serial, serial as u8);
        p.sit_out = false;
        p
    }

    #[test]
    fn levels_after_rake_takes_from_bottom() {
        let mut pots = SidePots::new();
        pots.pots = vec![
            PotLevel {
                amount: Chips(30),
                total: Chips(30),
            },
            PotLevel {
                amount: Chips(20),
                total: Chips(50),
            },
        ];
        assert_eq!(pots.levels_after_rake(Chips(35)), vec![Chips(0), Chips(15)]);
        assert_eq!(pots.levels_after_rake(Chips::ZERO), vec![Chips(30), Chips(50)]);
    }

    #[test]
    fn uncalled_needs_unique_top() {
        let mut players: BTreeMap<PlayerId, Player> = (1..=3).map(|s| (s, player(s))).collect();
        let mut pots = SidePots::new();
        pots.add(0, 1, Chips(100));
        pots.add(0, 2, Chips(40));
        pots.update_uncalled(0, &players);
        assert_eq!(pots.uncalled, Chips(60));
        assert_eq!(pots.uncalled_serial, Some(1));

        pots.add(0, 3, Chips(100));
        pots.update_uncalled(0, &players);
        assert_eq!(pots.uncalled, Chips::ZERO);

        if let Some(p) = players.get_mut(&1) {
            p.fold = true;
        }
        pots.add(0, 1, Chips(10));
        pots.update_uncalled(0, &players);
        assert_eq!(pots.uncalled_serial, None);
    }

    #[test]
    fn level_smaller_than_moved_excess_is_an_accounting_error() {
        let mut players: BTreeMap<PlayerId, Player> = (1..=2).map(|s| (s, player(s))).collect();
        if let Some(p) = players.get_mut(&2) {
            p.all_in = true;
        }
        let mut pots = SidePots::new();
        pots.add(0, 1, Chips(100));
        pots.add(0, 2, Chips(50));
        pots.pots[0] = PotLevel {
            amount: Chips(20),
            total: Chips(20),
        };

        let err = pots.make_side_pots(0, &mut players, &[1, 2]).unwrap_err();
        assert!(matches!(err, EngineError::Accounting(_)));
    }

    #[test]
    fn all_in_for_less_opens_a_new_level() {
        let mut players: BTreeMap<PlayerId, Player> = (1..=3).map(|s| (s, player(s))).collect();
        if let Some(p) = players.get_mut(&2) {
            p.all_in = true;
        }
        let mut pots = SidePots::new();
        pots.add(0, 1, Chips(100));
        pots.add(0, 2, Chips(40));
        pots.add(0, 3, Chips(100));

        pots.make_side_pots(0, &mut players, &[1, 2, 3]).unwrap();
        assert_eq!(
            pots.pots,
            vec![
                PotLevel {
                    amount: Chips(120),
                    total: Chips(120),
                },
                PotLevel {
                    amount: Chips(120),
                    total: Chips(240),
                },
            ]
        );
        assert_eq!(players[&1].side_pot_index, 1);
        assert_eq!(players[&2].side_pot_index, 0);
        assert_eq!(players[&3].side_pot_index, 1);
    }
}
