//! Рейк: комиссия заведения с банка.
//!
//! Политика решает только сумму. Движок сам ограничивает её банком без
//! несравненной ставки и раскладывает по вкладчикам.

use std::collections::BTreeMap;

use crate::domain::chips::Chips;
use crate::domain::PlayerId;

/// Что известно о раздаче в момент расчёта рейка.
#[derive(Clone, Copy, Debug)]
pub struct RakeContext {
    /// Банк без несравненной ставки.
    pub raked_pot: Chips,
    pub tournament: bool,
    pub players: usize,
    /// Дошла ли раздача до вскрытия.
    pub showdown: bool,
}

pub trait RakePolicy {
    fn rake(&self, ctx: &RakeContext) -> Chips;
}

/// Без рейка.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRake;

impl RakePolicy for NoRake {
    fn rake(&self, _ctx: &RakeContext) -> Chips {
        Chips::ZERO
    }
}

/// Процент от банка (в базисных пунктах) с потолком. В турнирах ноль.
#[derive(Clone, Copy, Debug)]
pub struct PercentRake {
    pub basis_points: u64,
    pub cap: Option<Chips>,
}

impl PercentRake {
    /// Классические 5%.
    pub fn five_percent() -> Self {
        Self {
            basis_points: 500,
            cap: None,
        }
    }
}

impl RakePolicy for PercentRake {
    fn rake(&self, ctx: &RakeContext) -> Chips {
        if ctx.tournament {
            return Chips::ZERO;
        }
        let rake = ctx.raked_pot.mul_div(self.basis_points, 10_000);
        match self.cap {
            Some(cap) => rake.min(cap),
            None => rake,
        }
    }
}

/// Доля рейка на каждого вкладчика.
///
/// Пропорционально вкладу, с округлением вниз; оставшиеся единицы
/// раздаются по одной, начиная с наименьших вкладов (при равенстве -
/// по возрастанию номера игрока).
pub fn apportion_rake(rake: Chips, contributions: &BTreeMap<PlayerId, Chips>) -> BTreeMap<PlayerId, Chips> {
    let total: Chips = contributions.values().sum();
    let mut shares: BTreeMap<PlayerId, Chips> = contributions
        .iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(serial, c)| (*serial, c.mul_div(rake.0, total.0)))
        .collect();
    if rake.is_zero() || shares.is_empty() {
        return shares;
    }

    let distributed: Chips = shares.values().sum();
    let mut left = rake.saturating_sub(distributed);
    let mut order: Vec<(Chips, PlayerId)> = contributions
        .iter()
        .filter(|(_, c)| !c.is_zero())
        .map(|(s, c)| (*c, *s))
        .collect();
    order.sort();

    while !left.is_zero() {
        for (_, serial) in &order {
            if left.is_zero() {
                break;
            }
            if let Some(share) = shares.get_mut(serial) {
                *share += Chips(1);
                left = left.saturating_sub(Chips(1));
            }
        }
    }
    shares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pot: u64, tournament: bool) -> RakeContext {
        RakeContext {
            raked_pot: Chips(pot),
            tournament,
            players: 3,
            showdown: true,
        }
    }

    #[test]
    fn percent_rake_is_capped_and_off_in_tournaments() {
        let policy = PercentRake {
            basis_points: 500,
            cap: Some(Chips(30)),
        };
        assert_eq!(policy.rake(&ctx(100, false)), Chips(5));
        assert_eq!(policy.rake(&ctx(99, false)), Chips(4));
        assert_eq!(policy.rake(&ctx(10_000, false)), Chips(30));
        assert_eq!(policy.rake(&ctx(10_000, true)), Chips::ZERO);
        assert_eq!(NoRake.rake(&ctx(10_000, false)), Chips::ZERO);
    }

    #[test]
    fn leftover_units_go_to_smallest_contributors() {
        let contributions: BTreeMap<PlayerId, Chips> =
            [(1, Chips(10)), (2, Chips(10)), (3, Chips(10))].into_iter().collect();
        let shares = apportion_rake(Chips(2), &contributions);
        assert_eq!(shares[&1], Chips(1));
        assert_eq!(shares[&2], Chips(1));
        assert_eq!(shares[&3], Chips(0));

        let contributions: BTreeMap<PlayerId, Chips> =
            [(1, Chips(60)), (2, Chips(30)), (3, Chips(10))].into_iter().collect();
        let shares = apportion_rake(Chips(7), &contributions);
        // 4.2 / 2.1 / 0.7 → 4 / 2 / 0, остаток 1 - самому маленькому вкладу.
        assert_eq!(shares[&1], Chips(4));
        assert_eq!(shares[&2], Chips(2));
        assert_eq!(shares[&3], Chips(1));
        assert_eq!(shares.values().copied().sum::<Chips>(), Chips(7));
    }
}
