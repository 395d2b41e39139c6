use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Количество фишек в минимальных единицах. Обёртка над u64, чтобы не путать
/// с индексами и счётчиками. Вся математика банка целочисленная.
///
/// Оператора `-` нет: вычитание всегда явное, `checked_sub` там, где
/// отрицательный результат означает ошибку учёта, `saturating_sub` там,
/// где ноль и есть нужный ответ.
#[derive(
    Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Chips(pub u64);

impl Chips {
    pub const ZERO: Chips = Chips(0);

    pub fn new(amount: u64) -> Self {
        Chips(amount)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Безопасное вычитание, не даёт уйти в минус.
    pub fn saturating_sub(self, other: Chips) -> Chips {
        Chips(self.0.saturating_sub(other.0))
    }

    /// Вычитание с проверкой: `None`, если результат был бы отрицательным.
    /// Движок превращает `None` в фатальную ошибку учёта банка.
    pub fn checked_sub(self, other: Chips) -> Option<Chips> {
        self.0.checked_sub(other.0).map(Chips)
    }

    /// `self * numerator / denominator` без переполнения (через u128).
    pub fn mul_div(self, numerator: u64, denominator: u64) -> Chips {
        if denominator == 0 {
            return Chips::ZERO;
        }
        let value = (self.0 as u128) * (numerator as u128) / (denominator as u128);
        Chips(value as u64)
    }

    /// Делит сумму на `parts` равных долей, кратных `unit`.
    /// Возвращает (доля, остаток); `доля * parts + остаток == self`.
    pub fn divide(self, parts: usize, unit: Chips) -> (Chips, Chips) {
        if parts == 0 {
            return (Chips::ZERO, self);
        }
        let unit = unit.0.max(1);
        let units = self.0 / unit;
        let share = (units / parts as u64) * unit;
        let left = self.0 - share * parts as u64;
        (Chips(share), Chips(left))
    }
}

impl fmt::Display for Chips {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Chips {
    type Output = Chips;

    fn add(self, rhs: Chips) -> Self::Output {
        Chips(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Chips {
    fn add_assign(&mut self, rhs: Chips) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Sum for Chips {
    fn sum<I: Iterator<Item = Chips>>(iter: I) -> Self {
        iter.fold(Chips::ZERO, |acc, c| acc + c)
    }
}

impl<'a> Sum<&'a Chips> for Chips {
    fn sum<I: Iterator<Item = &'a Chips>>(iter: I) -> Self {
        iter.fold(Chips::ZERO, |acc, c| acc + *c)
    }
}
