use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::{HandId, TableId};

/// Генерация ID на основе монотонных счётчиков.
/// Номера раздач уникальны в пределах хоста, а не стола. Номера игроков
/// приходят извне и здесь не выдаются.
#[derive(Debug)]
pub struct IdGenerator {
    table_counter: AtomicU64,
    hand_counter: AtomicU64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator {
    /// Все счётчики начинаются с 1.
    pub fn new() -> Self {
        Self {
            table_counter: AtomicU64::new(1),
            hand_counter: AtomicU64::new(1),
        }
    }

    #[inline]
    pub fn next_table_id(&self) -> TableId {
        self.table_counter.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn next_hand_id(&self) -> HandId {
        self.hand_counter.fetch_add(1, Ordering::Relaxed)
    }
}
