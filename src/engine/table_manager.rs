use std::collections::HashMap;

use thiserror::Error;

use crate::domain::structure::TableConfig;
use crate::domain::TableId;
use crate::engine::game::{Mode, PokerGame};
use crate::engine::{EngineError, PlayerAction, RandomSource};
use crate::infra::IdGenerator;

/// Ошибки уровня менеджера столов (над движком одного стола).
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("Стол {0} не найден")]
    TableNotFound(TableId),

    #[error("Стол {0} уже существует")]
    TableExists(TableId),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Менеджер столов: независимые `PokerGame` по `TableId`.
///
/// Каждый стол обслуживается строго последовательно; менеджер сам не
/// синхронизирован, владелец решает, как делить его между потоками.
pub struct TableManager {
    tables: HashMap<TableId, PokerGame>,
    ids: IdGenerator,
}

impl Default for TableManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TableManager {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
            ids: IdGenerator::new(),
        }
    }

    /// Открыть ведущий стол по конфигурации. При `id == 0` стол получает
    /// первый свободный номер из генератора.
    pub fn open_table(&mut self, mut config: TableConfig) -> Result<TableId, ManagerError> {
        if config.id == 0 {
            config.id = self.free_table_id();
        }
        let id = config.id;
        if self.tables.contains_key(&id) {
            return Err(ManagerError::TableExists(id));
        }
        let game = PokerGame::new(config, Mode::Authoritative)?;
        self.tables.insert(id, game);
        Ok(id)
    }

    /// Добавить готовый стол (например, зеркальный).
    pub fn add_table(&mut self, game: PokerGame) -> Result<TableId, ManagerError> {
        let id = game.config().id;
        if self.tables.contains_key(&id) {
            return Err(ManagerError::TableExists(id));
        }
        self.tables.insert(id, game);
        Ok(id)
    }

    fn free_table_id(&self) -> TableId {
        loop {
            let id = self.ids.next_table_id();
            if !self.tables.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn close_table(&mut self, table_id: TableId) -> Option<PokerGame> {
        self.tables.remove(&table_id)
    }

    pub fn has_table(&self, table_id: TableId) -> bool {
        self.tables.contains_key(&table_id)
    }

    pub fn table_ids(&self) -> Vec<TableId> {
        let mut ids: Vec<TableId> = self.tables.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn table(&self, table_id: TableId) -> Option<&PokerGame> {
        self.tables.get(&table_id)
    }

    pub fn table_mut(&mut self, table_id: TableId) -> Result<&mut PokerGame, ManagerError> {
        self.tables
            .get_mut(&table_id)
            .ok_or(ManagerError::TableNotFound(table_id))
    }

    /// Начать раздачу: уровень по числу сыгранных раздач, номер - из генератора.
    pub fn begin_turn<R: RandomSource>(&mut self, table_id: TableId, rng: &mut R) -> Result<(), ManagerError> {
        let hand_id = self.ids.next_hand_id();
        let game = self.table_mut(table_id)?;
        let structure = &game.config().structure;
        let stakes = structure.stakes_for_level(structure.level_for(game.hands_count(), 0));
        game.begin_turn(hand_id, stakes, rng)?;
        Ok(())
    }

    pub fn apply_action(&mut self, table_id: TableId, action: &PlayerAction) -> Result<(), ManagerError> {
        self.table_mut(table_id)?.apply_action(action)?;
        Ok(())
    }
}
