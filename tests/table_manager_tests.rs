//! Несколько независимых столов под одним менеджером.

use poker_turn_engine::domain::{BettingStructure, Chips, GameState, TableConfig, Variant};
use poker_turn_engine::engine::{
    EngineError, ManagerError, Mode, PlayerAction, PlayerActionKind, PokerGame, Rejection, TableManager,
};
use poker_turn_engine::infra::{DeterministicRng, IdGenerator};

fn config(id: u64) -> TableConfig {
    TableConfig {
        id,
        name: format!("table-{id}"),
        max_players: 6,
        variant: Variant::holdem(),
        structure: BettingStructure::no_limit(10, 20),
    }
}

fn seat_two(game: &mut PokerGame) {
    for serial in [1, 2] {
        game.add_player(serial, None).unwrap();
        game.pay_buy_in(serial, Chips(500)).unwrap();
        game.sit(serial).unwrap();
        game.auto_blind_ante(serial, true).unwrap();
    }
}

#[test]
fn tables_are_opened_and_closed_by_id() {
    let mut manager = TableManager::new();
    assert_eq!(manager.open_table(config(2)).unwrap(), 2);
    assert_eq!(manager.open_table(config(1)).unwrap(), 1);
    assert!(matches!(manager.open_table(config(1)), Err(ManagerError::TableExists(1))));
    assert_eq!(manager.table_ids(), vec![1, 2]);

    let mirror = PokerGame::new(config(3), Mode::Mirror).unwrap();
    manager.add_table(mirror).unwrap();
    assert_eq!(manager.table(3).unwrap().mode(), Mode::Mirror);

    assert!(manager.close_table(2).is_some());
    assert!(!manager.has_table(2));
    assert!(matches!(manager.table_mut(2), Err(ManagerError::TableNotFound(2))));
}

#[test]
fn hands_on_different_tables_do_not_interfere() {
    let mut manager = TableManager::default();
    manager.open_table(config(1)).unwrap();
    manager.open_table(config(2)).unwrap();
    seat_two(manager.table_mut(1).unwrap());
    seat_two(manager.table_mut(2).unwrap());

    let mut rng = DeterministicRng::from_seed(42);
    manager.begin_turn(1, &mut rng).unwrap();
    manager.begin_turn(2, &mut rng).unwrap();
    assert_ne!(manager.table(1).unwrap().hand_id(), manager.table(2).unwrap().hand_id());

    // Один на один первым ходит дилер - игрок 1.
    manager
        .apply_action(1, &PlayerAction::new(1, PlayerActionKind::Fold))
        .unwrap();
    assert_eq!(manager.table(1).unwrap().state(), GameState::End);
    assert_eq!(manager.table(2).unwrap().state(), GameState::Round(0));

    let err = manager
        .apply_action(2, &PlayerAction::new(2, PlayerActionKind::Call))
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Engine(EngineError::Rejected(Rejection::NotPlayersTurn(2)))
    ));
    assert!(matches!(
        manager.begin_turn(9, &mut rng),
        Err(ManagerError::TableNotFound(9))
    ));
}

#[test]
fn id_generator_counts_from_one() {
    let ids = IdGenerator::new();
    assert_eq!(ids.next_hand_id(), 1);
    assert_eq!(ids.next_hand_id(), 2);
    assert_eq!(ids.next_table_id(), 1);
}

#[test]
fn table_without_id_gets_first_free_number() {
    let mut manager = TableManager::new();
    manager.open_table(config(1)).unwrap();

    let id = manager.open_table(config(0)).unwrap();
    assert_eq!(id, 2);
    assert_eq!(manager.table(2).unwrap().config().id, 2);
    assert_eq!(manager.open_table(config(0)).unwrap(), 3);
    assert_eq!(manager.table_ids(), vec![1, 2, 3]);
}
