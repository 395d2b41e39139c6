//! Раунды торговли: порядок хода, границы ставок, лимит рейзов, отказы.

use poker_turn_engine::domain::{BettingStructure, Chips, GameState, PlayerId, TableConfig, Variant};
use poker_turn_engine::engine::{
    BetLimits, EngineError, HandEventKind, Mode, PlayerAction, PlayerActionKind, PokerGame, Rejection,
};
use poker_turn_engine::infra::DeterministicRng;

fn config(structure: BettingStructure) -> TableConfig {
    TableConfig {
        id: 7,
        name: "betting".to_string(),
        max_players: 6,
        variant: Variant::holdem(),
        structure,
    }
}

/// Четыре игрока на местах 0..3, блайнды платятся автоматически.
/// Дилер - игрок 1, малый - 2, большой - 3, первым ходит 4.
fn four_handed(structure: BettingStructure) -> PokerGame {
    let mut game = PokerGame::new(config(structure), Mode::Authoritative).unwrap();
    for serial in 1..=4u64 {
        game.add_player(serial, Some((serial - 1) as u8)).unwrap();
        game.pay_buy_in(serial, Chips(1000)).unwrap();
        game.sit(serial).unwrap();
        game.auto_blind_ante(serial, true).unwrap();
    }
    let stakes = game.config().structure.stakes_for_level(1);
    game.begin_turn(1, stakes, &mut DeterministicRng::from_seed(3))
        .unwrap();
    game
}

fn rejection(err: EngineError) -> Rejection {
    err.rejection().cloned().expect("ожидался отказ")
}

fn bets(game: &PokerGame) -> Vec<(PlayerId, Chips)> {
    game.player_list()
        .iter()
        .map(|s| (*s, game.player(*s).unwrap().bet))
        .collect()
}

#[test]
fn preflop_goes_around_and_flop_is_dealt() {
    let mut game = four_handed(BettingStructure::no_limit(10, 20));
    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.serial_in_position(), Some(4));

    game.call(4).unwrap();
    game.call(1).unwrap();
    game.call(2).unwrap();
    assert_eq!(game.serial_in_position(), Some(3));
    assert!(game.can_check(3));
    game.check(3).unwrap();

    assert_eq!(game.state(), GameState::Round(1));
    assert_eq!(game.pot(), Chips(80));
    assert_eq!(game.board().len(), 3);
    assert!(bets(&game).iter().all(|(_, bet)| bet.is_zero()));
    // После флопа первым ходит игрок слева от дилера.
    assert_eq!(game.serial_in_position(), Some(2));
}

#[test]
fn big_blind_may_raise_when_limpers_come_back() {
    let mut game = four_handed(BettingStructure::no_limit(10, 20));
    game.call(4).unwrap();
    game.call(1).unwrap();
    game.call(2).unwrap();
    game.call_n_raise(3, Chips(60)).unwrap();

    // Рейз большого блайнда открывает круг заново.
    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.serial_in_position(), Some(4));
    assert_eq!(game.to_call(4), Chips(60));
    game.fold(4).unwrap();
    game.call(1).unwrap();
    game.call(2).unwrap();

    assert_eq!(game.state(), GameState::Round(1));
    assert_eq!(game.pot(), Chips(20 + 80 * 3));
}

#[test]
fn no_limit_bet_limits() {
    let game = four_handed(BettingStructure::no_limit(10, 20));
    assert_eq!(
        game.bet_limits(4),
        BetLimits {
            min: Chips(40),
            max: Chips(1000),
            to_call: Chips(20),
        }
    );
}

#[test]
fn raise_is_clamped_to_limits() {
    let mut game = four_handed(BettingStructure::no_limit(10, 20));
    game.call_n_raise(4, Chips(1)).unwrap();
    assert_eq!(game.player(4).unwrap().bet, Chips(40));
    assert_eq!(game.last_bet(), Chips(20));

    // Следующий рейз - не меньше предыдущего повышения.
    assert_eq!(game.bet_limits(1).min, Chips(60));
    game.call_n_raise(1, Chips(5000)).unwrap();
    let p1 = game.player(1).unwrap();
    assert_eq!(p1.bet, Chips(1000));
    assert!(p1.all_in);
    assert!(game
        .events()
        .iter()
        .any(|e| e.kind == HandEventKind::AllIn { serial: 1 }));
}

#[test]
fn pot_limit_max_is_pot_after_call() {
    let mut structure = BettingStructure::no_limit(10, 20);
    structure.rounds = vec![poker_turn_engine::domain::BetRule::pot_limit(); 4];
    let game = four_handed(structure);
    // Банк 30 на столе + колл 20: максимум 50 сверху, итого 70.
    assert_eq!(game.bet_limits(4).max, Chips(70));
}

#[test]
fn fixed_limit_cap_stops_raises() {
    // Ставка 10, не больше одного повышения за раунд; блайнды 5/10.
    let mut game = four_handed(BettingStructure::limit(10, 1));
    assert_eq!(game.round_cap_left(), Some(1));

    game.call_n_raise(4, Chips(999)).unwrap();
    assert_eq!(game.player(4).unwrap().bet, Chips(20));
    assert_eq!(game.round_cap_left(), Some(0));
    assert!(!game.can_raise(1));

    let before = game.snapshot();
    let err = game.call_n_raise(1, Chips(20)).unwrap_err();
    assert_eq!(rejection(err), Rejection::RoundCapped);
    assert_eq!(game.snapshot(), before);

    game.call(1).unwrap();
    assert_eq!(game.player(1).unwrap().bet, Chips(20));
}

#[test]
fn rejected_actions_leave_state_untouched() {
    let mut game = four_handed(BettingStructure::no_limit(10, 20));
    let before = game.snapshot();
    let journal = game.events().len();

    assert_eq!(rejection(game.call(1).unwrap_err()), Rejection::NotPlayersTurn(1));
    assert_eq!(rejection(game.check(4).unwrap_err()), Rejection::CannotCheck(4));
    assert_eq!(rejection(game.fold(99).unwrap_err()), Rejection::UnknownPlayer(99));
    assert_eq!(rejection(game.muck(4, true).unwrap_err()), Rejection::NotMuckable(4));
    // Повтор того же отказа ничего не меняет.
    assert_eq!(rejection(game.call(1).unwrap_err()), Rejection::NotPlayersTurn(1));

    assert_eq!(game.snapshot(), before);
    assert_eq!(game.events().len(), journal);
}

#[test]
fn everyone_folds_to_big_blind() {
    let mut game = four_handed(BettingStructure::no_limit(10, 20));
    game.fold(4).unwrap();
    game.fold(1).unwrap();
    game.fold(2).unwrap();

    assert_eq!(game.state(), GameState::End);
    assert_eq!(game.player(3).unwrap().money, Chips(1010));
    assert_eq!(game.player(2).unwrap().money, Chips(990));
    let summary = game.summary().unwrap();
    assert_eq!(summary.winners, vec![3]);
    assert_eq!(summary.uncalled, Chips(10));
    assert_eq!(summary.uncalled_serial, Some(3));
    assert_eq!(game.hands_count(), 1);
}

#[test]
fn typed_actions_dispatch_to_engine() {
    let mut game = four_handed(BettingStructure::no_limit(10, 20));
    game.apply_action(&PlayerAction::new(4, PlayerActionKind::Raise(Chips(100))))
        .unwrap();
    game.apply_action(&PlayerAction::new(1, PlayerActionKind::Fold))
        .unwrap();
    game.apply_action(&PlayerAction::new(2, PlayerActionKind::Call))
        .unwrap();

    assert_eq!(game.player(4).unwrap().bet, Chips(100));
    assert!(game.player(1).unwrap().fold);
    assert_eq!(game.player(2).unwrap().bet, Chips(100));
    assert_eq!(game.serial_in_position(), Some(3));

    let err = game
        .apply_action(&PlayerAction::new(3, PlayerActionKind::Check))
        .unwrap_err();
    assert_eq!(rejection(err), Rejection::CannotCheck(3));
}

#[test]
fn sitting_out_player_is_folded_in_turn() {
    let mut game = four_handed(BettingStructure::no_limit(10, 20));
    game.sit_out_next_turn(1).unwrap();
    game.auto_player(1).unwrap();
    game.call(4).unwrap();

    // Ход игрока 1 пропущен автоигрой.
    assert!(game.player(1).unwrap().fold);
    assert_eq!(game.serial_in_position(), Some(2));
}
