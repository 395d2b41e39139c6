//! Фаза блайндов и анте: кто что платит, запросы, догоняющие блайнды,
//! отмена раздачи.

use poker_turn_engine::domain::{
    BettingStructure, BlindDuty, Chips, GameState, PlayerId, SeatIndex, TableConfig, Variant, WaitFor,
};
use poker_turn_engine::engine::{EngineError, HandEventKind, Mode, PokerGame, Rejection};
use poker_turn_engine::infra::DeterministicRng;

/// Холдем 10/20 без лимита на `max_players` мест.
fn config(max_players: usize) -> TableConfig {
    TableConfig {
        id: 1,
        name: "blinds".to_string(),
        max_players,
        variant: Variant::holdem(),
        structure: BettingStructure::no_limit(10, 20),
    }
}

/// Посадить игроков `(serial, seat)` со стеком 1000.
fn table(max_players: usize, seats: &[(PlayerId, SeatIndex)], auto: bool) -> PokerGame {
    let mut game = PokerGame::new(config(max_players), Mode::Authoritative).unwrap();
    for (serial, seat) in seats {
        game.add_player(*serial, Some(*seat)).unwrap();
        game.pay_buy_in(*serial, Chips(1000)).unwrap();
        game.sit(*serial).unwrap();
        game.auto_blind_ante(*serial, auto).unwrap();
    }
    game
}

fn begin(game: &mut PokerGame, hand_id: u64) {
    let stakes = game.config().structure.stakes_for_level(1);
    game.begin_turn(hand_id, stakes, &mut DeterministicRng::from_seed(hand_id))
        .unwrap();
}

/// Все по очереди сбрасывают, пока не останется один.
fn fold_to_winner(game: &mut PokerGame) {
    while let (GameState::Round(_), Some(serial)) = (game.state(), game.serial_in_position()) {
        game.fold(serial).unwrap();
    }
}

fn rejection(err: EngineError) -> Rejection {
    err.rejection().cloned().expect("ожидался отказ, а не фатальная ошибка")
}

#[test]
fn four_players_small_and_big_left_of_dealer() {
    let mut game = table(10, &[(1, 0), (2, 1), (3, 2), (4, 3)], false);
    begin(&mut game, 1);

    assert_eq!(game.state(), GameState::BlindAnte);
    assert_eq!(game.dealer_seat(), Some(0));
    assert_eq!(game.player(2).unwrap().blind, BlindDuty::Small);
    assert_eq!(game.player(3).unwrap().blind, BlindDuty::Big);
    assert_eq!(game.player(4).unwrap().blind, BlindDuty::Exempt);
    assert_eq!(game.player(1).unwrap().blind, BlindDuty::Exempt);

    assert_eq!(game.serial_in_position(), Some(2));
    let last = game.events().last().map(|e| e.kind.clone());
    assert_eq!(
        last,
        Some(HandEventKind::BlindRequest {
            serial: 2,
            amount: Chips(10),
            dead: Chips::ZERO,
            duty: BlindDuty::Small,
        })
    );

    game.blind(2).unwrap();
    assert_eq!(game.serial_in_position(), Some(3));
    game.blind(3).unwrap();

    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.player(2).unwrap().bet, Chips(10));
    assert_eq!(game.player(3).unwrap().bet, Chips(20));
    // Первым говорит игрок после большого блайнда.
    assert_eq!(game.serial_in_position(), Some(4));
    assert!(game.player_list().iter().all(|s| game.player(*s).unwrap().hand.len() == 2));
}

#[test]
fn blind_out_of_turn_is_rejected_without_changes() {
    let mut game = table(10, &[(1, 0), (2, 1), (3, 2), (4, 3)], false);
    begin(&mut game, 1);
    let before = game.snapshot();
    let events = game.events().len();

    let err = game.blind(3).unwrap_err();
    assert_eq!(rejection(err), Rejection::NotPlayersTurn(3));
    let err = game.call(4).unwrap_err();
    assert_eq!(rejection(err), Rejection::BlindAntePhase);
    let err = game.ante(2).unwrap_err();
    assert_eq!(rejection(err), Rejection::NothingDue(2));

    assert_eq!(game.snapshot(), before);
    assert_eq!(game.events().len(), events);
}

#[test]
fn heads_up_dealer_posts_small_and_acts_first() {
    let mut game = table(6, &[(1, 0), (2, 3)], true);
    begin(&mut game, 1);

    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.player(1).unwrap().bet, Chips(10));
    assert_eq!(game.player(2).unwrap().bet, Chips(20));
    assert_eq!(game.serial_in_position(), Some(1));

    game.call(1).unwrap();
    game.check(2).unwrap();
    assert_eq!(game.state(), GameState::Round(1));
    assert_eq!(game.board().len(), 3);
    // После флопа первым говорит не дилер.
    assert_eq!(game.serial_in_position(), Some(2));
}

/// Дилер встал на блайндах: в раздаче двое, но ходят они как за полным
/// столом - малый первым, большой с правом последнего слова.
#[test]
fn small_blind_acts_first_when_dealer_leaves_during_blinds() {
    let mut game = table(10, &[(1, 0), (2, 1), (3, 2)], false);
    begin(&mut game, 1);
    assert_eq!(game.serial_in_position(), Some(2));

    assert!(game.sit_out(1).unwrap());
    game.blind(2).unwrap();
    game.blind(3).unwrap();

    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.player_list(), &[2, 3]);
    assert!(!game.is_heads_up());
    assert_eq!(game.serial_in_position(), Some(2));

    game.call(2).unwrap();
    assert_eq!(game.serial_in_position(), Some(3));
    assert!(game.can_raise(3));
    game.check(3).unwrap();
    assert_eq!(game.state(), GameState::Round(1));
}

/// Новичок ждёт догоняющего блайнда, раздача остаётся на двоих.
#[test]
fn big_blind_keeps_option_when_newcomer_waits() {
    let mut game = table(4, &[(1, 0), (2, 2)], true);
    begin(&mut game, 1);
    fold_to_winner(&mut game);

    game.add_player(3, Some(3)).unwrap();
    game.pay_buy_in(3, Chips(1000)).unwrap();
    game.sit(3).unwrap();
    game.auto_blind_ante(3, true).unwrap();
    begin(&mut game, 2);

    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.dealer_seat(), Some(2));
    assert_eq!(game.player_list(), &[1, 2]);
    assert_eq!(game.player(3).unwrap().wait_for, Some(WaitFor::Late));
    assert_eq!(game.player(1).unwrap().bet, Chips(10));
    assert_eq!(game.player(2).unwrap().bet, Chips(20));
    assert_eq!(game.serial_in_position(), Some(1));

    game.call(1).unwrap();
    assert_eq!(game.serial_in_position(), Some(2));
    assert!(game.can_raise(2));
    game.check(2).unwrap();
    assert_eq!(game.state(), GameState::Round(1));
}

#[test]
fn newcomer_posts_late_blind() {
    let mut game = table(10, &[(1, 0), (2, 1), (3, 2), (4, 3)], true);
    begin(&mut game, 1);
    fold_to_winner(&mut game);
    assert_eq!(game.state(), GameState::End);
    assert_eq!(game.player(3).unwrap().money, Chips(1010));

    game.add_player(5, Some(4)).unwrap();
    game.pay_buy_in(5, Chips(1000)).unwrap();
    game.sit(5).unwrap();
    game.auto_blind_ante(5, true).unwrap();
    begin(&mut game, 2);

    assert_eq!(game.dealer_seat(), Some(1));
    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.player(3).unwrap().bet, Chips(10));
    assert_eq!(game.player(4).unwrap().bet, Chips(20));
    let newcomer = game.player(5).unwrap();
    assert_eq!(newcomer.blind, BlindDuty::Posted);
    assert_eq!(newcomer.bet, Chips(20));
    assert_eq!(newcomer.missed_blind, None);
}

#[test]
fn newcomer_may_wait_for_big_blind() {
    let mut game = table(10, &[(1, 0), (2, 1), (3, 2), (4, 3)], true);
    begin(&mut game, 1);
    fold_to_winner(&mut game);

    game.add_player(5, Some(4)).unwrap();
    game.pay_buy_in(5, Chips(1000)).unwrap();
    game.sit(5).unwrap();
    begin(&mut game, 2);

    assert_eq!(game.state(), GameState::BlindAnte);
    assert_eq!(game.serial_in_position(), Some(5));
    assert_eq!(game.player(5).unwrap().blind, BlindDuty::Late);

    game.wait_big_blind(5).unwrap();
    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.player_list(), &[1, 2, 3, 4]);
    assert_eq!(game.player(5).unwrap().wait_for, Some(WaitFor::Big));
    assert!(game
        .events()
        .iter()
        .any(|e| e.kind == HandEventKind::WaitFor { serial: 5, reason: WaitFor::Big }));
}

/// Пропустивший малый блайнд при семи игроках платит большой и малый мёртвыми.
#[test]
fn missed_blind_with_six_or_more_is_big_and_dead() {
    let seats: Vec<(PlayerId, SeatIndex)> = (1..=7).map(|s| (s, (s - 1) as SeatIndex)).collect();
    let mut game = table(10, &seats, true);
    game.sit_out(2).unwrap();
    begin(&mut game, 1);
    assert_eq!(game.player(3).unwrap().blind, BlindDuty::Posted);
    assert_eq!(game.player(3).unwrap().bet, Chips(10));
    fold_to_winner(&mut game);
    assert!(game.player(2).unwrap().missed_blind.is_some());

    game.sit(2).unwrap();
    begin(&mut game, 2);

    assert_eq!(game.dealer_seat(), Some(2));
    let p = game.player(2).unwrap();
    assert_eq!(p.blind, BlindDuty::Posted);
    assert_eq!(p.bet, Chips(20));
    assert_eq!(p.dead, Chips(10));
    assert_eq!(p.money, Chips(970));
    assert_eq!(game.pot(), Chips(10));
}

#[test]
fn missed_blind_with_few_players_is_big_only() {
    let mut game = table(10, &[(1, 0), (2, 1), (3, 2), (4, 3)], true);
    game.sit_out(2).unwrap();
    begin(&mut game, 1);
    fold_to_winner(&mut game);

    game.sit(2).unwrap();
    begin(&mut game, 2);

    let p = game.player(2).unwrap();
    assert_eq!(p.bet, Chips(20));
    assert_eq!(p.dead, Chips::ZERO);
    assert_eq!(game.pot(), Chips::ZERO);
}

#[test]
fn hand_canceled_when_only_one_player_left() {
    let mut game = table(6, &[(1, 0), (2, 1)], false);
    begin(&mut game, 1);
    assert_eq!(game.serial_in_position(), Some(1));
    game.blind(1).unwrap();
    assert_eq!(game.serial_in_position(), Some(2));

    assert!(game.sit_out(2).unwrap());
    assert_eq!(game.state(), GameState::Canceled);
    assert_eq!(game.player(1).unwrap().money, Chips(1000));
    assert_eq!(game.player(2).unwrap().money, Chips(1000));
    assert_eq!(game.pot(), Chips::ZERO);
    assert!(game.events().iter().any(|e| matches!(
        e.kind,
        HandEventKind::Canceled {
            serial: Some(1),
            amount: Chips(10)
        }
    )));
}

#[test]
fn begin_turn_needs_two_sitting_players() {
    let mut game = table(6, &[(1, 0)], true);
    let stakes = game.config().structure.stakes_for_level(1);
    let err = game
        .begin_turn(1, stakes, &mut DeterministicRng::from_seed(1))
        .unwrap_err();
    assert_eq!(rejection(err), Rejection::NotEnoughPlayers);
    assert_eq!(game.state(), GameState::Idle);
}
