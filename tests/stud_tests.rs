//! Стад: анте вместо блайндов, первый ход по открытым картам,
//! нехватка колоды.

use poker_turn_engine::domain::{
    parse_cards, Ante, BetRule, BettingStructure, Chips, Deck, GameState, PlayerId, Schedule, TableConfig,
    Variant,
};
use poker_turn_engine::engine::{EngineError, HandEventKind, Mode, PokerGame};
use poker_turn_engine::infra::DeterministicRng;

/// Семикарточный стад без лимита, анте 5, без блайндов.
fn config(max_players: usize) -> TableConfig {
    TableConfig {
        id: 7,
        name: "stud".to_string(),
        max_players,
        variant: Variant::stud7(),
        structure: BettingStructure {
            name: "stud-ante-5".to_string(),
            blinds: None,
            ante: Some(Ante {
                value: Chips(5),
                bring_in: Chips::ZERO,
            }),
            schedule: Schedule::Fixed,
            rounds: vec![BetRule::no_limit(); 5],
            buy_in: Chips(100),
            max_buy_in: Chips(10_000),
            chip_unit: Chips(1),
        },
    }
}

/// Игроки на местах 0, 1, 2... со стеком 1000.
fn table(serials: &[PlayerId], auto: bool) -> PokerGame {
    let mut game = PokerGame::new(config(10), Mode::Authoritative).unwrap();
    for (seat, serial) in serials.iter().enumerate() {
        game.add_player(*serial, Some(seat as u8)).unwrap();
        game.pay_buy_in(*serial, Chips(1000)).unwrap();
        game.sit(*serial).unwrap();
        game.auto_blind_ante(*serial, auto).unwrap();
    }
    game
}

fn check_down(game: &mut PokerGame) {
    while let (GameState::Round(_), Some(serial)) = (game.state(), game.serial_in_position()) {
        game.check(serial).unwrap();
    }
}

#[test]
fn antes_are_requested_in_turn_and_go_to_the_pot() {
    let mut game = table(&[1, 2, 3], false);
    let stakes = game.config().structure.stakes_for_level(1);
    game.begin_turn(1, stakes, &mut DeterministicRng::from_seed(3)).unwrap();

    assert_eq!(game.state(), GameState::BlindAnte);
    assert_eq!(game.serial_in_position(), Some(1));
    assert_eq!(
        game.events().last().map(|e| e.kind.clone()),
        Some(HandEventKind::AnteRequest {
            serial: 1,
            amount: Chips(5)
        })
    );

    game.ante(1).unwrap();
    assert_eq!(game.serial_in_position(), Some(2));
    game.ante(2).unwrap();
    game.ante(3).unwrap();

    assert_eq!(game.state(), GameState::Round(0));
    // Анте - мёртвые деньги: сразу в банке, ставкой не считаются.
    assert_eq!(game.pot(), Chips(15));
    for serial in 1..=3 {
        let p = game.player(serial).unwrap();
        assert_eq!(p.money, Chips(995));
        assert_eq!(p.bet, Chips::ZERO);
        assert_eq!(p.dead, Chips(5));
        assert_eq!(game.side_pots().round_contribution(0, serial), Chips(5));
    }
    let paid: Vec<PlayerId> = game
        .events()
        .iter()
        .filter_map(|e| match e.kind {
            HandEventKind::AntePaid { serial, amount } if amount == Chips(5) => Some(serial),
            _ => None,
        })
        .collect();
    assert_eq!(paid, vec![1, 2, 3]);
}

#[test]
fn lowest_upcard_opens_third_street_and_best_board_opens_later() {
    let mut game = table(&[1, 2, 3], true);
    // Третья улица: по две закрытые, затем по одной открытой (Kh, 3s, 9d).
    // Четвёртая: Kd, 4c, 9s. Дальше - по карте на пятую, шестую и седьмую.
    let deck = Deck::stacked(
        parse_cards("2c 2d 2h 3c 3d 3h Kh 3s 9d Kd 4c 9s 5c 6c 7c 5d 6d 7d 5h 6h 7h").unwrap(),
    );
    let stakes = game.config().structure.stakes_for_level(1);
    game.begin_turn_with_deck(1, stakes, deck).unwrap();

    assert_eq!(game.state(), GameState::Round(0));
    assert_eq!(game.pot(), Chips(15));
    assert_eq!(game.serial_in_position(), Some(2));
    game.check(2).unwrap();
    game.check(3).unwrap();
    game.check(1).unwrap();

    assert_eq!(game.state(), GameState::Round(1));
    // Открытая пара королей старше пары девяток.
    assert_eq!(game.serial_in_position(), Some(1));

    check_down(&mut game);
    assert_eq!(game.state(), GameState::End);
    assert!(game.players().all(|p| p.hand.len() == 7));
    assert_eq!(game.chips_on_table(), Chips(3000));
}

/// Десятерым не хватает 52 карт на семь улиц: шестая и седьмая
/// сдаются одной общей картой каждая.
#[test]
fn short_deck_turns_last_streets_into_board_cards() {
    let serials: Vec<PlayerId> = (1..=10).collect();
    let mut game = table(&serials, true);
    let stakes = game.config().structure.stakes_for_level(1);
    game.begin_turn(1, stakes, &mut DeterministicRng::from_seed(10)).unwrap();
    assert_eq!(game.pot(), Chips(50));

    check_down(&mut game);

    assert_eq!(game.state(), GameState::End);
    assert_eq!(game.board().len(), 2);
    assert!(game.players().all(|p| p.hand.len() == 5));
    assert_eq!(game.chips_on_table(), Chips(10_000));

    let last_deal = game.events().iter().rev().find_map(|e| match &e.kind {
        HandEventKind::CardsDealt { round, plan, .. } => Some((*round, plan.clone())),
        _ => None,
    });
    let (round, plan) = last_deal.unwrap();
    assert_eq!(round, 4);
    assert_eq!((plan[3].up, plan[3].board), (0, 1));
    assert_eq!((plan[4].down, plan[4].board), (0, 1));
    assert_eq!(plan[4].hand_size, 5);
    assert_eq!(plan[4].board_size, 2);
    // Конфигурация стола не тронута.
    assert_eq!(game.config().variant.rounds[4].down, 1);
}

/// Общие карты превращать уже не во что: колода кончилась.
#[test]
fn empty_deck_cannot_deal_the_flop() {
    let config = TableConfig {
        id: 8,
        name: "short-deck".to_string(),
        max_players: 2,
        variant: Variant::holdem(),
        structure: BettingStructure::no_limit(10, 20),
    };
    let mut game = PokerGame::new(config, Mode::Authoritative).unwrap();
    for serial in [1, 2] {
        game.add_player(serial, None).unwrap();
        game.pay_buy_in(serial, Chips(1000)).unwrap();
        game.sit(serial).unwrap();
        game.auto_blind_ante(serial, true).unwrap();
    }
    let stakes = game.config().structure.stakes_for_level(1);
    let deck = Deck::stacked(parse_cards("Ah Kh Qh Jh").unwrap());
    game.begin_turn_with_deck(1, stakes, deck).unwrap();

    game.call(1).unwrap();
    let err = game.check(2).unwrap_err();
    assert!(matches!(err, EngineError::DeckExhausted));
}
