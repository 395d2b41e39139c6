//! Арифметика позиций.
//!
//! Позиция - индекс в списке игроков раздачи (`player_list`), список
//! упорядочен по местам и не меняется в течение раунда торговли.

use std::collections::BTreeMap;

use crate::domain::player::Player;
use crate::domain::{PlayerId, SeatIndex};

/// Сдвиг индекса на `step` подходящих игроков по кругу (отрицательный - назад).
///
/// `None`, если список пуст или ни один игрок не подходит.
pub fn index_add<F>(player_list: &[PlayerId], start: usize, step: i32, pred: F) -> Option<usize>
where
    F: Fn(PlayerId) -> bool,
{
    let len = player_list.len();
    if len == 0 {
        return None;
    }
    if step == 0 {
        return Some(start % len);
    }
    if !player_list.iter().any(|s| pred(*s)) {
        return None;
    }

    let forward = step > 0;
    let mut index = start % len;
    for _ in 0..step.unsigned_abs() {
        loop {
            index = if forward {
                (index + 1) % len
            } else {
                (index + len - 1) % len
            };
            if pred(player_list[index]) {
                break;
            }
        }
    }
    Some(index)
}

pub fn index_in_game_add(
    player_list: &[PlayerId],
    players: &BTreeMap<PlayerId, Player>,
    start: usize,
    step: i32,
) -> Option<usize> {
    index_add(player_list, start, step, |s| {
        players.get(&s).map_or(false, Player::is_in_game)
    })
}

pub fn index_not_fold_add(
    player_list: &[PlayerId],
    players: &BTreeMap<PlayerId, Player>,
    start: usize,
    step: i32,
) -> Option<usize> {
    index_add(player_list, start, step, |s| {
        players.get(&s).map_or(false, Player::is_not_fold)
    })
}

/// Следующее место по кругу, начиная с `start` (включительно),
/// на котором сидит игрок, удовлетворяющий `pred`.
pub fn next_seat_from<F>(
    players: &BTreeMap<PlayerId, Player>,
    max_players: usize,
    start: usize,
    pred: F,
) -> Option<SeatIndex>
where
    F: Fn(&Player) -> bool,
{
    let by_seat = seat_map(players);
    (0..max_players)
        .map(|k| ((start + k) % max_players) as SeatIndex)
        .find(|seat| by_seat.get(seat).map_or(false, |p| pred(p)))
}

/// Место → игрок.
pub fn seat_map(players: &BTreeMap<PlayerId, Player>) -> BTreeMap<SeatIndex, &Player> {
    players.values().map(|p| (p.seat, p)).collect()
}

/// Индекс игрока, сидящего на `dealer_seat`, либо ближайшего перед ним.
pub fn dealer_index(
    player_list: &[PlayerId],
    players: &BTreeMap<PlayerId, Player>,
    dealer_seat: SeatIndex,
) -> Option<usize> {
    let seats: Vec<SeatIndex> = player_list
        .iter()
        .filter_map(|s| players.get(s).map(|p| p.seat))
        .collect();
    if seats.len() != player_list.len() || seats.is_empty() {
        return None;
    }
    if let Some(i) = seats.iter().position(|s| *s == dealer_seat) {
        return Some(i);
    }
    // Дилер ушёл из раздачи: кнопка у предыдущего по месту игрока.
    match seats.iter().rposition(|s| *s < dealer_seat) {
        Some(i) => Some(i),
        None => Some(seats.len() - 1),
    }
}
