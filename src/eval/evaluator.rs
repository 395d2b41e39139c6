use std::collections::BTreeMap;

use crate::domain::card::{Card, Rank, Suit};
use crate::domain::hand::{HandRank, WinSide};

use super::hand_rank::{encode_high, encode_low, HandCategory};
use super::HandEvaluator;

/// Встроенный оценщик: хай (лучшие 5 из 5–7 карт) и лоу «восемь или ниже».
/// Руку и борд не различает, поэтому омаха-ограничения не поддерживает.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardEvaluator;

impl HandEvaluator for StandardEvaluator {
    fn best(&self, _variant: &str, side: WinSide, pocket: &[Card], board: &[Card]) -> Option<HandRank> {
        let mut cards = Vec::with_capacity(pocket.len() + board.len());
        cards.extend_from_slice(pocket);
        cards.extend_from_slice(board);
        match side {
            WinSide::High => evaluate_high(&cards),
            WinSide::Low => evaluate_low8(&cards),
        }
    }

    fn rank_visible(&self, cards: &[Card]) -> HandRank {
        evaluate_high(cards).unwrap_or(HandRank(0))
    }
}

/// Лучшая хай-комбинация из любого числа карт.
///
/// До пяти карт оцениваются как есть (неполная рука стада: только пары,
/// сеты и каре). Больше пяти - перебор всех 5-карточных сочетаний.
pub fn evaluate_high(cards: &[Card]) -> Option<HandRank> {
    match cards.len() {
        0 => None,
        1..=5 => Some(rank_cards(cards)),
        n => {
            let mut best: Option<HandRank> = None;
            let mut idx = [0usize, 1, 2, 3, 4];
            loop {
                let five = [
                    cards[idx[0]],
                    cards[idx[1]],
                    cards[idx[2]],
                    cards[idx[3]],
                    cards[idx[4]],
                ];
                let r = rank_cards(&five);
                if best.map_or(true, |b| r > b) {
                    best = Some(r);
                }
                if !next_combination(&mut idx, n) {
                    break;
                }
            }
            best
        }
    }
}

/// Следующее сочетание индексов в лексикографическом порядке.
fn next_combination(idx: &mut [usize; 5], n: usize) -> bool {
    let k = idx.len();
    let mut i = k;
    while i > 0 {
        i -= 1;
        if idx[i] < n - k + i {
            idx[i] += 1;
            for j in i + 1..k {
                idx[j] = idx[j - 1] + 1;
            }
            return true;
        }
    }
    false
}

/// Лоу «восемь или ниже» (туз младший, стриты и флеши не мешают).
/// `None`, если нет пяти разных рангов не старше восьмёрки.
pub fn evaluate_low8(cards: &[Card]) -> Option<HandRank> {
    let mut present = [false; 9];
    for c in cards {
        let v = low_value(c.rank);
        if v <= 8 {
            present[v as usize] = true;
        }
    }
    let lowest: Vec<u8> = (1u8..=8).filter(|v| present[*v as usize]).take(5).collect();
    if lowest.len() < 5 {
        return None;
    }
    let desc = [lowest[4], lowest[3], lowest[2], lowest[1], lowest[0]];
    Some(encode_low(&desc))
}

fn low_value(rank: Rank) -> u8 {
    match rank {
        Rank::Ace => 1,
        r => r as u8,
    }
}

/// Оценка 1–5 карт.
fn rank_cards(cards: &[Card]) -> HandRank {
    let mut rank_counts = [0u8; 15];
    let mut suit_counts = [0u8; 4];
    for card in cards {
        rank_counts[card.rank as usize] += 1;
        let s = match card.suit {
            Suit::Clubs => 0,
            Suit::Diamonds => 1,
            Suit::Hearts => 2,
            Suit::Spades => 3,
        };
        suit_counts[s] += 1;
    }

    // (количество, ранг), сначала по количеству, затем по рангу - по убыванию.
    let mut groups: Vec<(u8, Rank)> = Rank::ALL
        .iter()
        .filter(|r| rank_counts[**r as usize] > 0)
        .map(|r| (rank_counts[*r as usize], *r))
        .collect();
    groups.sort_by(|a, b| b.cmp(a));

    let ordered: Vec<Rank> = groups.iter().map(|(_, r)| *r).collect();
    let pattern: Vec<u8> = groups.iter().map(|(c, _)| *c).collect();

    let full = cards.len() == 5;
    let is_flush = full && suit_counts.iter().any(|&c| c == 5);
    let straight_high = if full && groups.len() == 5 {
        straight_high(&ordered)
    } else {
        None
    };

    if let (true, Some(high)) = (is_flush, straight_high) {
        return encode_high(HandCategory::StraightFlush, &straight_ranks(high));
    }
    match pattern.as_slice() {
        [4, ..] => return encode_high(HandCategory::FourOfAKind, &ordered),
        [3, 2] => return encode_high(HandCategory::FullHouse, &ordered),
        _ => {}
    }
    if is_flush {
        return encode_high(HandCategory::Flush, &ordered);
    }
    if let Some(high) = straight_high {
        return encode_high(HandCategory::Straight, &straight_ranks(high));
    }
    let category = match pattern.as_slice() {
        [3, ..] => HandCategory::ThreeOfAKind,
        [2, 2, ..] => HandCategory::TwoPair,
        [2, ..] => HandCategory::OnePair,
        _ => HandCategory::HighCard,
    };
    encode_high(category, &ordered)
}

/// Старшая карта стрита для пяти разных рангов (по убыванию), иначе `None`.
/// Колесо A2345 - стрит до пятёрки.
fn straight_high(desc: &[Rank]) -> Option<Rank> {
    let values: Vec<u8> = desc.iter().map(|r| *r as u8).collect();
    if values.windows(2).all(|w| w[0] == w[1] + 1) {
        return Some(desc[0]);
    }
    if values == [14, 5, 4, 3, 2] {
        return Some(Rank::Five);
    }
    None
}

fn straight_ranks(high: Rank) -> Vec<Rank> {
    let top = high as u8;
    (0..5)
        .map(|i| {
            let v = top - i;
            // в колесе туз идёт младшей картой
            Rank::from_value(if v < 2 { 14 } else { v }).unwrap_or(Rank::Two)
        })
        .collect()
}

/// Победители по сторонам через `best` - поведение по умолчанию
/// для любого оценщика.
pub(crate) fn winners_by_best<E: HandEvaluator + ?Sized>(
    evaluator: &E,
    variant: &str,
    sides: &[WinSide],
    pockets: &[Vec<Card>],
    board: &[Card],
) -> BTreeMap<WinSide, Vec<usize>> {
    let mut result = BTreeMap::new();
    for side in sides {
        let values: Vec<Option<HandRank>> = pockets
            .iter()
            .map(|p| evaluator.best(variant, *side, p, board))
            .collect();
        let Some(top) = values.iter().flatten().max().copied() else {
            continue;
        };
        let winners: Vec<usize> = values
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == Some(top))
            .map(|(i, _)| i)
            .collect();
        result.insert(*side, winners);
    }
    result
}
