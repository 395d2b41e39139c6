use crate::domain::card::Rank;
use crate::domain::hand::HandRank;

/// Категория покерной руки по силе.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandCategory {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
}

impl HandCategory {
    fn from_id(id: u8) -> HandCategory {
        match id {
            1 => HandCategory::OnePair,
            2 => HandCategory::TwoPair,
            3 => HandCategory::ThreeOfAKind,
            4 => HandCategory::Straight,
            5 => HandCategory::Flush,
            6 => HandCategory::FullHouse,
            7 => HandCategory::FourOfAKind,
            8 => HandCategory::StraightFlush,
            _ => HandCategory::HighCard,
        }
    }
}

/// Схема кодирования хай-руки (u32):
///   [категория:4][r0:4][r1:4][r2:4][r3:4][r4:4]
/// Пустой слот ранга - 0, он младше любой карты (неполные руки стада).
pub(crate) fn encode_high(category: HandCategory, ranks: &[Rank]) -> HandRank {
    let mut value = (category as u32) & 0x0F;
    for i in 0..5 {
        let nibble = ranks.get(i).map(|r| *r as u32).unwrap_or(0);
        value = (value << 4) | nibble;
    }
    HandRank(value)
}

/// Лоу-рука: пять разных рангов не старше восьмёрки, туз = 1.
/// Чем младше старшая карта, тем лучше, поэтому значение инвертируется,
/// чтобы и здесь «больше» означало «лучше».
pub(crate) fn encode_low(ranks_desc: &[u8; 5]) -> HandRank {
    let mut packed = 0u32;
    for r in ranks_desc {
        packed = (packed << 4) | (*r as u32);
    }
    HandRank(LOW_FLAG | (0x000F_FFFF - packed))
}

const LOW_FLAG: u32 = 1 << 28;

/// Категория хай-руки.
pub fn hand_category(rank: HandRank) -> HandCategory {
    HandCategory::from_id(((rank.0 >> 20) & 0x0F) as u8)
}

/// Является ли значение лоу-рукой.
pub fn is_low(rank: HandRank) -> bool {
    rank.0 & LOW_FLAG != 0
}

/// Человеческое описание руки.
pub fn describe_hand(rank: HandRank) -> String {
    if is_low(rank) {
        let packed = 0x000F_FFFF - (rank.0 & 0x000F_FFFF);
        let top = (packed >> 16) & 0x0F;
        return format!("{top}-low");
    }
    match hand_category(rank) {
        HandCategory::HighCard => "High card",
        HandCategory::OnePair => "One pair",
        HandCategory::TwoPair => "Two pair",
        HandCategory::ThreeOfAKind => "Three of a kind",
        HandCategory::Straight => "Straight",
        HandCategory::Flush => "Flush",
        HandCategory::FullHouse => "Full house",
        HandCategory::FourOfAKind => "Four of a kind",
        HandCategory::StraightFlush => "Straight flush",
    }
    .to_string()
}
