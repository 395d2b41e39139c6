use core::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Масть карты.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

/// Ранг карты.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Обратное к `rank as u8`. Значения вне 2..=14 дают `None`.
    pub fn from_value(v: u8) -> Option<Rank> {
        Rank::ALL.get(v.checked_sub(2)? as usize).copied()
    }
}

/// Обычная покерная карта (52-карточная колода).
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }
}

/// Парсинг списка карт через пробел: `"Ah Kd 7c"`.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, String> {
    s.split_whitespace().map(Card::from_str).collect()
}

/// Карта в руке игрока.
///
/// `card == None` - карта существует, но её номинал неизвестен этому
/// экземпляру (зеркало видит только рубашку). Видимость меняется только
/// в одну сторону: закрытая → открытая.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DealtCard {
    pub card: Option<Card>,
    pub visible: bool,
}

impl DealtCard {
    pub fn down(card: Card) -> Self {
        Self {
            card: Some(card),
            visible: false,
        }
    }

    pub fn up(card: Card) -> Self {
        Self {
            card: Some(card),
            visible: true,
        }
    }

    /// То, что видит посторонний наблюдатель.
    pub fn public(&self) -> DealtCard {
        if self.visible {
            *self
        } else {
            DealtCard {
                card: None,
                visible: false,
            }
        }
    }
}

/// Карманные карты игрока.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pocket {
    pub cards: Vec<DealtCard>,
}

impl Pocket {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn push(&mut self, card: DealtCard) {
        self.cards.push(card);
    }

    /// Открыть все карты. Обратно закрыть нельзя.
    pub fn reveal(&mut self) {
        for c in self.cards.iter_mut() {
            c.visible = true;
        }
    }

    pub fn all_visible(&self) -> bool {
        self.cards.iter().all(|c| c.visible)
    }

    /// Известные номиналы (для оценки руки).
    pub fn known(&self) -> Vec<Card> {
        self.cards.iter().filter_map(|c| c.card).collect()
    }

    /// Номиналы открытых карт.
    pub fn visible_cards(&self) -> Vec<Card> {
        self.cards
            .iter()
            .filter(|c| c.visible)
            .filter_map(|c| c.card)
            .collect()
    }

    pub fn public(&self) -> Vec<DealtCard> {
        self.cards.iter().map(DealtCard::public).collect()
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ch = match self {
            Suit::Clubs => 'c',
            Suit::Diamonds => 'd',
            Suit::Hearts => 'h',
            Suit::Spades => 's',
        };
        write!(f, "{ch}")
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ch = match self {
            Rank::Two => '2',
            Rank::Three => '3',
            Rank::Four => '4',
            Rank::Five => '5',
            Rank::Six => '6',
            Rank::Seven => '7',
            Rank::Eight => '8',
            Rank::Nine => '9',
            Rank::Ten => 'T',
            Rank::Jack => 'J',
            Rank::Queen => 'Q',
            Rank::King => 'K',
            Rank::Ace => 'A',
        };
        write!(f, "{ch}")
    }
}

impl fmt::Display for Card {
    /// Формат вида `Ah`, `Td`, `7c`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// Парсинг строки вида "Ah", "Td", "7c".
impl FromStr for Card {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(r_ch), Some(s_ch), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(format!("Карта должна состоять из двух символов: {s:?}"));
        };

        let rank = match r_ch {
            '2' => Rank::Two,
            '3' => Rank::Three,
            '4' => Rank::Four,
            '5' => Rank::Five,
            '6' => Rank::Six,
            '7' => Rank::Seven,
            '8' => Rank::Eight,
            '9' => Rank::Nine,
            'T' | 't' => Rank::Ten,
            'J' | 'j' => Rank::Jack,
            'Q' | 'q' => Rank::Queen,
            'K' | 'k' => Rank::King,
            'A' | 'a' => Rank::Ace,
            _ => return Err(format!("Неизвестный ранг: {r_ch}")),
        };

        let suit = match s_ch {
            'c' | 'C' => Suit::Clubs,
            'd' | 'D' => Suit::Diamonds,
            'h' | 'H' => Suit::Hearts,
            's' | 'S' => Suit::Spades,
            _ => return Err(format!("Неизвестная масть: {s_ch}")),
        };

        Ok(Card { rank, suit })
    }
}
