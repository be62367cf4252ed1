use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::catalog::{starter_catalog, CardTemplate, TemplateError};
use super::config::{ConfigError, MatchConfig, LANE_COUNT, MANA_CAP};
use super::keywords::Keyword;

pub type CardId = u32;

const SEQ_HEADROOM: u32 = 1 << 16;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Player1,
    Player2,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Player1, Side::Player2];

    pub fn opponent(self) -> Side {
        match self {
            Side::Player1 => Side::Player2,
            Side::Player2 => Side::Player1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Player1 => "player1",
            Side::Player2 => "player2",
        }
    }
}

impl std::str::FromStr for Side {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "player1" | "p1" | "1" => Ok(Side::Player1),
            "player2" | "p2" | "2" => Ok(Side::Player2),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Deck,
    Hand,
    Board,
    Discard,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Active,
    Finished,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    pub life: i32,
    pub mana: u8,
    pub max_mana: u8,
}

impl PlayerState {
    pub fn new(life: i32, mana: u8, max_mana: u8) -> Self {
        Self {
            life,
            mana,
            max_mana,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchCard {
    pub id: CardId,
    #[serde(default)]
    pub name: String,
    pub side: Side,
    pub zone: Zone,
    /// Lane 1..=3, only set while on the board.
    #[serde(default)]
    pub slot_index: Option<u8>,
    /// `None` means the card is at its base hp.
    #[serde(default)]
    pub current_hp: Option<i32>,
    pub base_hp: i32,
    pub base_atk: i32,
    pub mana_cost: u8,
    #[serde(default)]
    pub keyword: Keyword,
    /// Order of entry into the current zone; higher entered later.
    #[serde(default)]
    pub zone_seq: u32,
}

impl MatchCard {
    pub fn from_template(id: CardId, side: Side, template: &CardTemplate) -> Self {
        Self {
            id,
            name: template.name.clone(),
            side,
            zone: Zone::Deck,
            slot_index: None,
            current_hp: None,
            base_hp: template.final_hp,
            base_atk: template.final_atk,
            mana_cost: template.mana_cost,
            keyword: template.keyword,
            zone_seq: 0,
        }
    }

    pub fn hp(&self) -> i32 {
        self.current_hp.unwrap_or(self.base_hp)
    }

    pub fn attack(&self) -> i32 {
        self.base_atk.max(0)
    }

    pub fn is_on_board(&self) -> bool {
        self.zone == Zone::Board
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Striker {
    Attacker,
    Defender,
}

/// What happened during one combat resolution, in order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum CombatEvent {
    #[serde(rename_all = "camelCase")]
    Attack {
        lane: u8,
        attacker_id: CardId,
        defender_id: CardId,
    },
    #[serde(rename_all = "camelCase")]
    FirstStrike {
        lane: u8,
        attacker_id: CardId,
        defender_id: CardId,
    },
    #[serde(rename_all = "camelCase")]
    Damage {
        lane: u8,
        target_id: CardId,
        amount: i32,
        side: Striker,
    },
    #[serde(rename_all = "camelCase")]
    Heal { target: Side, amount: i32 },
    #[serde(rename_all = "camelCase")]
    Death { lane: u8, card_id: CardId },
    #[serde(rename_all = "camelCase")]
    Face {
        target: Side,
        amount: i32,
        life_after: i32,
    },
    #[serde(rename_all = "camelCase")]
    Redirect {
        lane: u8,
        attacker_id: CardId,
        blocker_id: CardId,
        blocker_slot: u8,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntegrityError {
    #[error("card id {card_id} appears more than once")]
    DuplicateCardId { card_id: CardId },
    #[error("{side:?} slot {slot} holds more than one card")]
    SlotCollision { side: Side, slot: u8 },
    #[error("card {card_id} is on the board without a valid slot")]
    InvalidSlot { card_id: CardId },
    #[error("card {card_id} has hp {value} outside 0..={base}")]
    HpOutOfRange {
        card_id: CardId,
        value: i32,
        base: i32,
    },
    #[error("{side:?} mana {mana} outside 0..={max_mana}")]
    ManaOutOfRange { side: Side, mana: u8, max_mana: u8 },
    #[error("{side:?} max mana {value} above the cap")]
    MaxManaAboveCap { side: Side, value: u8 },
    #[error("{side:?} life is negative: {value}")]
    NegativeLife { side: Side, value: i32 },
    #[error("winner is set while the match is still active")]
    WinnerWhileActive,
    #[error("card {card_id} has invalid base stats: hp {hp}, attack {atk}")]
    InvalidBaseStats { card_id: CardId, hp: i32, atk: i32 },
    #[error("zone sequence counter is exhausted")]
    SequenceExhausted,
    #[error("invalid match config: {reason}")]
    InvalidConfig { reason: ConfigError },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Template(#[from] TemplateError),
}

/// Authoritative snapshot of a duel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchState {
    #[serde(default)]
    pub config: MatchConfig,
    pub player1: PlayerState,
    pub player2: PlayerState,
    #[serde(default)]
    pub cards: Vec<MatchCard>,
    pub current_turn: Side,
    pub turn_number: u32,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub winner: Option<Side>,
    #[serde(default)]
    pub next_seq: u32,
}

impl MatchState {
    /// Start a match: ids are assigned, both decks are shuffled with `seed`
    /// and the opening hands are dealt.
    pub fn new(
        config: MatchConfig,
        deck1: &[CardTemplate],
        deck2: &[CardTemplate],
        seed: u64,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        for template in deck1.iter().chain(deck2.iter()) {
            template.validate()?;
        }

        let player = PlayerState::new(
            config.starting_life,
            config.starting_mana,
            config.starting_max_mana,
        );
        let opening_hand = config.opening_hand;
        let mut state = Self::empty(config, player.clone(), player);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut next_id: CardId = 1;
        for (side, deck) in [(Side::Player1, deck1), (Side::Player2, deck2)] {
            let mut cards: Vec<MatchCard> = deck
                .iter()
                .map(|template| {
                    let card = MatchCard::from_template(next_id, side, template);
                    next_id += 1;
                    card
                })
                .collect();
            cards.shuffle(&mut rng);
            for mut card in cards {
                card.zone_seq = state.bump_seq();
                state.cards.push(card);
            }
        }
        state.cards.sort_by_key(|card| card.id);

        for _ in 0..opening_hand {
            for side in Side::ALL {
                state.draw_card(side);
            }
        }

        Ok(state)
    }

    pub fn empty(config: MatchConfig, player1: PlayerState, player2: PlayerState) -> Self {
        Self {
            config,
            player1,
            player2,
            cards: Vec::new(),
            current_turn: Side::Player1,
            turn_number: 1,
            status: MatchStatus::Active,
            winner: None,
            next_seq: 0,
        }
    }

    /// Next zone sequence number, always above every card already placed
    /// even if `next_seq` arrived stale.
    fn bump_seq(&mut self) -> u32 {
        let floor = self.highest_seq();
        self.next_seq = floor.saturating_add(1);
        self.next_seq
    }

    fn highest_seq(&self) -> u32 {
        self.cards
            .iter()
            .map(|card| card.zone_seq)
            .fold(self.next_seq, u32::max)
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn player(&self, side: Side) -> &PlayerState {
        match side {
            Side::Player1 => &self.player1,
            Side::Player2 => &self.player2,
        }
    }

    pub fn player_mut(&mut self, side: Side) -> &mut PlayerState {
        match side {
            Side::Player1 => &mut self.player1,
            Side::Player2 => &mut self.player2,
        }
    }

    // === Cards ===

    /// Add a card directly into a zone. Ids must stay unique; used by
    /// setup code and tests that build positions by hand.
    pub fn insert_card(&mut self, mut card: MatchCard) {
        card.zone_seq = self.bump_seq();
        if card.zone != Zone::Board {
            card.slot_index = None;
        }
        self.cards.push(card);
    }

    pub fn spawn_card(
        &mut self,
        side: Side,
        template: &CardTemplate,
        zone: Zone,
        slot: Option<u8>,
    ) -> CardId {
        let id = self.next_card_id();
        let mut card = MatchCard::from_template(id, side, template);
        card.zone = zone;
        card.slot_index = slot;
        self.insert_card(card);
        id
    }

    pub fn next_card_id(&self) -> CardId {
        self.cards.iter().map(|card| card.id).max().unwrap_or(0).saturating_add(1)
    }

    pub fn card(&self, id: CardId) -> Option<&MatchCard> {
        self.cards.iter().find(|card| card.id == id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Option<&mut MatchCard> {
        self.cards.iter_mut().find(|card| card.id == id)
    }

    /// Cards of `side` in `zone`, oldest entry first.
    pub fn zone_cards(&self, side: Side, zone: Zone) -> Vec<&MatchCard> {
        let mut cards: Vec<&MatchCard> = self
            .cards
            .iter()
            .filter(|card| card.side == side && card.zone == zone)
            .collect();
        cards.sort_by_key(|card| card.zone_seq);
        cards
    }

    pub fn zone_count(&self, side: Side, zone: Zone) -> usize {
        self.cards
            .iter()
            .filter(|card| card.side == side && card.zone == zone)
            .count()
    }

    pub fn board_card(&self, side: Side, slot: u8) -> Option<&MatchCard> {
        self.cards
            .iter()
            .find(|card| card.side == side && card.is_on_board() && card.slot_index == Some(slot))
    }

    /// Board of `side` indexed by lane (index 0 is lane 1).
    pub fn lanes(&self, side: Side) -> [Option<CardId>; LANE_COUNT as usize] {
        let mut lanes = [None; LANE_COUNT as usize];
        for (index, lane) in lanes.iter_mut().enumerate() {
            *lane = self.board_card(side, index as u8 + 1).map(|card| card.id);
        }
        lanes
    }

    pub fn blocker(&self, side: Side) -> Option<&MatchCard> {
        (1..=LANE_COUNT)
            .filter_map(|slot| self.board_card(side, slot))
            .find(|card| card.keyword.taunts())
    }

    fn move_card(&mut self, id: CardId, zone: Zone) -> Option<&mut MatchCard> {
        let seq = self.bump_seq();
        let card = self.card_mut(id)?;
        card.zone = zone;
        card.zone_seq = seq;
        if zone != Zone::Board {
            card.slot_index = None;
        }
        if zone == Zone::Discard {
            card.current_hp = None;
        }
        Some(card)
    }

    /// Move a card onto `slot`. The caller has already checked the slot is free.
    pub fn place_on_board(&mut self, id: CardId, slot: u8) -> bool {
        match self.move_card(id, Zone::Board) {
            Some(card) => {
                card.slot_index = Some(slot);
                true
            }
            None => false,
        }
    }

    pub fn draw_card(&mut self, side: Side) -> Option<CardId> {
        let id = self.zone_cards(side, Zone::Deck).first()?.id;
        self.move_card(id, Zone::Hand);
        Some(id)
    }

    /// Most recently discarded card back into the hand.
    pub fn recover_from_discard(&mut self, side: Side) -> Option<CardId> {
        let id = self.zone_cards(side, Zone::Discard).last()?.id;
        self.move_card(id, Zone::Hand);
        Some(id)
    }

    /// Board → discard. Returns the lane the card left.
    pub fn destroy_card(&mut self, id: CardId) -> Option<u8> {
        let lane = self.card(id).filter(|card| card.is_on_board())?.slot_index?;
        self.move_card(id, Zone::Discard);
        Some(lane)
    }

    pub fn damage_card(&mut self, id: CardId, amount: i32) -> Option<i32> {
        let card = self.card_mut(id)?;
        let remaining = (card.hp() - amount.max(0)).max(0);
        card.current_hp = Some(remaining);
        Some(remaining)
    }

    pub fn damage_player(&mut self, side: Side, amount: i32) -> i32 {
        let player = self.player_mut(side);
        player.life = (player.life - amount.max(0)).max(0);
        player.life
    }

    pub fn heal_player(&mut self, side: Side, amount: i32) -> i32 {
        let max_life = self.config.max_life;
        let player = self.player_mut(side);
        let applied = amount.max(0).min((max_life - player.life).max(0));
        player.life += applied;
        applied
    }

    pub fn spend_mana(&mut self, side: Side, amount: u8) {
        let player = self.player_mut(side);
        player.mana = player.mana.saturating_sub(amount);
    }

    /// Turn-start mana: refill within the current max, then grow the max.
    pub fn refill_mana(&mut self, side: Side) {
        let per_turn = self.config.mana_per_turn;
        let cap = self.config.mana_cap.min(MANA_CAP);
        let player = self.player_mut(side);
        player.mana = player.max_mana.min(player.mana.saturating_add(per_turn));
        player.max_mana = cap.min(player.max_mana.saturating_add(1));
    }

    // === Outcome ===

    /// Finish the match if a side is at 0 life. Both at 0 is a draw.
    pub fn evaluate_outcome(&mut self) -> bool {
        if self.is_finished() {
            return true;
        }
        let p1_down = self.player1.life <= 0;
        let p2_down = self.player2.life <= 0;
        let winner = match (p1_down, p2_down) {
            (false, false) => return false,
            (true, true) => None,
            (true, false) => Some(Side::Player2),
            (false, true) => Some(Side::Player1),
        };
        self.status = MatchStatus::Finished;
        self.winner = winner;
        true
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        self.config
            .validate()
            .map_err(|reason| IntegrityError::InvalidConfig { reason })?;
        if self.status == MatchStatus::Active && self.winner.is_some() {
            return Err(IntegrityError::WinnerWhileActive);
        }
        // every apply moves a handful of cards; leave room for them
        if self.highest_seq() > u32::MAX - SEQ_HEADROOM {
            return Err(IntegrityError::SequenceExhausted);
        }

        for side in Side::ALL {
            let player = self.player(side);
            if player.life < 0 {
                return Err(IntegrityError::NegativeLife {
                    side,
                    value: player.life,
                });
            }
            if player.max_mana > MANA_CAP {
                return Err(IntegrityError::MaxManaAboveCap {
                    side,
                    value: player.max_mana,
                });
            }
            if player.mana > player.max_mana {
                return Err(IntegrityError::ManaOutOfRange {
                    side,
                    mana: player.mana,
                    max_mana: player.max_mana,
                });
            }
        }

        let mut seen = HashSet::new();
        let mut occupied = HashSet::new();
        for card in &self.cards {
            if !seen.insert(card.id) {
                return Err(IntegrityError::DuplicateCardId { card_id: card.id });
            }
            if card.base_hp <= 0 || card.base_atk < 0 {
                return Err(IntegrityError::InvalidBaseStats {
                    card_id: card.id,
                    hp: card.base_hp,
                    atk: card.base_atk,
                });
            }
            if let Some(hp) = card.current_hp {
                if hp < 0 || hp > card.base_hp {
                    return Err(IntegrityError::HpOutOfRange {
                        card_id: card.id,
                        value: hp,
                        base: card.base_hp,
                    });
                }
            }
            if card.is_on_board() {
                let slot = match card.slot_index {
                    Some(slot) if (1..=LANE_COUNT).contains(&slot) => slot,
                    _ => return Err(IntegrityError::InvalidSlot { card_id: card.id }),
                };
                if !occupied.insert((card.side, slot)) {
                    return Err(IntegrityError::SlotCollision {
                        side: card.side,
                        slot,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn sample() -> Self {
        let catalog = starter_catalog();
        let config = MatchConfig::default();
        let mut state = Self::empty(
            config,
            PlayerState::new(26, 3, 4),
            PlayerState::new(28, 3, 3),
        );
        state.turn_number = 6;

        let layout: [(Side, usize, Zone, Option<u8>); 10] = [
            (Side::Player1, 2, Zone::Board, Some(1)),
            (Side::Player1, 4, Zone::Board, Some(3)),
            (Side::Player1, 1, Zone::Hand, None),
            (Side::Player1, 5, Zone::Hand, None),
            (Side::Player1, 9, Zone::Deck, None),
            (Side::Player2, 3, Zone::Board, Some(2)),
            (Side::Player2, 0, Zone::Board, Some(3)),
            (Side::Player2, 6, Zone::Hand, None),
            (Side::Player2, 8, Zone::Deck, None),
            (Side::Player2, 1, Zone::Discard, None),
        ];
        for (index, (side, template, zone, slot)) in layout.into_iter().enumerate() {
            let mut card = MatchCard::from_template(index as CardId + 1, side, &catalog[template]);
            card.zone = zone;
            card.slot_index = slot;
            state.insert_card(card);
        }
        state
    }
}
