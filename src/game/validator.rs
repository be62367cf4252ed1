use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::config::LANE_COUNT;
use super::state::{CardId, MatchState, Side, Zone};

/// An action submitted by one side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    #[serde(rename_all = "camelCase")]
    PlayCard { card_id: CardId, target_slot: u8 },
    EndTurn,
    BuyCard,
}

/// Mana debited by `buy_card`.
pub const BUY_CARD_COST: u8 = 1;

/// Why an action was refused. Serialized as a snake_case string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Error)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    #[error("the match is already finished")]
    MatchFinished,
    #[error("it is not your turn")]
    NotYourTurn,
    #[error("not enough mana to play that card")]
    NotEnoughMana,
    #[error("that slot is already occupied")]
    SlotOccupied,
    #[error("cards can only be bought once the deck is empty")]
    DeckNotEmpty,
    #[error("there is nothing in the discard pile")]
    NoDiscard,
    #[error("buying a card needs at least one mana")]
    NoMana,
    #[error("that card does not belong to you")]
    InvalidCardOwnership,
    #[error("that card is not in your hand")]
    CardNotInHand,
    #[error("target slot must be between 1 and 3")]
    InvalidTarget,
    #[error("the match state is inconsistent")]
    InvalidState,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::MatchFinished => "match_finished",
            RejectReason::NotYourTurn => "not_your_turn",
            RejectReason::NotEnoughMana => "not_enough_mana",
            RejectReason::SlotOccupied => "slot_occupied",
            RejectReason::DeckNotEmpty => "deck_not_empty",
            RejectReason::NoDiscard => "no_discard",
            RejectReason::NoMana => "no_mana",
            RejectReason::InvalidCardOwnership => "invalid_card_ownership",
            RejectReason::CardNotInHand => "card_not_in_hand",
            RejectReason::InvalidTarget => "invalid_target",
            RejectReason::InvalidState => "invalid_state",
        }
    }
}

/// Checks actions against a snapshot without touching it.
pub struct ActionValidator;

impl ActionValidator {
    pub fn validate(state: &MatchState, action: &Action, acting: Side) -> Result<(), RejectReason> {
        let result = Self::check(state, action, acting);
        if let Err(reason) = result {
            debug!(
                side = acting.as_str(),
                ?action,
                reason = reason.as_str(),
                "action rejected"
            );
        }
        result
    }

    fn check(state: &MatchState, action: &Action, acting: Side) -> Result<(), RejectReason> {
        Self::ensure_integrity(state)?;
        Self::ensure_active(state)?;
        Self::ensure_turn_owner(state, acting)?;

        match *action {
            Action::PlayCard {
                card_id,
                target_slot,
            } => Self::check_play(state, acting, card_id, target_slot),
            Action::EndTurn => Ok(()),
            Action::BuyCard => Self::check_buy(state, acting),
        }
    }

    fn ensure_integrity(state: &MatchState) -> Result<(), RejectReason> {
        state
            .integrity_check()
            .map_err(|_| RejectReason::InvalidState)
    }

    fn ensure_active(state: &MatchState) -> Result<(), RejectReason> {
        if state.is_finished() {
            return Err(RejectReason::MatchFinished);
        }
        Ok(())
    }

    fn ensure_turn_owner(state: &MatchState, acting: Side) -> Result<(), RejectReason> {
        if state.current_turn != acting {
            return Err(RejectReason::NotYourTurn);
        }
        Ok(())
    }

    fn check_play(
        state: &MatchState,
        acting: Side,
        card_id: CardId,
        target_slot: u8,
    ) -> Result<(), RejectReason> {
        let card = state
            .card(card_id)
            .filter(|card| card.side == acting)
            .ok_or(RejectReason::InvalidCardOwnership)?;
        if card.zone != Zone::Hand {
            return Err(RejectReason::CardNotInHand);
        }
        if !(1..=LANE_COUNT).contains(&target_slot) {
            return Err(RejectReason::InvalidTarget);
        }
        if state.board_card(acting, target_slot).is_some() {
            return Err(RejectReason::SlotOccupied);
        }
        if card.mana_cost > state.player(acting).mana {
            return Err(RejectReason::NotEnoughMana);
        }
        Ok(())
    }

    fn check_buy(state: &MatchState, acting: Side) -> Result<(), RejectReason> {
        if state.zone_count(acting, Zone::Deck) > 0 {
            return Err(RejectReason::DeckNotEmpty);
        }
        if state.zone_count(acting, Zone::Discard) == 0 {
            return Err(RejectReason::NoDiscard);
        }
        if state.player(acting).mana < BUY_CARD_COST {
            return Err(RejectReason::NoMana);
        }
        Ok(())
    }
}
