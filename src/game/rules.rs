use serde::{Deserialize, Serialize};
use tracing::debug;

use super::combat::CombatResolver;
use super::config::LANE_COUNT;
use super::state::{CardId, CombatEvent, MatchState, Side, Zone};
use super::validator::{Action, ActionValidator, RejectReason, BUY_CARD_COST};

/// The new snapshot and what happened while producing it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resolution {
    pub state: MatchState,
    pub events: Vec<CombatEvent>,
}

/// Boundary shape: `{ok: true, state, events}` or `{ok: false, reason}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<MatchState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<CombatEvent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
}

impl From<Result<Resolution, RejectReason>> for ApplyResult {
    fn from(result: Result<Resolution, RejectReason>) -> Self {
        match result {
            Ok(resolution) => Self {
                ok: true,
                state: Some(resolution.state),
                events: Some(resolution.events),
                reason: None,
            },
            Err(reason) => Self {
                ok: false,
                state: None,
                events: None,
                reason: Some(reason),
            },
        }
    }
}

/// Drives a match: validates, applies, runs combat on `end_turn`, hands the
/// turn over.
pub struct TurnEngine;

impl TurnEngine {
    /// Apply `action` for `acting` to a copy of `state`. The input is never
    /// modified, so a rejection leaves the caller's snapshot as it was.
    pub fn apply(
        state: &MatchState,
        action: &Action,
        acting: Side,
    ) -> Result<Resolution, RejectReason> {
        let mut next = state.clone();
        let events = Self::apply_in_place(&mut next, action, acting)?;
        Ok(Resolution {
            state: next,
            events,
        })
    }

    /// Validate, then mutate `state`. Nothing is touched on rejection.
    pub fn apply_in_place(
        state: &mut MatchState,
        action: &Action,
        acting: Side,
    ) -> Result<Vec<CombatEvent>, RejectReason> {
        ActionValidator::validate(state, action, acting)?;

        let events = match *action {
            Action::PlayCard {
                card_id,
                target_slot,
            } => {
                Self::play_card(state, acting, card_id, target_slot);
                Vec::new()
            }
            Action::BuyCard => {
                Self::buy_card(state, acting);
                Vec::new()
            }
            Action::EndTurn => Self::end_turn(state, acting),
        };
        Ok(events)
    }

    fn play_card(state: &mut MatchState, acting: Side, card_id: CardId, slot: u8) {
        let cost = state.card(card_id).map(|card| card.mana_cost).unwrap_or(0);
        state.spend_mana(acting, cost);
        state.place_on_board(card_id, slot);
        debug!(side = acting.as_str(), card_id, slot, cost, "card played");
    }

    fn buy_card(state: &mut MatchState, acting: Side) {
        state.spend_mana(acting, BUY_CARD_COST);
        let bought = state.recover_from_discard(acting);
        debug!(side = acting.as_str(), ?bought, "card bought back");
    }

    fn end_turn(state: &mut MatchState, acting: Side) -> Vec<CombatEvent> {
        let events = CombatResolver::resolve(state, acting);
        if state.is_finished() {
            return events;
        }
        Self::start_turn(state, acting.opponent());
        events
    }

    fn start_turn(state: &mut MatchState, next: Side) {
        let drawn = state.draw_card(next);
        state.refill_mana(next);
        state.current_turn = next;
        state.turn_number = state.turn_number.saturating_add(1);
        debug!(
            side = next.as_str(),
            turn = state.turn_number,
            ?drawn,
            mana = state.player(next).mana,
            "turn started"
        );
    }

    /// Every action `side` may take right now.
    pub fn legal_actions(state: &MatchState, side: Side) -> Vec<Action> {
        let mut actions = Vec::new();
        if ActionValidator::validate(state, &Action::EndTurn, side).is_err() {
            return actions;
        }

        let player = state.player(side);
        let free_slots: Vec<u8> = (1..=LANE_COUNT)
            .filter(|slot| state.board_card(side, *slot).is_none())
            .collect();
        for card in state.zone_cards(side, Zone::Hand) {
            if card.mana_cost > player.mana {
                continue;
            }
            for slot in &free_slots {
                actions.push(Action::PlayCard {
                    card_id: card.id,
                    target_slot: *slot,
                });
            }
        }

        if ActionValidator::validate(state, &Action::BuyCard, side).is_ok() {
            actions.push(Action::BuyCard);
        }
        actions.push(Action::EndTurn);
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::catalog::{starter_deck, CardTemplate};
    use crate::game::config::MatchConfig;
    use crate::game::keywords::Keyword;
    use crate::game::state::{MatchStatus, PlayerState};

    fn fresh_match() -> MatchState {
        let deck = starter_deck();
        MatchState::new(MatchConfig::default(), &deck, &deck, 11).expect("setup")
    }

    #[test]
    fn end_turn_alternates_and_counts() {
        let mut state = fresh_match();
        for expected_turn in 2..10 {
            let acting = state.current_turn;
            let resolution = TurnEngine::apply(&state, &Action::EndTurn, acting).expect("end turn");
            state = resolution.state;
            assert_eq!(state.current_turn, acting.opponent());
            assert_eq!(state.turn_number, expected_turn);
        }
    }

    #[test]
    fn end_turn_draws_and_refills_for_next_side() {
        let state = fresh_match();
        let hand_before = state.zone_count(Side::Player2, Zone::Hand);

        let next = TurnEngine::apply(&state, &Action::EndTurn, Side::Player1)
            .expect("end turn")
            .state;

        assert_eq!(next.zone_count(Side::Player2, Zone::Hand), hand_before + 1);
        assert_eq!(next.player2.mana, 1);
        assert_eq!(next.player2.max_mana, 2);
        // the side that just ended keeps its numbers
        assert_eq!(next.player1, state.player1);
    }

    #[test]
    fn empty_deck_draw_is_a_no_op() {
        let mut state = MatchState::sample();
        state.draw_card(Side::Player2);
        let hand = state.zone_count(Side::Player2, Zone::Hand);

        let next = TurnEngine::apply(&state, &Action::EndTurn, Side::Player1)
            .expect("end turn")
            .state;

        assert_eq!(next.zone_count(Side::Player2, Zone::Hand), hand);
        assert_eq!(next.current_turn, Side::Player2);
    }

    #[test]
    fn play_card_moves_to_board_and_debits_mana() {
        let state = MatchState::sample();
        let card_id = state.zone_cards(Side::Player1, Zone::Hand)[0].id;
        let cost = state.card(card_id).unwrap().mana_cost;

        let resolution = TurnEngine::apply(
            &state,
            &Action::PlayCard {
                card_id,
                target_slot: 2,
            },
            Side::Player1,
        )
        .expect("play card");

        assert!(resolution.events.is_empty());
        let card = resolution.state.card(card_id).unwrap();
        assert_eq!(card.zone, Zone::Board);
        assert_eq!(card.slot_index, Some(2));
        assert_eq!(resolution.state.player1.mana, state.player1.mana - cost);
    }

    #[test]
    fn buy_card_returns_latest_discard() {
        let mut state = MatchState::sample();
        state.draw_card(Side::Player1);
        let first = state.board_card(Side::Player1, 1).unwrap().id;
        let second = state.board_card(Side::Player1, 3).unwrap().id;
        state.destroy_card(first);
        state.destroy_card(second);

        let next = TurnEngine::apply(&state, &Action::BuyCard, Side::Player1)
            .expect("buy card")
            .state;

        assert_eq!(next.card(second).unwrap().zone, Zone::Hand);
        assert_eq!(next.card(first).unwrap().zone, Zone::Discard);
        assert_eq!(next.player1.mana, state.player1.mana - 1);
    }

    #[test]
    fn rejection_leaves_input_untouched() {
        let state = MatchState::sample();
        let before = state.clone();
        let result = TurnEngine::apply(&state, &Action::EndTurn, Side::Player2);
        assert_eq!(result, Err(RejectReason::NotYourTurn));
        assert_eq!(state, before);

        let mut in_place = state.clone();
        let result = TurnEngine::apply_in_place(&mut in_place, &Action::BuyCard, Side::Player1);
        assert_eq!(result, Err(RejectReason::DeckNotEmpty));
        assert_eq!(in_place, before);
    }

    #[test]
    fn combat_runs_before_turn_flips() {
        let mut state = MatchState::empty(
            MatchConfig::default(),
            PlayerState::new(30, 1, 1),
            PlayerState::new(30, 1, 1),
        );
        let striker = CardTemplate::new("striker", 3, 2, 1).with_keyword(Keyword::Overclock);
        state.spawn_card(Side::Player1, &striker, Zone::Board, Some(1));

        let resolution =
            TurnEngine::apply(&state, &Action::EndTurn, Side::Player1).expect("end turn");

        assert_eq!(
            resolution.events,
            vec![CombatEvent::Face {
                target: Side::Player2,
                amount: 3,
                life_after: 27
            }]
        );
        assert_eq!(resolution.state.current_turn, Side::Player2);
    }

    #[test]
    fn lethal_end_turn_finishes_without_flipping() {
        let mut state = MatchState::empty(
            MatchConfig::default(),
            PlayerState::new(30, 1, 1),
            PlayerState::new(2, 1, 1),
        );
        let striker = CardTemplate::new("striker", 3, 2, 1);
        state.spawn_card(Side::Player1, &striker, Zone::Board, Some(2));

        let next = TurnEngine::apply(&state, &Action::EndTurn, Side::Player1)
            .expect("end turn")
            .state;

        assert_eq!(next.status, MatchStatus::Finished);
        assert_eq!(next.winner, Some(Side::Player1));
        assert_eq!(next.current_turn, Side::Player1);
        assert_eq!(next.turn_number, 1);
        assert_eq!(
            TurnEngine::apply(&next, &Action::EndTurn, Side::Player1),
            Err(RejectReason::MatchFinished)
        );
        assert!(TurnEngine::legal_actions(&next, Side::Player1).is_empty());
    }

    #[test]
    fn legal_actions_cover_hand_slots_and_end_turn() {
        let state = MatchState::sample();
        let actions = TurnEngine::legal_actions(&state, Side::Player1);

        // one affordable card, one free slot
        let hound = state.zone_cards(Side::Player1, Zone::Hand)[0].id;
        assert_eq!(
            actions,
            vec![
                Action::PlayCard {
                    card_id: hound,
                    target_slot: 2
                },
                Action::EndTurn
            ]
        );
        for action in &actions {
            assert!(TurnEngine::apply(&state, action, Side::Player1).is_ok());
        }
        assert!(TurnEngine::legal_actions(&state, Side::Player2).is_empty());
    }

    #[test]
    fn malformed_snapshots_are_refused_not_applied() {
        let mut exhausted = MatchState::sample();
        exhausted.next_seq = u32::MAX;
        assert_eq!(
            TurnEngine::apply(&exhausted, &Action::EndTurn, Side::Player1),
            Err(RejectReason::InvalidState)
        );

        let mut hollow = MatchState::sample();
        let id = hollow.board_card(Side::Player2, 3).unwrap().id;
        hollow.card_mut(id).unwrap().base_hp = 0;
        assert_eq!(
            TurnEngine::apply(&hollow, &Action::EndTurn, Side::Player1),
            Err(RejectReason::InvalidState)
        );
        assert!(TurnEngine::legal_actions(&hollow, Side::Player1).is_empty());
    }

    #[test]
    fn stale_sequence_counter_still_buys_latest_discard() {
        let mut state = MatchState::empty(
            MatchConfig::default(),
            PlayerState::new(30, 3, 3),
            PlayerState::new(30, 3, 3),
        );
        let old = CardTemplate::new("old", 1, 1, 1);
        let fresh = CardTemplate::new("fresh", 1, 1, 1);
        let old_id = state.spawn_card(Side::Player1, &old, Zone::Discard, None);
        let fresh_id = state.spawn_card(Side::Player1, &fresh, Zone::Board, Some(1));
        state.spawn_card(Side::Player2, &CardTemplate::new("wall", 1, 1, 1), Zone::Board, Some(1));
        for card in &mut state.cards {
            card.zone_seq += 40;
        }
        state.next_seq = 0;

        // both lane-1 cards trade, then player2 passes back
        let state = TurnEngine::apply(&state, &Action::EndTurn, Side::Player1)
            .expect("end turn")
            .state;
        assert_eq!(state.card(fresh_id).unwrap().zone, Zone::Discard);
        let state = TurnEngine::apply(&state, &Action::EndTurn, Side::Player2)
            .expect("end turn")
            .state;
        let state = TurnEngine::apply(&state, &Action::BuyCard, Side::Player1)
            .expect("buy card")
            .state;

        assert_eq!(state.card(fresh_id).unwrap().zone, Zone::Hand);
        assert_eq!(state.card(old_id).unwrap().zone, Zone::Discard);
    }

    #[test]
    fn apply_is_deterministic() {
        let state = MatchState::sample();
        let a = TurnEngine::apply(&state, &Action::EndTurn, Side::Player1);
        let b = TurnEngine::apply(&state, &Action::EndTurn, Side::Player1);
        assert_eq!(a, b);
    }

    #[test]
    fn apply_result_shapes() {
        let state = MatchState::sample();
        let rejected: ApplyResult = TurnEngine::apply(&state, &Action::BuyCard, Side::Player1).into();
        let json = serde_json::to_value(&rejected).unwrap();
        assert_eq!(json, serde_json::json!({"ok": false, "reason": "deck_not_empty"}));

        let accepted: ApplyResult = TurnEngine::apply(&state, &Action::EndTurn, Side::Player1).into();
        let json = serde_json::to_value(&accepted).unwrap();
        assert_eq!(json["ok"], true);
        assert!(json["events"].is_array());
        assert_eq!(json["state"]["currentTurn"], "player2");
    }
}
