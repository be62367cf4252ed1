//! Rebuild a post-combat snapshot from the pre-combat one and its event log.
//!
//! Clients that only receive events use this to stay in sync; tests use it to
//! check the log describes combat completely.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::{CardId, CombatEvent, MatchState};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplayError {
    #[error("event {index}: unknown card {card_id}")]
    UnknownCard { index: usize, card_id: CardId },
    #[error("event {index}: card {card_id} is not on the board")]
    NotOnBoard { index: usize, card_id: CardId },
    #[error("event {index}: card {card_id} died in lane {lane} with hp left")]
    DeathWithoutLethal {
        index: usize,
        card_id: CardId,
        lane: u8,
    },
    #[error("event {index}: expected life {expected}, replay reached {actual}")]
    LifeMismatch {
        index: usize,
        expected: i32,
        actual: i32,
    },
    #[error("event {index}: heal of {expected} only applied {actual}")]
    HealMismatch {
        index: usize,
        expected: i32,
        actual: i32,
    },
}

/// Apply `events` to a copy of `before` (the snapshot combat started from).
pub fn replay_events(before: &MatchState, events: &[CombatEvent]) -> Result<MatchState, ReplayError> {
    let mut state = before.clone();
    for (index, event) in events.iter().enumerate() {
        apply_event(&mut state, index, event)?;
    }
    state.evaluate_outcome();
    Ok(state)
}

fn on_board(state: &MatchState, index: usize, card_id: CardId) -> Result<(), ReplayError> {
    let card = state
        .card(card_id)
        .ok_or(ReplayError::UnknownCard { index, card_id })?;
    if !card.is_on_board() {
        return Err(ReplayError::NotOnBoard { index, card_id });
    }
    Ok(())
}

fn apply_event(state: &mut MatchState, index: usize, event: &CombatEvent) -> Result<(), ReplayError> {
    match *event {
        CombatEvent::Attack {
            attacker_id,
            defender_id,
            ..
        }
        | CombatEvent::FirstStrike {
            attacker_id,
            defender_id,
            ..
        }
        | CombatEvent::Redirect {
            attacker_id,
            blocker_id: defender_id,
            ..
        } => {
            on_board(state, index, attacker_id)?;
            on_board(state, index, defender_id)
        }
        CombatEvent::Damage {
            target_id, amount, ..
        } => {
            on_board(state, index, target_id)?;
            state.damage_card(target_id, amount);
            Ok(())
        }
        CombatEvent::Heal { target, amount } => {
            let applied = state.heal_player(target, amount);
            if applied != amount {
                return Err(ReplayError::HealMismatch {
                    index,
                    expected: amount,
                    actual: applied,
                });
            }
            Ok(())
        }
        CombatEvent::Death { lane, card_id } => {
            on_board(state, index, card_id)?;
            let lethal = state
                .card(card_id)
                .map(|card| card.hp() <= 0 && card.slot_index == Some(lane))
                .unwrap_or(false);
            if !lethal {
                return Err(ReplayError::DeathWithoutLethal {
                    index,
                    card_id,
                    lane,
                });
            }
            state.destroy_card(card_id);
            Ok(())
        }
        CombatEvent::Face {
            target,
            amount,
            life_after,
        } => {
            let actual = state.damage_player(target, amount);
            if actual != life_after {
                return Err(ReplayError::LifeMismatch {
                    index,
                    expected: life_after,
                    actual,
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::combat::CombatResolver;
    use crate::game::state::{Side, Striker};

    #[test]
    fn replay_matches_resolver_on_sample() {
        let before = MatchState::sample();
        let mut after = before.clone();
        let events = CombatResolver::resolve(&mut after, Side::Player1);
        assert!(!events.is_empty());

        let replayed = replay_events(&before, &events).expect("replay");

        assert_eq!(replayed.player1, after.player1);
        assert_eq!(replayed.player2, after.player2);
        for card in &after.cards {
            let other = replayed.card(card.id).unwrap();
            assert_eq!(other.zone, card.zone, "card {}", card.id);
            assert_eq!(other.slot_index, card.slot_index);
            assert_eq!(other.current_hp, card.current_hp);
        }
    }

    #[test]
    fn replay_rejects_premature_death() {
        let before = MatchState::sample();
        let id = before.board_card(Side::Player1, 1).unwrap().id;
        let events = [CombatEvent::Death { lane: 1, card_id: id }];
        assert_eq!(
            replay_events(&before, &events),
            Err(ReplayError::DeathWithoutLethal {
                index: 0,
                card_id: id,
                lane: 1
            })
        );
    }

    #[test]
    fn replay_rejects_unknown_and_off_board_cards() {
        let before = MatchState::sample();
        let events = [CombatEvent::Damage {
            lane: 1,
            target_id: 404,
            amount: 1,
            side: Striker::Attacker,
        }];
        assert_eq!(
            replay_events(&before, &events),
            Err(ReplayError::UnknownCard {
                index: 0,
                card_id: 404
            })
        );

        let in_hand = before.zone_cards(Side::Player1, crate::game::state::Zone::Hand)[0].id;
        let events = [CombatEvent::Damage {
            lane: 1,
            target_id: in_hand,
            amount: 1,
            side: Striker::Attacker,
        }];
        assert!(matches!(
            replay_events(&before, &events),
            Err(ReplayError::NotOnBoard { index: 0, .. })
        ));
    }

    #[test]
    fn replay_checks_life_after() {
        let before = MatchState::sample();
        let events = [CombatEvent::Face {
            target: Side::Player2,
            amount: 3,
            life_after: 20,
        }];
        assert_eq!(
            replay_events(&before, &events),
            Err(ReplayError::LifeMismatch {
                index: 0,
                expected: 20,
                actual: 25
            })
        );
    }
}
