//! End-of-turn combat between the acting side's lanes and the opposing board.
//!
//! Lanes resolve strictly left to right. Within a lane the attacker picks its
//! target (taunt first, then the facing card, then the player), strikes, and
//! deaths are applied before the next lane is looked at, so a blocker killed
//! in lane 1 no longer taunts lane 2.
//!
//! A blocker standing in the attacker's own lane is hit directly: no
//! `redirect` event precedes the `attack` in that case.

use tracing::{info, trace};

use super::config::{EmptyLanePolicy, LANE_COUNT};
use super::keywords::lifesteal_amount;
use super::state::{CardId, CombatEvent, MatchCard, MatchState, Side, Striker};

pub struct CombatResolver;

impl CombatResolver {
    /// Resolve `attacking`'s board into its opponent. Mutates `state` and
    /// returns the ordered event log (possibly empty).
    pub fn resolve(state: &mut MatchState, attacking: Side) -> Vec<CombatEvent> {
        let mut events = Vec::new();
        if state.is_finished() {
            return events;
        }

        // only the defending board changes mid-combat, so the attackers can
        // be read up front
        for (lane, attacker) in (1..=LANE_COUNT).zip(state.lanes(attacking)) {
            match attacker {
                Some(attacker_id) => {
                    Self::resolve_lane(state, attacking, lane, attacker_id, &mut events)
                }
                None => trace!(lane, side = attacking.as_str(), "lane empty, skipped"),
            }
        }

        if state.evaluate_outcome() {
            info!(
                winner = state.winner.map(Side::as_str).unwrap_or("draw"),
                turn = state.turn_number,
                "match finished"
            );
        }
        events
    }

    fn resolve_lane(
        state: &mut MatchState,
        attacking: Side,
        lane: u8,
        attacker_id: CardId,
        events: &mut Vec<CombatEvent>,
    ) {
        let Some(attacker) = state.card(attacker_id).cloned() else {
            return;
        };
        let defending = attacking.opponent();

        let target = match state.blocker(defending).cloned() {
            Some(blocker) => {
                let blocker_slot = blocker.slot_index.unwrap_or(lane);
                if blocker_slot != lane {
                    events.push(CombatEvent::Redirect {
                        lane,
                        attacker_id: attacker.id,
                        blocker_id: blocker.id,
                        blocker_slot,
                    });
                }
                Some(blocker)
            }
            None => state.board_card(defending, lane).cloned(),
        };

        match target {
            Some(defender) => Self::clash(state, lane, &attacker, &defender, events),
            None => Self::hit_face(state, lane, &attacker, defending, events),
        }
    }

    fn clash(
        state: &mut MatchState,
        lane: u8,
        attacker: &MatchCard,
        defender: &MatchCard,
        events: &mut Vec<CombatEvent>,
    ) {
        let first_strike = attacker.keyword.strikes_first();
        trace!(
            lane,
            attacker = attacker.id,
            defender = defender.id,
            keyword = attacker.keyword.as_str(),
            "clash"
        );

        if first_strike {
            events.push(CombatEvent::FirstStrike {
                lane,
                attacker_id: attacker.id,
                defender_id: defender.id,
            });
        }
        events.push(CombatEvent::Attack {
            lane,
            attacker_id: attacker.id,
            defender_id: defender.id,
        });

        let dealt = attacker.attack();
        let defender_hp = Self::strike(state, lane, defender, dealt, Striker::Attacker, events);
        Self::lifesteal(state, attacker, dealt, events);

        if first_strike {
            if defender_hp == 0 {
                Self::kill(state, defender, events);
                return;
            }
            let attacker_hp =
                Self::strike(state, lane, attacker, defender.attack(), Striker::Defender, events);
            if attacker_hp == 0 {
                Self::kill(state, attacker, events);
            }
            return;
        }

        let attacker_hp =
            Self::strike(state, lane, attacker, defender.attack(), Striker::Defender, events);
        if defender_hp == 0 {
            Self::kill(state, defender, events);
        }
        if attacker_hp == 0 {
            Self::kill(state, attacker, events);
        }
    }

    /// Deal `amount` to `target`; returns its hp afterwards.
    fn strike(
        state: &mut MatchState,
        lane: u8,
        target: &MatchCard,
        amount: i32,
        side: Striker,
        events: &mut Vec<CombatEvent>,
    ) -> i32 {
        if amount <= 0 {
            return state.card(target.id).map(MatchCard::hp).unwrap_or(0);
        }
        let remaining = state.damage_card(target.id, amount).unwrap_or(0);
        events.push(CombatEvent::Damage {
            lane,
            target_id: target.id,
            amount,
            side,
        });
        remaining
    }

    fn kill(state: &mut MatchState, card: &MatchCard, events: &mut Vec<CombatEvent>) {
        if let Some(lane) = state.destroy_card(card.id) {
            events.push(CombatEvent::Death {
                lane,
                card_id: card.id,
            });
        }
    }

    fn lifesteal(
        state: &mut MatchState,
        attacker: &MatchCard,
        dealt: i32,
        events: &mut Vec<CombatEvent>,
    ) {
        let life = state.player(attacker.side).life;
        let amount = lifesteal_amount(attacker.keyword, dealt, life, state.config.max_life);
        if amount <= 0 {
            return;
        }
        let applied = state.heal_player(attacker.side, amount);
        if applied > 0 {
            events.push(CombatEvent::Heal {
                target: attacker.side,
                amount: applied,
            });
        }
    }

    fn hit_face(
        state: &mut MatchState,
        lane: u8,
        attacker: &MatchCard,
        defending: Side,
        events: &mut Vec<CombatEvent>,
    ) {
        if state.config.empty_lane == EmptyLanePolicy::Absorb {
            trace!(lane, attacker = attacker.id, "unopposed attack absorbed");
            return;
        }
        let amount = attacker.attack();
        if amount <= 0 {
            return;
        }
        let life_after = state.damage_player(defending, amount);
        events.push(CombatEvent::Face {
            target: defending,
            amount,
            life_after,
        });
        Self::lifesteal(state, attacker, amount, events);
    }
}
