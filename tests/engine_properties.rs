use duel_core::{
    starter_deck, Action, CombatEvent, MatchConfig, MatchState, Side, TurnEngine, Zone,
};
use proptest::prelude::*;

fn fresh_match(seed: u64) -> MatchState {
    let deck = starter_deck();
    MatchState::new(MatchConfig::default(), &deck, &deck, seed).expect("starter setup")
}

/// Play out `picks` as indices into the legal action list of whoever is on
/// turn, collecting every accepted resolution along the way.
fn play_out(seed: u64, picks: &[usize]) -> Vec<(MatchState, Action, Vec<CombatEvent>, MatchState)> {
    let mut state = fresh_match(seed);
    let mut history = Vec::new();
    for pick in picks {
        let side = state.current_turn;
        let actions = TurnEngine::legal_actions(&state, side);
        if actions.is_empty() {
            break;
        }
        let action = actions[pick % actions.len()];
        let resolution = TurnEngine::apply(&state, &action, side).expect("legal action applies");
        history.push((state, action, resolution.events, resolution.state.clone()));
        state = resolution.state;
    }
    history
}

fn check_invariants(state: &MatchState) {
    assert_eq!(state.integrity_check(), Ok(()));
    for side in Side::ALL {
        let player = state.player(side);
        assert!(player.mana <= player.max_mana, "{side:?} mana above max");
        assert!(player.max_mana <= 10);
        let mut slots = Vec::new();
        for card in state.zone_cards(side, Zone::Board) {
            let hp = card.current_hp.unwrap_or(card.base_hp);
            assert!(hp > 0 && hp <= card.base_hp, "card {} hp {hp}", card.id);
            let slot = card.slot_index.expect("board card has a slot");
            assert!(!slots.contains(&slot), "slot {slot} shared");
            slots.push(slot);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn invariants_hold_over_random_play(seed in any::<u64>(), picks in prop::collection::vec(0usize..64, 1..80)) {
        for (_, _, _, after) in play_out(seed, &picks) {
            check_invariants(&after);
        }
    }

    #[test]
    fn end_turn_alternates_and_max_mana_never_drops(seed in any::<u64>(), picks in prop::collection::vec(0usize..64, 1..80)) {
        for (before, action, _, after) in play_out(seed, &picks) {
            for side in Side::ALL {
                prop_assert!(after.player(side).max_mana >= before.player(side).max_mana);
            }
            if action == Action::EndTurn && !after.is_finished() {
                prop_assert_eq!(after.current_turn, before.current_turn.opponent());
                prop_assert_eq!(after.turn_number, before.turn_number + 1);
            } else {
                prop_assert_eq!(after.current_turn, before.current_turn);
                prop_assert_eq!(after.turn_number, before.turn_number);
            }
        }
    }

    #[test]
    fn apply_is_a_pure_function(seed in any::<u64>(), picks in prop::collection::vec(0usize..64, 1..40)) {
        for (before, action, events, after) in play_out(seed, &picks) {
            let again = TurnEngine::apply(&before, &action, before.current_turn).expect("replays");
            prop_assert_eq!(&again.events, &events);
            prop_assert_eq!(&again.state, &after);
        }
    }

    #[test]
    fn heal_never_exceeds_preceding_damage(seed in any::<u64>(), picks in prop::collection::vec(0usize..64, 1..80)) {
        for (_, _, events, _) in play_out(seed, &picks) {
            let mut last_dealt = 0;
            for event in &events {
                match *event {
                    CombatEvent::Damage { amount, .. } => last_dealt = amount,
                    CombatEvent::Face { amount, .. } => last_dealt = amount,
                    CombatEvent::Heal { amount, .. } => {
                        prop_assert!(amount > 0 && amount <= last_dealt);
                    }
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn blockers_draw_every_attack(seed in any::<u64>(), picks in prop::collection::vec(0usize..64, 1..80)) {
        for (before, action, events, _) in play_out(seed, &picks) {
            if action != Action::EndTurn {
                continue;
            }
            let defender = before.current_turn.opponent();
            let Some(blocker) = before.blocker(defender).map(|card| card.id) else {
                continue;
            };
            // until the blocker dies, every attack must land on it
            for event in &events {
                match *event {
                    CombatEvent::Attack { defender_id, .. } => prop_assert_eq!(defender_id, blocker),
                    CombatEvent::Face { .. } => prop_assert!(false, "face damage past a live blocker"),
                    CombatEvent::Death { card_id, .. } if card_id == blocker => break,
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn rejected_actions_change_nothing(seed in any::<u64>(), card_id in 0u32..64, slot in 0u8..6) {
        let state = fresh_match(seed);
        let idle = state.current_turn.opponent();
        let action = Action::PlayCard { card_id, target_slot: slot };
        for (side, action) in [(idle, Action::EndTurn), (state.current_turn, action), (state.current_turn, Action::BuyCard)] {
            let snapshot = state.clone();
            let mut target = state.clone();
            if TurnEngine::apply_in_place(&mut target, &action, side).is_err() {
                prop_assert_eq!(&target, &snapshot);
            }
        }
    }
}
