pub mod ai;
pub mod game;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{AiAgent, AiConfig, AiDecision, AiDifficulty, AiStrategy};
pub use game::{
    replay_events, starter_catalog, starter_deck, Action, ActionValidator, ApplyResult, CardId,
    CardTemplate, CombatEvent, CombatResolver, EmptyLanePolicy, IntegrityError, Keyword,
    MatchCard, MatchConfig, MatchState, MatchStatus, PlayerState, RejectReason, ReplayError,
    Resolution, Side, Striker, TurnEngine, Zone,
};
use utils::{console_log, console_warn, set_panic_hook};

#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    set_panic_hook();
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn parse_side(side: &str) -> Result<Side, JsValue> {
    Side::from_str(side).map_err(|_| JsValue::from_str(&format!("unknown side: {side}")))
}

/// `undefined`/`null` fall back to `fallback`.
fn from_optional<T, F>(value: JsValue, fallback: F) -> Result<T, JsValue>
where
    T: DeserializeOwned,
    F: FnOnce() -> T,
{
    if value.is_undefined() || value.is_null() {
        Ok(fallback())
    } else {
        from_value(value).map_err(JsValue::from)
    }
}

fn ai_config(difficulty: Option<String>, strategy: Option<String>) -> AiConfig {
    let diff = difficulty
        .as_deref()
        .and_then(|value| AiDifficulty::from_str(value).ok())
        .unwrap_or(AiDifficulty::Normal);
    let mut config = AiConfig::from_difficulty(diff);
    if let Some(strategy) = strategy
        .as_deref()
        .and_then(|value| AiStrategy::from_str(value).ok())
    {
        config = config.with_strategy(strategy);
    }
    config
}

#[derive(Serialize)]
struct AiMoveResponse {
    decision: AiDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    applied: Option<ApplyResult>,
}

/// Holds one match for clients that prefer a stateful handle over passing
/// snapshots back and forth.
#[wasm_bindgen]
pub struct DuelEngine {
    state: MatchState,
}

#[wasm_bindgen]
impl DuelEngine {
    #[wasm_bindgen(constructor)]
    pub fn new(initial_state_json: Option<String>) -> Result<DuelEngine, JsValue> {
        let state = if let Some(json) = initial_state_json {
            let state: MatchState = serde_json::from_str(&json).map_err(serde_to_js_error)?;
            state.integrity_check().map_err(serde_to_js_error)?;
            state
        } else {
            MatchState::sample()
        };
        Ok(DuelEngine { state })
    }

    #[wasm_bindgen(js_name = "stateJson")]
    pub fn state_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.state).map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "setStateJson")]
    pub fn set_state_json(&mut self, json: &str) -> Result<(), JsValue> {
        let state: MatchState = serde_json::from_str(json).map_err(serde_to_js_error)?;
        state.integrity_check().map_err(serde_to_js_error)?;
        self.state = state;
        Ok(())
    }

    /// Apply a JSON action for `side`. The held state only changes when the
    /// action is accepted; the reply is an `ApplyResult` as JSON.
    #[wasm_bindgen(js_name = "applyJson")]
    pub fn apply_json(&mut self, action_json: &str, side: &str) -> Result<String, JsValue> {
        let action: Action = serde_json::from_str(action_json).map_err(serde_to_js_error)?;
        let side = parse_side(side)?;
        let result = self.apply(&action, side);
        serde_json::to_string(&result).map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "applyAiMove")]
    pub fn apply_ai_move(
        &mut self,
        side: &str,
        difficulty: Option<String>,
        strategy: Option<String>,
    ) -> Result<String, JsValue> {
        let side = parse_side(side)?;
        let mut agent = AiAgent::new(ai_config(difficulty, strategy));
        let decision = agent.decide_action(&self.state, side);

        let applied = decision.action.map(|action| self.apply(&action, side));

        let response = AiMoveResponse { decision, applied };
        serde_json::to_string(&response).map_err(serde_to_js_error)
    }

    #[wasm_bindgen(js_name = "thinkAi")]
    pub fn think_ai(
        &self,
        side: &str,
        difficulty: Option<String>,
        strategy: Option<String>,
        delay_ms: Option<u32>,
    ) -> Result<Promise, JsValue> {
        let side = parse_side(side)?;
        let state = self.state.clone();
        let config = ai_config(difficulty, strategy);
        let delay = delay_ms.unwrap_or(0);

        Ok(future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let mut agent = AiAgent::new(config);
            let decision = agent.decide_action(&state, side);
            let json = serde_json::to_string(&decision).map_err(serde_to_js_error)?;
            Ok(JsValue::from_str(&json))
        }))
    }

    fn apply(&mut self, action: &Action, side: Side) -> ApplyResult {
        let result = TurnEngine::apply(&self.state, action, side);
        match &result {
            Ok(resolution) => {
                self.state = resolution.state.clone();
                if self.state.is_finished() {
                    console_log(&format!("match finished, winner: {:?}", self.state.winner));
                }
            }
            Err(reason) => console_warn(&format!("{} rejected: {reason}", side.as_str())),
        }
        result.into()
    }
}

/// Start a seeded match. `config` and both decks are optional; missing decks
/// use the starter deck.
#[wasm_bindgen(js_name = "createMatch")]
pub fn create_match(
    config: JsValue,
    deck1: JsValue,
    deck2: JsValue,
    seed: u32,
) -> Result<JsValue, JsValue> {
    let config: MatchConfig = from_optional(config, MatchConfig::default)?;
    let deck1: Vec<CardTemplate> = from_optional(deck1, starter_deck)?;
    let deck2: Vec<CardTemplate> = from_optional(deck2, starter_deck)?;
    let state =
        MatchState::new(config, &deck1, &deck2, u64::from(seed)).map_err(serde_to_js_error)?;
    to_value(&state).map_err(JsValue::from)
}

/// A fixed mid-game position for UI work and debugging.
#[wasm_bindgen(js_name = "sampleMatch")]
pub fn sample_match() -> Result<JsValue, JsValue> {
    to_value(&MatchState::sample()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "starterCatalog")]
pub fn starter_catalog_js() -> Result<JsValue, JsValue> {
    to_value(&starter_catalog().to_vec()).map_err(JsValue::from)
}

/// Returns `{ok, state, events}` or `{ok: false, reason}`. Malformed input
/// is an error rather than a rejection.
#[wasm_bindgen(js_name = "applyAction")]
pub fn apply_action(state: JsValue, action: JsValue, side: &str) -> Result<JsValue, JsValue> {
    let state: MatchState = from_value(state).map_err(JsValue::from)?;
    let action: Action = from_value(action).map_err(JsValue::from)?;
    let side = parse_side(side)?;
    let result: ApplyResult = TurnEngine::apply(&state, &action, side).into();
    to_value(&result).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateAction")]
pub fn validate_action(state: JsValue, action: JsValue, side: &str) -> Result<JsValue, JsValue> {
    let state: MatchState = from_value(state).map_err(JsValue::from)?;
    let action: Action = from_value(action).map_err(JsValue::from)?;
    let side = parse_side(side)?;
    let result = ApplyResult {
        ok: true,
        state: None,
        events: None,
        reason: None,
    };
    let result = match ActionValidator::validate(&state, &action, side) {
        Ok(()) => result,
        Err(reason) => ApplyResult {
            ok: false,
            reason: Some(reason),
            ..result
        },
    };
    to_value(&result).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "legalActions")]
pub fn legal_actions(state: JsValue, side: &str) -> Result<JsValue, JsValue> {
    let state: MatchState = from_value(state).map_err(JsValue::from)?;
    let side = parse_side(side)?;
    to_value(&TurnEngine::legal_actions(&state, side)).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateState")]
pub fn validate_state(state: JsValue) -> Result<(), JsValue> {
    let state: MatchState = from_value(state).map_err(JsValue::from)?;
    state
        .integrity_check()
        .map_err(|error| to_value(&error).unwrap_or_else(serde_to_js_error))
}

/// Rebuild the post-combat state from the pre-combat snapshot and its events.
#[wasm_bindgen(js_name = "replayEvents")]
pub fn replay_events_js(before: JsValue, events: JsValue) -> Result<JsValue, JsValue> {
    let before: MatchState = from_value(before).map_err(JsValue::from)?;
    let events: Vec<CombatEvent> = from_value(events).map_err(JsValue::from)?;
    let after = replay_events(&before, &events)
        .map_err(|error| to_value(&error).unwrap_or_else(serde_to_js_error))?;
    to_value(&after).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    state: JsValue,
    side: &str,
    difficulty: Option<String>,
    strategy: Option<String>,
) -> Result<JsValue, JsValue> {
    let state: MatchState = from_value(state).map_err(JsValue::from)?;
    let side = parse_side(side)?;
    let mut agent = AiAgent::new(ai_config(difficulty, strategy));
    let decision = agent.decide_action(&state, side);
    to_value(&decision).map_err(JsValue::from)
}
