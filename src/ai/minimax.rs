use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::game::{
    Action, Keyword, MatchCard, MatchState, RejectReason, Resolution, Side, TurnEngine, Zone,
};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiStrategy {
    Aggressive,
    Control,
    Random,
    Adaptive,
}

impl FromStr for AiStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aggressive" | "aggro" => Ok(AiStrategy::Aggressive),
            "control" => Ok(AiStrategy::Control),
            "random" => Ok(AiStrategy::Random),
            "adaptive" | "balanced" => Ok(AiStrategy::Adaptive),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    Normal,
    Hard,
    Expert,
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "normal" | "medium" => Ok(AiDifficulty::Normal),
            "hard" => Ok(AiDifficulty::Hard),
            "expert" | "extreme" => Ok(AiDifficulty::Expert),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiConfig {
    pub depth: u8,
    pub randomness: f64,
    /// Search stops after visiting this many nodes; 0 means unbounded.
    pub node_budget: u64,
    pub strategy: AiStrategy,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        match difficulty {
            AiDifficulty::Easy => Self {
                depth: 1,
                randomness: 1.2,
                node_budget: 200,
                strategy: AiStrategy::Random,
            },
            AiDifficulty::Normal => Self {
                depth: 2,
                randomness: 0.6,
                node_budget: 2_000,
                strategy: AiStrategy::Control,
            },
            AiDifficulty::Hard => Self {
                depth: 3,
                randomness: 0.2,
                node_budget: 8_000,
                strategy: AiStrategy::Aggressive,
            },
            AiDifficulty::Expert => Self {
                depth: 4,
                randomness: 0.0,
                node_budget: 20_000,
                strategy: AiStrategy::Adaptive,
            },
        }
    }

    pub fn with_strategy(mut self, strategy: AiStrategy) -> Self {
        self.strategy = strategy;
        if matches!(self.strategy, AiStrategy::Random) {
            self.randomness = self.randomness.max(1.0);
        }
        self
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::Normal)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiDecision {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    pub evaluation: f64,
    pub depth_reached: u8,
    pub nodes: u64,
    /// The node budget ran out before the search finished.
    pub exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<Resolution>,
    pub strategy: AiStrategy,
}

struct SearchStats {
    nodes: u64,
    depth_reached: u8,
    exhausted: bool,
}

impl SearchStats {
    fn new() -> Self {
        Self {
            nodes: 0,
            depth_reached: 0,
            exhausted: false,
        }
    }
}

/// Offline opponent. Searches over the same `TurnEngine` the server runs.
pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn idle_decision(&self, state: &MatchState, side: Side, stats: &SearchStats) -> AiDecision {
        AiDecision {
            action: None,
            evaluation: self.evaluate(state, side),
            depth_reached: stats.depth_reached,
            nodes: stats.nodes,
            exhausted: stats.exhausted,
            resolution: None,
            strategy: self.config.strategy,
        }
    }

    fn random_decision(&mut self, state: &MatchState, side: Side) -> AiDecision {
        let mut transitions = self.generate_transitions(state, side);
        if transitions.is_empty() {
            return self.idle_decision(state, side, &SearchStats::new());
        }

        transitions.shuffle(&mut self.rng);
        let (action, next_state) = transitions.swap_remove(0);
        let resolution = TurnEngine::apply(state, &action, side).ok();

        AiDecision {
            action: Some(action),
            evaluation: self.evaluate(&next_state, side),
            depth_reached: 1,
            nodes: 1,
            exhausted: false,
            resolution,
            strategy: AiStrategy::Random,
        }
    }

    /// Pick an action for `side`. Returns no action when `side` cannot act.
    pub fn decide_action(&mut self, state: &MatchState, side: Side) -> AiDecision {
        let mut stats = SearchStats::new();

        if state.is_finished() || state.current_turn != side {
            return self.idle_decision(state, side, &stats);
        }

        let strategy = self.config.strategy;
        if strategy == AiStrategy::Random {
            return self.random_decision(state, side);
        }

        let mut transitions = self.generate_transitions(state, side);
        self.prioritize_actions(state, &mut transitions, strategy, side);
        if transitions.is_empty() {
            return self.idle_decision(state, side, &stats);
        }

        let depth = self.config.depth.saturating_sub(1);
        let mut best_action = None;
        let mut best_score = f64::NEG_INFINITY;
        let mut best_cmp = f64::NEG_INFINITY;
        let mut alpha = f64::NEG_INFINITY;
        let beta = f64::INFINITY;

        for (action, child_state) in transitions {
            let score = self.minimax_rec(&child_state, depth, alpha, beta, side, &mut stats);
            alpha = alpha.max(score);

            let comparison_score = if self.config.randomness > 0.0 {
                score + self.random_noise()
            } else {
                score
            };

            if comparison_score > best_cmp {
                best_cmp = comparison_score;
                best_score = score;
                best_action = Some(action);
            }

            if stats.exhausted {
                break;
            }
        }

        let resolution = best_action
            .as_ref()
            .and_then(|action| TurnEngine::apply(state, action, side).ok());

        debug!(
            side = side.as_str(),
            ?best_action,
            nodes = stats.nodes,
            exhausted = stats.exhausted,
            "ai decided"
        );

        AiDecision {
            action: best_action,
            evaluation: best_score,
            depth_reached: stats.depth_reached,
            nodes: stats.nodes,
            exhausted: stats.exhausted,
            resolution,
            strategy,
        }
    }

    fn minimax_rec(
        &mut self,
        state: &MatchState,
        depth_remaining: u8,
        mut alpha: f64,
        mut beta: f64,
        root: Side,
        stats: &mut SearchStats,
    ) -> f64 {
        stats.nodes += 1;
        let depth_explored = self.config.depth.saturating_sub(depth_remaining);
        if depth_explored > stats.depth_reached {
            stats.depth_reached = depth_explored;
        }

        if self.config.node_budget > 0 && stats.nodes >= self.config.node_budget {
            stats.exhausted = true;
            return self.evaluate(state, root);
        }

        if depth_remaining == 0 || state.is_finished() {
            return self.evaluate(state, root);
        }

        let actor = state.current_turn;
        let maximizing = actor == root;
        let mut transitions = self.generate_transitions(state, actor);
        self.prioritize_actions(state, &mut transitions, self.config.strategy, root);
        if transitions.is_empty() {
            return self.evaluate(state, root);
        }

        if maximizing {
            let mut value = f64::NEG_INFINITY;
            for (_, child_state) in transitions {
                let score = self.minimax_rec(
                    &child_state,
                    depth_remaining - 1,
                    alpha,
                    beta,
                    root,
                    stats,
                );
                value = value.max(score);
                alpha = alpha.max(value);
                if stats.exhausted || beta <= alpha {
                    break;
                }
            }
            value
        } else {
            let mut value = f64::INFINITY;
            for (_, child_state) in transitions {
                let score = self.minimax_rec(
                    &child_state,
                    depth_remaining - 1,
                    alpha,
                    beta,
                    root,
                    stats,
                );
                value = value.min(score);
                beta = beta.min(value);
                if stats.exhausted || beta <= alpha {
                    break;
                }
            }
            value
        }
    }

    fn generate_transitions(&mut self, state: &MatchState, actor: Side) -> Vec<(Action, MatchState)> {
        let mut transitions: Vec<(Action, MatchState)> = TurnEngine::legal_actions(state, actor)
            .into_iter()
            .filter_map(|action| {
                let mut next = state.clone();
                let applied: Result<_, RejectReason> =
                    TurnEngine::apply_in_place(&mut next, &action, actor);
                applied.ok().map(|_| (action, next))
            })
            .collect();

        if self.config.randomness > 0.0 {
            transitions.shuffle(&mut self.rng);
        }
        transitions
    }

    fn prioritize_actions(
        &self,
        base_state: &MatchState,
        actions: &mut [(Action, MatchState)],
        strategy: AiStrategy,
        side: Side,
    ) {
        if actions.len() <= 1 {
            return;
        }

        match strategy {
            AiStrategy::Random => {}
            AiStrategy::Aggressive => actions.sort_by(|a, b| {
                aggressive_score(base_state, b, side)
                    .partial_cmp(&aggressive_score(base_state, a, side))
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            AiStrategy::Control => actions.sort_by(|a, b| {
                control_score(base_state, b, side)
                    .partial_cmp(&control_score(base_state, a, side))
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            AiStrategy::Adaptive => actions.sort_by(|a, b| {
                let score_b = self.evaluate(&b.1, side);
                let score_a = self.evaluate(&a.1, side);
                score_b
                    .partial_cmp(&score_a)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
    }

    fn evaluate(&self, state: &MatchState, side: Side) -> f64 {
        if state.is_finished() {
            return match state.winner {
                Some(winner) if winner == side => 1_000_000.0,
                Some(_) => -1_000_000.0,
                None => 0.0,
            };
        }

        let (life_diff, board_diff, hand_diff, mana_diff) = evaluation_components(state, side);

        let weights = match self.config.strategy {
            AiStrategy::Aggressive => StrategyWeights {
                life: 3.0,
                board: 1.2,
                hand: 0.6,
                mana: 0.4,
            },
            AiStrategy::Control => StrategyWeights {
                life: 1.2,
                board: 2.4,
                hand: 1.6,
                mana: 0.8,
            },
            AiStrategy::Adaptive => adaptive_weights(life_diff, board_diff),
            AiStrategy::Random => StrategyWeights {
                life: 1.0,
                board: 1.0,
                hand: 1.0,
                mana: 0.5,
            },
        };

        let turn_bonus = if state.current_turn == side { 0.3 } else { -0.3 };

        life_diff * weights.life
            + board_diff * weights.board
            + hand_diff * weights.hand
            + mana_diff * weights.mana
            + turn_bonus
    }

    fn random_noise(&mut self) -> f64 {
        if self.config.randomness <= 0.0 {
            0.0
        } else {
            (self.rng.gen::<f64>() - 0.5) * 2.0 * self.config.randomness
        }
    }
}

fn card_value(card: &MatchCard) -> f64 {
    let atk = card.attack() as f64;
    let hp = card.hp().max(0) as f64;
    let keyword_bonus = match card.keyword {
        Keyword::None => 0.0,
        Keyword::Overclock => atk * 0.5,
        Keyword::Blocker => hp * 0.4,
        Keyword::Vampirism => atk * 0.6,
    };
    atk * 1.6 + hp + keyword_bonus
}

fn board_value(state: &MatchState, side: Side) -> f64 {
    state
        .zone_cards(side, Zone::Board)
        .into_iter()
        .map(card_value)
        .sum()
}

fn aggressive_score(base: &MatchState, transition: &(Action, MatchState), side: Side) -> f64 {
    let (_, next) = transition;
    let opponent = side.opponent();
    let damage = (base.player(opponent).life - next.player(opponent).life) as f64;
    damage + board_value(next, side)
}

fn control_score(base: &MatchState, transition: &(Action, MatchState), side: Side) -> f64 {
    let (_, next) = transition;
    let board_gain = board_value(next, side) - board_value(base, side);
    board_gain - board_value(next, side.opponent())
}

fn evaluation_components(state: &MatchState, side: Side) -> (f64, f64, f64, f64) {
    let opponent = side.opponent();
    let me = state.player(side);
    let them = state.player(opponent);

    let life_diff = (me.life - them.life) as f64;
    let board_diff = board_value(state, side) - board_value(state, opponent);
    let hand_diff =
        state.zone_count(side, Zone::Hand) as f64 - state.zone_count(opponent, Zone::Hand) as f64;
    let mana_diff = me.max_mana as f64 - them.max_mana as f64;

    (life_diff, board_diff, hand_diff, mana_diff)
}

#[derive(Debug, Clone, Copy)]
struct StrategyWeights {
    life: f64,
    board: f64,
    hand: f64,
    mana: f64,
}

fn adaptive_weights(life_diff: f64, board_diff: f64) -> StrategyWeights {
    let life_weight = if life_diff < 0.0 { 2.6 } else { 1.4 };
    let board_weight = if board_diff < 0.0 { 2.8 } else { 1.6 };
    StrategyWeights {
        life: life_weight,
        board: board_weight,
        hand: 1.3,
        mana: 0.9,
    }
}
