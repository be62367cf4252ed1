use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lanes per side. Slots are addressed `1..=LANE_COUNT`.
pub const LANE_COUNT: u8 = 3;
/// Hard ceiling for `max_mana`.
pub const MANA_CAP: u8 = 10;

const DEFAULT_STARTING_LIFE: i32 = 30;
const DEFAULT_STARTING_MANA: u8 = 1;
const DEFAULT_MANA_PER_TURN: u8 = MANA_CAP;
const DEFAULT_OPENING_HAND: u8 = 3;

/// What happens when an attacker finds neither a blocker nor a card in the
/// opposing lane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EmptyLanePolicy {
    /// The attacker hits the defending player's life and a `face` event is emitted.
    #[default]
    Face,
    /// The attack is absorbed: no damage, no event.
    Absorb,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConfigError {
    #[error("starting life must be positive, got {value}")]
    NonPositiveLife { value: i32 },
    #[error("max life {max_life} is below starting life {starting_life}")]
    MaxLifeBelowStart { starting_life: i32, max_life: i32 },
    #[error("mana cap {value} exceeds {MANA_CAP}")]
    ManaCapTooHigh { value: u8 },
    #[error("starting mana {mana} exceeds starting max mana {max_mana}")]
    ManaAboveMax { mana: u8, max_mana: u8 },
    #[error("starting max mana {max_mana} exceeds mana cap {cap}")]
    MaxManaAboveCap { max_mana: u8, cap: u8 },
}

/// Per-match tuning. Every field has a serde default so a client may send `{}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MatchConfig {
    #[serde(default = "default_starting_life")]
    pub starting_life: i32,
    /// Lifesteal never heals a side above this.
    #[serde(default = "default_starting_life")]
    pub max_life: i32,
    #[serde(default = "default_starting_mana")]
    pub starting_mana: u8,
    #[serde(default = "default_starting_mana")]
    pub starting_max_mana: u8,
    #[serde(default = "default_mana_per_turn")]
    pub mana_per_turn: u8,
    #[serde(default = "default_mana_cap")]
    pub mana_cap: u8,
    #[serde(default = "default_opening_hand")]
    pub opening_hand: u8,
    #[serde(default)]
    pub empty_lane: EmptyLanePolicy,
}

fn default_starting_life() -> i32 {
    DEFAULT_STARTING_LIFE
}

fn default_starting_mana() -> u8 {
    DEFAULT_STARTING_MANA
}

fn default_mana_per_turn() -> u8 {
    DEFAULT_MANA_PER_TURN
}

fn default_mana_cap() -> u8 {
    MANA_CAP
}

fn default_opening_hand() -> u8 {
    DEFAULT_OPENING_HAND
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            starting_life: DEFAULT_STARTING_LIFE,
            max_life: DEFAULT_STARTING_LIFE,
            starting_mana: DEFAULT_STARTING_MANA,
            starting_max_mana: DEFAULT_STARTING_MANA,
            mana_per_turn: DEFAULT_MANA_PER_TURN,
            mana_cap: MANA_CAP,
            opening_hand: DEFAULT_OPENING_HAND,
            empty_lane: EmptyLanePolicy::default(),
        }
    }
}

impl MatchConfig {
    pub fn with_empty_lane(mut self, policy: EmptyLanePolicy) -> Self {
        self.empty_lane = policy;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.starting_life <= 0 {
            return Err(ConfigError::NonPositiveLife {
                value: self.starting_life,
            });
        }
        if self.max_life < self.starting_life {
            return Err(ConfigError::MaxLifeBelowStart {
                starting_life: self.starting_life,
                max_life: self.max_life,
            });
        }
        if self.mana_cap > MANA_CAP {
            return Err(ConfigError::ManaCapTooHigh {
                value: self.mana_cap,
            });
        }
        if self.starting_max_mana > self.mana_cap {
            return Err(ConfigError::MaxManaAboveCap {
                max_mana: self.starting_max_mana,
                cap: self.mana_cap,
            });
        }
        if self.starting_mana > self.starting_max_mana {
            return Err(ConfigError::ManaAboveMax {
                mana: self.starting_mana,
                max_mana: self.starting_max_mana,
            });
        }
        Ok(())
    }
}
