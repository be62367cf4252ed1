//! Pure duel engine: match state, validation, combat, turn flow.

pub mod catalog;
pub mod combat;
pub mod config;
pub mod keywords;
pub mod replay;
pub mod rules;
pub mod state;
pub mod validator;

pub use catalog::{starter_catalog, starter_deck, CardTemplate, TemplateError};
pub use combat::CombatResolver;
pub use config::{ConfigError, EmptyLanePolicy, MatchConfig, LANE_COUNT, MANA_CAP};
pub use keywords::Keyword;
pub use replay::{replay_events, ReplayError};
pub use rules::{ApplyResult, Resolution, TurnEngine};
pub use state::{
    CardId,
    CombatEvent,
    IntegrityError,
    MatchCard,
    MatchState,
    MatchStatus,
    PlayerState,
    SetupError,
    Side,
    Striker,
    Zone,
};
pub use validator::{Action, ActionValidator, RejectReason, BUY_CARD_COST};
