//! Offline opponent for vs-AI duels.

pub mod minimax;

pub use minimax::{AiAgent, AiConfig, AiDecision, AiDifficulty, AiStrategy};
