//! Card templates as supplied by the deck/catalog provider.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::config::MANA_CAP;
use super::keywords::Keyword;

/// Base stats of a card before it enters a match. Field names follow the
/// catalog rows (`final_hp`); camelCase is accepted too.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardTemplate {
    pub name: String,
    #[serde(alias = "finalHp")]
    pub final_hp: i32,
    #[serde(alias = "finalAtk")]
    pub final_atk: i32,
    #[serde(alias = "manaCost")]
    pub mana_cost: u8,
    #[serde(default)]
    pub keyword: Keyword,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TemplateError {
    #[error("template `{name}` has non-positive hp {value}")]
    NonPositiveHp { name: String, value: i32 },
    #[error("template `{name}` has negative attack {value}")]
    NegativeAttack { name: String, value: i32 },
    #[error("template `{name}` costs {value}, above the mana cap")]
    CostAboveCap { name: String, value: u8 },
}

impl CardTemplate {
    pub fn new(name: impl Into<String>, final_atk: i32, final_hp: i32, mana_cost: u8) -> Self {
        Self {
            name: name.into(),
            final_hp,
            final_atk,
            mana_cost,
            keyword: Keyword::None,
        }
    }

    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keyword = keyword;
        self
    }

    pub fn validate(&self) -> Result<(), TemplateError> {
        if self.final_hp <= 0 {
            return Err(TemplateError::NonPositiveHp {
                name: self.name.clone(),
                value: self.final_hp,
            });
        }
        if self.final_atk < 0 {
            return Err(TemplateError::NegativeAttack {
                name: self.name.clone(),
                value: self.final_atk,
            });
        }
        if self.mana_cost > MANA_CAP {
            return Err(TemplateError::CostAboveCap {
                name: self.name.clone(),
                value: self.mana_cost,
            });
        }
        Ok(())
    }
}

static STARTER_CATALOG: Lazy<Vec<CardTemplate>> = Lazy::new(|| {
    vec![
        CardTemplate::new("Scrap Drone", 1, 2, 1),
        CardTemplate::new("Circuit Hound", 2, 2, 2),
        CardTemplate::new("Overclocked Striker", 3, 2, 2).with_keyword(Keyword::Overclock),
        CardTemplate::new("Bulwark Unit", 1, 5, 3).with_keyword(Keyword::Blocker),
        CardTemplate::new("Night Leech", 2, 3, 3).with_keyword(Keyword::Vampirism),
        CardTemplate::new("Iron Brawler", 4, 3, 4),
        CardTemplate::new("Plasma Lancer", 5, 2, 4).with_keyword(Keyword::Overclock),
        CardTemplate::new("Citadel Core", 2, 8, 5).with_keyword(Keyword::Blocker),
        CardTemplate::new("Blood Reactor", 4, 5, 5).with_keyword(Keyword::Vampirism),
        CardTemplate::new("Titan Frame", 7, 7, 7),
    ]
});

/// The built-in catalog used for sample matches and the offline playground.
pub fn starter_catalog() -> &'static [CardTemplate] {
    &STARTER_CATALOG
}

/// Two copies of each starter card.
pub fn starter_deck() -> Vec<CardTemplate> {
    STARTER_CATALOG
        .iter()
        .flat_map(|template| [template.clone(), template.clone()])
        .collect()
}
